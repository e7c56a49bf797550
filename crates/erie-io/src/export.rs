//! Regional result export.

use std::path::Path;

use erie_algo::{Plan, SolutionRecord};
use tracing::info;

use crate::error::{DataError, DataResult};

pub const RESULT_HEADER: [&str; 7] = [
    "REGION",
    "AGRO_ABATE_t",
    "WWTP_ABATE_t",
    "TOTAL_ABATE_t",
    "NUMBER_WWTP",
    "DELTA_PPB",
    "DELTA_LOAD_t",
];

/// Formats `value` with `digits` significant digits, switching to exponent
/// notation for very large or small magnitudes (`%g` style).
pub fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if value == 0.0 {
        return "0".into();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// One CSV row per region, in region order.
pub fn write_plan_csv(plan: &Plan, path: &Path) -> DataResult<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|err| DataError::csv(path, err))?;
    wtr.write_record(RESULT_HEADER)
        .map_err(|err| DataError::csv(path, err))?;

    for r in &plan.regions {
        wtr.write_record([
            r.region.clone(),
            format_significant(r.agro_abatement.value(), 4),
            format_significant(r.wwtp_abatement.value(), 4),
            format_significant(r.total_abatement().value(), 4),
            r.wwtp_upgrades.to_string(),
            format_significant(r.concentration_delta.value(), 4),
            format_significant(r.load_delta.value(), 4),
        ])
        .map_err(|err| DataError::csv(path, err))?;
    }

    wtr.flush().map_err(|err| DataError::io(path, err))?;
    info!(path = %path.display(), regions = plan.regions.len(), "wrote plan CSV");
    Ok(())
}

/// Writes the record's plan; records without a plan are a solver-status error.
pub fn write_record_csv(record: &SolutionRecord, path: &Path) -> DataResult<()> {
    write_plan_csv(record.require_plan()?, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_digits_match_printf_g() {
        assert_eq!(format_significant(0.0, 4), "0");
        assert_eq!(format_significant(212.0, 4), "212");
        assert_eq!(format_significant(0.665204, 4), "0.6652");
        assert_eq!(format_significant(3.0200001, 4), "3.02");
        assert_eq!(format_significant(-1.5, 4), "-1.5");
        assert_eq!(format_significant(12345.6, 4), "1.235e+04");
        assert_eq!(format_significant(9999.6, 4), "1e+04");
        assert_eq!(format_significant(0.00001234, 4), "1.234e-05");
        assert_eq!(format_significant(0.0001, 4), "0.0001");
    }
}
