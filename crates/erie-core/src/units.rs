//! Unit newtypes for the quantities reported by a plan.
//!
//! Concentration reductions are in parts per billion (µg/L), lake segment
//! volumes in km³, and loads in tonnes per year. Multiplying a concentration
//! by a volume yields a load: 1 µg/L over 1 km³ (1e12 L) is 1e12 µg, i.e. 1 t.
//!
//! ```
//! use erie_core::units::{CubicKilometres, PartsPerBillion, Tonnes};
//!
//! let load = PartsPerBillion(0.5) * CubicKilometres(318.7);
//! assert_eq!(load, Tonnes(159.35));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }
        }
    };
}

/// Phosphorus mass, tonnes per year.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Tonnes(pub f64);

impl_unit_ops!(Tonnes, "t/year");

/// Concentration, parts per billion (µg/L).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PartsPerBillion(pub f64);

impl_unit_ops!(PartsPerBillion, "ppb");

/// Lake segment volume, km³.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct CubicKilometres(pub f64);

impl_unit_ops!(CubicKilometres, "km³");

impl Mul<CubicKilometres> for PartsPerBillion {
    type Output = Tonnes;
    fn mul(self, rhs: CubicKilometres) -> Tonnes {
        Tonnes(self.0 * rhs.0)
    }
}
