use anyhow::Result;
use erie_algo::health;

use super::print_json;

pub fn handle() -> Result<()> {
    print_json(&health())
}
