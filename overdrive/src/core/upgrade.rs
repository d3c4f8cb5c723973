use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// * `name` - Upgrade name, e.g. Upgrade 04
/// * `core_power` - Bonus to core power
/// * `max_laps` - Bonus to max laps
/// * `condition` - Track types on which the upgrade takes effect, empty means on every track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub name: String,
    pub core_power: f64,
    pub max_laps: i64,
    pub condition: BTreeSet<String>,
}
