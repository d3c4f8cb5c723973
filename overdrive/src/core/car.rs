use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// * `name` - Car name, e.g. Car 01
/// * `core_power` - Base core power (>= 0)
/// * `max_laps` - Number of laps the car can drive without track or upgrade bonus
/// * `track_types` - Track types the car is associated with (informational, does not gate any
/// bonus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    pub core_power: f64,
    pub max_laps: u32,
    pub track_types: BTreeSet<String>,
}

impl Car {
    pub fn is_associated_with(&self, track_type: &str) -> bool {
        self.track_types.contains(track_type)
    }
}
