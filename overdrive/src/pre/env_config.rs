use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// * `agent_index` - Index of the agent car in the cars table
/// * `points_table` - Points by finishing position (default: 25, 18, 15, 12, 10, 8, 6, 4, 2, 1)
/// * `shuffle_tracks` - Shuffle the track sequence on every reset
/// * `seed` - Seed of the random generator (tie-breaking and shuffling), random if not set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub agent_index: usize,
    pub points_table: Option<Vec<u32>>,
    pub shuffle_tracks: bool,
    pub seed: Option<u64>,
}

/// read_env_config reads the JSON file and decodes it into the environment configuration.
pub fn read_env_config(filepath: &Path) -> anyhow::Result<EnvConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open environment config file {}!",
            filepath.display()
        ))?;
    let config = serde_json::from_reader(&fh).context(format!(
        "Failed to parse environment config file {}!",
        filepath.display()
    ))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EnvConfig =
            serde_json::from_str(r#"{"agent_index": 2, "points_table": [10, 5, 1]}"#).unwrap();
        assert_eq!(config.agent_index, 2);
        assert_eq!(config.points_table, Some(vec![10, 5, 1]));
        assert!(!config.shuffle_tracks);
        assert_eq!(config.seed, None);

        let config: EnvConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EnvConfig::default());
    }
}
