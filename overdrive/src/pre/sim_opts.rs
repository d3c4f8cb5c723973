use crate::pre::env_config::EnvConfig;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Never upgrade
    None,
    /// Always pick the action given by --action
    Fixed,
    /// Pick a uniformly random action
    Random,
    /// Pick the action that avoids a DNF with the highest effective core power
    Greedy,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "overdrive",
    about = "Simulates a sequence of races for an upgrade-choosing agent car"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging (one line per simulated track)
    #[clap(short, long)]
    pub debug: bool,

    /// Shuffle the track sequence at the start of every episode
    #[clap(long)]
    pub shuffle_tracks: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the tracks table
    #[clap(long, default_value = "data_csv/tracks.csv")]
    pub tracks_csv: PathBuf,

    /// Set path to the cars table
    #[clap(long, default_value = "data_csv/cars.csv")]
    pub cars_csv: PathBuf,

    /// Set path to the upgrades table (ignored if the file does not exist)
    #[clap(long, default_value = "data_csv/upgrades.csv")]
    pub upgrades_csv: PathBuf,

    /// Set path to a JSON environment config file (OPTIONAL: command line values take precedence)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Set index of the agent car in the cars table
    #[clap(short, long)]
    pub agent_car_id: Option<usize>,

    /// Set seed of the random generator
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set points by finishing position as comma separated list, e.g. 10,5,1
    #[clap(long)]
    pub points: Option<String>,

    /// Set policy choosing the agent's upgrade
    #[clap(long, value_enum, default_value = "greedy")]
    pub policy: PolicyKind,

    /// Set action index used by the fixed policy
    #[clap(long, default_value = "0")]
    pub action: usize,

    /// Set number of simulated episodes
    #[clap(short, long, default_value = "1")]
    pub no_episodes: u32,

    /// Set path of the JSON result file (OPTIONAL)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

/// parse_points parses a comma separated points table like "25, 18, 15".
pub fn parse_points(points: &str) -> anyhow::Result<Vec<u32>> {
    points
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u32>()
                .context(format!("Invalid points value '{}'!", p))
        })
        .collect()
}

/// episode_seeds returns one seed per episode: the base seed for the first episode, counting up
/// from there for the following ones. Without a base seed every episode draws from entropy.
pub fn episode_seeds(base_seed: Option<u64>, no_episodes: u32) -> Vec<Option<u64>> {
    (0..no_episodes)
        .map(|i| base_seed.map(|s| s.wrapping_add(u64::from(i))))
        .collect()
}

impl SimOpts {
    /// The method applies the command line options on top of the given environment config.
    pub fn apply_to(&self, mut config: EnvConfig) -> anyhow::Result<EnvConfig> {
        if let Some(agent_car_id) = self.agent_car_id {
            config.agent_index = agent_car_id;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(points) = &self.points {
            config.points_table = Some(parse_points(points)?);
        }
        if self.shuffle_tracks {
            config.shuffle_tracks = true;
        }
        Ok(config)
    }
}
