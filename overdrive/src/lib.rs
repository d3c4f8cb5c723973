//! Race-sequence simulator: every step runs one track for a field of cars, applies the track's
//! type bonus to everyone and the chosen upgrade to the agent car, ranks the field and converts
//! the agent's finishing position into points.

pub mod core;
pub mod error;
pub mod interfaces;
pub mod post;
pub mod pre;

pub use crate::core::actions::{Action, ActionCatalog, NoUpgrade, UpgradePolicy};
pub use crate::core::episode::{Episode, EpisodeState, Observation, StepDetail, StepResult};
pub use crate::core::race::{PointsTable, RaceOutcome};
pub use crate::core::stats::EffectiveStats;
pub use crate::error::{ActionError, ConfigError, SchemaError, SimError};
pub use crate::pre::env_config::EnvConfig;
pub use crate::pre::normalize::{EntityTables, RawTable};
