use crate::core::episode::EpisodeState;
use thiserror::Error;

/// SchemaError is raised while normalizing the raw entity tables, e.g. if a required column is
/// missing or a cell cannot be coerced to the type of its column.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{table} table must contain column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("{table} table, row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error("{table} table, row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// ConfigError is raised if the environment configuration does not fit the loaded tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("agent car index {agent_index} out of range (number of cars is {n_cars})")]
    AgentIndexOutOfRange { agent_index: usize, n_cars: usize },
}

/// ActionError is raised if an action index outside the action catalog is requested.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("invalid action {index}, expected 0..={}", .n_actions.saturating_sub(1))]
    OutOfRange { index: usize, n_actions: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("episode is {state}, call reset() before step()")]
    EpisodeNotRunning { state: EpisodeState },
    /// Broken internal invariant, never recovered.
    #[error("internal error: {0}")]
    Internal(String),
}
