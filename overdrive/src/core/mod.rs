pub mod actions;
pub mod car;
pub mod episode;
pub mod handle_episode;
pub mod race;
pub mod stats;
pub mod track;
pub mod upgrade;
