pub mod env_config;
pub mod normalize;
pub mod read_tables;
pub mod sim_opts;
