use clap::Parser;
use log::info;
use overdrive::core::episode::Episode;
use overdrive::core::handle_episode::handle_episode;
use overdrive::interfaces::policy::build_policy;
use overdrive::post::episode_result::{write_results_to_file, EpisodeResult, EvalSummary};
use overdrive::pre::env_config::{read_env_config, EnvConfig};
use overdrive::pre::read_tables::read_entity_tables;
use overdrive::pre::sim_opts::{episode_seeds, SimOpts};
use overdrive::EntityTables;
use rayon::prelude::*;
use std::time::Instant;

/// run_episode builds an independent episode (own random generator) and simulates it once. The
/// policy derives its own seed from the episode seed.
fn run_episode(
    tables: &EntityTables,
    env_config: &EnvConfig,
    sim_opts: &SimOpts,
    seed: Option<u64>,
) -> anyhow::Result<EpisodeResult> {
    let mut episode = Episode::new(tables, env_config)?;
    let mut policy = build_policy(sim_opts.policy, sim_opts.action, seed);
    Ok(handle_episode(&mut episode, policy.as_mut(), seed)?)
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if sim_opts.debug { "debug" } else { "info" },
    ))
    .init();

    // get environment configuration
    let base_config = if let Some(config_path) = &sim_opts.config {
        info!("Reading environment config from {:?}", config_path);
        read_env_config(config_path)?
    } else {
        EnvConfig::default()
    };
    let env_config = sim_opts.apply_to(base_config)?;

    // get entity tables
    let tables = read_entity_tables(
        &sim_opts.tracks_csv,
        &sim_opts.cars_csv,
        Some(sim_opts.upgrades_csv.as_path()),
    )?;

    // fail early on a bad agent index
    let check = Episode::new(&tables, &env_config)?;
    info!(
        "Simulating {} episode(s) of {} tracks for {} against {} opponents ({} actions, policy {:?})",
        sim_opts.no_episodes,
        check.n_tracks(),
        check.agent().name,
        check.opponents().len(),
        check.n_actions(),
        sim_opts.policy
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();

    let results: Vec<EpisodeResult> = episode_seeds(env_config.seed, sim_opts.no_episodes)
        .into_par_iter()
        .map(|seed| run_episode(&tables, &env_config, &sim_opts, seed))
        .collect::<anyhow::Result<Vec<EpisodeResult>>>()?;

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    if let Some(first) = results.first() {
        first.print_summary();
    }
    println!("{}", EvalSummary::from_results(&results));

    if let Some(output) = &sim_opts.output {
        let path = write_results_to_file(&results, output)?;
        info!("Results written to {}", path);
    }

    Ok(())
}
