use crate::core::episode::Episode;
use crate::error::SimError;
use crate::interfaces::policy::Policy;
use crate::post::episode_result::EpisodeResult;
use log::info;

/// handle_episode resets the episode, lets the policy choose an action for every track until
/// the episode terminates, and returns the results for post-processing.
pub fn handle_episode(
    episode: &mut Episode,
    policy: &mut dyn Policy,
    seed: Option<u64>,
) -> Result<EpisodeResult, SimError> {
    episode.reset(seed)?;
    let track_order: Vec<String> = episode
        .track_order()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut steps = Vec::with_capacity(episode.n_tracks());
    while !episode.is_done() {
        let action_index = policy.select_action(episode)?;
        let step_result = episode.step(action_index)?;
        steps.push(step_result.detail);
    }

    info!(
        "Episode finished: {} tracks, return {:.1} (policy {}, seed {:?})",
        steps.len(),
        episode.episode_return(),
        policy.name(),
        seed
    );

    Ok(EpisodeResult {
        seed,
        policy: policy.name().to_owned(),
        agent: episode.agent().name.to_owned(),
        track_order,
        steps,
        episode_return: episode.episode_return(),
    })
}
