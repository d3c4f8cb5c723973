use crate::core::actions::NO_UPGRADE;
use crate::core::episode::Episode;
use crate::error::SimError;
use crate::pre::sim_opts::PolicyKind;
use helpers::general::argmax;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Policy is the decision-maker choosing the agent's action on every step.
pub trait Policy {
    fn name(&self) -> &str;
    fn select_action(&mut self, episode: &Episode) -> Result<usize, SimError>;
}

/// Always picks the same action.
#[derive(Debug, Clone)]
pub struct FixedPolicy {
    action_index: usize,
    name: String,
}

impl FixedPolicy {
    pub fn new(action_index: usize) -> FixedPolicy {
        FixedPolicy {
            action_index,
            name: format!("fixed({})", action_index),
        }
    }
}

impl Policy for FixedPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_action(&mut self, _episode: &Episode) -> Result<usize, SimError> {
        Ok(self.action_index)
    }
}

/// Picks a uniformly random action from its own generator.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> RandomPolicy {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        RandomPolicy { rng }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn select_action(&mut self, episode: &Episode) -> Result<usize, SimError> {
        Ok(self.rng.gen_range(0..episode.n_actions()))
    }
}

/// Picks the action with the highest effective core power among the actions that avoid a DNF on
/// the current track. Falls back to "No Upgrade" if every action ends in a DNF.
#[derive(Debug, Clone, Default)]
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn select_action(&mut self, episode: &Episode) -> Result<usize, SimError> {
        let mut scores = Vec::with_capacity(episode.n_actions());
        for action_index in 0..episode.n_actions() {
            let (stats, dnf) = episode.preview_action(action_index)?;
            scores.push(if dnf {
                f64::NEG_INFINITY
            } else {
                stats.core_power
            });
        }
        Ok(argmax(&scores).unwrap_or(NO_UPGRADE))
    }
}

/// Mixed into an episode seed so a random policy does not share the episode's random stream.
const POLICY_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// policy_seed derives the seed of a policy's own generator from the seed of its episode.
pub fn policy_seed(episode_seed: Option<u64>) -> Option<u64> {
    episode_seed.map(|s| s ^ POLICY_SEED_MIX)
}

/// build_policy creates the policy selected on the command line. `episode_seed` is the seed of
/// the episode the policy acts in.
pub fn build_policy(
    kind: PolicyKind,
    action_index: usize,
    episode_seed: Option<u64>,
) -> Box<dyn Policy> {
    match kind {
        PolicyKind::None => Box::new(FixedPolicy::new(NO_UPGRADE)),
        PolicyKind::Fixed => Box::new(FixedPolicy::new(action_index)),
        PolicyKind::Random => Box::new(RandomPolicy::new(policy_seed(episode_seed))),
        PolicyKind::Greedy => Box::new(GreedyPolicy),
    }
}
