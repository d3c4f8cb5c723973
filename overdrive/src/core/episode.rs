use crate::core::actions::{ActionCatalog, NoUpgrade, UpgradePolicy};
use crate::core::car::Car;
use crate::core::race::{self, PointsTable};
use crate::core::stats::{self, EffectiveStats};
use crate::core::track::{Track, TrackTypeVocab};
use crate::error::{ConfigError, SimError};
use crate::pre::env_config::EnvConfig;
use crate::pre::normalize::EntityTables;
use helpers::general::mean;
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observation layout: agent base core power, agent base max laps, one-hot track type, required
/// laps, mean opponent core power, mean opponent max laps.
pub type Observation = Vec<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeState {
    Ready,
    InProgress,
    Done,
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpisodeState::Ready => write!(f, "ready"),
            EpisodeState::InProgress => write!(f, "in progress"),
            EpisodeState::Done => write!(f, "done"),
        }
    }
}

/// StepDetail describes the race of one step from the agent's point of view. `finishing_order`
/// lists every competitor's car name from first to last. `episode_return` is only set on the
/// terminal step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetail {
    pub track: String,
    pub track_type: String,
    pub required_laps: u32,
    pub type_bonus_core: i64,
    pub type_bonus_max: i64,
    pub action: String,
    pub agent_effective_core: f64,
    pub agent_effective_max: i64,
    pub agent_dnf: bool,
    pub position: usize,
    pub points: u32,
    pub finishing_order: Vec<String>,
    pub episode_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub detail: StepDetail,
}

/// Episode runs one track per step over a (optionally shuffled) sequence of tracks.
#[derive(Debug)]
pub struct Episode {
    tracks: Vec<Track>,
    track_order: Vec<usize>,
    cursor: usize,
    episode_return: f64,
    state: EpisodeState,
    agent_index: usize,
    agent: Car,
    opponents: Vec<Car>,
    opp_mean_core: f64,
    opp_mean_max_laps: f64,
    actions: ActionCatalog,
    track_types: TrackTypeVocab,
    points_table: PointsTable,
    shuffle_tracks: bool,
    rng: ChaCha8Rng,
    opponent_policy: Box<dyn UpgradePolicy>,
}

impl Episode {
    pub fn new(tables: &EntityTables, config: &EnvConfig) -> Result<Episode, SimError> {
        let n_cars = tables.cars.len();
        if config.agent_index >= n_cars {
            return Err(ConfigError::AgentIndexOutOfRange {
                agent_index: config.agent_index,
                n_cars,
            }
            .into());
        }

        let agent = tables.cars[config.agent_index].to_owned();
        let opponents: Vec<Car> = tables
            .cars
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != config.agent_index)
            .map(|(_, car)| car.to_owned())
            .collect();

        let opp_cores: Vec<f64> = opponents.iter().map(|c| c.core_power).collect();
        let opp_max_laps: Vec<f64> = opponents.iter().map(|c| f64::from(c.max_laps)).collect();

        let points_table = config
            .points_table
            .to_owned()
            .map(PointsTable::new)
            .unwrap_or_default()
            .padded_to(n_cars);

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Episode {
            tracks: tables.tracks.to_owned(),
            track_order: (0..tables.tracks.len()).collect(),
            cursor: 0,
            episode_return: 0.0,
            state: EpisodeState::Ready,
            agent_index: config.agent_index,
            agent,
            opp_mean_core: mean(&opp_cores),
            opp_mean_max_laps: mean(&opp_max_laps),
            opponents,
            actions: ActionCatalog::build(tables.upgrades.as_deref()),
            track_types: tables.track_types(),
            points_table,
            shuffle_tracks: config.shuffle_tracks,
            rng,
            opponent_policy: Box::new(NoUpgrade),
        })
    }

    /// Replaces the policy that picks upgrades for the opponents (default: never upgrade).
    pub fn with_opponent_policy(mut self, policy: Box<dyn UpgradePolicy>) -> Episode {
        self.opponent_policy = policy;
        self
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHODS --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Starts a new episode. A given seed re-seeds the random generator before the (optional)
    /// track shuffle.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Observation, SimError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        self.track_order = (0..self.tracks.len()).collect();
        if self.shuffle_tracks {
            self.track_order.shuffle(&mut self.rng);
        }

        self.cursor = 0;
        self.episode_return = 0.0;
        self.state = if self.tracks.is_empty() {
            EpisodeState::Done
        } else {
            EpisodeState::InProgress
        };

        self.observation()
    }

    /// Simulates the race on the current track with the agent using the given action.
    pub fn step(&mut self, action_index: usize) -> Result<StepResult, SimError> {
        if self.state != EpisodeState::InProgress {
            return Err(SimError::EpisodeNotRunning { state: self.state });
        }
        let action = self.actions.get(action_index)?;
        let track = &self.tracks[self.current_track_idx()?];

        // agent goes last on the grid
        let agent_stats = stats::compute(
            self.agent.core_power,
            i64::from(self.agent.max_laps),
            &track.track_type,
            track.type_bonus,
            action,
        );

        let mut grid_core = Vec::with_capacity(self.opponents.len() + 1);
        let mut grid_dnf = Vec::with_capacity(self.opponents.len() + 1);

        for opp in self.opponents.iter() {
            let opp_action = self
                .opponent_policy
                .select_upgrade(opp, track, &self.actions);
            let opp_stats = stats::compute_for_action(
                &self.actions,
                opp_action,
                opp.core_power,
                i64::from(opp.max_laps),
                &track.track_type,
                track.type_bonus,
            )?;
            grid_core.push(opp_stats.core_power);
            grid_dnf.push(opp_stats.is_dnf(track.tot_no_laps));
        }

        let agent_dnf = agent_stats.is_dnf(track.tot_no_laps);
        grid_core.push(agent_stats.core_power);
        grid_dnf.push(agent_dnf);
        let agent_grid_idx = grid_core.len() - 1;

        let order = race::rank_field(&grid_core, &grid_dnf, &mut self.rng)?;
        let outcome = race::outcome_for(&order, &grid_dnf, agent_grid_idx, &self.points_table)?;
        let finishing_order: Vec<String> = order
            .iter()
            .map(|&idx| {
                self.opponents
                    .get(idx)
                    .unwrap_or(&self.agent)
                    .name
                    .to_owned()
            })
            .collect();

        let mut detail = StepDetail {
            track: track.name.to_owned(),
            track_type: track.track_type.to_owned(),
            required_laps: track.tot_no_laps,
            type_bonus_core: track.type_bonus.core,
            type_bonus_max: track.type_bonus.max_laps,
            action: action.name.to_owned(),
            agent_effective_core: agent_stats.core_power,
            agent_effective_max: agent_stats.max_laps,
            agent_dnf,
            position: outcome.position,
            points: outcome.points,
            finishing_order,
            episode_return: None,
        };

        // advance
        let reward = f64::from(outcome.points);
        self.episode_return += reward;
        self.cursor += 1;
        let terminated = self.cursor >= self.tracks.len();
        if terminated {
            self.state = EpisodeState::Done;
            detail.episode_return = Some(self.episode_return);
        }

        debug!(
            "Track {} ({}, {} laps): action '{}', core {:.1}, max laps {}, dnf {}, P{} -> {} pts",
            detail.track,
            detail.track_type,
            detail.required_laps,
            detail.action,
            detail.agent_effective_core,
            detail.agent_effective_max,
            detail.agent_dnf,
            detail.position,
            detail.points
        );

        Ok(StepResult {
            observation: self.observation()?,
            reward,
            terminated,
            truncated: false,
            detail,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn current_track_idx(&self) -> Result<usize, SimError> {
        self.track_order.get(self.cursor).copied().ok_or_else(|| {
            SimError::Internal(format!(
                "track cursor {} out of bounds (sequence length is {})",
                self.cursor,
                self.track_order.len()
            ))
        })
    }

    pub fn current_track(&self) -> Result<&Track, SimError> {
        Ok(&self.tracks[self.current_track_idx()?])
    }

    /// The method returns the observation for the current track, or the zero vector if no
    /// episode is running.
    pub fn observation(&self) -> Result<Observation, SimError> {
        if self.state != EpisodeState::InProgress {
            return Ok(vec![0.0; self.observation_dim()]);
        }
        let track = self.current_track()?;

        let mut obs = Vec::with_capacity(self.observation_dim());
        obs.push(self.agent.core_power as f32);
        obs.push(self.agent.max_laps as f32);
        obs.extend(self.track_types.one_hot(&track.track_type));
        obs.push(track.tot_no_laps as f32);
        obs.push(self.opp_mean_core as f32);
        obs.push(self.opp_mean_max_laps as f32);
        Ok(obs)
    }

    /// The method returns the agent's effective stats and DNF flag on the current track for the
    /// given action without advancing the episode.
    pub fn preview_action(&self, action_index: usize) -> Result<(EffectiveStats, bool), SimError> {
        if self.state != EpisodeState::InProgress {
            return Err(SimError::EpisodeNotRunning { state: self.state });
        }
        let track = self.current_track()?;
        let agent_stats = stats::compute_for_action(
            &self.actions,
            action_index,
            self.agent.core_power,
            i64::from(self.agent.max_laps),
            &track.track_type,
            track.type_bonus,
        )?;
        Ok((agent_stats, agent_stats.is_dnf(track.tot_no_laps)))
    }

    pub fn observation_dim(&self) -> usize {
        2 + self.track_types.len() + 1 + 2
    }

    pub fn n_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == EpisodeState::Done
    }

    pub fn track_cursor(&self) -> usize {
        self.cursor
    }

    pub fn n_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn episode_return(&self) -> f64 {
        self.episode_return
    }

    /// Track names in the order of the current episode.
    pub fn track_order(&self) -> Vec<&str> {
        self.track_order
            .iter()
            .map(|&idx| self.tracks[idx].name.as_str())
            .collect()
    }

    pub fn actions(&self) -> &ActionCatalog {
        &self.actions
    }

    pub fn track_types(&self) -> &TrackTypeVocab {
        &self.track_types
    }

    pub fn agent_index(&self) -> usize {
        self.agent_index
    }

    pub fn agent(&self) -> &Car {
        &self.agent
    }

    pub fn opponents(&self) -> &[Car] {
        &self.opponents
    }

    pub fn points_table(&self) -> &PointsTable {
        &self.points_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::TypeBonus;
    use crate::core::upgrade::Upgrade;
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    fn car(name: &str, core: f64, max_laps: u32) -> Car {
        Car {
            name: name.to_owned(),
            core_power: core,
            max_laps,
            track_types: BTreeSet::new(),
        }
    }

    fn track(name: &str, laps: u32, track_type: &str, bonus: TypeBonus) -> Track {
        Track {
            name: name.to_owned(),
            tot_no_laps: laps,
            track_type: track_type.to_owned(),
            type_bonus: bonus,
            type_bonus_raw: String::new(),
        }
    }

    fn tables() -> EntityTables {
        EntityTables {
            tracks: vec![
                track("Track 01", 50, "Sunny", TypeBonus::new(30, 0)),
                track("Track 02", 55, "Night", TypeBonus::new(0, 10)),
            ],
            cars: vec![
                car("Car 01", 300.0, 40),
                car("Car 02", 310.0, 50),
                car("Car 03", 290.0, 60),
            ],
            upgrades: Some(vec![Upgrade {
                name: "Upgrade 01".to_owned(),
                core_power: 0.0,
                max_laps: 10,
                condition: BTreeSet::new(),
            }]),
        }
    }

    fn config() -> EnvConfig {
        EnvConfig {
            seed: Some(3),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn agent_index_is_validated() {
        let config = EnvConfig {
            agent_index: 3,
            ..config()
        };
        assert_eq!(
            Episode::new(&tables(), &config).unwrap_err(),
            SimError::Config(ConfigError::AgentIndexOutOfRange {
                agent_index: 3,
                n_cars: 3
            })
        );
    }

    #[test]
    fn opponents_exclude_agent_and_keep_order() {
        let config = EnvConfig {
            agent_index: 1,
            ..config()
        };
        let episode = Episode::new(&tables(), &config).unwrap();
        assert_eq!(episode.agent().name, "Car 02");
        let names: Vec<&str> = episode.opponents().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Car 01", "Car 03"]);
        assert_eq!(episode.points_table().len(), 10);
    }

    #[test]
    fn step_before_reset_is_rejected() {
        let mut episode = Episode::new(&tables(), &config()).unwrap();
        assert_eq!(episode.state(), EpisodeState::Ready);
        assert_eq!(
            episode.step(0).unwrap_err(),
            SimError::EpisodeNotRunning {
                state: EpisodeState::Ready
            }
        );
    }

    #[test]
    fn observation_layout() {
        let mut episode = Episode::new(&tables(), &config()).unwrap();
        let obs = episode.reset(None).unwrap();
        assert_eq!(episode.observation_dim(), 7);
        // vocab is [Night, Sunny]
        assert_eq!(obs, vec![300.0, 40.0, 0.0, 1.0, 50.0, 300.0, 55.0]);
    }

    #[test]
    fn agent_dnf_scores_zero_and_upgrade_rescues_it() {
        let mut episode = Episode::new(&tables(), &config()).unwrap();
        episode.reset(None).unwrap();

        // 40 laps < 50 required
        let result = episode.step(0).unwrap();
        assert!(result.detail.agent_dnf);
        assert_eq!(result.detail.points, 0);
        assert_eq!(result.detail.position, 3);
        assert_eq!(result.detail.finishing_order, vec!["Car 02", "Car 03", "Car 01"]);
        assert_relative_eq!(result.detail.agent_effective_core, 330.0);
        assert_relative_eq!(result.reward, 0.0);
        assert!(!result.terminated);

        // 40 + 10 (track) + 10 (upgrade) >= 55; core 300 vs 310 and 290
        let result = episode.step(1).unwrap();
        assert!(!result.detail.agent_dnf);
        assert_eq!(result.detail.agent_effective_max, 60);
        assert_eq!(result.detail.position, 2);
        assert_eq!(result.detail.points, 18);
        assert_eq!(result.detail.finishing_order, vec!["Car 02", "Car 01", "Car 03"]);
        assert!(result.terminated);
        assert_eq!(result.detail.episode_return, Some(18.0));
        assert_eq!(result.observation, vec![0.0; 7]);
    }

    #[test]
    fn invalid_action_leaves_cursor_untouched() {
        let mut episode = Episode::new(&tables(), &config()).unwrap();
        episode.reset(None).unwrap();
        assert!(matches!(episode.step(2), Err(SimError::Action(_))));
        assert_eq!(episode.track_cursor(), 0);
        assert_eq!(episode.state(), EpisodeState::InProgress);
        assert!(episode.step(1).is_ok());
    }

    #[test]
    fn empty_sequence_is_done_right_after_reset() {
        let mut tables = tables();
        tables.tracks.clear();
        let mut episode = Episode::new(&tables, &config()).unwrap();
        let obs = episode.reset(None).unwrap();
        assert_eq!(episode.state(), EpisodeState::Done);
        assert_eq!(obs, vec![0.0; 5]);
        assert!(episode.step(0).is_err());
    }

    #[test]
    fn single_car_has_zero_opponent_means() {
        let mut tables = tables();
        tables.cars.truncate(1);
        let mut episode = Episode::new(&tables, &config()).unwrap();
        let obs = episode.reset(None).unwrap();
        assert_eq!(&obs[5..], &[0.0, 0.0]);
        let result = episode.step(1).unwrap();
        assert_eq!(result.detail.position, 1);
    }

    #[derive(Debug)]
    struct AlwaysFirstUpgrade;

    impl UpgradePolicy for AlwaysFirstUpgrade {
        fn select_upgrade(&self, _car: &Car, _track: &Track, _catalog: &ActionCatalog) -> usize {
            1
        }
    }

    #[test]
    fn opponent_policy_can_be_replaced() {
        let mut tables = tables();
        // Car 02 only finishes track 01 with the upgrade, Car 03 never needs it.
        tables.cars[1].max_laps = 45;
        let mut base = Episode::new(&tables, &config()).unwrap();
        let mut upgraded = Episode::new(&tables, &config())
            .unwrap()
            .with_opponent_policy(Box::new(AlwaysFirstUpgrade));

        base.reset(None).unwrap();
        upgraded.reset(None).unwrap();

        // agent with upgrade: core 330, laps 50; Car 02: core 340, laps 45 (+10 if upgraded)
        let base_result = base.step(1).unwrap();
        let upgraded_result = upgraded.step(1).unwrap();
        assert_eq!(base_result.detail.position, 1);
        assert_eq!(upgraded_result.detail.position, 2);
    }
}
