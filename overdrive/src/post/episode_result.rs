use crate::core::episode::StepDetail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write as IoWrite;
use std::path::Path;

/// EpisodeResult contains all information about one simulated episode that is required for
/// post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub seed: Option<u64>,
    pub policy: String,
    pub agent: String,
    pub track_order: Vec<String>,
    pub steps: Vec<StepDetail>,
    pub episode_return: f64,
}

impl EpisodeResult {
    pub fn no_dnfs(&self) -> usize {
        self.steps.iter().filter(|s| s.agent_dnf).count()
    }

    pub fn no_wins(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| !s.agent_dnf && s.position == 1)
            .count()
    }

    /// print_summary prints the per-track results to the console output.
    pub fn print_summary(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for EpisodeResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "RESULT: Episode of {} with policy {} (seed {})",
            self.agent,
            self.policy,
            self.seed
                .map_or_else(|| "random".to_owned(), |s| s.to_string())
        )?;
        writeln!(
            f,
            "{:>3}, {:<12}, {:<8}, {:>4}, {:<16}, {:>8}, {:>4}, {:>3}, {:>3}, {:>3}",
            "no", "track", "type", "laps", "action", "core", "max", "dnf", "pos", "pts"
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(
                f,
                "{:>3}, {:<12}, {:<8}, {:>4}, {:<16}, {:>8.1}, {:>4}, {:>3}, {:>3}, {:>3}",
                i + 1,
                step.track,
                step.track_type,
                step.required_laps,
                step.action,
                step.agent_effective_core,
                step.agent_effective_max,
                if step.agent_dnf { "yes" } else { "no" },
                step.position,
                step.points
            )?;
        }
        write!(
            f,
            "RESULT: Episode return {:.1} ({} wins, {} DNFs)",
            self.episode_return,
            self.no_wins(),
            self.no_dnfs()
        )
    }
}

/// EvalSummary aggregates the results of several episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub no_episodes: usize,
    pub mean_return: f64,
    pub std_return: f64,
    pub min_return: f64,
    pub max_return: f64,
    pub dnf_rate: f64,
}

impl EvalSummary {
    pub fn from_results(results: &[EpisodeResult]) -> EvalSummary {
        let returns: Vec<f64> = results.iter().map(|r| r.episode_return).collect();
        let no_episodes = returns.len();
        let mean_return = helpers::general::mean(&returns);
        let variance = helpers::general::mean(
            &returns
                .iter()
                .map(|r| (r - mean_return).powi(2))
                .collect::<Vec<f64>>(),
        );

        let no_steps: usize = results.iter().map(|r| r.steps.len()).sum();
        let no_dnfs: usize = results.iter().map(EpisodeResult::no_dnfs).sum();

        EvalSummary {
            no_episodes,
            mean_return,
            std_return: variance.sqrt(),
            min_return: returns.iter().copied().fold(f64::INFINITY, f64::min),
            max_return: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            dnf_rate: if no_steps > 0 {
                no_dnfs as f64 / no_steps as f64
            } else {
                0.0
            },
        }
    }
}

impl fmt::Display for EvalSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.no_episodes == 0 {
            return write!(f, "RESULT: No episodes simulated");
        }
        write!(
            f,
            "RESULT: mean return {:.3} ± {:.3} over {} episodes (min {:.1}, max {:.1}, DNF rate {:.1}%)",
            self.mean_return,
            self.std_return,
            self.no_episodes,
            self.min_return,
            self.max_return,
            self.dnf_rate * 100.0
        )
    }
}

#[derive(Debug, Serialize)]
struct ResultsFile<'a> {
    summary: EvalSummary,
    episodes: &'a [EpisodeResult],
}

/// write_results_to_file writes the episode results and their summary as JSON file. Returns the
/// path to the written file.
pub fn write_results_to_file(results: &[EpisodeResult], path: &Path) -> anyhow::Result<String> {
    if let Some(out_dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(out_dir)?;
    }

    let content = serde_json::to_string_pretty(&ResultsFile {
        summary: EvalSummary::from_results(results),
        episodes: results,
    })?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    Ok(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step(points: u32, position: usize, dnf: bool) -> StepDetail {
        StepDetail {
            track: "Track 01".to_owned(),
            track_type: "Sunny".to_owned(),
            required_laps: 50,
            type_bonus_core: 30,
            type_bonus_max: 0,
            action: "No Upgrade".to_owned(),
            agent_effective_core: 330.0,
            agent_effective_max: 50,
            agent_dnf: dnf,
            position,
            points,
            finishing_order: Vec::new(),
            episode_return: None,
        }
    }

    fn result(steps: Vec<StepDetail>) -> EpisodeResult {
        EpisodeResult {
            seed: Some(1),
            policy: "greedy".to_owned(),
            agent: "Car 01".to_owned(),
            track_order: vec!["Track 01".to_owned(); steps.len()],
            episode_return: steps.iter().map(|s| f64::from(s.points)).sum(),
            steps,
        }
    }

    #[test]
    fn summary_aggregates_returns_and_dnfs() {
        let results = vec![
            result(vec![step(25, 1, false), step(0, 4, true)]),
            result(vec![step(18, 2, false), step(15, 3, false)]),
        ];
        let summary = EvalSummary::from_results(&results);
        assert_eq!(summary.no_episodes, 2);
        assert_relative_eq!(summary.mean_return, 29.0);
        assert_relative_eq!(summary.std_return, 4.0);
        assert_relative_eq!(summary.min_return, 25.0);
        assert_relative_eq!(summary.max_return, 33.0);
        assert_relative_eq!(summary.dnf_rate, 0.25);
        assert_eq!(results[0].no_wins(), 1);
    }

    #[test]
    fn display_lists_every_track() {
        let text = result(vec![step(25, 1, false), step(0, 4, true)]).to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(text.ends_with("RESULT: Episode return 25.0 (1 wins, 1 DNFs)"));
    }

    #[test]
    fn results_file_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let results = vec![result(vec![step(25, 1, false)])];
        write_results_to_file(&results, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["no_episodes"], 1);
        let episodes: Vec<EpisodeResult> =
            serde_json::from_value(value["episodes"].clone()).unwrap();
        assert_eq!(episodes, results);
    }
}
