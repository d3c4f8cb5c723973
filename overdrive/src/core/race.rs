use crate::error::SimError;
use helpers::general::{argsort, SortOrder};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// F1-like points for positions 1 to 10.
pub const DEFAULT_POINTS_BY_POSITION: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Standard deviation of the per-competitor perturbation used to break core power ties.
pub const TIE_BREAK_STD_DEV: f64 = 1e-6;

/// PointsTable maps 1-based finishing positions to points. Positions beyond the table award 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTable {
    points: Vec<u32>,
}

impl Default for PointsTable {
    fn default() -> Self {
        PointsTable::new(DEFAULT_POINTS_BY_POSITION.to_vec())
    }
}

impl PointsTable {
    pub fn new(points: Vec<u32>) -> PointsTable {
        PointsTable { points }
    }

    /// The method pads the table with zeros up to the field size. It never truncates.
    pub fn padded_to(mut self, field_size: usize) -> PointsTable {
        if self.points.len() < field_size {
            self.points.resize(field_size, 0);
        }
        self
    }

    pub fn points_for(&self, position: usize) -> u32 {
        position
            .checked_sub(1)
            .and_then(|idx| self.points.get(idx))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.points
    }
}

/// RaceOutcome of one competitor: 1-based position and awarded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub position: usize,
    pub points: u32,
}

/// is_dnf returns true if a competitor cannot drive the required number of laps.
pub fn is_dnf(effective_max_laps: i64, required_laps: u32) -> bool {
    effective_max_laps < i64::from(required_laps)
}

/// rank_field returns the competitor indices in finishing order. Finishers rank above all DNFs,
/// within both groups higher core power ranks higher. Ties are broken by a tiny random
/// perturbation drawn freshly for every call.
pub fn rank_field<R: Rng + ?Sized>(
    effective_cores: &[f64],
    dnf_flags: &[bool],
    rng: &mut R,
) -> Result<Vec<usize>, SimError> {
    if effective_cores.is_empty() {
        return Err(SimError::Internal("cannot rank an empty field".to_owned()));
    }
    if effective_cores.len() != dnf_flags.len() {
        return Err(SimError::Internal(format!(
            "field size mismatch: {} core values but {} DNF flags",
            effective_cores.len(),
            dnf_flags.len()
        )));
    }

    let noise = Normal::new(0.0, TIE_BREAK_STD_DEV)
        .map_err(|e| SimError::Internal(format!("invalid tie-break distribution: {}", e)))?;

    let sort_keys: Vec<(bool, f64)> = effective_cores
        .iter()
        .zip(dnf_flags.iter())
        .map(|(&core, &dnf)| (!dnf, core + noise.sample(rng)))
        .collect();

    Ok(argsort(&sort_keys, SortOrder::Descending))
}

/// outcome_for returns the outcome of the competitor at subject_index in a finishing order
/// produced by rank_field. A DNF keeps its position but never scores.
pub fn outcome_for(
    order: &[usize],
    dnf_flags: &[bool],
    subject_index: usize,
    points_table: &PointsTable,
) -> Result<RaceOutcome, SimError> {
    let dnf = *dnf_flags.get(subject_index).ok_or_else(|| {
        SimError::Internal(format!(
            "subject index {} out of bounds (field size is {})",
            subject_index,
            dnf_flags.len()
        ))
    })?;

    let position = order
        .iter()
        .position(|&idx| idx == subject_index)
        .map(|rank| rank + 1)
        .ok_or_else(|| SimError::Internal("subject missing from ranking".to_owned()))?;

    let points = if dnf {
        0
    } else {
        points_table.points_for(position)
    };

    Ok(RaceOutcome { position, points })
}

/// resolve ranks the field and returns the outcome of the competitor at subject_index.
pub fn resolve<R: Rng + ?Sized>(
    effective_cores: &[f64],
    dnf_flags: &[bool],
    subject_index: usize,
    points_table: &PointsTable,
    rng: &mut R,
) -> Result<RaceOutcome, SimError> {
    if subject_index >= effective_cores.len() {
        return Err(SimError::Internal(format!(
            "subject index {} out of bounds (field size is {})",
            subject_index,
            effective_cores.len()
        )));
    }

    let order = rank_field(effective_cores, dnf_flags, rng)?;
    outcome_for(&order, dnf_flags, subject_index, points_table)
}
