use serde::{Deserialize, Serialize};

/// TypeBonus is the additive bonus a track grants every competitor. At most one of both parts is
/// non-zero for a well-formed "Type Bonus" cell.
/// * `core` - Bonus to core power
/// * `max_laps` - Bonus to max laps
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBonus {
    pub core: i64,
    pub max_laps: i64,
}

impl TypeBonus {
    pub fn new(core: i64, max_laps: i64) -> TypeBonus {
        TypeBonus { core, max_laps }
    }

    pub fn is_zero(&self) -> bool {
        self.core == 0 && self.max_laps == 0
    }
}

/// * `name` - Track name, e.g. Track 01
/// * `tot_no_laps` - Number of laps a car must be able to drive to finish the race (> 0)
/// * `track_type` - Track type tag, e.g. Sunny
/// * `type_bonus` - Parsed type bonus applied to all competitors
/// * `type_bonus_raw` - Type bonus cell as found in the input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub tot_no_laps: u32,
    pub track_type: String,
    pub type_bonus: TypeBonus,
    pub type_bonus_raw: String,
}

/// TrackTypeVocab is the sorted set of distinct track types of a race sequence. It fixes the
/// layout of the one-hot part of the observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTypeVocab {
    types: Vec<String>,
}

impl TrackTypeVocab {
    pub fn from_tracks(tracks: &[Track]) -> TrackTypeVocab {
        let mut types: Vec<String> = tracks.iter().map(|t| t.track_type.to_owned()).collect();
        types.sort_unstable();
        types.dedup();
        TrackTypeVocab { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn index_of(&self, track_type: &str) -> Option<usize> {
        self.types
            .binary_search_by(|t| t.as_str().cmp(track_type))
            .ok()
    }

    /// The method returns the one-hot encoding of the given track type (all zeros if the type is
    /// not part of the vocabulary).
    pub fn one_hot(&self, track_type: &str) -> Vec<f32> {
        let mut enc = vec![0.0; self.types.len()];
        if let Some(idx) = self.index_of(track_type) {
            enc[idx] = 1.0;
        }
        enc
    }

    pub fn as_slice(&self) -> &[String] {
        &self.types
    }
}
