use crate::core::actions::{Action, ActionCatalog};
use crate::core::race::is_dnf;
use crate::core::track::TypeBonus;
use crate::error::ActionError;
use serde::{Deserialize, Serialize};

/// EffectiveStats are a competitor's stats on one specific track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub core_power: f64,
    pub max_laps: i64,
}

impl EffectiveStats {
    pub fn is_dnf(&self, required_laps: u32) -> bool {
        is_dnf(self.max_laps, required_laps)
    }
}

/// compute returns the effective stats of a competitor on a track of the given type. The track
/// bonus always applies, the action's bonus only if its condition matches the track type.
/// Negative bonuses are applied as given.
pub fn compute(
    base_core: f64,
    base_max_laps: i64,
    track_type: &str,
    track_bonus: TypeBonus,
    action: &Action,
) -> EffectiveStats {
    let mut core_power = base_core + track_bonus.core as f64;
    let mut max_laps = base_max_laps + track_bonus.max_laps;

    if action.applies_on(track_type) {
        core_power += action.add_core;
        max_laps += action.add_max_laps;
    }

    EffectiveStats {
        core_power,
        max_laps,
    }
}

/// compute_for_action looks up the action in the catalog before calling compute.
pub fn compute_for_action(
    catalog: &ActionCatalog,
    action_index: usize,
    base_core: f64,
    base_max_laps: i64,
    track_type: &str,
    track_bonus: TypeBonus,
) -> Result<EffectiveStats, ActionError> {
    let action = catalog.get(action_index)?;
    Ok(compute(
        base_core,
        base_max_laps,
        track_type,
        track_bonus,
        action,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::upgrade::Upgrade;
    use approx::assert_relative_eq;

    fn catalog() -> ActionCatalog {
        let upgrades = vec![
            Upgrade {
                name: "Upgrade 01".to_owned(),
                core_power: 20.0,
                max_laps: 0,
                condition: Default::default(),
            },
            Upgrade {
                name: "Upgrade 04".to_owned(),
                core_power: 20.0,
                max_laps: 10,
                condition: ["Sunny", "Night"].iter().map(|s| s.to_string()).collect(),
            },
            Upgrade {
                name: "Broken".to_owned(),
                core_power: -50.0,
                max_laps: -5,
                condition: Default::default(),
            },
        ];
        ActionCatalog::build(Some(&upgrades))
    }

    #[test]
    fn track_core_bonus_without_upgrade() {
        let stats =
            compute_for_action(&catalog(), 0, 300.0, 50, "Sunny", TypeBonus::new(30, 0)).unwrap();
        assert_relative_eq!(stats.core_power, 330.0);
        assert_eq!(stats.max_laps, 50);
    }

    #[test]
    fn upgrade_applies_only_on_matching_track_type() {
        let catalog = catalog();
        let on_night =
            compute_for_action(&catalog, 2, 300.0, 40, "Night", TypeBonus::new(0, 5)).unwrap();
        assert_relative_eq!(on_night.core_power, 320.0);
        assert_eq!(on_night.max_laps, 55);

        let on_rain =
            compute_for_action(&catalog, 2, 300.0, 40, "Rain", TypeBonus::new(0, 5)).unwrap();
        assert_relative_eq!(on_rain.core_power, 300.0);
        assert_eq!(on_rain.max_laps, 45);
    }

    #[test]
    fn non_negative_bonuses_never_lower_stats() {
        let catalog = catalog();
        for idx in 0..3 {
            for track_type in ["Sunny", "Night", "Rain"] {
                let stats =
                    compute_for_action(&catalog, idx, 310.0, 45, track_type, TypeBonus::new(0, 20))
                        .unwrap();
                assert!(stats.core_power >= 310.0);
                assert!(stats.max_laps >= 45);
            }
        }
    }

    #[test]
    fn negative_bonus_is_accepted() {
        let stats =
            compute_for_action(&catalog(), 3, 300.0, 40, "Rain", TypeBonus::default()).unwrap();
        assert_relative_eq!(stats.core_power, 250.0);
        assert_eq!(stats.max_laps, 35);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            compute_for_action(&catalog(), 4, 300.0, 40, "Rain", TypeBonus::default()),
            Err(ActionError::OutOfRange {
                index: 4,
                n_actions: 4
            })
        );
    }

    #[test]
    fn dnf_uses_strict_comparison() {
        let stats = EffectiveStats {
            core_power: 300.0,
            max_laps: 50,
        };
        assert!(!stats.is_dnf(50));
        assert!(stats.is_dnf(51));
        assert!(!stats.is_dnf(49));
    }
}
