use crate::core::car::Car;
use crate::core::track::Track;
use crate::core::upgrade::Upgrade;
use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

pub const NO_UPGRADE: usize = 0;
pub const NO_UPGRADE_NAME: &str = "No Upgrade";

/// Action is one selectable upgrade choice.
/// * `name` - Upgrade name (or "No Upgrade")
/// * `add_core` - Bonus to core power if the condition matches
/// * `add_max_laps` - Bonus to max laps if the condition matches
/// * `condition` - Track types on which the bonus applies, empty means on every track type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub add_core: f64,
    pub add_max_laps: i64,
    pub condition: BTreeSet<String>,
}

impl Action {
    pub fn no_upgrade() -> Action {
        Action {
            name: NO_UPGRADE_NAME.to_owned(),
            add_core: 0.0,
            add_max_laps: 0,
            condition: BTreeSet::new(),
        }
    }

    pub fn from_upgrade(upgrade: &Upgrade) -> Action {
        Action {
            name: upgrade.name.to_owned(),
            add_core: upgrade.core_power,
            add_max_laps: upgrade.max_laps,
            condition: upgrade.condition.to_owned(),
        }
    }

    /// The method checks if the action's bonus takes effect on a track of the given type.
    pub fn applies_on(&self, track_type: &str) -> bool {
        self.condition.is_empty() || self.condition.contains(track_type)
    }
}

/// ActionCatalog holds the discrete action set: "No Upgrade" at index 0, followed by one action
/// per upgrade row in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    pub fn build(upgrades: Option<&[Upgrade]>) -> ActionCatalog {
        let mut actions = vec![Action::no_upgrade()];
        if let Some(upgrades) = upgrades {
            actions.extend(upgrades.iter().map(Action::from_upgrade));
        }
        ActionCatalog { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always false, the catalog contains at least the no-op action.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Action, ActionError> {
        self.actions.get(index).ok_or(ActionError::OutOfRange {
            index,
            n_actions: self.actions.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}

/// UpgradePolicy decides which catalog action a non-agent competitor receives on a track.
pub trait UpgradePolicy: Debug + Send {
    fn select_upgrade(&self, car: &Car, track: &Track, catalog: &ActionCatalog) -> usize;
}

/// Opponents never upgrade.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUpgrade;

impl UpgradePolicy for NoUpgrade {
    fn select_upgrade(&self, _car: &Car, _track: &Track, _catalog: &ActionCatalog) -> usize {
        NO_UPGRADE
    }
}
