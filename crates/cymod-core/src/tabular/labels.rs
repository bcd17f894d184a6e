//! Custom node labels for generated transition patterns.

use crate::CymodError;
use crate::primitives::{DEFAULT_CONDITION_LABEL, DEFAULT_STATE_LABEL, DEFAULT_TRANSITION_LABEL};
use serde::{Deserialize, Serialize};

/// Labels used for State, Transition and Condition nodes.
///
/// Overrides are keyed by the default label they replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLabels {
    state: String,
    transition: String,
    condition: String,
}

impl Default for CustomLabels {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE_LABEL.to_string(),
            transition: DEFAULT_TRANSITION_LABEL.to_string(),
            condition: DEFAULT_CONDITION_LABEL.to_string(),
        }
    }
}

impl CustomLabels {
    /// Apply overrides such as `{"State": "MyState"}` to the defaults.
    ///
    /// Returns `CymodError::UnknownLabel` for any key other than `State`,
    /// `Transition` or `Condition`.
    pub fn from_overrides<I, K, V>(overrides: I) -> Result<Self, CymodError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut labels = Self::default();
        for (key, value) in overrides {
            let slot = match key.as_ref() {
                DEFAULT_STATE_LABEL => &mut labels.state,
                DEFAULT_TRANSITION_LABEL => &mut labels.transition,
                DEFAULT_CONDITION_LABEL => &mut labels.condition,
                other => return Err(CymodError::UnknownLabel(other.to_string())),
            };
            *slot = value.into();
        }
        Ok(labels)
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub fn transition(&self) -> &str {
        &self.transition
    }

    #[must_use]
    pub fn condition(&self) -> &str {
        &self.condition
    }
}
