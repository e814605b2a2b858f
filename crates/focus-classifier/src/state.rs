//! Focus verdict types

use serde::{Deserialize, Serialize};

/// Focus state of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    /// Tracking enabled, user present, facing forward, on a target app
    Focused,
    /// Tracking enabled but at least one focus condition failed
    Distracted,
    /// Tracking disabled
    #[default]
    Idle,
}

impl FocusState {
    pub fn is_focused(&self) -> bool {
        matches!(self, FocusState::Focused)
    }
}

/// First focus condition that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistractionReason {
    /// Nobody in front of the camera
    NotPresent,
    /// Present but head turned away
    LookingAway,
    /// Foreground app is not one of the targets (empty title = no window)
    OffTarget { title: String },
    /// Latest reading is too old to trust
    StaleSignal,
}

/// Focus verdict with its explanation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub state: FocusState,
    /// Set only when `state` is `Distracted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DistractionReason>,
}

impl Classification {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn focused() -> Self {
        Self {
            state: FocusState::Focused,
            reason: None,
        }
    }

    pub fn distracted(reason: DistractionReason) -> Self {
        Self {
            state: FocusState::Distracted,
            reason: Some(reason),
        }
    }

    /// Human-readable status line
    pub fn describe(&self) -> String {
        match (&self.state, &self.reason) {
            (FocusState::Idle, _) => "Idle".to_string(),
            (FocusState::Focused, _) => "Focusing on selected applications".to_string(),
            (FocusState::Distracted, Some(DistractionReason::NotPresent)) => {
                "User is not detected".to_string()
            }
            (FocusState::Distracted, Some(DistractionReason::LookingAway)) => {
                "Distracted (looking away)".to_string()
            }
            (FocusState::Distracted, Some(DistractionReason::OffTarget { title })) => {
                format!("Distracted (on '{}')", title)
            }
            (FocusState::Distracted, Some(DistractionReason::StaleSignal)) => {
                "Distracted (no recent signal)".to_string()
            }
            (FocusState::Distracted, None) => "Distracted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_off_target() {
        let c = Classification::distracted(DistractionReason::OffTarget {
            title: "Browser".into(),
        });
        assert_eq!(c.describe(), "Distracted (on 'Browser')");
        assert_eq!(Classification::idle().describe(), "Idle");
    }
}
