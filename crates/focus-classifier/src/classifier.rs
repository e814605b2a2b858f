//! Focus classification

use signal_source::PresenceSignal;

use crate::state::{Classification, DistractionReason, FocusState};
use crate::targets::TargetSet;

/// Classify one tick.
///
/// `Idle` when tracking is off; `Focused` only when the subject is present,
/// facing forward, and the active title matches a target.
pub fn classify(
    tracking_enabled: bool,
    signal: &PresenceSignal,
    active_title: &str,
    targets: &TargetSet,
) -> FocusState {
    explain(tracking_enabled, signal, active_title, targets).state
}

/// Classify one tick and name the first failed condition.
///
/// Conditions are checked in order: presence, orientation, target.
pub fn explain(
    tracking_enabled: bool,
    signal: &PresenceSignal,
    active_title: &str,
    targets: &TargetSet,
) -> Classification {
    if !tracking_enabled {
        return Classification::idle();
    }
    if !signal.present {
        return Classification::distracted(DistractionReason::NotPresent);
    }
    if !signal.facing_forward {
        return Classification::distracted(DistractionReason::LookingAway);
    }
    if !targets.matches(active_title) {
        return Classification::distracted(DistractionReason::OffTarget {
            title: active_title.trim().to_string(),
        });
    }
    Classification::focused()
}
