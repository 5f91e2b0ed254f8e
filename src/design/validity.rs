//! Submission gating.

use super::SlotId;

/// Pure predicate over slot fill state.
pub struct ValidityTracker;

impl ValidityTracker {
    /// Slots that must hold a selection before submitting.
    pub const REQUIRED: [SlotId; 5] = [
        SlotId::Concept,
        SlotId::Competency,
        SlotId::Performance,
        SlotId::Audience,
        SlotId::Format,
    ];

    /// Required slots currently empty, in [`Self::REQUIRED`] order.
    pub fn missing(filled: impl Fn(SlotId) -> bool) -> Vec<SlotId> {
        Self::REQUIRED.into_iter().filter(|s| !filled(*s)).collect()
    }

    pub fn can_submit(filled: impl Fn(SlotId) -> bool) -> bool {
        Self::REQUIRED.into_iter().all(filled)
    }
}
