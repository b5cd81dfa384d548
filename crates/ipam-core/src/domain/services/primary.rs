//! Primary designation
//!
//! Single routine deciding which of a device's mappings is primary. Every
//! entry point (assign, unassign, set-primary, cascades from address
//! deletion) goes through [`plan_primary`] and applies the resulting plan:
//! demotions first, then the promotion, inside one store transaction.

use crate::domain::aggregates::DeviceIpMapping;
use crate::domain::value_objects::MappingId;

/// What the caller wants from reconciliation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryChoice {
    /// This mapping must end up primary
    Keep(MappingId),
    /// This mapping is about to be removed; settle the rest
    Excluding(MappingId),
    /// Keep the current primary if any, otherwise pick one
    Auto,
}

/// Changes needed to reach exactly one primary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrimaryPlan {
    pub demote: Vec<MappingId>,
    pub promote: Option<MappingId>,
}

impl PrimaryPlan {
    pub fn is_noop(&self) -> bool {
        self.demote.is_empty() && self.promote.is_none()
    }
}

/// Plan primary changes for one device's mappings.
///
/// With no explicit target, an existing primary wins (the oldest one when
/// there are several), otherwise the oldest mapping by creation time.
/// Returns `None` when `Keep` names a mapping that is not in the set.
pub fn plan_primary(mappings: &[DeviceIpMapping], choice: PrimaryChoice) -> Option<PrimaryPlan> {
    let mut candidates: Vec<&DeviceIpMapping> = mappings
        .iter()
        .filter(|m| !matches!(choice, PrimaryChoice::Excluding(id) if m.id() == id))
        .collect();
    candidates.sort_by_key(|m| (m.created_at(), m.id()));

    let target = match choice {
        PrimaryChoice::Keep(id) => Some(*candidates.iter().find(|m| m.id() == id)?),
        PrimaryChoice::Excluding(_) | PrimaryChoice::Auto => candidates
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| candidates.first())
            .copied(),
    };

    let Some(target) = target else {
        return Some(PrimaryPlan::default());
    };

    Some(PrimaryPlan {
        demote: candidates
            .iter()
            .filter(|m| m.is_primary() && m.id() != target.id())
            .map(|m| m.id())
            .collect(),
        promote: (!target.is_primary()).then(|| target.id()),
    })
}
