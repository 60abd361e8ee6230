//! Change events published by the membership store.
//!
//! A `MembershipChange` is the card set analogue of a differential delta:
//! one physical card entering (`+1`) or leaving (`-1`) one card set. The
//! store never batches several copies into one event.

use crate::model::{CardSetId, PhysicalCardId};
use alloc::vec::Vec;

/// One committed change to the copies of a physical card in a card set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipChange {
    pub card_set: CardSetId,
    pub physical_card: PhysicalCardId,
    /// `+1` for an added copy, `-1` for a removed one.
    pub delta: i32,
}

impl MembershipChange {
    /// Creates a change with an explicit delta.
    #[inline]
    pub fn new(card_set: CardSetId, physical_card: PhysicalCardId, delta: i32) -> Self {
        Self {
            card_set,
            physical_card,
            delta,
        }
    }

    /// A copy was added.
    #[inline]
    pub fn added(card_set: CardSetId, physical_card: PhysicalCardId) -> Self {
        Self::new(card_set, physical_card, 1)
    }

    /// A copy was removed.
    #[inline]
    pub fn removed(card_set: CardSetId, physical_card: PhysicalCardId) -> Self {
        Self::new(card_set, physical_card, -1)
    }

    #[inline]
    pub fn is_add(&self) -> bool {
        self.delta > 0
    }

    #[inline]
    pub fn is_remove(&self) -> bool {
        self.delta < 0
    }
}

/// A change to the card set tree itself.
///
/// Every variant carries the parent ids involved so listeners can decide
/// relevance without looking the set up again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HierarchyChange {
    /// A card set was created.
    Added {
        card_set: CardSetId,
        parent: Option<CardSetId>,
        in_use: bool,
    },
    /// A card set was deleted.
    Removed {
        card_set: CardSetId,
        parent: Option<CardSetId>,
        in_use: bool,
    },
    /// A card set moved to a new parent.
    Reparented {
        card_set: CardSetId,
        old_parent: Option<CardSetId>,
        new_parent: Option<CardSetId>,
        in_use: bool,
    },
    /// The in-use flag of a card set flipped.
    InUseToggled {
        card_set: CardSetId,
        parent: Option<CardSetId>,
        in_use: bool,
    },
    /// A card set was renamed.
    Renamed {
        card_set: CardSetId,
        parent: Option<CardSetId>,
    },
}

impl HierarchyChange {
    /// The card set this change is about.
    pub fn card_set(&self) -> CardSetId {
        match *self {
            HierarchyChange::Added { card_set, .. }
            | HierarchyChange::Removed { card_set, .. }
            | HierarchyChange::Reparented { card_set, .. }
            | HierarchyChange::InUseToggled { card_set, .. }
            | HierarchyChange::Renamed { card_set, .. } => card_set,
        }
    }

    /// Every parent the changed set had before or has after the change.
    pub fn parents(&self) -> Vec<CardSetId> {
        let mut parents = Vec::with_capacity(2);
        match *self {
            HierarchyChange::Added { parent, .. }
            | HierarchyChange::Removed { parent, .. }
            | HierarchyChange::InUseToggled { parent, .. }
            | HierarchyChange::Renamed { parent, .. } => parents.extend(parent),
            HierarchyChange::Reparented {
                old_parent,
                new_parent,
                ..
            } => {
                parents.extend(old_parent);
                if new_parent != old_parent {
                    parents.extend(new_parent);
                }
            }
        }
        parents
    }

    /// Returns true if the changed set is, or was, a child of `card_set`.
    pub fn touches_children_of(&self, card_set: CardSetId) -> bool {
        self.parents().contains(&card_set)
    }

    /// Whether the set was in use when the change was made. Renames do not
    /// say, so they count as in use.
    pub fn in_use(&self) -> bool {
        match *self {
            HierarchyChange::Added { in_use, .. }
            | HierarchyChange::Removed { in_use, .. }
            | HierarchyChange::Reparented { in_use, .. } => in_use,
            // The flag flipped, so the set was in use on one side of it.
            HierarchyChange::InUseToggled { .. } | HierarchyChange::Renamed { .. } => true,
        }
    }
}

/// Anything the store publishes after a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Membership(MembershipChange),
    Hierarchy(HierarchyChange),
}

impl From<MembershipChange> for StoreEvent {
    fn from(change: MembershipChange) -> Self {
        StoreEvent::Membership(change)
    }
}

impl From<HierarchyChange> for StoreEvent {
    fn from(change: HierarchyChange) -> Self {
        StoreEvent::Hierarchy(change)
    }
}
