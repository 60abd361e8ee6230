//! Display mode axes.
//!
//! The four axes are independent; every combination is valid. A parent count
//! mode that needs a parent degrades to `IgnoreParent` for a card set that
//! has none, rather than being rejected.

use cardtree_core::Error;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Implements `as_str`, `ALL`, `Display` and `FromStr` over stable snake_case
/// names, matching the serde representation.
macro_rules! mode_names {
    ($ty:ident, $axis:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every value of this axis.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Stable name used in persisted profiles.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(Error::invalid_mode($axis, other)),
                }
            }
        }
    };
}

/// Breakdown levels shown below each card row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraLevels {
    #[default]
    None,
    Expansions,
    CardSets,
    /// Expansions, each broken down by child card set.
    ExpansionsAndCardSets,
    /// Child card sets, each broken down by expansion.
    CardSetsAndExpansions,
}

mode_names!(ExtraLevels, "extra levels", {
    None => "none",
    Expansions => "expansions",
    CardSets => "card_sets",
    ExpansionsAndCardSets => "expansions_and_card_sets",
    CardSetsAndExpansions => "card_sets_and_expansions",
});

impl ExtraLevels {
    #[inline]
    pub fn shows_expansions(self) -> bool {
        !matches!(self, ExtraLevels::None | ExtraLevels::CardSets)
    }

    #[inline]
    pub fn shows_card_sets(self) -> bool {
        !matches!(self, ExtraLevels::None | ExtraLevels::Expansions)
    }
}

/// Which pool of cards populates the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowMode {
    #[default]
    ThisSetOnly,
    AllCards,
    ParentCards,
    ChildCards,
}

mode_names!(ShowMode, "show", {
    ThisSetOnly => "this_set_only",
    AllCards => "all_cards",
    ParentCards => "parent_cards",
    ChildCards => "child_cards",
});

/// How the parent count column is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentCountMode {
    #[default]
    IgnoreParent,
    /// Copies in the parent.
    ParentCount,
    /// Copies in the parent minus copies in this set.
    MinusThisSet,
    /// Copies in the parent minus copies in every in-use child of the parent.
    MinusSetsInUse,
}

mode_names!(ParentCountMode, "parent count", {
    IgnoreParent => "ignore_parent",
    ParentCount => "parent_count",
    MinusThisSet => "minus_this_set",
    MinusSetsInUse => "minus_sets_in_use",
});

impl ParentCountMode {
    /// The mode in effect for a set with or without a parent.
    #[inline]
    pub fn effective(self, has_parent: bool) -> Self {
        if has_parent {
            self
        } else {
            ParentCountMode::IgnoreParent
        }
    }

    /// Whether copies in the parent feed the parent count.
    #[inline]
    pub fn uses_parent(self) -> bool {
        self != ParentCountMode::IgnoreParent
    }
}

/// The full display configuration of one view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewModes {
    pub extra_levels: ExtraLevels,
    pub show_mode: ShowMode,
    pub parent_count_mode: ParentCountMode,
    /// Keep rows whose counts drop to zero so they can be edited.
    pub editable: bool,
}

impl ViewModes {
    pub fn new(
        extra_levels: ExtraLevels,
        show_mode: ShowMode,
        parent_count_mode: ParentCountMode,
        editable: bool,
    ) -> Self {
        Self {
            extra_levels,
            show_mode,
            parent_count_mode,
            editable,
        }
    }

    /// Every combination of the four axes.
    pub fn all() -> impl Iterator<Item = ViewModes> {
        ExtraLevels::ALL.iter().flat_map(|&extra| {
            ShowMode::ALL.iter().flat_map(move |&show| {
                ParentCountMode::ALL.iter().flat_map(move |&parent| {
                    [false, true]
                        .into_iter()
                        .map(move |editable| ViewModes::new(extra, show, parent, editable))
                })
            })
        })
    }
}

/// Which related card sets matter under the current modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Relevance {
    pub parent: bool,
    pub children: bool,
    pub siblings: bool,
}

impl Relevance {
    pub fn new(modes: &ViewModes, has_parent: bool) -> Self {
        let parent_mode = modes.parent_count_mode.effective(has_parent);
        Self {
            parent: has_parent
                && (modes.show_mode == ShowMode::ParentCards || parent_mode.uses_parent()),
            children: modes.show_mode == ShowMode::ChildCards
                || modes.extra_levels.shows_card_sets(),
            siblings: parent_mode == ParentCountMode::MinusSetsInUse,
        }
    }
}
