//! Persisted view profiles.
//!
//! A profile names the four mode axes for a card set or pane. Profiles are
//! stored as TOML; missing keys take the axis defaults.
//!
//! ```toml
//! extra_levels = "expansions"
//! show_mode = "parent_cards"
//! parent_count_mode = "minus_sets_in_use"
//! editable = true
//! ```

use crate::mode::{ExtraLevels, ParentCountMode, ShowMode, ViewModes};
use cardtree_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mode selection loaded from persisted configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewProfile {
    pub extra_levels: ExtraLevels,
    pub show_mode: ShowMode,
    pub parent_count_mode: ParentCountMode,
    pub editable: bool,
}

impl ViewProfile {
    /// Parses a profile from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::invalid_profile(e.message()))
    }

    /// Serializes the profile to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::invalid_profile(e.to_string()))
    }

    /// The modes this profile selects.
    pub fn modes(&self) -> ViewModes {
        ViewModes::new(
            self.extra_levels,
            self.show_mode,
            self.parent_count_mode,
            self.editable,
        )
    }
}

impl From<ViewModes> for ViewProfile {
    fn from(modes: ViewModes) -> Self {
        Self {
            extra_levels: modes.extra_levels,
            show_mode: modes.show_mode,
            parent_count_mode: modes.parent_count_mode,
            editable: modes.editable,
        }
    }
}
