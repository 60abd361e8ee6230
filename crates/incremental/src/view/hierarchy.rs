//! Card set tree changes.
//!
//! The cache entries a change can affect are always invalidated. The tree
//! is reloaded only when the current modes read the affected card sets.

use super::{CardSetView, ChangeOutcome};
use crate::mode::{ParentCountMode, Relevance, ShowMode};
use cardtree_core::{CardStore, HierarchyChange};
use tracing::debug;

impl CardSetView {
    /// Applies one committed change to the card set tree.
    ///
    /// Removing the focus set unloads the view and reports `Reloaded`.
    pub fn apply_hierarchy_change(
        &mut self,
        store: &dyn CardStore,
        change: &HierarchyChange,
    ) -> ChangeOutcome {
        if !self.loaded {
            self.cache.clear();
            return ChangeOutcome::Ignored;
        }
        self.begin_op();
        let outcome = if change.card_set() == self.focus {
            self.on_focus_change(store, change)
        } else {
            self.on_related_change(store, change)
        };
        self.end_op();
        outcome
    }

    fn on_focus_change(&mut self, store: &dyn CardStore, change: &HierarchyChange) -> ChangeOutcome {
        let focus = self.focus;
        match *change {
            HierarchyChange::Removed { .. } => {
                debug!(focus, "focus card set removed");
                self.unload();
                ChangeOutcome::Reloaded
            }
            HierarchyChange::Reparented { .. } => {
                self.cache.invalidate_parent();
                if self.modes.show_mode == ShowMode::ParentCards
                    || self.modes.parent_count_mode.uses_parent()
                {
                    self.reload(store, "focus card set moved");
                    ChangeOutcome::Reloaded
                } else {
                    ChangeOutcome::Ignored
                }
            }
            HierarchyChange::InUseToggled { in_use, .. } => {
                self.focus_in_use = in_use;
                let has_parent = self.cache.parent(store, focus).is_some();
                if self.modes.parent_count_mode.effective(has_parent)
                    == ParentCountMode::MinusSetsInUse
                {
                    self.reload(store, "focus in-use flag changed");
                    ChangeOutcome::Reloaded
                } else {
                    ChangeOutcome::Ignored
                }
            }
            HierarchyChange::Added { .. } | HierarchyChange::Renamed { .. } => {
                ChangeOutcome::Ignored
            }
        }
    }

    fn on_related_change(&mut self, store: &dyn CardStore, change: &HierarchyChange) -> ChangeOutcome {
        let focus = self.focus;
        let parent = self.cache.parent(store, focus);
        let relevance = Relevance::new(&self.modes, parent.is_some());
        let renamed = matches!(change, HierarchyChange::Renamed { .. });
        let mut reason = None;

        if change.touches_children_of(focus) {
            self.cache.invalidate_children();
            // Child names only show up in the card set levels.
            let shown = if renamed {
                self.modes.extra_levels.shows_card_sets()
            } else {
                change.in_use()
            };
            if relevance.children && shown {
                reason = Some("child card set changed");
            }
        }
        if let Some(parent) = parent {
            if change.touches_children_of(parent) {
                self.cache.invalidate_siblings();
                if relevance.siblings && !renamed && change.in_use() {
                    reason = reason.or(Some("sibling card set changed"));
                }
            }
        }
        if matches!(change, HierarchyChange::Removed { .. }) && self.filter_involves(change.card_set()) {
            reason = reason.or(Some("filter depends on the removed card set"));
        }

        match reason {
            Some(reason) => {
                self.reload(store, reason);
                ChangeOutcome::Reloaded
            }
            None => ChangeOutcome::Ignored,
        }
    }
}
