//! The incremental card set view.
//!
//! A `CardSetView` renders one focus card set as a tree of groups, card
//! rows and optional breakdown levels, and keeps that tree equal to a full
//! reload as membership changes arrive. Hierarchy changes invalidate the
//! affected parts of the row cache and force a reload only when the
//! current modes depend on them.
//!
//! Operations never fail. Events naming card sets or cards that no longer
//! resolve are logged and ignored.

mod hierarchy;
mod load;
mod update;

use crate::cache::RowCache;
use crate::mode::{ExtraLevels, ParentCountMode, ShowMode, ViewModes};
use crate::profile::ViewProfile;
use crate::row::{RowContext, ViewRow};
use crate::tree::{CardSetTree, GroupNode, TreeNode};
use cardtree_core::{
    AbstractCardId, CardSetId, CardStore, CardTypeGrouping, Filter, FilterDomain, Grouping,
    PhysicalCard, PhysicalCardId, Record, StoreEvent,
};
use cardtree_store::ChangeListener;
use hashbrown::HashMap;
use tracing::warn;

/// Whether the row cache survives between operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    #[default]
    Persistent,
    /// Start every operation with an empty cache.
    Disabled,
}

/// Construction options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub cache: CachePolicy,
}

/// What a change did to the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Nothing displayed changed.
    Ignored,
    /// The tree was patched in place.
    Patched,
    /// The tree was rebuilt from scratch.
    Reloaded,
}

impl ChangeOutcome {
    #[inline]
    pub fn is_reload(self) -> bool {
        self == ChangeOutcome::Reloaded
    }
}

/// Incremental tree view of one card set.
pub struct CardSetView {
    focus: CardSetId,
    options: ViewOptions,
    modes: ViewModes,
    grouping: Box<dyn Grouping>,
    filter: Option<Box<dyn Filter>>,
    filter_enabled: bool,
    cache: RowCache,
    /// Filter results, valid for one operation.
    visible: HashMap<PhysicalCardId, bool>,
    rows: HashMap<AbstractCardId, ViewRow>,
    tree: CardSetTree,
    focus_in_use: bool,
    loaded: bool,
    /// The configuration changed since the last load.
    stale: bool,
}

impl CardSetView {
    /// Creates a view of `focus`, grouped by card type. Call `load` before
    /// reading the tree.
    pub fn new(focus: CardSetId) -> Self {
        Self::with_options(focus, ViewOptions::default())
    }

    pub fn with_options(focus: CardSetId, options: ViewOptions) -> Self {
        Self {
            focus,
            options,
            modes: ViewModes::default(),
            grouping: Box::new(CardTypeGrouping),
            filter: None,
            filter_enabled: false,
            cache: RowCache::new(),
            visible: HashMap::new(),
            rows: HashMap::new(),
            tree: CardSetTree::new(),
            focus_in_use: false,
            loaded: false,
            stale: false,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    fn update_modes(&mut self, update: impl FnOnce(&mut ViewModes)) -> bool {
        let before = self.modes;
        update(&mut self.modes);
        let changed = before != self.modes;
        self.stale |= changed;
        changed
    }

    /// Returns true if the tree must be reloaded.
    pub fn set_extra_levels(&mut self, mode: ExtraLevels) -> bool {
        self.update_modes(|m| m.extra_levels = mode)
    }

    pub fn set_show_mode(&mut self, mode: ShowMode) -> bool {
        self.update_modes(|m| m.show_mode = mode)
    }

    pub fn set_parent_count_mode(&mut self, mode: ParentCountMode) -> bool {
        self.update_modes(|m| m.parent_count_mode = mode)
    }

    pub fn set_editable(&mut self, editable: bool) -> bool {
        self.update_modes(|m| m.editable = editable)
    }

    pub fn set_modes(&mut self, modes: ViewModes) -> bool {
        self.update_modes(|m| *m = modes)
    }

    /// Applies every axis of a profile.
    pub fn apply_profile(&mut self, profile: &ViewProfile) -> bool {
        self.set_modes(profile.modes())
    }

    pub fn set_grouping(&mut self, grouping: Box<dyn Grouping>) -> bool {
        self.grouping = grouping;
        self.stale = true;
        true
    }

    /// Installs a filter. A filter that can be evaluated against neither
    /// abstract nor physical cards is dropped.
    pub fn set_filter(&mut self, filter: Option<Box<dyn Filter>>, enabled: bool) -> bool {
        let was_active = self.filter_active();
        self.filter = filter.filter(|f| {
            let types = f.types();
            let usable = types.contains(FilterDomain::AbstractCard)
                || types.contains(FilterDomain::PhysicalCard);
            if !usable {
                warn!(focus = self.focus, "filter applies to neither cards nor printings, ignored");
            }
            usable
        });
        self.filter_enabled = enabled;
        let changed = was_active || self.filter_active();
        self.stale |= changed;
        changed
    }

    pub fn set_filter_enabled(&mut self, enabled: bool) -> bool {
        if self.filter_enabled == enabled {
            return false;
        }
        self.filter_enabled = enabled;
        let changed = self.filter.is_some();
        self.stale |= changed;
        changed
    }

    /// Rebinds the view to another card set.
    pub fn set_focus(&mut self, focus: CardSetId) -> bool {
        if focus == self.focus {
            return false;
        }
        self.focus = focus;
        self.cache.clear();
        self.rows.clear();
        self.tree.clear();
        self.loaded = false;
        true
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn focus(&self) -> CardSetId {
        self.focus
    }

    pub fn modes(&self) -> ViewModes {
        self.modes
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns true if the tree does not reflect the current configuration.
    pub fn needs_reload(&self) -> bool {
        self.stale || !self.loaded
    }

    pub fn tree(&self) -> &CardSetTree {
        &self.tree
    }

    /// Groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.tree.groups()
    }

    pub fn row(&self, card: AbstractCardId) -> Option<&ViewRow> {
        self.rows.get(&card)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The displayed node of a card, taken from its first group.
    pub fn card_node(&self, card: AbstractCardId) -> Option<&TreeNode> {
        let row = self.rows.get(&card)?;
        let group = self.tree.group(row.groups().first()?)?;
        group.row(row.name(), card)
    }

    /// A breakdown node below a card, addressed by one label per level,
    /// e.g. `&["Jyhad"]` or `&["Child deck", "Jyhad"]`.
    pub fn breakdown(&self, card: AbstractCardId, path: &[&str]) -> Option<&TreeNode> {
        self.card_node(card)?.find(path)
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    fn filter_active(&self) -> bool {
        self.filter_enabled && self.filter.is_some()
    }

    fn filter_involves(&self, card_set: CardSetId) -> bool {
        match &self.filter {
            Some(filter) if self.filter_enabled => filter.involves(card_set),
            _ => false,
        }
    }

    fn begin_op(&mut self) {
        self.visible.clear();
        if self.options.cache == CachePolicy::Disabled {
            self.cache.clear();
        }
    }

    fn end_op(&mut self) {
        self.visible.clear();
    }

    /// Whether a printing passes the filter.
    fn is_visible(&mut self, store: &dyn CardStore, card: &PhysicalCard) -> bool {
        let filter = match &self.filter {
            Some(filter) if self.filter_enabled => filter,
            _ => return true,
        };
        if let Some(visible) = self.visible.get(&card.id) {
            return *visible;
        }
        let record = if filter.types().contains(FilterDomain::PhysicalCard) {
            Record::Physical(card.id)
        } else {
            Record::Abstract(card.abstract_card)
        };
        let visible = filter.accepts(store, record);
        self.visible.insert(card.id, visible);
        visible
    }

    fn row_context<'a>(&self, has_parent: bool, children: &'a [(CardSetId, String)]) -> RowContext<'a> {
        RowContext {
            modes: self.modes,
            has_parent,
            focus_in_use: self.focus_in_use,
            children,
        }
    }

    /// Drops every row and marks the view unloaded.
    fn unload(&mut self) {
        self.rows.clear();
        self.tree.clear();
        self.cache.clear();
        self.loaded = false;
    }
}

impl ChangeListener for CardSetView {
    fn on_store_event(&mut self, event: &StoreEvent, store: &dyn CardStore) {
        match event {
            StoreEvent::Membership(change) => {
                self.apply_change(store, change.card_set, change.physical_card, change.delta);
            }
            StoreEvent::Hierarchy(change) => {
                self.apply_hierarchy_change(store, change);
            }
        }
    }

    fn on_missed_events(&mut self, store: &dyn CardStore) {
        self.cache.clear();
        if !self.loaded {
            return;
        }
        self.begin_op();
        self.reload(store, "missed events");
        self.end_op();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardtree_core::{AbstractCard, CardNameFilter, DomainSet, MembershipChange, NullGrouping};
    use cardtree_store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct MembershipOnly;

    impl Filter for MembershipOnly {
        fn types(&self) -> DomainSet {
            DomainSet::of(&[FilterDomain::Membership])
        }

        fn accepts(&self, _store: &dyn CardStore, _record: Record) -> bool {
            false
        }
    }

    fn store() -> (MemoryStore, CardSetId, PhysicalCardId) {
        let mut store = MemoryStore::new();
        let card = store.add_abstract_card(AbstractCard::new(1, "Dominate", "Discipline"));
        let pc = store.unspecified_printing(card).unwrap();
        let deck = store.create_card_set("Deck", None, true).unwrap();
        (store, deck, pc)
    }

    #[test]
    fn test_setters_report_changes() {
        let mut view = CardSetView::new(1);
        assert!(view.needs_reload());
        assert!(view.set_show_mode(ShowMode::AllCards));
        assert!(!view.set_show_mode(ShowMode::AllCards));
        assert!(view.set_editable(true));
        assert!(!view.set_filter(None, true));
        assert!(view.set_grouping(Box::new(NullGrouping)));

        let profile = ViewProfile::from(view.modes());
        assert!(!view.apply_profile(&profile));
    }

    #[test]
    fn test_set_filter_rejects_membership_only_filter() {
        let mut view = CardSetView::new(1);
        assert!(!view.set_filter(Some(Box::new(MembershipOnly)), true));
        assert!(!view.filter_active());
        assert!(view.set_filter(Some(Box::new(CardNameFilter::new("dom"))), true));
        assert!(view.set_filter_enabled(false));
        assert!(!view.set_filter_enabled(false));
    }

    #[test]
    fn test_load_and_patch() {
        let (mut store, deck, pc) = store();
        let mut view = CardSetView::new(deck);
        view.load(&store);
        assert!(view.tree().is_empty());
        assert!(!view.needs_reload());

        store.add_card(deck, pc).unwrap();
        let outcome = view.apply_change(&store, deck, pc, 1);
        assert_eq!(outcome, ChangeOutcome::Patched);
        assert_eq!(view.card_node(1).map(|n| n.count), Some(1));
        assert_eq!(view.row(1).map(ViewRow::count), Some(1));
    }

    #[test]
    fn test_stale_view_reloads_on_change() {
        let (mut store, deck, pc) = store();
        let mut view = CardSetView::new(deck);
        view.load(&store);
        view.set_extra_levels(ExtraLevels::Expansions);

        store.add_card(deck, pc).unwrap();
        assert!(view.apply_change(&store, deck, pc, 1).is_reload());
        assert!(!view.needs_reload());
        assert!(view.breakdown(1, &[crate::row::UNSPECIFIED_EXPANSION]).is_some());
    }

    #[test]
    fn test_unloaded_view_ignores_changes() {
        let (mut store, deck, pc) = store();
        let mut view = CardSetView::new(deck);
        store.add_card(deck, pc).unwrap();
        assert_eq!(view.apply_change(&store, deck, pc, 1), ChangeOutcome::Ignored);
        assert!(view.tree().is_empty());
    }

    #[test]
    fn test_listener_follows_the_store() {
        let (mut store, deck, pc) = store();
        let view = Rc::new(RefCell::new(CardSetView::new(deck)));
        view.borrow_mut().load(&store);
        store.subscribe(&view);

        store.add_cards(deck, pc, 2).unwrap();
        assert_eq!(view.borrow().card_node(1).map(|n| n.count), Some(2));

        store.delete_card_set(deck).unwrap();
        assert!(!view.borrow().is_loaded());
        assert!(view.borrow().tree().is_empty());
    }

    #[test]
    fn test_set_focus_unloads() {
        let (mut store, deck, pc) = store();
        let other = store.create_card_set("Other", None, true).unwrap();
        store.add_card(deck, pc).unwrap();
        let mut view = CardSetView::new(deck);
        view.load(&store);
        assert_eq!(view.row_count(), 1);

        assert!(view.set_focus(other));
        assert!(!view.set_focus(other));
        assert!(view.needs_reload());
        view.load(&store);
        assert_eq!(view.row_count(), 0);
    }

    #[test]
    fn test_unknown_card_is_ignored() {
        let (store, deck, _) = store();
        let mut view = CardSetView::new(deck);
        view.load(&store);
        let change = MembershipChange::added(deck, 999);
        assert_eq!(
            view.apply_change(&store, change.card_set, change.physical_card, change.delta),
            ChangeOutcome::Ignored
        );
    }
}
