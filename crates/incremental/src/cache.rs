//! Row cache.
//!
//! Per-view memo of the card lists the view draws on: the catalogue, the
//! parent set, each in-use child set and the in-use siblings, together with
//! the resolved set ids that decide which card sets count as parent, child
//! or sibling. Every entry is computed on first use and stays valid until
//! the card set tree changes; membership changes are folded into populated
//! lists as they arrive.
//!
//! Lists are unfiltered. The view's filter is applied when rows are built,
//! so changing the filter never invalidates the cache.

use cardtree_core::{AbstractCardId, CardSetId, CardStore, PhysicalCard, PhysicalCardId};
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeMap;

/// How a card set relates to the focus set of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Focus,
    Parent,
    /// An in-use child of the focus set.
    Child,
    /// An in-use child of the focus set's parent, other than the focus set.
    Sibling,
    Unrelated,
}

/// Copy counts of one pool of card sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolCounts {
    by_physical: HashMap<PhysicalCardId, i64>,
    by_abstract: HashMap<AbstractCardId, i64>,
}

impl PoolCounts {
    /// Counts the given memberships, one entry per copy.
    pub fn from_members(store: &dyn CardStore, members: impl IntoIterator<Item = PhysicalCardId>) -> Self {
        let mut pool = Self::default();
        for id in members {
            if let Some(card) = store.physical_card(id) {
                pool.adjust(&card, 1);
            }
        }
        pool
    }

    /// Adds `delta` copies of a physical card. Entries reaching zero are
    /// dropped.
    pub fn adjust(&mut self, card: &PhysicalCard, delta: i64) {
        bump(&mut self.by_physical, card.id, delta);
        bump(&mut self.by_abstract, card.abstract_card, delta);
    }

    /// Copies of a physical card.
    #[inline]
    pub fn get(&self, card: PhysicalCardId) -> i64 {
        self.by_physical.get(&card).copied().unwrap_or(0)
    }

    /// Copies of any printing of an abstract card.
    #[inline]
    pub fn abstract_count(&self, card: AbstractCardId) -> i64 {
        self.by_abstract.get(&card).copied().unwrap_or(0)
    }

    /// Abstract cards with at least one copy.
    pub fn cards(&self) -> impl Iterator<Item = AbstractCardId> + '_ {
        self.by_abstract
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(card, _)| *card)
    }

    /// Total copies.
    pub fn total(&self) -> i64 {
        self.by_physical.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_physical.is_empty()
    }
}

fn bump<K: core::hash::Hash + Eq + Copy>(map: &mut HashMap<K, i64>, key: K, delta: i64) {
    let entry = map.entry(key).or_insert(0);
    *entry += delta;
    if *entry == 0 {
        map.remove(&key);
    }
}

/// Catalogue-wide printing lists, grouped by abstract card.
#[derive(Clone, Debug, Default)]
pub struct Catalogue {
    printings: BTreeMap<AbstractCardId, Vec<PhysicalCardId>>,
}

impl Catalogue {
    fn load(store: &dyn CardStore) -> Self {
        let mut printings: BTreeMap<AbstractCardId, Vec<PhysicalCardId>> = BTreeMap::new();
        for id in store.catalogue() {
            if let Some(card) = store.physical_card(id) {
                printings.entry(card.abstract_card).or_default().push(id);
            }
        }
        Self { printings }
    }

    /// Every printing of a card.
    pub fn printings(&self, card: AbstractCardId) -> &[PhysicalCardId] {
        self.printings.get(&card).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every abstract card that has at least one printing.
    pub fn cards(&self) -> impl Iterator<Item = AbstractCardId> + '_ {
        self.printings.keys().copied()
    }
}

/// Cached lookups for one view, keyed by focus set.
///
/// Each `Option` is `None` until first needed. Invalidation clears exactly
/// the entries a given kind of tree change can affect.
#[derive(Clone, Debug, Default)]
pub struct RowCache {
    catalogue: Option<Catalogue>,
    /// Resolved parent of the focus set.
    parent_filter: Option<Option<CardSetId>>,
    parent_list: Option<PoolCounts>,
    /// In-use children of the focus set, sorted by name.
    child_filters: Option<Vec<(CardSetId, String)>>,
    combined_child_filter: Option<HashSet<CardSetId>>,
    child_lists: Option<HashMap<CardSetId, PoolCounts>>,
    combined_child_list: Option<PoolCounts>,
    /// In-use children of the parent, other than the focus set.
    sibling_filter: Option<HashSet<CardSetId>>,
    sibling_list: Option<PoolCounts>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------

    /// The focus set moved to another parent.
    pub fn invalidate_parent(&mut self) {
        self.parent_filter = None;
        self.parent_list = None;
        self.invalidate_siblings();
    }

    /// An in-use child of the focus set appeared, vanished, moved away,
    /// was renamed, or had its in-use flag flipped.
    pub fn invalidate_children(&mut self) {
        self.child_filters = None;
        self.combined_child_filter = None;
        self.child_lists = None;
        self.combined_child_list = None;
    }

    /// A sibling appeared, vanished, moved, or had its in-use flag flipped.
    pub fn invalidate_siblings(&mut self) {
        self.sibling_filter = None;
        self.sibling_list = None;
    }

    /// Drops everything, e.g. when the view is rebound to another set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.catalogue.is_none()
            && self.parent_filter.is_none()
            && self.parent_list.is_none()
            && self.child_filters.is_none()
            && self.combined_child_filter.is_none()
            && self.child_lists.is_none()
            && self.combined_child_list.is_none()
            && self.sibling_filter.is_none()
            && self.sibling_list.is_none()
    }

    // ------------------------------------------------------------------
    // Filters: which card sets play which role
    // ------------------------------------------------------------------

    /// The focus set's parent.
    pub fn parent(&mut self, store: &dyn CardStore, focus: CardSetId) -> Option<CardSetId> {
        *self
            .parent_filter
            .get_or_insert_with(|| store.parent_of(focus))
    }

    /// In-use children of the focus set, sorted by name then id.
    pub fn children(&mut self, store: &dyn CardStore, focus: CardSetId) -> &[(CardSetId, String)] {
        self.child_filters.get_or_insert_with(|| {
            let mut children: Vec<(CardSetId, String)> = store
                .children_in_use(focus)
                .into_iter()
                .filter_map(|id| store.card_set(id).map(|cs| (id, cs.name.clone())))
                .collect();
            children.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
            children
        })
    }

    fn child_ids(&mut self, store: &dyn CardStore, focus: CardSetId) -> &HashSet<CardSetId> {
        if self.combined_child_filter.is_none() {
            let ids = self.children(store, focus).iter().map(|(id, _)| *id).collect();
            self.combined_child_filter = Some(ids);
        }
        self.combined_child_filter.get_or_insert_with(HashSet::new)
    }

    /// In-use siblings of the focus set.
    pub fn siblings(&mut self, store: &dyn CardStore, focus: CardSetId) -> &HashSet<CardSetId> {
        if self.sibling_filter.is_none() {
            let siblings = match self.parent(store, focus) {
                Some(parent) => store
                    .children_in_use(parent)
                    .into_iter()
                    .filter(|id| *id != focus)
                    .collect(),
                None => HashSet::new(),
            };
            self.sibling_filter = Some(siblings);
        }
        self.sibling_filter.get_or_insert_with(HashSet::new)
    }

    /// Classifies a card set relative to the focus set. Constant time once
    /// the filters are resolved.
    pub fn relation(&mut self, store: &dyn CardStore, focus: CardSetId, card_set: CardSetId) -> Relation {
        if card_set == focus {
            Relation::Focus
        } else if self.parent(store, focus) == Some(card_set) {
            Relation::Parent
        } else if self.child_ids(store, focus).contains(&card_set) {
            Relation::Child
        } else if self.siblings(store, focus).contains(&card_set) {
            Relation::Sibling
        } else {
            Relation::Unrelated
        }
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// The whole catalogue.
    pub fn catalogue(&mut self, store: &dyn CardStore) -> &Catalogue {
        self.catalogue.get_or_insert_with(|| Catalogue::load(store))
    }

    /// The catalogue, if already loaded.
    pub fn cached_catalogue(&self) -> Option<&Catalogue> {
        self.catalogue.as_ref()
    }

    /// Copies in the parent set, loading them if needed.
    pub fn parent_list(&mut self, store: &dyn CardStore, focus: CardSetId) -> Option<&PoolCounts> {
        let parent = self.parent(store, focus)?;
        let list = self
            .parent_list
            .get_or_insert_with(|| PoolCounts::from_members(store, store.members(parent)));
        Some(&*list)
    }

    /// Per-child copies, loading them if needed.
    pub fn child_lists(&mut self, store: &dyn CardStore, focus: CardSetId) -> &HashMap<CardSetId, PoolCounts> {
        if self.child_lists.is_none() {
            let lists = self
                .children(store, focus)
                .iter()
                .map(|(id, _)| (*id, PoolCounts::from_members(store, store.members(*id))))
                .collect();
            self.child_lists = Some(lists);
        }
        self.child_lists.get_or_insert_with(HashMap::new)
    }

    /// Copies across every in-use child, loading them if needed.
    pub fn combined_child_list(&mut self, store: &dyn CardStore, focus: CardSetId) -> &PoolCounts {
        if self.combined_child_list.is_none() {
            let members: Vec<PhysicalCardId> = self
                .children(store, focus)
                .iter()
                .flat_map(|(id, _)| store.members(*id))
                .collect();
            self.combined_child_list = Some(PoolCounts::from_members(store, members));
        }
        self.combined_child_list.get_or_insert_with(PoolCounts::default)
    }

    /// Copies across every in-use sibling, loading them if needed.
    pub fn sibling_list(&mut self, store: &dyn CardStore, focus: CardSetId) -> &PoolCounts {
        if self.sibling_list.is_none() {
            let members: Vec<PhysicalCardId> = self
                .siblings(store, focus)
                .iter()
                .flat_map(|id| store.members(*id))
                .collect();
            self.sibling_list = Some(PoolCounts::from_members(store, members));
        }
        self.sibling_list.get_or_insert_with(PoolCounts::default)
    }

    pub fn cached_parent_list(&self) -> Option<&PoolCounts> {
        self.parent_list.as_ref()
    }

    pub fn cached_child_list(&self, child: CardSetId) -> Option<&PoolCounts> {
        self.child_lists.as_ref().and_then(|lists| lists.get(&child))
    }

    pub fn cached_sibling_list(&self) -> Option<&PoolCounts> {
        self.sibling_list.as_ref()
    }

    /// Folds a committed membership change into every populated list it
    /// touches.
    pub fn record_change(&mut self, relation: Relation, card_set: CardSetId, card: &PhysicalCard, delta: i64) {
        match relation {
            Relation::Parent => {
                if let Some(list) = self.parent_list.as_mut() {
                    list.adjust(card, delta);
                }
            }
            Relation::Child => {
                if let Some(list) = self
                    .child_lists
                    .as_mut()
                    .and_then(|lists| lists.get_mut(&card_set))
                {
                    list.adjust(card, delta);
                }
                if let Some(list) = self.combined_child_list.as_mut() {
                    list.adjust(card, delta);
                }
            }
            Relation::Sibling => {
                if let Some(list) = self.sibling_list.as_mut() {
                    list.adjust(card, delta);
                }
            }
            Relation::Focus | Relation::Unrelated => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardtree_core::AbstractCard;
    use cardtree_store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        parent: CardSetId,
        focus: CardSetId,
        sibling: CardSetId,
        child: CardSetId,
        card: PhysicalCardId,
    }

    fn fixture() -> Fixture {
        let mut store = MemoryStore::new();
        let abs = store.add_abstract_card(AbstractCard::new(1, "Anarch Revolt", "Master"));
        let card = store.unspecified_printing(abs).unwrap();
        let parent = store.create_card_set("Parent", None, false).unwrap();
        let focus = store.create_card_set("Focus", Some(parent), true).unwrap();
        let sibling = store.create_card_set("Sibling", Some(parent), true).unwrap();
        store.create_card_set("Unused", Some(parent), false).unwrap();
        let child = store.create_card_set("Child", Some(focus), true).unwrap();
        store.add_cards(parent, card, 3).unwrap();
        store.add_cards(sibling, card, 2).unwrap();
        store.add_card(child, card).unwrap();
        Fixture {
            store,
            parent,
            focus,
            sibling,
            child,
            card,
        }
    }

    #[test]
    fn test_relations() {
        let f = fixture();
        let mut cache = RowCache::new();
        let s = &f.store;
        assert_eq!(cache.relation(s, f.focus, f.focus), Relation::Focus);
        assert_eq!(cache.relation(s, f.focus, f.parent), Relation::Parent);
        assert_eq!(cache.relation(s, f.focus, f.child), Relation::Child);
        assert_eq!(cache.relation(s, f.focus, f.sibling), Relation::Sibling);
        // Not in use
        let unused = s.card_set_by_name("Unused").unwrap().id;
        assert_eq!(cache.relation(s, f.focus, unused), Relation::Unrelated);
    }

    #[test]
    fn test_lists() {
        let f = fixture();
        let mut cache = RowCache::new();
        let s = &f.store;
        assert_eq!(cache.parent_list(s, f.focus).unwrap().get(f.card), 3);
        assert_eq!(cache.sibling_list(s, f.focus).abstract_count(1), 2);
        assert_eq!(cache.combined_child_list(s, f.focus).total(), 1);
        assert_eq!(cache.child_lists(s, f.focus)[&f.child].get(f.card), 1);
        assert_eq!(cache.catalogue(s).printings(1), &[f.card]);
    }

    #[test]
    fn test_record_change_updates_populated_lists() {
        let f = fixture();
        let mut cache = RowCache::new();
        let s = &f.store;
        cache.parent_list(s, f.focus);
        cache.child_lists(s, f.focus);

        let card = s.physical_card(f.card).unwrap();
        cache.record_change(Relation::Parent, f.parent, &card, -1);
        cache.record_change(Relation::Child, f.child, &card, -1);
        cache.record_change(Relation::Sibling, f.sibling, &card, 1);

        assert_eq!(cache.cached_parent_list().unwrap().get(f.card), 2);
        assert_eq!(cache.cached_child_list(f.child).map(|l| l.get(f.card)), Some(0));
        // Not populated, so nothing to update
        assert!(cache.cached_sibling_list().is_none());
    }

    #[test]
    fn test_invalidation_scopes() {
        let f = fixture();
        let mut cache = RowCache::new();
        let s = &f.store;
        cache.parent_list(s, f.focus);
        cache.sibling_list(s, f.focus);
        cache.child_lists(s, f.focus);
        cache.catalogue(s);

        cache.invalidate_children();
        assert!(cache.cached_child_list(f.child).is_none());
        assert!(cache.cached_parent_list().is_some());

        cache.invalidate_parent();
        assert!(cache.cached_parent_list().is_none());
        assert!(cache.cached_sibling_list().is_none());
        assert!(cache.cached_catalogue().is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pool_counts_drop_zero_entries() {
        let f = fixture();
        let card = f.store.physical_card(f.card).unwrap();
        let mut pool = PoolCounts::default();
        pool.adjust(&card, 1);
        pool.adjust(&card, -1);
        assert!(pool.is_empty());
        assert_eq!(pool.cards().count(), 0);
    }
}
