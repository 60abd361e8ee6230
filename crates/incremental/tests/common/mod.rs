//! Shared fixture: a small catalogue and a card set hierarchy.
//!
//! ```text
//! Parent (not in use)
//! ├── Focus (in use)
//! │   ├── Child (in use)
//! │   │   └── Grandchild (in use)
//! │   └── Idle Child (not in use)
//! ├── Sibling (in use)
//! └── Idle Sibling (not in use)
//! Unrelated (in use)
//! ```

#![allow(dead_code)]

use cardtree_core::{AbstractCard, AbstractCardId, CardSetId, CardStore, PhysicalCardId};
use cardtree_incremental::{CachePolicy, CardSetView, ViewModes, ViewOptions};
use cardtree_store::MemoryStore;
use std::cell::RefCell;
use std::rc::Rc;

pub const ALASTOR: AbstractCardId = 1;
pub const ANSON: AbstractCardId = 2;
pub const DEFLECTION: AbstractCardId = 3;
pub const KINDRED: AbstractCardId = 4;
pub const NAMELESS: AbstractCardId = 5;

pub struct Fixture {
    pub store: MemoryStore,
    pub parent: CardSetId,
    pub focus: CardSetId,
    pub child: CardSetId,
    pub grandchild: CardSetId,
    pub idle_child: CardSetId,
    pub sibling: CardSetId,
    pub idle_sibling: CardSetId,
    pub unrelated: CardSetId,
    /// Every printing in the catalogue.
    pub printings: Vec<PhysicalCardId>,
}

impl Fixture {
    /// The hierarchy with no copies anywhere.
    pub fn empty() -> Self {
        let mut store = MemoryStore::new();
        let jyhad = store.add_expansion("Jyhad");
        let sabbat = store.add_expansion("Sabbat");

        store.add_abstract_card(AbstractCard::new(ALASTOR, "Alastor", "Political Action"));
        store.add_abstract_card(AbstractCard::new(ANSON, "Anson", "Vampire").with_clan("Toreador"));
        store.add_abstract_card(
            AbstractCard::new(DEFLECTION, "Deflection", "Reaction").with_type("Combat"),
        );
        store.add_abstract_card(AbstractCard::new(KINDRED, "Kindred Restructure", "Political Action"));
        let mut nameless = AbstractCard::new(NAMELESS, "Nameless Thing", "");
        nameless.card_types.clear();
        store.add_abstract_card(nameless);

        store.add_printing(ALASTOR, jyhad).unwrap();
        store.add_printing(ANSON, jyhad).unwrap();
        store.add_printing(ANSON, sabbat).unwrap();
        store.add_printing(DEFLECTION, sabbat).unwrap();

        let parent = store.create_card_set("Parent", None, false).unwrap();
        let focus = store.create_card_set("Focus", Some(parent), true).unwrap();
        let child = store.create_card_set("Child", Some(focus), true).unwrap();
        let grandchild = store.create_card_set("Grandchild", Some(child), true).unwrap();
        let idle_child = store.create_card_set("Idle Child", Some(focus), false).unwrap();
        let sibling = store.create_card_set("Sibling", Some(parent), true).unwrap();
        let idle_sibling = store.create_card_set("Idle Sibling", Some(parent), false).unwrap();
        let unrelated = store.create_card_set("Unrelated", None, true).unwrap();

        let printings = store.catalogue();
        Self {
            store,
            parent,
            focus,
            child,
            grandchild,
            idle_child,
            sibling,
            idle_sibling,
            unrelated,
            printings,
        }
    }

    /// The hierarchy with copies spread across every set.
    pub fn populated() -> Self {
        let mut f = Self::empty();
        let p = f.printings.clone();
        let sets = f.sets();
        for (i, set) in sets.iter().enumerate() {
            for (j, pc) in p.iter().enumerate() {
                let copies = (i * 3 + j * 5) % 4;
                f.store.add_cards(*set, *pc, copies).unwrap();
            }
        }
        f
    }

    /// Every card set, focus first.
    pub fn sets(&self) -> Vec<CardSetId> {
        vec![
            self.focus,
            self.parent,
            self.child,
            self.grandchild,
            self.idle_child,
            self.sibling,
            self.idle_sibling,
            self.unrelated,
        ]
    }

    /// The printing of `card` without an expansion.
    pub fn unspecified(&self, card: AbstractCardId) -> PhysicalCardId {
        self.store.unspecified_printing(card).unwrap()
    }

    /// A loaded view of `set`.
    pub fn view(&self, set: CardSetId, modes: ViewModes) -> CardSetView {
        self.view_with(set, modes, CachePolicy::Persistent)
    }

    pub fn view_with(&self, set: CardSetId, modes: ViewModes, cache: CachePolicy) -> CardSetView {
        let mut view = CardSetView::with_options(set, ViewOptions { cache });
        view.set_modes(modes);
        view.load(&self.store);
        view
    }

    /// A loaded view of `set` that follows the store.
    pub fn subscribed(&mut self, set: CardSetId, modes: ViewModes, cache: CachePolicy) -> Rc<RefCell<CardSetView>> {
        let view = Rc::new(RefCell::new(self.view_with(set, modes, cache)));
        self.store.subscribe(&view);
        view
    }
}

/// Asserts that a view shows what a fresh load of the same set would show.
pub fn assert_matches_reload(f: &Fixture, view: &CardSetView) {
    let fresh = f.view(view.focus(), view.modes());
    assert_eq!(view.tree(), fresh.tree());
}
