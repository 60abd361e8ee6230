//! In-memory membership store.
//!
//! Holds the catalogue, the card set tree and card set memberships. Every
//! mutation commits first and then publishes one event on the store's own
//! `ChangeBus`, so listeners always observe committed state.

use crate::bus::{ChangeBus, ChangeListener, SubscriptionId};
use cardtree_core::{
    AbstractCard, AbstractCardId, CardSet, CardSetId, CardStore, Error, Expansion, ExpansionId,
    HierarchyChange, MembershipChange, PhysicalCard, PhysicalCardId, Result, StoreEvent,
};
use hashbrown::HashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Committed catalogue and membership state.
#[derive(Clone, Debug, Default)]
pub struct StoreData {
    card_sets: BTreeMap<CardSetId, CardSet>,
    names: HashMap<String, CardSetId>,
    abstract_cards: BTreeMap<AbstractCardId, AbstractCard>,
    physical_cards: BTreeMap<PhysicalCardId, PhysicalCard>,
    printings: HashMap<AbstractCardId, Vec<PhysicalCardId>>,
    expansions: BTreeMap<ExpansionId, Expansion>,
    /// Card set -> physical card -> number of membership rows.
    memberships: HashMap<CardSetId, BTreeMap<PhysicalCardId, usize>>,
    next_card_set: CardSetId,
    next_physical: PhysicalCardId,
    next_expansion: ExpansionId,
}

impl StoreData {
    fn require_set(&self, id: CardSetId) -> Result<&CardSet> {
        self.card_sets.get(&id).ok_or(Error::unknown_card_set(id))
    }

    fn require_physical(&self, id: PhysicalCardId) -> Result<&PhysicalCard> {
        self.physical_cards
            .get(&id)
            .ok_or(Error::unknown_physical_card(id))
    }

    /// Returns true if `ancestor` is `id` or one of its ancestors.
    fn is_ancestor(&self, ancestor: CardSetId, id: CardSetId) -> bool {
        let mut current = Some(id);
        while let Some(cs) = current {
            if cs == ancestor {
                return true;
            }
            current = self.card_sets.get(&cs).and_then(|s| s.parent);
        }
        false
    }
}

impl CardStore for StoreData {
    fn card_set(&self, id: CardSetId) -> Option<&CardSet> {
        self.card_sets.get(&id)
    }

    fn card_set_by_name(&self, name: &str) -> Option<&CardSet> {
        self.names.get(name).and_then(|id| self.card_sets.get(id))
    }

    fn children(&self, id: CardSetId) -> Vec<CardSetId> {
        self.card_sets
            .values()
            .filter(|cs| cs.parent == Some(id))
            .map(|cs| cs.id)
            .collect()
    }

    fn physical_card(&self, id: PhysicalCardId) -> Option<PhysicalCard> {
        self.physical_cards.get(&id).copied()
    }

    fn abstract_card(&self, id: AbstractCardId) -> Option<&AbstractCard> {
        self.abstract_cards.get(&id)
    }

    fn expansion(&self, id: ExpansionId) -> Option<&Expansion> {
        self.expansions.get(&id)
    }

    fn members(&self, card_set: CardSetId) -> Vec<PhysicalCardId> {
        self.memberships
            .get(&card_set)
            .map(|rows| {
                rows.iter()
                    .flat_map(|(card, copies)| std::iter::repeat(*card).take(*copies))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn count(&self, card_set: CardSetId, card: PhysicalCardId) -> usize {
        self.memberships
            .get(&card_set)
            .and_then(|rows| rows.get(&card))
            .copied()
            .unwrap_or(0)
    }

    fn printings(&self, card: AbstractCardId) -> Vec<PhysicalCardId> {
        self.printings.get(&card).cloned().unwrap_or_default()
    }

    fn catalogue(&self) -> Vec<PhysicalCardId> {
        self.physical_cards.keys().copied().collect()
    }

    fn abstract_cards(&self) -> Vec<AbstractCardId> {
        self.abstract_cards.keys().copied().collect()
    }
}

/// The membership store with its change bus.
///
/// # Example
///
/// ```rust
/// use cardtree_core::{AbstractCard, CardStore};
/// use cardtree_store::MemoryStore;
///
/// let mut store = MemoryStore::new();
/// let card = store.add_abstract_card(AbstractCard::new(1, "Abebe", "Vampire"));
/// let printing = store.unspecified_printing(card).unwrap();
/// let deck = store.create_card_set("Deck", None, true).unwrap();
///
/// store.add_card(deck, printing).unwrap();
/// assert_eq!(store.count(deck, printing), 1);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    data: StoreData,
    bus: ChangeBus,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the committed state.
    #[inline]
    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Subscribes a listener to this store's events.
    pub fn subscribe<L>(&mut self, listener: &Rc<RefCell<L>>) -> SubscriptionId
    where
        L: ChangeListener + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Unsubscribes a listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// The store's change bus.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Resynchronises listeners that were busy when an event was published.
    pub fn resync(&mut self) -> usize {
        self.bus.resync(&self.data)
    }

    fn publish(&mut self, event: StoreEvent) {
        self.bus.publish(&event, &self.data);
    }

    // ------------------------------------------------------------------
    // Catalogue
    // ------------------------------------------------------------------

    /// Adds an expansion and returns its id.
    pub fn add_expansion(&mut self, name: impl Into<String>) -> ExpansionId {
        self.data.next_expansion += 1;
        let id = self.data.next_expansion;
        self.data.expansions.insert(
            id,
            Expansion {
                id,
                name: name.into(),
            },
        );
        id
    }

    /// Adds an abstract card, together with its printing without a recorded
    /// expansion. Re-adding an id replaces the card's attributes.
    pub fn add_abstract_card(&mut self, card: AbstractCard) -> AbstractCardId {
        let id = card.id;
        let is_new = self.data.abstract_cards.insert(id, card).is_none();
        if is_new {
            self.insert_printing(id, None);
        }
        id
    }

    /// Adds a printing of an abstract card in an expansion.
    pub fn add_printing(
        &mut self,
        card: AbstractCardId,
        expansion: ExpansionId,
    ) -> Result<PhysicalCardId> {
        if !self.data.abstract_cards.contains_key(&card) {
            return Err(Error::unknown_abstract_card(card));
        }
        if let Some(existing) = self.printing(card, Some(expansion)) {
            return Ok(existing);
        }
        Ok(self.insert_printing(card, Some(expansion)))
    }

    fn insert_printing(&mut self, card: AbstractCardId, expansion: Option<ExpansionId>) -> PhysicalCardId {
        self.data.next_physical += 1;
        let id = self.data.next_physical;
        self.data.physical_cards.insert(
            id,
            PhysicalCard {
                id,
                abstract_card: card,
                expansion,
            },
        );
        self.data.printings.entry(card).or_default().push(id);
        id
    }

    /// The printing of `card` in `expansion`, if catalogued.
    pub fn printing(&self, card: AbstractCardId, expansion: Option<ExpansionId>) -> Option<PhysicalCardId> {
        self.data
            .printings
            .get(&card)?
            .iter()
            .copied()
            .find(|pc| {
                self.data
                    .physical_cards
                    .get(pc)
                    .is_some_and(|p| p.expansion == expansion)
            })
    }

    /// The printing of `card` without a recorded expansion.
    pub fn unspecified_printing(&self, card: AbstractCardId) -> Option<PhysicalCardId> {
        self.printing(card, None)
    }

    // ------------------------------------------------------------------
    // Card set tree
    // ------------------------------------------------------------------

    /// Creates a card set.
    pub fn create_card_set(
        &mut self,
        name: &str,
        parent: Option<CardSetId>,
        in_use: bool,
    ) -> Result<CardSetId> {
        if self.data.names.contains_key(name) {
            return Err(Error::duplicate_card_set(name));
        }
        if let Some(parent) = parent {
            self.data.require_set(parent)?;
        }
        self.data.next_card_set += 1;
        let id = self.data.next_card_set;
        self.data
            .card_sets
            .insert(id, CardSet::new(id, name, parent, in_use));
        self.data.names.insert(name.to_string(), id);
        tracing::debug!(card_set = id, name, "card set created");

        self.publish(
            HierarchyChange::Added {
                card_set: id,
                parent,
                in_use,
            }
            .into(),
        );
        Ok(id)
    }

    /// Renames a card set.
    pub fn rename_card_set(&mut self, id: CardSetId, name: &str) -> Result<()> {
        let old = self.data.require_set(id)?.name.clone();
        if old == name {
            return Ok(());
        }
        if self.data.names.contains_key(name) {
            return Err(Error::duplicate_card_set(name));
        }
        self.data.names.remove(&old);
        self.data.names.insert(name.to_string(), id);
        let parent = match self.data.card_sets.get_mut(&id) {
            Some(cs) => {
                cs.name = name.to_string();
                cs.parent
            }
            None => return Err(Error::unknown_card_set(id)),
        };

        self.publish(HierarchyChange::Renamed { card_set: id, parent }.into());
        Ok(())
    }

    /// Moves a card set under a new parent.
    pub fn set_parent(&mut self, id: CardSetId, parent: Option<CardSetId>) -> Result<()> {
        let current = self.data.require_set(id)?;
        let (old_parent, in_use) = (current.parent, current.in_use);
        if old_parent == parent {
            return Ok(());
        }
        if let Some(new_parent) = parent {
            self.data.require_set(new_parent)?;
            if self.data.is_ancestor(id, new_parent) {
                return Err(Error::CycleDetected {
                    id,
                    parent: new_parent,
                });
            }
        }
        if let Some(cs) = self.data.card_sets.get_mut(&id) {
            cs.parent = parent;
        }

        self.publish(
            HierarchyChange::Reparented {
                card_set: id,
                old_parent,
                new_parent: parent,
                in_use,
            }
            .into(),
        );
        Ok(())
    }

    /// Marks a card set in use or not.
    pub fn set_in_use(&mut self, id: CardSetId, in_use: bool) -> Result<()> {
        let parent = match self.data.card_sets.get_mut(&id) {
            Some(cs) if cs.in_use == in_use => return Ok(()),
            Some(cs) => {
                cs.in_use = in_use;
                cs.parent
            }
            None => return Err(Error::unknown_card_set(id)),
        };

        self.publish(
            HierarchyChange::InUseToggled {
                card_set: id,
                parent,
                in_use,
            }
            .into(),
        );
        Ok(())
    }

    /// Deletes a card set. Its children move up to its parent and its
    /// memberships are dropped.
    pub fn delete_card_set(&mut self, id: CardSetId) -> Result<()> {
        let target = self.data.require_set(id)?;
        let (parent, in_use, name) = (target.parent, target.in_use, target.name.clone());

        for child in self.data.children(id) {
            self.set_parent(child, parent)?;
        }

        self.data.card_sets.remove(&id);
        self.data.names.remove(&name);
        self.data.memberships.remove(&id);
        tracing::debug!(card_set = id, name = %name, "card set deleted");

        self.publish(
            HierarchyChange::Removed {
                card_set: id,
                parent,
                in_use,
            }
            .into(),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Adds one copy of a physical card to a card set.
    pub fn add_card(&mut self, card_set: CardSetId, card: PhysicalCardId) -> Result<()> {
        self.data.require_set(card_set)?;
        self.data.require_physical(card)?;
        *self
            .data
            .memberships
            .entry(card_set)
            .or_default()
            .entry(card)
            .or_insert(0) += 1;

        self.publish(MembershipChange::added(card_set, card).into());
        Ok(())
    }

    /// Removes one copy of a physical card from a card set.
    pub fn remove_card(&mut self, card_set: CardSetId, card: PhysicalCardId) -> Result<()> {
        self.data.require_set(card_set)?;
        let rows = self
            .data
            .memberships
            .get_mut(&card_set)
            .ok_or(Error::NotInCardSet { card_set, card })?;
        match rows.get_mut(&card) {
            Some(copies) if *copies > 1 => *copies -= 1,
            Some(_) => {
                rows.remove(&card);
            }
            None => return Err(Error::NotInCardSet { card_set, card }),
        }

        self.publish(MembershipChange::removed(card_set, card).into());
        Ok(())
    }

    /// Adds `copies` copies, publishing one event per copy.
    pub fn add_cards(&mut self, card_set: CardSetId, card: PhysicalCardId, copies: usize) -> Result<()> {
        for _ in 0..copies {
            self.add_card(card_set, card)?;
        }
        Ok(())
    }
}

impl CardStore for MemoryStore {
    fn card_set(&self, id: CardSetId) -> Option<&CardSet> {
        self.data.card_set(id)
    }

    fn card_set_by_name(&self, name: &str) -> Option<&CardSet> {
        self.data.card_set_by_name(name)
    }

    fn children(&self, id: CardSetId) -> Vec<CardSetId> {
        self.data.children(id)
    }

    fn physical_card(&self, id: PhysicalCardId) -> Option<PhysicalCard> {
        self.data.physical_card(id)
    }

    fn abstract_card(&self, id: AbstractCardId) -> Option<&AbstractCard> {
        self.data.abstract_card(id)
    }

    fn expansion(&self, id: ExpansionId) -> Option<&Expansion> {
        self.data.expansion(id)
    }

    fn members(&self, card_set: CardSetId) -> Vec<PhysicalCardId> {
        self.data.members(card_set)
    }

    fn count(&self, card_set: CardSetId, card: PhysicalCardId) -> usize {
        self.data.count(card_set, card)
    }

    fn printings(&self, card: AbstractCardId) -> Vec<PhysicalCardId> {
        self.data.printings(card)
    }

    fn catalogue(&self) -> Vec<PhysicalCardId> {
        self.data.catalogue()
    }

    fn abstract_cards(&self) -> Vec<AbstractCardId> {
        self.data.abstract_cards()
    }
}
