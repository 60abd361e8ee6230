//! Read access to the persisted catalogue and card set memberships.

use crate::model::{
    AbstractCard, AbstractCardId, CardSet, CardSetId, Expansion, ExpansionId, PhysicalCard,
    PhysicalCardId,
};
use alloc::vec::Vec;

/// Read-only view of the membership store.
///
/// Implementations answer from committed state: once a change event has been
/// published, every query here already reflects it.
pub trait CardStore {
    /// Looks up a card set.
    fn card_set(&self, id: CardSetId) -> Option<&CardSet>;

    /// Looks up a card set by name.
    fn card_set_by_name(&self, name: &str) -> Option<&CardSet>;

    /// Direct children of a card set, in use or not.
    fn children(&self, id: CardSetId) -> Vec<CardSetId>;

    /// Looks up a physical card.
    fn physical_card(&self, id: PhysicalCardId) -> Option<PhysicalCard>;

    /// Looks up an abstract card.
    fn abstract_card(&self, id: AbstractCardId) -> Option<&AbstractCard>;

    /// Looks up an expansion.
    fn expansion(&self, id: ExpansionId) -> Option<&Expansion>;

    /// Members of a card set, one entry per copy.
    fn members(&self, card_set: CardSetId) -> Vec<PhysicalCardId>;

    /// Number of copies of a physical card in a card set.
    fn count(&self, card_set: CardSetId, card: PhysicalCardId) -> usize;

    /// Every printing of an abstract card.
    fn printings(&self, card: AbstractCardId) -> Vec<PhysicalCardId>;

    /// Every physical card in the catalogue.
    fn catalogue(&self) -> Vec<PhysicalCardId>;

    /// Every abstract card in the catalogue.
    fn abstract_cards(&self) -> Vec<AbstractCardId>;

    /// In-use children of a card set.
    fn children_in_use(&self, id: CardSetId) -> Vec<CardSetId> {
        self.children(id)
            .into_iter()
            .filter(|child| self.card_set(*child).is_some_and(|cs| cs.in_use))
            .collect()
    }

    /// The parent of a card set, if both exist.
    fn parent_of(&self, id: CardSetId) -> Option<CardSetId> {
        self.card_set(id).and_then(|cs| cs.parent)
    }

    /// Name of the expansion of a physical card, if it has one.
    fn expansion_name(&self, card: &PhysicalCard) -> Option<&str> {
        card.expansion
            .and_then(|exp| self.expansion(exp))
            .map(|exp| exp.name.as_str())
    }
}
