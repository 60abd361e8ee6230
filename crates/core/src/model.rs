//! Catalogue and card set records.
//!
//! Everything here is addressed by a stable integer id. Card sets refer to
//! their parent by id only; the tree is navigated through a `CardStore`
//! rather than through owned pointers.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier of a card set.
pub type CardSetId = u32;

/// Identifier of an abstract card.
pub type AbstractCardId = u32;

/// Identifier of a physical card (one printing of an abstract card).
pub type PhysicalCardId = u32;

/// Identifier of an expansion.
pub type ExpansionId = u32;

/// A named node in the card set tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSet {
    pub id: CardSetId,
    pub name: String,
    /// Parent card set, looked up by id.
    pub parent: Option<CardSetId>,
    /// Sets not in use are skipped by parent, child and sibling aggregation.
    pub in_use: bool,
}

impl CardSet {
    /// Creates a card set record.
    pub fn new(id: CardSetId, name: impl Into<String>, parent: Option<CardSetId>, in_use: bool) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            in_use,
        }
    }

    /// Returns true if `other` is an in-use child of this set.
    #[inline]
    pub fn is_parent_of(&self, other: &CardSet) -> bool {
        other.parent == Some(self.id)
    }
}

/// A card identity, independent of printing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbstractCard {
    pub id: AbstractCardId,
    pub name: String,
    /// Card types, e.g. `Vampire`, `Action`. A card may have several.
    pub card_types: Vec<String>,
    pub clans: Vec<String>,
    pub text: String,
}

impl AbstractCard {
    /// Creates a card with a single type and no clan.
    pub fn new(id: AbstractCardId, name: impl Into<String>, card_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            card_types: alloc::vec![card_type.into()],
            clans: Vec::new(),
            text: String::new(),
        }
    }

    /// Adds a clan.
    pub fn with_clan(mut self, clan: impl Into<String>) -> Self {
        self.clans.push(clan.into());
        self
    }

    /// Adds a further card type.
    pub fn with_type(mut self, card_type: impl Into<String>) -> Self {
        self.card_types.push(card_type.into());
        self
    }

    /// Sets the card text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// An expansion (card printing run).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expansion {
    pub id: ExpansionId,
    pub name: String,
}

/// One printing of an abstract card. `expansion` is `None` for copies whose
/// printing is not recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhysicalCard {
    pub id: PhysicalCardId,
    pub abstract_card: AbstractCardId,
    pub expansion: Option<ExpansionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_set_parent_link() {
        let parent = CardSet::new(1, "Collection", None, false);
        let child = CardSet::new(2, "Deck", Some(1), true);
        assert!(parent.is_parent_of(&child));
        assert!(!child.is_parent_of(&parent));
    }

    #[test]
    fn test_abstract_card_builder() {
        let card = AbstractCard::new(7, "Alexandra", "Vampire")
            .with_clan("Toreador")
            .with_type("Imbued");
        assert_eq!(card.card_types, alloc::vec!["Vampire", "Imbued"]);
        assert_eq!(card.clans, alloc::vec!["Toreador"]);
    }
}
