//! Card filters.
//!
//! A filter is a predicate over catalogue records. It declares which record
//! domains it understands (`types`), can enumerate matching records
//! (`select`), and says whether a change to a given card set could alter its
//! result (`involves`).

use crate::model::{AbstractCardId, CardSetId, ExpansionId, PhysicalCardId};
use crate::store::CardStore;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Record domains a filter can be evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterDomain {
    AbstractCard,
    PhysicalCard,
    /// Card set memberships; records are physical cards.
    Membership,
}

/// A small set of filter domains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomainSet {
    bits: u8,
}

impl DomainSet {
    pub const EMPTY: DomainSet = DomainSet { bits: 0 };

    fn bit(domain: FilterDomain) -> u8 {
        match domain {
            FilterDomain::AbstractCard => 0b001,
            FilterDomain::PhysicalCard => 0b010,
            FilterDomain::Membership => 0b100,
        }
    }

    /// A set holding the given domains.
    pub fn of(domains: &[FilterDomain]) -> Self {
        domains.iter().fold(Self::EMPTY, |set, d| set.with(*d))
    }

    /// Every domain.
    pub fn all() -> Self {
        Self::of(&[
            FilterDomain::AbstractCard,
            FilterDomain::PhysicalCard,
            FilterDomain::Membership,
        ])
    }

    #[must_use]
    pub fn with(self, domain: FilterDomain) -> Self {
        Self {
            bits: self.bits | Self::bit(domain),
        }
    }

    #[inline]
    pub fn contains(&self, domain: FilterDomain) -> bool {
        self.bits & Self::bit(domain) != 0
    }

    #[must_use]
    pub fn intersection(self, other: DomainSet) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

/// A catalogue record a filter is asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Record {
    Abstract(AbstractCardId),
    Physical(PhysicalCardId),
}

/// A composable card predicate.
pub trait Filter {
    /// Domains this filter may be evaluated against.
    fn types(&self) -> DomainSet;

    /// Whether the record passes. Records from domains not in `types` pass.
    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool;

    /// Whether a change to `card_set` could change this filter's result.
    fn involves(&self, _card_set: CardSetId) -> bool {
        false
    }

    /// Every record of `domain` that passes.
    fn select(&self, store: &dyn CardStore, domain: FilterDomain) -> Vec<Record> {
        match domain {
            FilterDomain::AbstractCard => store
                .abstract_cards()
                .into_iter()
                .map(Record::Abstract)
                .filter(|r| self.accepts(store, *r))
                .collect(),
            FilterDomain::PhysicalCard | FilterDomain::Membership => store
                .catalogue()
                .into_iter()
                .map(Record::Physical)
                .filter(|r| self.accepts(store, *r))
                .collect(),
        }
    }
}

/// Resolves a physical record to its abstract card.
fn abstract_of(store: &dyn CardStore, record: Record) -> Option<AbstractCardId> {
    match record {
        Record::Abstract(id) => Some(id),
        Record::Physical(id) => store.physical_card(id).map(|pc| pc.abstract_card),
    }
}

/// Case-insensitive substring match on the card name.
pub struct CardNameFilter {
    needle: String,
}

impl CardNameFilter {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }
}

impl Filter for CardNameFilter {
    fn types(&self) -> DomainSet {
        DomainSet::all()
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        abstract_of(store, record)
            .and_then(|id| store.abstract_card(id))
            .is_some_and(|card| card.name.to_lowercase().contains(&self.needle))
    }
}

/// Matches cards with any of the given types.
pub struct CardTypeFilter {
    types: Vec<String>,
}

impl CardTypeFilter {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for CardTypeFilter {
    fn types(&self) -> DomainSet {
        DomainSet::all()
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        abstract_of(store, record)
            .and_then(|id| store.abstract_card(id))
            .is_some_and(|card| card.card_types.iter().any(|t| self.types.contains(t)))
    }
}

/// Matches printings from the given expansions. `None` selects printings
/// without a recorded expansion.
pub struct ExpansionFilter {
    expansions: Vec<Option<ExpansionId>>,
}

impl ExpansionFilter {
    pub fn new(expansions: Vec<Option<ExpansionId>>) -> Self {
        Self { expansions }
    }
}

impl Filter for ExpansionFilter {
    fn types(&self) -> DomainSet {
        DomainSet::of(&[FilterDomain::PhysicalCard, FilterDomain::Membership])
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        match record {
            Record::Physical(id) => store
                .physical_card(id)
                .is_some_and(|pc| self.expansions.contains(&pc.expansion)),
            Record::Abstract(_) => true,
        }
    }
}

/// Matches printings with at least one copy in a given card set.
pub struct InCardSetFilter {
    card_set: CardSetId,
}

impl InCardSetFilter {
    pub fn new(card_set: CardSetId) -> Self {
        Self { card_set }
    }
}

impl Filter for InCardSetFilter {
    fn types(&self) -> DomainSet {
        DomainSet::of(&[FilterDomain::PhysicalCard, FilterDomain::Membership])
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        match record {
            Record::Physical(id) => store.count(self.card_set, id) > 0,
            Record::Abstract(id) => store
                .printings(id)
                .into_iter()
                .any(|pc| store.count(self.card_set, pc) > 0),
        }
    }

    fn involves(&self, card_set: CardSetId) -> bool {
        card_set == self.card_set
    }
}

/// Passes records accepted by every inner filter.
pub struct AndFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AndFilter {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }
}

impl Filter for AndFilter {
    fn types(&self) -> DomainSet {
        self.filters
            .iter()
            .fold(DomainSet::all(), |set, f| set.intersection(f.types()))
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        self.filters.iter().all(|f| f.accepts(store, record))
    }

    fn involves(&self, card_set: CardSetId) -> bool {
        self.filters.iter().any(|f| f.involves(card_set))
    }
}

/// Passes records accepted by any inner filter.
pub struct OrFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl OrFilter {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }
}

impl Filter for OrFilter {
    fn types(&self) -> DomainSet {
        self.filters
            .iter()
            .fold(DomainSet::all(), |set, f| set.intersection(f.types()))
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        self.filters.iter().any(|f| f.accepts(store, record))
    }

    fn involves(&self, card_set: CardSetId) -> bool {
        self.filters.iter().any(|f| f.involves(card_set))
    }
}

/// Inverts an inner filter.
pub struct NotFilter {
    inner: Box<dyn Filter>,
}

impl NotFilter {
    pub fn new(inner: Box<dyn Filter>) -> Self {
        Self { inner }
    }
}

impl Filter for NotFilter {
    fn types(&self) -> DomainSet {
        self.inner.types()
    }

    fn accepts(&self, store: &dyn CardStore, record: Record) -> bool {
        !self.inner.accepts(store, record)
    }

    fn involves(&self, card_set: CardSetId) -> bool {
        self.inner.involves(card_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_set() {
        let set = DomainSet::of(&[FilterDomain::PhysicalCard]);
        assert!(set.contains(FilterDomain::PhysicalCard));
        assert!(!set.contains(FilterDomain::AbstractCard));
        assert!(DomainSet::all().contains(FilterDomain::Membership));
        assert!(set.intersection(DomainSet::of(&[FilterDomain::AbstractCard])).is_empty());
    }

    #[test]
    fn test_combinator_types() {
        let and = AndFilter::new(alloc::vec![
            Box::new(CardNameFilter::new("a")) as Box<dyn Filter>,
            Box::new(ExpansionFilter::new(alloc::vec![None])),
        ]);
        assert!(!and.types().contains(FilterDomain::AbstractCard));
        assert!(and.types().contains(FilterDomain::PhysicalCard));
    }

    #[test]
    fn test_involves() {
        let f = NotFilter::new(Box::new(InCardSetFilter::new(3)));
        assert!(f.involves(3));
        assert!(!f.involves(4));
        assert!(!CardNameFilter::new("x").involves(3));
    }
}
