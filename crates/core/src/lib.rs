//! cardtree core - catalogue, card set and change event types.
//!
//! This crate provides the shared vocabulary of the card set view:
//!
//! - `CardSet`, `AbstractCard`, `PhysicalCard`, `Expansion`: catalogue records
//!   addressed by integer ids
//! - `CardStore`: read access to the catalogue and card set memberships
//! - `MembershipChange` / `HierarchyChange`: events published after a commit
//! - `Filter`: composable card predicates
//! - `Grouping`: assigns cards to top-level groups
//! - `Error`: error type for store mutations and profile parsing
//!
//! # Example
//!
//! ```rust
//! use cardtree_core::{group_keys, AbstractCard, CardTypeGrouping, MembershipChange};
//!
//! let card = AbstractCard::new(1, "Anson", "Vampire").with_clan("Toreador");
//! assert_eq!(group_keys(&CardTypeGrouping, &card), vec!["Vampire"]);
//!
//! let change = MembershipChange::added(3, 10);
//! assert!(change.is_add());
//! ```

#![no_std]

extern crate alloc;

mod error;
pub mod event;
pub mod filter;
pub mod grouping;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use event::{HierarchyChange, MembershipChange, StoreEvent};
pub use filter::{
    AndFilter, CardNameFilter, CardTypeFilter, DomainSet, ExpansionFilter, Filter, FilterDomain,
    InCardSetFilter, NotFilter, OrFilter, Record,
};
pub use grouping::{group_keys, CardTypeGrouping, ClanGrouping, Grouping, NullGrouping, NONE_GROUP};
pub use model::{
    AbstractCard, AbstractCardId, CardSet, CardSetId, Expansion, ExpansionId, PhysicalCard,
    PhysicalCardId,
};
pub use store::CardStore;
