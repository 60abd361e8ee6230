//! cardtree incremental - the incremental card set tree view.
//!
//! A `CardSetView` shows one card set as a tree of groups and card rows,
//! with counts borrowed from the set's parent, children or siblings under
//! four independent display axes. Membership changes patch the tree in
//! place; the result is always the tree a full reload would produce.
//!
//! # Core Concepts
//!
//! - `ViewModes`: extra levels, show mode, parent count mode and editability
//! - `ViewProfile`: the four axes by name, loadable from TOML
//! - `RowCache`: lazily loaded parent, child and sibling card lists with
//!   per-kind invalidation
//! - `ViewRow`: raw copy counts of one card across the pools that matter
//! - `CardSetTree`: the rendered groups, rows and breakdown levels
//!
//! # Example
//!
//! ```rust
//! use cardtree_core::AbstractCard;
//! use cardtree_incremental::{CardSetView, ChangeOutcome};
//! use cardtree_store::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! let card = store.add_abstract_card(AbstractCard::new(1, "Alastor", "Political Action"));
//! let printing = store.unspecified_printing(card).unwrap();
//! let deck = store.create_card_set("Deck", None, true).unwrap();
//!
//! let mut view = CardSetView::new(deck);
//! view.load(&store);
//! assert!(view.tree().is_empty());
//!
//! store.add_card(deck, printing).unwrap();
//! assert_eq!(view.apply_change(&store, deck, printing, 1), ChangeOutcome::Patched);
//! assert_eq!(view.tree().total_count(), 1);
//! ```

pub mod cache;
pub mod mode;
pub mod profile;
pub mod row;
pub mod tree;
pub mod view;

pub use cache::{Catalogue, PoolCounts, Relation, RowCache};
pub use mode::{ExtraLevels, ParentCountMode, ShowMode, ViewModes};
pub use profile::ViewProfile;
pub use row::{Printing, ViewRow, UNSPECIFIED_EXPANSION};
pub use tree::{CardSetTree, GroupNode, TreeNode, EMPTY_PLACEHOLDER};
pub use view::{CachePolicy, CardSetView, ChangeOutcome, ViewOptions};
