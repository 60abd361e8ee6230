//! cardtree store - in-memory membership store and change bus.
//!
//! - `MemoryStore`: the catalogue, the card set tree and memberships, with a
//!   mutation API that commits and then notifies
//! - `ChangeBus`: delivers `StoreEvent`s synchronously to listeners held by
//!   weak reference
//! - `ChangeListener`: implemented by anything that reacts to store changes

pub mod bus;
pub mod memory;

pub use bus::{ChangeBus, ChangeListener, SubscriptionId};
pub use memory::{MemoryStore, StoreData};
