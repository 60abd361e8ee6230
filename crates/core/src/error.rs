//! Error types for cardtree.

use crate::model::{AbstractCardId, CardSetId, PhysicalCardId};
use alloc::string::String;
use thiserror::Error;

/// Result type alias for cardtree operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by store mutations and profile parsing.
///
/// The view engine itself never returns these; it degrades to a no-op or a
/// full reload instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Card set id does not resolve.
    #[error("Card set not found: {id}")]
    UnknownCardSet { id: CardSetId },
    /// Physical card id does not resolve.
    #[error("Physical card not found: {id}")]
    UnknownPhysicalCard { id: PhysicalCardId },
    /// Abstract card id does not resolve.
    #[error("Abstract card not found: {id}")]
    UnknownAbstractCard { id: AbstractCardId },
    /// A card set with this name already exists.
    #[error("Card set already exists: {name}")]
    DuplicateCardSet { name: String },
    /// Reparenting would make a card set its own ancestor.
    #[error("Card set {id} cannot be placed under {parent}: cycle detected")]
    CycleDetected { id: CardSetId, parent: CardSetId },
    /// Tried to remove a copy that is not in the set.
    #[error("Physical card {card} is not in card set {card_set}")]
    NotInCardSet {
        card_set: CardSetId,
        card: PhysicalCardId,
    },
    /// A mode name did not parse.
    #[error("Invalid {axis} mode: {value}")]
    InvalidMode { axis: &'static str, value: String },
    /// A persisted profile did not parse.
    #[error("Invalid profile: {message}")]
    InvalidProfile { message: String },
}

impl Error {
    /// Creates an unknown card set error.
    pub fn unknown_card_set(id: CardSetId) -> Self {
        Error::UnknownCardSet { id }
    }

    /// Creates an unknown physical card error.
    pub fn unknown_physical_card(id: PhysicalCardId) -> Self {
        Error::UnknownPhysicalCard { id }
    }

    /// Creates an unknown abstract card error.
    pub fn unknown_abstract_card(id: AbstractCardId) -> Self {
        Error::UnknownAbstractCard { id }
    }

    /// Creates a duplicate card set error.
    pub fn duplicate_card_set(name: impl Into<String>) -> Self {
        Error::DuplicateCardSet { name: name.into() }
    }

    /// Creates an invalid mode error.
    pub fn invalid_mode(axis: &'static str, value: impl Into<String>) -> Self {
        Error::InvalidMode {
            axis,
            value: value.into(),
        }
    }

    /// Creates an invalid profile error.
    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Error::InvalidProfile {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by an id that no longer resolves.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownCardSet { .. }
                | Error::UnknownPhysicalCard { .. }
                | Error::UnknownAbstractCard { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_card_set(4);
        assert!(err.to_string().contains("Card set not found"));

        let err = Error::duplicate_card_set("My Deck");
        assert!(err.to_string().contains("My Deck"));

        let err = Error::invalid_mode("show", "everything");
        assert_eq!(err.to_string(), "Invalid show mode: everything");
    }

    #[test]
    fn test_reference_errors() {
        assert!(Error::unknown_physical_card(1).is_reference_error());
        assert!(Error::unknown_abstract_card(1).is_reference_error());
        assert!(!Error::CycleDetected { id: 1, parent: 2 }.is_reference_error());
    }
}
