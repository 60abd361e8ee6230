//! Groupings map a card to the top-level groups it is listed under.

use crate::model::AbstractCard;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Group label for cards a grouping assigns to no group.
pub const NONE_GROUP: &str = "<< None >>";

/// Assigns group keys to a card. A card may fall under several groups.
pub trait Grouping {
    fn groups(&self, card: &AbstractCard) -> Vec<String>;
}

impl<F> Grouping for F
where
    F: Fn(&AbstractCard) -> Vec<String>,
{
    fn groups(&self, card: &AbstractCard) -> Vec<String> {
        self(card)
    }
}

/// Places every card under one group.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullGrouping;

impl Grouping for NullGrouping {
    fn groups(&self, _card: &AbstractCard) -> Vec<String> {
        vec![String::from("All")]
    }
}

/// Groups by card type.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardTypeGrouping;

impl Grouping for CardTypeGrouping {
    fn groups(&self, card: &AbstractCard) -> Vec<String> {
        card.card_types.clone()
    }
}

/// Groups by clan.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClanGrouping;

impl Grouping for ClanGrouping {
    fn groups(&self, card: &AbstractCard) -> Vec<String> {
        card.clans.clone()
    }
}

/// Group keys for a card, sorted and deduplicated, with `NONE_GROUP` standing
/// in for an empty assignment.
pub fn group_keys(grouping: &dyn Grouping, card: &AbstractCard) -> Vec<String> {
    let mut keys = grouping.groups(card);
    keys.sort();
    keys.dedup();
    if keys.is_empty() {
        keys.push(String::from(NONE_GROUP));
    }
    keys
}
