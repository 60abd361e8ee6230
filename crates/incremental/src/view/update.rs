//! Incremental membership updates.

use super::{CardSetView, ChangeOutcome};
use crate::cache::Relation;
use crate::mode::Relevance;
use crate::row::{Pool, Printing, RowContext, ViewRow};
use cardtree_core::{group_keys, AbstractCard, CardSetId, CardStore, PhysicalCardId};
use tracing::{trace, warn};

impl CardSetView {
    /// Applies one committed membership change: `delta` copies of
    /// `physical_card` were added to (or removed from) `card_set`.
    pub fn apply_change(
        &mut self,
        store: &dyn CardStore,
        card_set: CardSetId,
        physical_card: PhysicalCardId,
        delta: i32,
    ) -> ChangeOutcome {
        if !self.loaded {
            // Nothing to patch, and cached lists would miss this change.
            self.cache.clear();
            return ChangeOutcome::Ignored;
        }
        self.begin_op();
        let outcome = self.patch(store, card_set, physical_card, i64::from(delta));
        self.end_op();
        outcome
    }

    fn patch(
        &mut self,
        store: &dyn CardStore,
        card_set: CardSetId,
        physical_card: PhysicalCardId,
        delta: i64,
    ) -> ChangeOutcome {
        let focus = self.focus;
        let relation = self.cache.relation(store, focus, card_set);
        let Some(card) = store.physical_card(physical_card) else {
            warn!(card_set, physical_card, "change names an unknown card, ignored");
            return ChangeOutcome::Ignored;
        };
        self.cache.record_change(relation, card_set, &card, delta);

        if self.stale {
            self.reload(store, "configuration changed");
            return ChangeOutcome::Reloaded;
        }
        if self.filter_involves(card_set) {
            self.reload(store, "filter depends on the changed card set");
            return ChangeOutcome::Reloaded;
        }
        if relation == Relation::Unrelated {
            return ChangeOutcome::Ignored;
        }

        let has_parent = self.cache.parent(store, focus).is_some();
        let relevance = Relevance::new(&self.modes, has_parent);
        let relevant = match relation {
            Relation::Focus => true,
            Relation::Parent => relevance.parent,
            Relation::Child => relevance.children,
            Relation::Sibling => relevance.siblings,
            Relation::Unrelated => false,
        };
        if !relevant || !self.is_visible(store, &card) {
            return ChangeOutcome::Ignored;
        }

        let children = self.cache.children(store, focus).to_vec();
        let ctx = self.row_context(has_parent, &children);
        let card_id = card.abstract_card;

        if let Some(row) = self.rows.get_mut(&card_id) {
            row.ensure_printing(Printing::new(store, &card));
            row.apply(relation, card_set, physical_card, delta, &ctx);
            let keep = self.modes.editable || row.stays(&ctx);
            if keep {
                self.tree.insert_row(row.groups(), card_id, &row.render(&ctx));
            }
            #[cfg(debug_assertions)]
            self.debug_check_row(store, card_id, &ctx);
            if !keep {
                if let Some(row) = self.rows.remove(&card_id) {
                    self.tree.remove_row(row.groups(), row.name(), card_id);
                }
            }
            trace!(?relation, card_set, physical_card, delta, keep, "row patched");
            return ChangeOutcome::Patched;
        }

        // Siblings only move parent counts, so they never make a row appear.
        if delta <= 0 || relation == Relation::Sibling {
            return ChangeOutcome::Ignored;
        }
        let Some(abstract_card) = store.abstract_card(card_id) else {
            warn!(physical_card, card = card_id, "printing of an unknown card, ignored");
            return ChangeOutcome::Ignored;
        };
        let row = self.synthesize(store, abstract_card, &ctx);
        if !row.stays(&ctx) {
            return ChangeOutcome::Ignored;
        }
        self.tree.insert_row(row.groups(), card_id, &row.render(&ctx));
        self.rows.insert(card_id, row);
        trace!(?relation, card_set, physical_card, delta, "row inserted");
        ChangeOutcome::Patched
    }

    /// Builds a row for a card that has none, reading populated cache lists
    /// and querying the store for the rest.
    fn synthesize(
        &mut self,
        store: &dyn CardStore,
        card: &AbstractCard,
        ctx: &RowContext<'_>,
    ) -> ViewRow {
        let focus = self.focus;
        let printings = self.visible_printings(store, card.id);
        let groups = group_keys(self.grouping.as_ref(), card);
        let parent = self.cache.parent(store, focus);
        let siblings: Vec<CardSetId> = self.cache.siblings(store, focus).iter().copied().collect();
        let cache = &self.cache;
        ViewRow::build(card, groups, printings, ctx, |pool, pc| {
            let copies = match pool {
                Pool::Own => store.count(focus, pc),
                Pool::Parent => match (cache.cached_parent_list(), parent) {
                    (Some(list), _) => return list.get(pc),
                    (None, Some(parent)) => store.count(parent, pc),
                    (None, None) => 0,
                },
                Pool::Siblings => match cache.cached_sibling_list() {
                    Some(list) => return list.get(pc),
                    None => siblings.iter().map(|s| store.count(*s, pc)).sum::<usize>(),
                },
                Pool::Child(child) => match cache.cached_child_list(child) {
                    Some(list) => return list.get(pc),
                    None => store.count(child, pc),
                },
            };
            copies as i64
        })
    }

    /// Rebuilds a patched row from direct store queries and checks that the
    /// patch arrived at the same copies and counts.
    #[cfg(debug_assertions)]
    fn debug_check_row(
        &mut self,
        store: &dyn CardStore,
        card_id: cardtree_core::AbstractCardId,
        ctx: &RowContext<'_>,
    ) {
        let Some(card) = store.abstract_card(card_id) else {
            return;
        };
        let focus = self.focus;
        let printings = self.visible_printings(store, card_id);
        let parent = self.cache.parent(store, focus);
        let siblings: Vec<CardSetId> = self.cache.siblings(store, focus).iter().copied().collect();
        let fresh = ViewRow::build(card, Vec::new(), printings, ctx, |pool, pc| {
            let copies = match pool {
                Pool::Own => store.count(focus, pc),
                Pool::Parent => parent.map_or(0, |p| store.count(p, pc)),
                Pool::Siblings => siblings.iter().map(|s| store.count(*s, pc)).sum::<usize>(),
                Pool::Child(child) => store.count(child, pc),
            };
            copies as i64
        });
        if let Some(row) = self.rows.get(&card_id) {
            debug_assert!(
                row.same_counts(&fresh),
                "patched row diverged from the store: {row:?} vs {fresh:?}"
            );
        }
    }
}
