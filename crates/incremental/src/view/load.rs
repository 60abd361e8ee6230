//! Full reload.

use super::CardSetView;
use crate::cache::PoolCounts;
use crate::mode::ShowMode;
use crate::row::{Pool, Printing, ViewRow};
use cardtree_core::{group_keys, AbstractCardId, CardStore, FilterDomain, Record};
use hashbrown::HashSet;
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl CardSetView {
    /// Rebuilds the tree from the store.
    pub fn load(&mut self, store: &dyn CardStore) {
        self.begin_op();
        self.load_rows(store);
        self.end_op();
    }

    pub(super) fn reload(&mut self, store: &dyn CardStore, reason: &str) {
        debug!(focus = self.focus, reason, "forced reload");
        self.load_rows(store);
    }

    fn load_rows(&mut self, store: &dyn CardStore) {
        self.rows.clear();
        self.tree.clear();
        self.stale = false;
        let focus = self.focus;
        let Some(focus_set) = store.card_set(focus) else {
            warn!(focus, "focus card set not found");
            self.unload();
            return;
        };
        self.focus_in_use = focus_set.in_use;
        self.prefill_visibility(store);

        let has_parent = self.cache.parent(store, focus).is_some();
        let children = self.cache.children(store, focus).to_vec();
        let ctx = self.row_context(has_parent, &children);
        let relevance = ctx.relevance();
        let own = PoolCounts::from_members(store, store.members(focus));

        let mut candidates: BTreeSet<AbstractCardId> = own.cards().collect();
        match self.modes.show_mode {
            ShowMode::ThisSetOnly => {}
            ShowMode::AllCards => candidates.extend(self.cache.catalogue(store).cards()),
            ShowMode::ParentCards => {
                if let Some(parent) = self.cache.parent_list(store, focus) {
                    candidates.extend(parent.cards());
                }
            }
            ShowMode::ChildCards => {
                candidates.extend(self.cache.combined_child_list(store, focus).cards())
            }
        }

        if relevance.parent {
            self.cache.parent_list(store, focus);
        }
        if relevance.siblings {
            self.cache.sibling_list(store, focus);
        }
        if relevance.children {
            self.cache.child_lists(store, focus);
        }

        for card_id in candidates {
            let Some(card) = store.abstract_card(card_id) else {
                continue;
            };
            let printings = self.visible_printings(store, card_id);
            if printings.is_empty() {
                continue;
            }
            let groups = group_keys(self.grouping.as_ref(), card);
            let cache = &self.cache;
            let row = ViewRow::build(card, groups, printings, &ctx, |pool, pc| match pool {
                Pool::Own => own.get(pc),
                Pool::Parent => cache.cached_parent_list().map_or(0, |l| l.get(pc)),
                Pool::Siblings => cache.cached_sibling_list().map_or(0, |l| l.get(pc)),
                Pool::Child(child) => cache.cached_child_list(child).map_or(0, |l| l.get(pc)),
            });
            if row.stays(&ctx) {
                self.tree.insert_row(row.groups(), card_id, &row.render(&ctx));
                self.rows.insert(card_id, row);
            }
        }

        self.loaded = true;
        debug!(
            focus,
            rows = self.rows.len(),
            groups = self.tree.group_count(),
            modes = ?self.modes,
            "view loaded"
        );
    }

    /// Evaluates the filter once for the whole catalogue.
    fn prefill_visibility(&mut self, store: &dyn CardStore) {
        let filter = match &self.filter {
            Some(filter) if self.filter_enabled => filter,
            _ => return,
        };
        let catalogue = self.cache.catalogue(store);
        if filter.types().contains(FilterDomain::PhysicalCard) {
            let selected: HashSet<Record> = filter
                .select(store, FilterDomain::PhysicalCard)
                .into_iter()
                .collect();
            for card in catalogue.cards() {
                for pc in catalogue.printings(card) {
                    self.visible
                        .insert(*pc, selected.contains(&Record::Physical(*pc)));
                }
            }
        } else {
            let selected: HashSet<Record> = filter
                .select(store, FilterDomain::AbstractCard)
                .into_iter()
                .collect();
            for card in catalogue.cards() {
                let visible = selected.contains(&Record::Abstract(card));
                for pc in catalogue.printings(card) {
                    self.visible.insert(*pc, visible);
                }
            }
        }
    }

    /// Printings of a card that pass the filter.
    pub(super) fn visible_printings(
        &mut self,
        store: &dyn CardStore,
        card: AbstractCardId,
    ) -> Vec<Printing> {
        store
            .printings(card)
            .into_iter()
            .filter_map(|id| store.physical_card(id))
            .filter(|pc| self.is_visible(store, pc))
            .map(|pc| Printing::new(store, &pc))
            .collect()
    }
}
