//! Per-card rows.
//!
//! A `ViewRow` keeps the raw copy counts of every pool that matters under
//! the modes it was built with, one entry per filter-visible printing. The
//! displayed `count` and `parent_count` are maintained by delta arithmetic
//! and are always equal to the values derived from the pools.

use crate::cache::Relation;
use crate::mode::{ExtraLevels, ParentCountMode, Relevance, ShowMode, ViewModes};
use crate::tree::TreeNode;
use cardtree_core::{AbstractCard, AbstractCardId, CardSetId, CardStore, PhysicalCard, PhysicalCardId};
use std::collections::BTreeMap;

/// Label of printings without a recorded expansion. Sorts first.
pub const UNSPECIFIED_EXPANSION: &str = "  Unspecified Expansion";

type Tally = BTreeMap<PhysicalCardId, i64>;

/// A pool a row draws copies from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pool {
    Own,
    Parent,
    Siblings,
    Child(CardSetId),
}

/// A printing of the row's card and its breakdown label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Printing {
    pub id: PhysicalCardId,
    pub label: String,
}

impl Printing {
    pub fn new(store: &dyn CardStore, card: &PhysicalCard) -> Self {
        Self {
            id: card.id,
            label: store
                .expansion_name(card)
                .unwrap_or(UNSPECIFIED_EXPANSION)
                .to_string(),
        }
    }
}

/// What a row needs to know about its view.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RowContext<'a> {
    pub modes: ViewModes,
    pub has_parent: bool,
    pub focus_in_use: bool,
    /// In-use children of the focus set, in display order.
    pub children: &'a [(CardSetId, String)],
}

impl RowContext<'_> {
    #[inline]
    fn parent_mode(&self) -> ParentCountMode {
        self.modes.parent_count_mode.effective(self.has_parent)
    }

    #[inline]
    pub fn relevance(&self) -> Relevance {
        Relevance::new(&self.modes, self.has_parent)
    }

    #[inline]
    fn counts_children(&self) -> bool {
        self.modes.show_mode == ShowMode::ChildCards
    }
}

/// One abstract card in the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewRow {
    card: AbstractCardId,
    name: String,
    groups: Vec<String>,
    printings: Vec<Printing>,
    own: Tally,
    parent: Tally,
    siblings: Tally,
    children: BTreeMap<CardSetId, Tally>,
    count: i64,
    parent_count: i64,
}

impl ViewRow {
    /// Builds a row from scratch. `lookup` answers copy counts per pool and
    /// printing; only the pools that matter under `ctx` are asked for.
    pub(crate) fn build(
        card: &AbstractCard,
        groups: Vec<String>,
        mut printings: Vec<Printing>,
        ctx: &RowContext<'_>,
        mut lookup: impl FnMut(Pool, PhysicalCardId) -> i64,
    ) -> Self {
        printings.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        let relevance = ctx.relevance();
        let mut row = Self {
            card: card.id,
            name: card.name.clone(),
            groups,
            printings,
            own: Tally::new(),
            parent: Tally::new(),
            siblings: Tally::new(),
            children: BTreeMap::new(),
            count: 0,
            parent_count: 0,
        };
        for printing in &row.printings {
            let id = printing.id;
            bump(&mut row.own, id, lookup(Pool::Own, id));
            if relevance.parent {
                bump(&mut row.parent, id, lookup(Pool::Parent, id));
            }
            if relevance.siblings {
                bump(&mut row.siblings, id, lookup(Pool::Siblings, id));
            }
            if relevance.children {
                for (child, _) in ctx.children {
                    let copies = lookup(Pool::Child(*child), id);
                    if copies != 0 {
                        row.children.entry(*child).or_default().insert(id, copies);
                    }
                }
            }
        }
        row.count = row.derived_count(ctx);
        row.parent_count = row.derived_parent_count(ctx);
        row
    }

    pub fn card(&self) -> AbstractCardId {
        self.card
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group keys, sorted. Never empty.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn parent_count(&self) -> i64 {
        self.parent_count
    }

    /// Visible printings, sorted by label.
    pub fn printings(&self) -> &[Printing] {
        &self.printings
    }

    pub fn has_printing(&self, card: PhysicalCardId) -> bool {
        self.printings.iter().any(|p| p.id == card)
    }

    /// Adds a printing catalogued after the row was built.
    pub(crate) fn ensure_printing(&mut self, printing: Printing) {
        if self.has_printing(printing.id) {
            return;
        }
        let at = self
            .printings
            .partition_point(|p| (&p.label, p.id) < (&printing.label, printing.id));
        self.printings.insert(at, printing);
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    fn own(&self, card: PhysicalCardId) -> i64 {
        self.own.get(&card).copied().unwrap_or(0)
    }

    fn parent(&self, card: PhysicalCardId) -> i64 {
        self.parent.get(&card).copied().unwrap_or(0)
    }

    fn sibling(&self, card: PhysicalCardId) -> i64 {
        self.siblings.get(&card).copied().unwrap_or(0)
    }

    fn child(&self, child: CardSetId, card: PhysicalCardId) -> i64 {
        self.children
            .get(&child)
            .and_then(|tally| tally.get(&card))
            .copied()
            .unwrap_or(0)
    }

    fn count_of(&self, card: PhysicalCardId, ctx: &RowContext<'_>) -> i64 {
        let mut count = self.own(card);
        if ctx.counts_children() {
            count += self.children.values().filter_map(|t| t.get(&card)).sum::<i64>();
        }
        count
    }

    fn parent_count_of(&self, card: PhysicalCardId, ctx: &RowContext<'_>) -> i64 {
        match ctx.parent_mode() {
            ParentCountMode::IgnoreParent => 0,
            ParentCountMode::ParentCount => self.parent(card),
            ParentCountMode::MinusThisSet => self.parent(card) - self.own(card),
            ParentCountMode::MinusSetsInUse => {
                let own = if ctx.focus_in_use { self.own(card) } else { 0 };
                self.parent(card) - self.sibling(card) - own
            }
        }
    }

    fn derived_count(&self, ctx: &RowContext<'_>) -> i64 {
        self.printings.iter().map(|p| self.count_of(p.id, ctx)).sum()
    }

    fn derived_parent_count(&self, ctx: &RowContext<'_>) -> i64 {
        self.printings
            .iter()
            .map(|p| self.parent_count_of(p.id, ctx))
            .sum()
    }

    /// Whether the row belongs in a freshly loaded tree. Editable views also
    /// keep rows that once did.
    pub(crate) fn stays(&self, ctx: &RowContext<'_>) -> bool {
        let own = self.own.values().sum::<i64>() > 0;
        match ctx.modes.show_mode {
            ShowMode::ThisSetOnly => own,
            ShowMode::AllCards => !self.printings.is_empty(),
            // Raw parent copies, not the mode-dependent parent count.
            ShowMode::ParentCards => own || self.parent.values().sum::<i64>() > 0,
            ShowMode::ChildCards => {
                own || self
                    .children
                    .values()
                    .any(|tally| tally.values().any(|n| *n > 0))
            }
        }
    }

    // ------------------------------------------------------------------
    // Incremental updates
    // ------------------------------------------------------------------

    /// Applies `delta` copies of `card` in `card_set`, which stands in
    /// `relation` to the focus set.
    pub(crate) fn apply(
        &mut self,
        relation: Relation,
        card_set: CardSetId,
        card: PhysicalCardId,
        delta: i64,
        ctx: &RowContext<'_>,
    ) {
        let parent_mode = ctx.parent_mode();
        match relation {
            Relation::Focus => {
                bump(&mut self.own, card, delta);
                self.count += delta;
                match parent_mode {
                    ParentCountMode::MinusThisSet => self.parent_count -= delta,
                    ParentCountMode::MinusSetsInUse if ctx.focus_in_use => {
                        self.parent_count -= delta
                    }
                    _ => {}
                }
            }
            Relation::Child => {
                let tally = self.children.entry(card_set).or_default();
                bump(tally, card, delta);
                if tally.is_empty() {
                    self.children.remove(&card_set);
                }
                if ctx.counts_children() {
                    self.count += delta;
                }
            }
            Relation::Parent => {
                bump(&mut self.parent, card, delta);
                if parent_mode.uses_parent() {
                    self.parent_count += delta;
                }
            }
            Relation::Sibling => {
                bump(&mut self.siblings, card, delta);
                if parent_mode == ParentCountMode::MinusSetsInUse {
                    self.parent_count -= delta;
                }
            }
            Relation::Unrelated => {}
        }
        debug_assert_eq!(self.count, self.derived_count(ctx));
        debug_assert_eq!(self.parent_count, self.derived_parent_count(ctx));
    }

    /// Returns true if both rows hold the same copies and counts. Printing
    /// lists are not compared.
    #[cfg(any(debug_assertions, test))]
    pub(crate) fn same_counts(&self, other: &ViewRow) -> bool {
        self.own == other.own
            && self.parent == other.parent
            && self.siblings == other.siblings
            && self.children == other.children
            && self.count == other.count
            && self.parent_count == other.parent_count
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// The card node with its breakdown levels.
    pub(crate) fn render(&self, ctx: &RowContext<'_>) -> TreeNode {
        let children = match ctx.modes.extra_levels {
            ExtraLevels::None => Vec::new(),
            ExtraLevels::Expansions => self.expansion_nodes(ctx, false),
            ExtraLevels::CardSets => self.card_set_nodes(ctx, false),
            ExtraLevels::ExpansionsAndCardSets => self.expansion_nodes(ctx, true),
            ExtraLevels::CardSetsAndExpansions => self.card_set_nodes(ctx, true),
        };
        TreeNode::new(self.name.as_str(), self.count, self.parent_count).with_children(children)
    }

    fn printing_stays(&self, card: PhysicalCardId, ctx: &RowContext<'_>) -> bool {
        ctx.modes.editable
            || self.count_of(card, ctx) > 0
            || (ctx.modes.show_mode == ShowMode::ParentCards && self.parent(card) > 0)
    }

    fn expansion_nodes(&self, ctx: &RowContext<'_>, nested: bool) -> Vec<TreeNode> {
        self.printings
            .iter()
            .filter(|p| self.printing_stays(p.id, ctx))
            .map(|p| {
                let node = TreeNode::new(
                    p.label.as_str(),
                    self.count_of(p.id, ctx),
                    self.parent_count_of(p.id, ctx),
                );
                if !nested {
                    return node;
                }
                let sets = ctx
                    .children
                    .iter()
                    .filter_map(|(child, name)| {
                        let copies = self.child(*child, p.id);
                        (copies > 0).then(|| TreeNode::new(name.as_str(), copies, 0))
                    })
                    .collect();
                node.with_children(sets)
            })
            .collect()
    }

    fn card_set_nodes(&self, ctx: &RowContext<'_>, nested: bool) -> Vec<TreeNode> {
        ctx.children
            .iter()
            .filter_map(|(child, name)| {
                let total: i64 = self.printings.iter().map(|p| self.child(*child, p.id)).sum();
                if total <= 0 {
                    return None;
                }
                let node = TreeNode::new(name.as_str(), total, 0);
                if !nested {
                    return Some(node);
                }
                let expansions = self
                    .printings
                    .iter()
                    .filter_map(|p| {
                        let copies = self.child(*child, p.id);
                        (copies > 0).then(|| TreeNode::new(p.label.as_str(), copies, 0))
                    })
                    .collect();
                Some(node.with_children(expansions))
            })
            .collect()
    }
}

fn bump(tally: &mut Tally, card: PhysicalCardId, delta: i64) {
    if delta == 0 {
        return;
    }
    let entry = tally.entry(card).or_insert(0);
    *entry += delta;
    if *entry == 0 {
        tally.remove(&card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JYHAD: PhysicalCardId = 10;
    const UNSPEC: PhysicalCardId = 11;
    const CHILD: CardSetId = 5;

    fn printings() -> Vec<Printing> {
        vec![
            Printing {
                id: JYHAD,
                label: "Jyhad".to_string(),
            },
            Printing {
                id: UNSPEC,
                label: UNSPECIFIED_EXPANSION.to_string(),
            },
        ]
    }

    fn children() -> Vec<(CardSetId, String)> {
        vec![(CHILD, "Child".to_string())]
    }

    fn ctx(children: &[(CardSetId, String)], modes: ViewModes) -> RowContext<'_> {
        RowContext {
            modes,
            has_parent: true,
            focus_in_use: true,
            children,
        }
    }

    fn modes(show: ShowMode, parent: ParentCountMode) -> ViewModes {
        ViewModes::new(ExtraLevels::None, show, parent, false)
    }

    /// own: 2 Jyhad, parent: 5 Jyhad + 1 unspecified, siblings: 1 Jyhad,
    /// child: 1 unspecified.
    fn lookup(pool: Pool, card: PhysicalCardId) -> i64 {
        match (pool, card) {
            (Pool::Own, JYHAD) => 2,
            (Pool::Parent, JYHAD) => 5,
            (Pool::Parent, UNSPEC) => 1,
            (Pool::Siblings, JYHAD) => 1,
            (Pool::Child(CHILD), UNSPEC) => 1,
            _ => 0,
        }
    }

    fn build(ctx: &RowContext<'_>) -> ViewRow {
        let card = AbstractCard::new(1, "Alastor", "Political Action");
        ViewRow::build(&card, vec!["Political Action".to_string()], printings(), ctx, lookup)
    }

    #[test]
    fn test_printings_sorted_by_label() {
        let kids = children();
        let row = build(&ctx(&kids, ViewModes::default()));
        let labels: Vec<&str> = row.printings().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, [UNSPECIFIED_EXPANSION, "Jyhad"]);
    }

    #[test]
    fn test_parent_count_modes() {
        let kids = children();
        let cases = [
            (ParentCountMode::IgnoreParent, 0),
            (ParentCountMode::ParentCount, 6),
            (ParentCountMode::MinusThisSet, 4),
            (ParentCountMode::MinusSetsInUse, 3),
        ];
        for (mode, expected) in cases {
            let row = build(&ctx(&kids, modes(ShowMode::ThisSetOnly, mode)));
            assert_eq!(row.parent_count(), expected, "{mode}");
            assert_eq!(row.count(), 2);
        }
    }

    #[test]
    fn test_focus_not_in_use_keeps_own_copies() {
        let kids = children();
        let mut ctx = ctx(&kids, modes(ShowMode::ThisSetOnly, ParentCountMode::MinusSetsInUse));
        ctx.focus_in_use = false;
        assert_eq!(build(&ctx).parent_count(), 5);
    }

    #[test]
    fn test_no_parent_ignores_parent_mode() {
        let kids = children();
        let mut ctx = ctx(&kids, modes(ShowMode::ParentCards, ParentCountMode::ParentCount));
        ctx.has_parent = false;
        let row = build(&ctx);
        assert_eq!(row.parent_count(), 0);
        assert!(row.stays(&ctx));
    }

    #[test]
    fn test_child_cards_count_children() {
        let kids = children();
        let ctx = ctx(&kids, modes(ShowMode::ChildCards, ParentCountMode::IgnoreParent));
        assert_eq!(build(&ctx).count(), 3);
    }

    #[test]
    fn test_apply_deltas() {
        let kids = children();
        let ctx = ctx(&kids, modes(ShowMode::ChildCards, ParentCountMode::MinusSetsInUse));
        let mut row = build(&ctx);
        assert_eq!((row.count(), row.parent_count()), (3, 3));

        row.apply(Relation::Focus, 1, JYHAD, -1, &ctx);
        assert_eq!((row.count(), row.parent_count()), (2, 4));
        row.apply(Relation::Sibling, 7, UNSPEC, 1, &ctx);
        assert_eq!(row.parent_count(), 3);
        row.apply(Relation::Parent, 2, UNSPEC, 2, &ctx);
        assert_eq!(row.parent_count(), 5);
        row.apply(Relation::Child, CHILD, UNSPEC, -1, &ctx);
        assert_eq!(row.count(), 1);

        let expected = ViewRow::build(
            &AbstractCard::new(1, "Alastor", "Political Action"),
            vec!["Political Action".to_string()],
            printings(),
            &ctx,
            |pool, card| match (pool, card) {
                (Pool::Own, JYHAD) => 1,
                (Pool::Parent, JYHAD) => 5,
                (Pool::Parent, UNSPEC) => 3,
                (Pool::Siblings, JYHAD) => 1,
                (Pool::Siblings, UNSPEC) => 1,
                _ => 0,
            },
        );
        assert!(row.same_counts(&expected));
    }

    #[test]
    fn test_stays() {
        let kids = children();
        let this_set = ctx(&kids, modes(ShowMode::ThisSetOnly, ParentCountMode::IgnoreParent));
        let mut row = build(&this_set);
        assert!(row.stays(&this_set));
        row.apply(Relation::Focus, 1, JYHAD, -2, &this_set);
        assert!(!row.stays(&this_set));

        let parent_cards = ctx(&kids, modes(ShowMode::ParentCards, ParentCountMode::IgnoreParent));
        let mut row = build(&parent_cards);
        row.apply(Relation::Focus, 1, JYHAD, -2, &parent_cards);
        assert!(row.stays(&parent_cards));

        let child_cards = ctx(&kids, modes(ShowMode::ChildCards, ParentCountMode::IgnoreParent));
        let mut row = build(&child_cards);
        row.apply(Relation::Focus, 1, JYHAD, -2, &child_cards);
        assert!(row.stays(&child_cards));
        row.apply(Relation::Child, CHILD, UNSPEC, -1, &child_cards);
        assert!(!row.stays(&child_cards));
    }

    #[test]
    fn test_render_expansions() {
        let kids = children();
        let mut modes = modes(ShowMode::ThisSetOnly, ParentCountMode::ParentCount);
        modes.extra_levels = ExtraLevels::Expansions;
        let ctx = ctx(&kids, modes);
        let node = build(&ctx).render(&ctx);
        assert_eq!((node.count, node.parent_count), (2, 6));
        assert_eq!(node.children, vec![TreeNode::new("Jyhad", 2, 5)]);

        let editable = RowContext {
            modes: ViewModes { editable: true, ..modes },
            ..ctx
        };
        let node = build(&editable).render(&editable);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0], TreeNode::new(UNSPECIFIED_EXPANSION, 0, 1));
    }

    #[test]
    fn test_render_nested_levels() {
        let kids = children();
        let mut m = modes(ShowMode::ChildCards, ParentCountMode::IgnoreParent);
        m.extra_levels = ExtraLevels::CardSetsAndExpansions;
        let ctx = ctx(&kids, m);
        let node = build(&ctx).render(&ctx);
        assert_eq!(
            node.children,
            vec![TreeNode::new("Child", 1, 0)
                .with_children(vec![TreeNode::new(UNSPECIFIED_EXPANSION, 1, 0)])]
        );

        m.extra_levels = ExtraLevels::ExpansionsAndCardSets;
        let ctx = RowContext { modes: m, ..ctx };
        let node = build(&ctx).render(&ctx);
        assert_eq!(node.find(&[UNSPECIFIED_EXPANSION, "Child"]).map(|n| n.count), Some(1));
        assert_eq!(node.find(&["Jyhad"]).map(|n| n.children.len()), Some(0));
    }

    #[test]
    fn test_ensure_printing_keeps_order() {
        let kids = children();
        let ctx = ctx(&kids, ViewModes::default());
        let mut row = build(&ctx);
        row.ensure_printing(Printing {
            id: 12,
            label: "Camarilla Edition".to_string(),
        });
        row.ensure_printing(Printing {
            id: 12,
            label: "Camarilla Edition".to_string(),
        });
        let ids: Vec<PhysicalCardId> = row.printings().iter().map(|p| p.id).collect();
        assert_eq!(ids, [UNSPEC, 12, JYHAD]);
    }
}
