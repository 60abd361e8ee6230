//! Presentation-facing tree: groups, card rows and breakdown levels.
//!
//! Group nodes carry the sums of their rows. A card that belongs to several
//! groups has one node in each.

use cardtree_core::AbstractCardId;
use std::collections::BTreeMap;

/// Shown in place of an empty tree.
pub const EMPTY_PLACEHOLDER: &str = "No cards in this card set";

/// One displayed row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub count: i64,
    pub parent_count: i64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>, count: i64, parent_count: i64) -> Self {
        Self {
            label: label.into(),
            count,
            parent_count,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    /// Finds a descendant by following labels, one per level.
    pub fn find(&self, path: &[&str]) -> Option<&TreeNode> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        self.children
            .iter()
            .find(|child| child.label == *first)
            .and_then(|child| child.find(rest))
    }

    /// Number of nodes below this one.
    pub fn descendants(&self) -> usize {
        self.children.iter().map(|c| 1 + c.descendants()).sum()
    }
}

/// Key of a card row within a group: rows sort by card name, then id.
pub type RowKey = (String, AbstractCardId);

/// A top-level group and its card rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupNode {
    pub label: String,
    pub count: i64,
    pub parent_count: i64,
    rows: BTreeMap<RowKey, TreeNode>,
}

impl GroupNode {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    /// Card rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = (AbstractCardId, &TreeNode)> {
        self.rows.iter().map(|((_, id), node)| (*id, node))
    }

    pub fn row(&self, name: &str, card: AbstractCardId) -> Option<&TreeNode> {
        self.rows.get(&(name.to_string(), card))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The whole view: groups sorted by label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardSetTree {
    groups: BTreeMap<String, GroupNode>,
}

impl CardSetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a card node under each of `groups`, replacing any node the
    /// card already had there.
    pub fn insert_row(&mut self, groups: &[String], card: AbstractCardId, node: &TreeNode) {
        for key in groups {
            let group = self
                .groups
                .entry(key.clone())
                .or_insert_with(|| GroupNode::new(key));
            if let Some(old) = group.rows.insert((node.label.clone(), card), node.clone()) {
                group.count -= old.count;
                group.parent_count -= old.parent_count;
            }
            group.count += node.count;
            group.parent_count += node.parent_count;
        }
    }

    /// Removes the card node from each of `groups`, dropping groups left
    /// empty. Returns the number of nodes removed.
    pub fn remove_row(&mut self, groups: &[String], name: &str, card: AbstractCardId) -> usize {
        let key = (name.to_string(), card);
        let mut removed = 0;
        for label in groups {
            let Some(group) = self.groups.get_mut(label) else {
                continue;
            };
            if let Some(old) = group.rows.remove(&key) {
                group.count -= old.count;
                group.parent_count -= old.parent_count;
                removed += 1;
            }
            if group.rows.is_empty() {
                self.groups.remove(label);
            }
        }
        removed
    }

    /// Groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.groups.values()
    }

    pub fn group(&self, label: &str) -> Option<&GroupNode> {
        self.groups.get(label)
    }

    /// Every (group, card, count, parent count) entry in display order.
    pub fn triples(&self) -> Vec<(String, AbstractCardId, i64, i64)> {
        self.groups
            .values()
            .flat_map(|group| {
                group.rows().map(move |(card, node)| {
                    (group.label.clone(), card, node.count, node.parent_count)
                })
            })
            .collect()
    }

    /// Sum of the group counts.
    pub fn total_count(&self) -> i64 {
        self.groups.values().map(|g| g.count).sum()
    }

    /// Number of card nodes, counting a card once per group.
    pub fn row_count(&self) -> usize {
        self.groups.values().map(GroupNode::len).sum()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Text to show when there is nothing else to show.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_PLACEHOLDER)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_insert_sums_groups() {
        let mut tree = CardSetTree::new();
        tree.insert_row(&groups(&["Vampire"]), 1, &TreeNode::new("Alpha", 2, 1));
        tree.insert_row(&groups(&["Vampire", "Master"]), 2, &TreeNode::new("Beta", 3, 0));

        let vampire = tree.group("Vampire").unwrap();
        assert_eq!((vampire.count, vampire.parent_count), (5, 1));
        assert_eq!(tree.group("Master").unwrap().count, 3);
        assert_eq!(tree.row_count(), 3);
        assert_eq!(tree.total_count(), 8);
    }

    #[test]
    fn test_replace_row_keeps_sums() {
        let mut tree = CardSetTree::new();
        let keys = groups(&["Vampire"]);
        tree.insert_row(&keys, 1, &TreeNode::new("Alpha", 2, 1));
        tree.insert_row(&keys, 1, &TreeNode::new("Alpha", 4, 0));

        let vampire = tree.group("Vampire").unwrap();
        assert_eq!(vampire.len(), 1);
        assert_eq!((vampire.count, vampire.parent_count), (4, 0));
    }

    #[test]
    fn test_remove_drops_empty_groups() {
        let mut tree = CardSetTree::new();
        let keys = groups(&["Master", "Vampire"]);
        tree.insert_row(&keys, 1, &TreeNode::new("Alpha", 1, 0));
        assert_eq!(tree.placeholder(), None);

        assert_eq!(tree.remove_row(&keys, "Alpha", 1), 2);
        assert!(tree.is_empty());
        assert_eq!(tree.placeholder(), Some(EMPTY_PLACEHOLDER));
        assert_eq!(tree.remove_row(&keys, "Alpha", 1), 0);
    }

    #[test]
    fn test_order_and_triples() {
        let mut tree = CardSetTree::new();
        tree.insert_row(&groups(&["b"]), 3, &TreeNode::new("Zed", 1, 0));
        tree.insert_row(&groups(&["b"]), 2, &TreeNode::new("Abe", 1, 0));
        tree.insert_row(&groups(&["a"]), 1, &TreeNode::new("Mid", 1, 2));

        let labels: Vec<&str> = tree.groups().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert_eq!(
            tree.triples(),
            vec![
                ("a".to_string(), 1, 1, 2),
                ("b".to_string(), 2, 1, 0),
                ("b".to_string(), 3, 1, 0),
            ]
        );
    }

    #[test]
    fn test_find_path() {
        let node = TreeNode::new("Alpha", 2, 0).with_children(vec![
            TreeNode::new("Jyhad", 1, 0).with_children(vec![TreeNode::new("Child", 1, 0)]),
            TreeNode::new("Sabbat", 1, 0),
        ]);
        assert_eq!(node.find(&["Jyhad", "Child"]).map(|n| n.count), Some(1));
        assert!(node.find(&["Camarilla"]).is_none());
        assert_eq!(node.descendants(), 3);
    }
}
