//! Authoritative store of focus nodes.
//!
//! The structural links live in a [`NodeMap`] arena under a hidden root
//! sentinel, and node records live in a secondary map keyed by [`NodeId`].
//! String ids are resolved through an index, so looking up children is a walk
//! over the parent's child list instead of a scan over every node.
//!
//! Nodes whose parent has not registered yet are parked under a second
//! sentinel and adopted once the parent shows up.

use slotmap::SecondaryMap;
use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::model::node::{FocusNode, NodeDescriptor, NodeUpdate};
use crate::model::tree::{NodeId, NodeMap};
use crate::navigation::FocusHandler;

pub struct FocusTree {
    map: NodeMap,
    root: NodeId,
    orphans: NodeId,
    nodes: SecondaryMap<NodeId, FocusNode>,
    handlers: SecondaryMap<NodeId, Box<dyn FocusHandler>>,
    ids: HashMap<String, NodeId>,
}

/// What [`FocusTree::remove`] took out of the tree.
#[derive(Debug)]
pub struct RemovedNode {
    pub node: NodeId,
    pub record: FocusNode,
    /// Former parent, if it was a registered node.
    pub parent: Option<NodeId>,
}

impl Default for FocusTree {
    fn default() -> Self { Self::new() }
}

impl FocusTree {
    pub fn new() -> Self {
        let mut map = NodeMap::new();
        let root = map.mk_node();
        let orphans = map.mk_node();
        FocusTree {
            map,
            root,
            orphans,
            nodes: SecondaryMap::new(),
            handlers: SecondaryMap::new(),
            ids: HashMap::default(),
        }
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn lookup(&self, id: &str) -> Option<NodeId> { self.ids.get(id).copied() }

    pub fn contains(&self, id: &str) -> bool { self.ids.contains_key(id) }

    pub fn get(&self, node: NodeId) -> Option<&FocusNode> { self.nodes.get(node) }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> Option<&mut FocusNode> {
        self.nodes.get_mut(node)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&FocusNode> {
        self.lookup(id).and_then(|node| self.get(node))
    }

    pub fn id_of(&self, node: NodeId) -> Option<&str> { self.get(node).map(|n| n.id.as_str()) }

    pub fn is_focusable(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(FocusNode::focusable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &FocusNode)> { self.nodes.iter() }

    /// Inserts a node, or overwrites the record registered under the same id.
    pub fn add(&mut self, descriptor: NodeDescriptor) -> NodeId {
        let NodeDescriptor {
            id,
            parent_id,
            handle,
            flags,
            preferred_child_id,
            handler,
        } = descriptor;

        let node = match self.lookup(&id) {
            Some(existing) => {
                trace!(%id, "overwriting focus node");
                existing
            }
            None => {
                let node = self.map.mk_node();
                self.ids.insert(id.clone(), node);
                node
            }
        };
        let parent_id = if self.would_cycle(node, parent_id.as_deref()) {
            warn!(%id, parent = ?parent_id, "ignoring parent that would create a cycle");
            self.get(node).and_then(|n| n.parent_id.clone())
        } else {
            parent_id
        };
        self.nodes.insert(
            node,
            FocusNode {
                id: id.clone(),
                parent_id: parent_id.clone(),
                handle,
                flags,
                preferred_child_id,
                last_focused_child: None,
            },
        );
        self.handlers.insert(node, handler);
        self.attach(node, parent_id.as_deref());
        self.adopt_orphans(node, &id);
        node
    }

    /// Merges the supplied fields into an existing node. Unknown ids are ignored.
    pub fn update(&mut self, id: &str, update: NodeUpdate) -> Option<NodeId> {
        let Some(node) = self.lookup(id) else {
            debug!(%id, "update for unknown focus node");
            return None;
        };
        let record = self.nodes.get_mut(node)?;
        update.apply_flags(&mut record.flags);
        if let Some(handle) = update.handle {
            record.handle = handle;
        }
        if let Some(preferred) = &update.preferred_child_id {
            record.preferred_child_id = preferred.clone();
        }
        let current_parent = record.parent_id.clone();

        if let Some(parent_id) = &update.parent_id
            && *parent_id != current_parent
        {
            if self.would_cycle(node, parent_id.as_deref()) {
                warn!(%id, parent = ?parent_id, "ignoring parent change that would create a cycle");
            } else {
                if let Some(record) = self.nodes.get_mut(node) {
                    record.parent_id = parent_id.clone();
                }
                self.attach(node, parent_id.as_deref());
            }
        }
        if let Some(handler) = update.handler {
            self.handlers.insert(node, handler);
        }
        Some(node)
    }

    /// Removes a node. Its children move to its former parent and any
    /// last-focused-child pointer naming it is cleared.
    pub fn remove(&mut self, id: &str) -> Option<RemovedNode> {
        let Some(node) = self.ids.remove(id) else {
            debug!(%id, "remove for unknown focus node");
            return None;
        };
        let parent = self.parent(node);
        let structural_parent = node.parent(&self.map).unwrap_or(self.root);
        let record = self.nodes.remove(node)?;
        self.handlers.remove(node);

        let children: Vec<_> = node.children(&self.map).collect();
        for child in children {
            // A child cannot inherit a parent id naming itself.
            let self_parented =
                record.parent_id.as_deref().is_some_and(|p| self.id_of(child) == Some(p));
            let (target, parent_id) = if self_parented {
                (self.root, None)
            } else {
                (structural_parent, record.parent_id.clone())
            };
            self.map.push_back(child, target);
            if let Some(child_record) = self.nodes.get_mut(child) {
                child_record.parent_id = parent_id;
            }
        }
        self.map.remove(node);

        for (_, other) in self.nodes.iter_mut() {
            if other.last_focused_child == Some(node) {
                other.last_focused_child = None;
            }
        }
        trace!(%id, "removed focus node");
        Some(RemovedNode { node, record, parent })
    }

    /// Registered parent of `node`; `None` for roots and for nodes waiting on
    /// a parent that has not registered.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        node.parent(&self.map).filter(|p| self.nodes.contains_key(*p))
    }

    pub fn children_of(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.map)
    }

    pub fn focusable_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of(node).filter(|child| self.is_focusable(*child))
    }

    /// Ids of every node whose parent is `id`.
    pub fn children(&self, id: &str) -> Vec<&str> {
        let Some(node) = self.lookup(id) else {
            return vec![];
        };
        self.children_of(node).filter_map(|child| self.id_of(child)).collect()
    }

    /// Nodes sharing `node`'s parent, excluding `node` itself.
    pub fn siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(structural_parent) = node.parent(&self.map) else {
            return vec![];
        };
        let parent_id = self.get(node).and_then(|n| n.parent_id.as_deref());
        structural_parent
            .children(&self.map)
            .filter(|sibling| *sibling != node)
            .filter(|sibling| {
                structural_parent != self.orphans
                    || self.get(*sibling).and_then(|n| n.parent_id.as_deref()) == parent_id
            })
            .collect()
    }

    /// Registered ancestors of `node`, nearest first, excluding `node`.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.parent(node);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.parent(current);
            Some(current)
        })
    }

    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        node.is_descendant_of(ancestor, &self.map)
    }

    pub fn last_focused_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)
            .and_then(|n| n.last_focused_child)
            .filter(|child| self.nodes.contains_key(*child))
    }

    pub fn last_focused_child_id(&self, id: &str) -> Option<&str> {
        let node = self.lookup(id)?;
        self.last_focused_child(node).and_then(|child| self.id_of(child))
    }

    pub(crate) fn set_last_focused_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(record) = self.nodes.get_mut(parent) {
            record.last_focused_child = Some(child);
        }
    }

    /// Points every ancestor's last-focused-child at the branch leading to `leaf`.
    pub(crate) fn record_focus_path(&mut self, leaf: NodeId) {
        let mut child = leaf;
        while let Some(parent) = self.parent(child) {
            self.set_last_focused_child(parent, child);
            child = parent;
        }
    }

    pub(crate) fn take_handler(&mut self, node: NodeId) -> Option<Box<dyn FocusHandler>> {
        self.handlers.remove(node)
    }

    pub(crate) fn restore_handler(&mut self, node: NodeId, handler: Box<dyn FocusHandler>) {
        if self.nodes.contains_key(node) && !self.handlers.contains_key(node) {
            self.handlers.insert(node, handler);
        }
    }

    pub fn draw_tree(&self) -> String {
        let mut roots: Vec<_> =
            self.root.children(&self.map).map(|node| self.ascii_tree(node)).collect();
        let orphans: Vec<_> =
            self.orphans.children(&self.map).map(|node| self.ascii_tree(node)).collect();
        if !orphans.is_empty() {
            roots.push(ascii_tree::Tree::Node("(awaiting parent)".into(), orphans));
        }
        let tree = ascii_tree::Tree::Node("(root)".into(), roots);
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let marker = match self.parent(node) {
            Some(parent) if self.last_focused_child(parent) == Some(node) => "☒ ",
            _ => "☐ ",
        };
        let desc = match self.get(node) {
            Some(record) if !record.focusable() => format!("{marker}{} (group)", record.id),
            Some(record) => format!("{marker}{}", record.id),
            None => format!("{marker}{node:?}"),
        };
        let children: Vec<_> = self.children_of(node).map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    /// Callers rule out cycles with [`Self::would_cycle`] first.
    fn attach(&mut self, node: NodeId, parent_id: Option<&str>) {
        let target = match parent_id {
            None => self.root,
            Some(parent_id) => match self.lookup(parent_id) {
                Some(parent) => parent,
                None => {
                    trace!(?parent_id, "parent not registered yet");
                    self.orphans
                }
            },
        };
        if node.parent(&self.map) != Some(target) {
            self.map.push_back(node, target);
        }
    }

    fn adopt_orphans(&mut self, parent: NodeId, parent_id: &str) {
        let waiting: Vec<_> = self
            .orphans
            .children(&self.map)
            .filter(|orphan| {
                self.get(*orphan).and_then(|n| n.parent_id.as_deref()) == Some(parent_id)
            })
            .collect();
        for orphan in waiting {
            if parent == orphan || parent.is_descendant_of(orphan, &self.map) {
                warn!(
                    parent = %parent_id,
                    child = ?self.id_of(orphan),
                    "not adopting node that would create a cycle"
                );
                continue;
            }
            trace!(parent = %parent_id, "adopting node that registered before its parent");
            self.map.push_back(orphan, parent);
        }
    }

    fn would_cycle(&self, node: NodeId, parent_id: Option<&str>) -> bool {
        match parent_id.and_then(|p| self.lookup(p)) {
            Some(parent) => parent == node || parent.is_descendant_of(node, &self.map),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::node::NodeHandle;

    fn desc(id: &str, parent: Option<&str>) -> NodeDescriptor {
        let d = NodeDescriptor::new(id, NodeHandle(0));
        match parent {
            Some(p) => d.parent(p),
            None => d,
        }
    }

    /// ```text
    ///    page
    ///   /    \
    /// menu   grid
    ///        /  \
    ///      g1    g2
    /// ```
    fn sample() -> FocusTree {
        let mut tree = FocusTree::new();
        tree.add(desc("page", None).focusable(false));
        tree.add(desc("menu", Some("page")));
        tree.add(desc("grid", Some("page")).focusable(false));
        tree.add(desc("g1", Some("grid")));
        tree.add(desc("g2", Some("grid")));
        tree
    }

    #[test]
    fn children_follow_registration_order() {
        let tree = sample();
        assert_eq!(tree.children("page"), vec!["menu", "grid"]);
        assert_eq!(tree.children("grid"), vec!["g1", "g2"]);
        assert!(tree.children("g1").is_empty());
        assert!(tree.children("nope").is_empty());
    }

    #[test]
    fn add_overwrites_existing_record() {
        let mut tree = sample();
        let before = tree.lookup("g1").unwrap();
        let after = tree.add(desc("g1", Some("grid")).focusable(false));
        assert_eq!(before, after);
        assert_eq!(tree.len(), 5);
        assert!(!tree.is_focusable(after));
        assert_eq!(tree.children("grid"), vec!["g1", "g2"]);
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let mut tree = sample();
        tree.add(desc("extra", Some("page")).track_children(true).preferred_child("x"));
        tree.update(
            "extra",
            NodeUpdate {
                focusable: Some(false),
                ..Default::default()
            },
        );
        let node = tree.get_by_id("extra").unwrap();
        assert!(!node.focusable());
        assert!(node.track_children());
        assert!(node.auto_restore_focus());
        assert_eq!(node.preferred_child_id.as_deref(), Some("x"));
        assert_eq!(node.parent_id.as_deref(), Some("page"));
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut tree = sample();
        assert!(tree.update("ghost", NodeUpdate::default()).is_none());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn update_can_move_node() {
        let mut tree = sample();
        tree.update(
            "g2",
            NodeUpdate {
                parent_id: Some(Some("page".into())),
                ..Default::default()
            },
        );
        assert_eq!(tree.children("page"), vec!["menu", "grid", "g2"]);
        assert_eq!(tree.children("grid"), vec!["g1"]);
    }

    #[test]
    fn update_rejects_cycles() {
        let mut tree = sample();
        tree.update(
            "page",
            NodeUpdate {
                parent_id: Some(Some("g1".into())),
                ..Default::default()
            },
        );
        assert_eq!(tree.get_by_id("page").unwrap().parent_id, None);
        let g1 = tree.lookup("g1").unwrap();
        let page = tree.lookup("page").unwrap();
        assert!(tree.is_descendant_of(g1, page));
    }

    #[test]
    fn remove_reparents_children_to_former_parent() {
        let mut tree = sample();
        let removed = tree.remove("grid").unwrap();
        assert_eq!(removed.record.id, "grid");
        assert_eq!(removed.parent, tree.lookup("page"));
        assert_eq!(tree.children("page"), vec!["menu", "g1", "g2"]);
        assert_eq!(tree.get_by_id("g1").unwrap().parent_id.as_deref(), Some("page"));
        assert!(!tree.contains("grid"));
    }

    #[test]
    fn remove_root_level_node_promotes_children_to_roots() {
        let mut tree = sample();
        tree.remove("page");
        let menu = tree.lookup("menu").unwrap();
        assert_eq!(tree.parent(menu), None);
        assert_eq!(tree.get_by_id("menu").unwrap().parent_id, None);
        let grid = tree.lookup("grid").unwrap();
        assert_eq!(tree.siblings(menu), vec![grid]);
    }

    #[test]
    fn remove_clears_last_focused_child_pointers() {
        let mut tree = sample();
        let g2 = tree.lookup("g2").unwrap();
        tree.record_focus_path(g2);
        assert_eq!(tree.last_focused_child_id("grid"), Some("g2"));
        assert_eq!(tree.last_focused_child_id("page"), Some("grid"));

        tree.remove("g2");
        assert_eq!(tree.last_focused_child_id("grid"), None);
        assert_eq!(tree.last_focused_child_id("page"), Some("grid"));
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut tree = sample();
        assert!(tree.remove("ghost").is_none());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn child_registered_before_parent_is_adopted() {
        let mut tree = FocusTree::new();
        tree.add(desc("a", Some("later")));
        tree.add(desc("b", Some("later")));
        tree.add(desc("other", None));
        let a = tree.lookup("a").unwrap();
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.siblings(a), vec![tree.lookup("b").unwrap()]);

        tree.add(desc("later", None));
        assert_eq!(tree.children("later"), vec!["a", "b"]);
        assert_eq!(tree.parent(a), tree.lookup("later"));
    }

    #[test]
    fn late_parent_naming_its_waiting_child_stays_acyclic() {
        let mut tree = FocusTree::new();
        tree.add(desc("o", Some("x")));
        tree.add(desc("x", Some("o")));
        let o = tree.lookup("o").unwrap();
        let x = tree.lookup("x").unwrap();

        assert_eq!(tree.parent(x), Some(o));
        assert_eq!(tree.parent(o), None);
        assert!(!tree.is_descendant_of(o, x));
        assert_eq!(tree.ancestors(x).collect::<Vec<_>>(), vec![o]);
        assert_eq!(tree.ancestors(o).count(), 0);
        tree.record_focus_path(x);
        assert_eq!(tree.last_focused_child_id("o"), Some("x"));
        assert!(tree.draw_tree().contains("(awaiting parent)"));

        tree.remove("o");
        assert_eq!(tree.get_by_id("x").unwrap().parent_id, None);
        assert_eq!(tree.parent(x), None);
        assert!(!tree.draw_tree().contains("(awaiting parent)"));
    }

    #[test]
    fn add_refuses_cyclic_parent_and_keeps_the_old_one() {
        let mut tree = sample();
        tree.add(desc("grid", Some("g1")).focusable(false));
        assert_eq!(tree.get_by_id("grid").unwrap().parent_id.as_deref(), Some("page"));
        assert_eq!(tree.children("page"), vec!["menu", "grid"]);
        assert_eq!(tree.children("grid"), vec!["g1", "g2"]);

        tree.remove("page");
        assert_eq!(tree.get_by_id("grid").unwrap().parent_id, None);
        assert_eq!(tree.parent(tree.lookup("grid").unwrap()), None);
    }

    #[test]
    fn add_refuses_self_parent() {
        let mut tree = FocusTree::new();
        tree.add(desc("loop", Some("loop")));
        let node = tree.lookup("loop").unwrap();
        assert_eq!(tree.get_by_id("loop").unwrap().parent_id, None);
        assert_eq!(tree.parent(node), None);
        assert_eq!(tree.ancestors(node).count(), 0);
    }

    #[test]
    fn ancestors_nearest_first() {
        let tree = sample();
        let g1 = tree.lookup("g1").unwrap();
        let ids: Vec<_> = tree.ancestors(g1).filter_map(|n| tree.id_of(n)).collect();
        assert_eq!(ids, vec!["grid", "page"]);
    }

    #[test]
    fn draw_tree_lists_every_node() {
        let tree = sample();
        let drawn = tree.draw_tree();
        for id in ["page", "menu", "grid", "g1", "g2"] {
            assert!(drawn.contains(id), "{id} missing from:\n{drawn}");
        }
    }
}
