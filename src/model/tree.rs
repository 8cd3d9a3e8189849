//! Arena that holds the structure of the focus forest.
//!
//! Nodes carry only structural links. Everything else about a node lives in
//! secondary maps keyed by [`NodeId`], so the links never own their
//! neighbours and no reference cycle can form.

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Represents a node somewhere in the forest.
    pub struct NodeId;
}

#[derive(Default, PartialEq, Debug)]
pub struct Node {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

#[derive(Default)]
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

impl NodeMap {
    pub fn new() -> NodeMap { NodeMap::default() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    /// Adds a detached node to the forest.
    pub fn mk_node(&mut self) -> NodeId { self.map.insert(Node::default()) }

    /// Removes a node from the forest. Its children become roots.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.unlink(id);
        let children: Vec<_> = id.children(self).collect();
        for child in children {
            self.unlink(child);
        }
        self.map.remove(id);
    }

    /// Moves `id` to the end of `parent`'s children, detaching it from any
    /// previous parent first.
    pub fn push_back(&mut self, id: NodeId, parent: NodeId) {
        if id == parent || !self.contains(id) || !self.contains(parent) {
            return;
        }
        debug_assert!(
            !parent.ancestors(self).any(|a| a == id),
            "push_back would create a cycle"
        );
        self.unlink(id);

        let prev_child = {
            let parent_node = &mut self.map[parent];
            parent_node.first_child.get_or_insert(id);
            parent_node.last_child.replace(id)
        };
        self.map[id].parent = Some(parent);
        if let Some(prev) = prev_child {
            self.map[prev].next_sibling = Some(id);
            self.map[id].prev_sibling = Some(prev);
        }
    }

    pub(crate) fn unlink(&mut self, id: NodeId) {
        let Some((prev_sibling, next_sibling, parent)) =
            self.map.get(id).map(|n| (n.prev_sibling, n.next_sibling, n.parent))
        else {
            return;
        };
        if let Some(prev) = prev_sibling
            && let Some(prev_node) = self.map.get_mut(prev)
        {
            prev_node.next_sibling = next_sibling;
        }
        if let Some(next) = next_sibling
            && let Some(next_node) = self.map.get_mut(next)
        {
            next_node.prev_sibling = prev_sibling;
        }
        if let Some(parent) = parent
            && let Some(parent_node) = self.map.get_mut(parent)
        {
            if parent_node.first_child == Some(id) {
                parent_node.first_child = next_sibling;
            }
            if parent_node.last_child == Some(id) {
                parent_node.last_child = prev_sibling;
            }
        }
        if let Some(node) = self.map.get_mut(id) {
            node.prev_sibling = None;
            node.next_sibling = None;
            node.parent = None;
        }
    }
}

impl NodeId {
    pub fn parent(self, map: &NodeMap) -> Option<NodeId> { map.map.get(self).and_then(|n| n.parent) }

    pub fn children(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = map.map.get(self).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let id = cur?;
            cur = map.map.get(id).and_then(|n| n.next_sibling);
            Some(id)
        })
    }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self).filter(|id| map.contains(*id));
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    /// Whether `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(self, ancestor: NodeId, map: &NodeMap) -> bool {
        self != ancestor && self.ancestors(map).any(|a| a == ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///        root
    ///       /  |  \
    /// child1 child2 child3
    ///          |
    ///         gc1
    /// ```
    struct TestTree {
        map: NodeMap,
        root: NodeId,
        child1: NodeId,
        child2: NodeId,
        child3: NodeId,
        gc1: NodeId,
    }

    impl TestTree {
        #[rustfmt::skip]
        fn new() -> Self {
            let mut map = NodeMap::new();
            let root = map.mk_node();
            let child1 = map.mk_node();
            let child2 = map.mk_node();
            let child3 = map.mk_node();
            let gc1 = map.mk_node();
            map.push_back(child1, root);
            map.push_back(child2, root);
            map.push_back(child3, root);
            map.push_back(gc1, child2);
            TestTree { map, root, child1, child2, child3, gc1 }
        }

        fn children(&self, node: NodeId) -> Vec<NodeId> { node.children(&self.map).collect() }

        #[track_caller]
        fn assert_children_are(&self, children: &[NodeId], parent: NodeId) {
            assert_eq!(children, self.children(parent), "children did not match");
            for child in children {
                assert_eq!(child.parent(&self.map), Some(parent), "child has incorrect parent");
            }
        }
    }

    #[test]
    fn iterator() {
        let t = TestTree::new();
        t.assert_children_are(&[t.child1, t.child2, t.child3], t.root);
        t.assert_children_are(&[t.gc1], t.child2);
        assert!(t.children(t.child1).is_empty());
        assert!(t.children(t.gc1).is_empty());
    }

    #[test]
    fn ancestors() {
        let t = TestTree::new();
        let ancestors = |node: NodeId| node.ancestors(&t.map).collect::<Vec<_>>();
        assert_eq!([t.gc1, t.child2, t.root], *ancestors(t.gc1));
        assert_eq!([t.child1, t.root], *ancestors(t.child1));
        assert_eq!([t.root], *ancestors(t.root));
        assert!(t.gc1.is_descendant_of(t.root, &t.map));
        assert!(!t.root.is_descendant_of(t.root, &t.map));
        assert!(!t.child1.is_descendant_of(t.child2, &t.map));
    }

    #[test]
    fn push_back_moves_between_parents() {
        let mut t = TestTree::new();
        t.map.push_back(t.child2, t.child3);
        t.assert_children_are(&[t.child1, t.child3], t.root);
        t.assert_children_are(&[t.child2], t.child3);
        t.assert_children_are(&[t.gc1], t.child2);
    }

    #[test]
    fn unlink_middle_child() {
        let mut t = TestTree::new();
        t.map.unlink(t.child2);
        t.assert_children_are(&[t.child1, t.child3], t.root);
        assert_eq!(t.child2.parent(&t.map), None);
    }

    #[test]
    fn remove_orphans_children() {
        let mut t = TestTree::new();
        t.map.remove(t.child2);
        assert!(!t.map.contains(t.child2));
        t.assert_children_are(&[t.child1, t.child3], t.root);
        assert_eq!(t.gc1.parent(&t.map), None);
        assert!(t.map.contains(t.gc1));
    }

    #[test]
    fn stale_ids_are_inert() {
        let mut t = TestTree::new();
        t.map.remove(t.child1);
        assert_eq!(t.child1.ancestors(&t.map).count(), 0);
        assert_eq!(t.child1.children(&t.map).count(), 0);
        t.map.push_back(t.child1, t.root);
        t.assert_children_are(&[t.child2, t.child3], t.root);
    }
}
