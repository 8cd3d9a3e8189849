use tracing::trace;

use crate::model::{FocusTree, LayoutCache, NodeId};

/// Turns a focus request for a container into the leaf that should actually
/// receive focus.
pub struct LeafResolver<'a> {
    tree: &'a FocusTree,
    layouts: &'a mut LayoutCache,
}

impl<'a> LeafResolver<'a> {
    pub fn new(tree: &'a FocusTree, layouts: &'a mut LayoutCache) -> Self {
        LeafResolver { tree, layouts }
    }

    /// Resolves `target` by id. An unknown id keeps `previous`.
    pub fn resolve_id(&mut self, target: &str, previous: Option<NodeId>) -> Option<NodeId> {
        match self.tree.lookup(target) {
            Some(node) => Some(self.resolve(node)),
            None => {
                trace!(%target, "focus target is not registered");
                previous
            }
        }
    }

    /// Walks down from `target` until reaching a node with no focusable
    /// children. Each step goes strictly deeper, so the walk terminates.
    pub fn resolve(&mut self, target: NodeId) -> NodeId {
        let mut current = target;
        while let Some(next) = self.next_step(current) {
            current = next;
        }
        current
    }

    fn next_step(&mut self, node: NodeId) -> Option<NodeId> {
        let children: Vec<NodeId> = self.tree.focusable_children(node).collect();
        if children.is_empty() {
            return None;
        }
        let record = self.tree.get(node)?;

        if record.save_last_focused_child()
            && let Some(last) = self.tree.last_focused_child(node)
            && self.is_participating_descendant(last, node)
        {
            return Some(last);
        }
        if let Some(preferred) = record.preferred_child_id.as_deref().and_then(|id| self.tree.lookup(id))
            && self.is_participating_descendant(preferred, node)
        {
            return Some(preferred);
        }

        // Closest to the page origin; the first registered wins a tie.
        children
            .into_iter()
            .map(|child| (child, self.layouts.get(self.tree, child).origin_distance()))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(child, _)| child)
    }

    fn is_participating_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node != ancestor && self.tree.is_focusable(node) && self.tree.is_descendant_of(node, ancestor)
    }
}
