use slotmap::SecondaryMap;
use tracing::trace;

use crate::model::focus_tree::FocusTree;
use crate::model::geometry::Rect;
use crate::model::node::NodeHandle;
use crate::model::tree::NodeId;

/// Measures the on-screen box of a node. Supplied by the host; the engine
/// never performs layout itself.
pub trait LayoutProvider {
    fn measure(&self, handle: NodeHandle) -> Rect;
}

impl<F> LayoutProvider for F
where F: Fn(NodeHandle) -> Rect
{
    fn measure(&self, handle: NodeHandle) -> Rect { self(handle) }
}

#[derive(Clone, Copy, Debug, Default)]
struct CachedLayout {
    rect: Rect,
    valid: bool,
}

/// Per-node cached boxes. A box is measured at most once between two
/// invalidations.
pub struct LayoutCache {
    provider: Box<dyn LayoutProvider>,
    boxes: SecondaryMap<NodeId, CachedLayout>,
}

impl LayoutCache {
    pub fn new(provider: impl LayoutProvider + 'static) -> Self {
        LayoutCache {
            provider: Box::new(provider),
            boxes: SecondaryMap::new(),
        }
    }

    /// Cached box for `node`, measuring it first if the cached one is stale.
    /// Unknown nodes report an empty box.
    pub fn get(&mut self, tree: &FocusTree, node: NodeId) -> Rect {
        if let Some(cached) = self.boxes.get(node)
            && cached.valid
        {
            return cached.rect;
        }
        let Some(record) = tree.get(node) else {
            return Rect::default();
        };
        let rect = self.provider.measure(record.handle);
        trace!(id = %record.id, %rect, "measured layout");
        self.boxes.insert(node, CachedLayout { rect, valid: true });
        rect
    }

    pub fn invalidate(&mut self, node: NodeId) {
        if let Some(cached) = self.boxes.get_mut(node) {
            cached.valid = false;
        }
    }

    pub fn invalidate_all(&mut self) {
        for (_, cached) in self.boxes.iter_mut() {
            cached.valid = false;
        }
    }

    pub fn forget(&mut self, node: NodeId) { self.boxes.remove(node); }

    pub fn clear(&mut self) { self.boxes.clear(); }

    /// Invalidates every box and measures every registered node again.
    pub fn recompute_all(&mut self, tree: &FocusTree) {
        self.invalidate_all();
        let nodes: Vec<_> = tree.iter().map(|(node, _)| node).collect();
        for node in nodes {
            self.get(tree, node);
        }
    }
}
