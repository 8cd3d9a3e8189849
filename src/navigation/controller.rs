//! Commits focus changes and emits the callbacks that go with them.

use tracing::{debug, trace};

use crate::engine::SpatialNavigation;
use crate::model::NodeId;
use crate::navigation::handler::FocusDetails;
use crate::navigation::leaf::LeafResolver;

/// Which node holds focus, and which of its ancestors were told about it.
#[derive(Debug, Default)]
pub struct FocusController {
    pub(crate) enabled: bool,
    pub(crate) current: Option<NodeId>,
    /// Ancestors of `current`, nearest first.
    pub(crate) focused_ancestors: Vec<NodeId>,
}

impl FocusController {
    pub fn current(&self) -> Option<NodeId> { self.current }

    pub fn focused_ancestors(&self) -> &[NodeId] { &self.focused_ancestors }
}

impl SpatialNavigation {
    /// Resolves `target` down to a leaf and moves focus there.
    pub(crate) fn focus_target(&mut self, target: &str, details: &FocusDetails) {
        if !self.focus.enabled {
            debug!(%target, "focus request while disabled");
            return;
        }
        let previous = self.focus.current;
        let resolved = LeafResolver::new(&self.tree, &mut self.layouts).resolve_id(target, previous);
        self.commit_focus(resolved, details);
    }

    /// Like [`Self::focus_target`] for a node already known to be registered.
    pub(crate) fn focus_node(&mut self, target: NodeId, details: &FocusDetails) {
        if !self.focus.enabled {
            return;
        }
        let resolved = LeafResolver::new(&self.tree, &mut self.layouts).resolve(target);
        self.commit_focus(Some(resolved), details);
    }

    pub(crate) fn commit_focus(&mut self, resolved: Option<NodeId>, details: &FocusDetails) {
        if resolved == self.focus.current {
            return;
        }
        let from = self.focus.current.and_then(|n| self.tree.id_of(n));
        let to = resolved.and_then(|n| self.tree.id_of(n));
        if self.settings.debug_logging {
            debug!(?from, ?to, "moving focus");
        } else {
            trace!(?from, ?to, "moving focus");
        }

        if let Some(previous) = self.focus.current
            && self.tree.is_focusable(previous)
        {
            let layout = self.layouts.get(&self.tree, previous);
            self.dispatch(previous, |handler, cx| {
                handler.on_focused_changed(cx, false);
                handler.on_blur(cx, layout, details);
            });
        }

        self.focus.current = resolved;

        // A node adopted as a leaf despite not being focusable gets no callbacks.
        if let Some(node) = resolved
            && self.tree.is_focusable(node)
        {
            let layout = self.layouts.get(&self.tree, node);
            self.dispatch(node, |handler, cx| {
                handler.on_focused_changed(cx, true);
                handler.on_focus(cx, layout, details);
            });
        }

        self.sync_focused_ancestors(details);
        if let Some(node) = resolved {
            self.tree.record_focus_path(node);
        }
    }

    /// Drops focus without blurring the old node, which is already gone.
    pub(crate) fn clear_focus(&mut self, details: &FocusDetails) {
        self.focus.current = None;
        self.sync_focused_ancestors(details);
    }

    /// Diffs the ancestor chain of the current focus against the one last
    /// reported and emits callbacks for the nodes that left or joined it.
    pub(crate) fn sync_focused_ancestors(&mut self, details: &FocusDetails) {
        let chain: Vec<NodeId> = match self.focus.current {
            Some(node) => self.tree.ancestors(node).collect(),
            None => vec![],
        };
        let leaving: Vec<NodeId> =
            self.focus.focused_ancestors.iter().filter(|n| !chain.contains(n)).copied().collect();
        let joining: Vec<NodeId> =
            chain.iter().filter(|n| !self.focus.focused_ancestors.contains(n)).copied().collect();

        for node in leaving {
            self.notify_ancestor(node, false, details);
        }
        for node in joining {
            self.notify_ancestor(node, true, details);
        }
        self.focus.focused_ancestors = chain;
    }

    fn notify_ancestor(&mut self, node: NodeId, has_focus: bool, details: &FocusDetails) {
        let Some(record) = self.tree.get(node) else {
            return;
        };
        let track_children = record.track_children();
        let focusable = record.focusable();
        trace!(id = %record.id, has_focus, "focused child changed");
        let layout = focusable.then(|| self.layouts.get(&self.tree, node));
        self.dispatch(node, |handler, cx| {
            if track_children {
                handler.on_has_focused_child_changed(cx, has_focus);
            }
            if let Some(layout) = layout {
                if has_focus {
                    handler.on_focus(cx, layout, details);
                } else {
                    handler.on_blur(cx, layout, details);
                }
            }
        });
    }
}
