//! Per-node callback capability and the context callbacks run in.

use std::collections::VecDeque;

use tracing::debug;

use crate::engine::SpatialNavigation;
use crate::input::KeyDetails;
use crate::model::{Direction, FocusNode, FocusTree, NodeId, Rect};

/// Callbacks the engine emits to the UI binding for one node. Every method
/// has a no-op default, so a binding implements only what it listens to.
pub trait FocusHandler {
    fn on_focus(&mut self, _cx: &mut HandlerContext<'_>, _layout: Rect, _details: &FocusDetails) {}

    fn on_blur(&mut self, _cx: &mut HandlerContext<'_>, _layout: Rect, _details: &FocusDetails) {}

    fn on_focused_changed(&mut self, _cx: &mut HandlerContext<'_>, _focused: bool) {}

    /// Only emitted for nodes registered with `track_children`.
    fn on_has_focused_child_changed(&mut self, _cx: &mut HandlerContext<'_>, _has: bool) {}

    fn on_activate_press(&mut self, _cx: &mut HandlerContext<'_>, _details: &KeyDetails) {}

    fn on_activate_release(&mut self, _cx: &mut HandlerContext<'_>) {}

    /// Returning `false` suppresses default navigation for this key event.
    fn on_arrow_press(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _direction: Direction,
        _details: &KeyDetails,
    ) -> bool {
        true
    }

    /// Names a node to focus instead of running geometric navigation.
    fn navigate_override(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _direction: Direction,
    ) -> Option<String> {
        None
    }
}

impl FocusHandler for () {}

/// Extra information passed along with a focus change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusDetails {
    /// Key event that caused the change.
    pub key: Option<KeyDetails>,
    /// Set for directional moves.
    pub direction: Option<Direction>,
    /// Caller-supplied payload, passed through untouched.
    pub extra: Option<serde_json::Value>,
}

/// Work a callback asked for. Runs after the callback returns, before the
/// public call that triggered it returns.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Request {
    SetFocus(String, FocusDetails),
    Navigate(Direction, FocusDetails),
}

/// Read access to the engine plus a queue for follow-up focus requests.
pub struct HandlerContext<'a> {
    pub(crate) tree: &'a FocusTree,
    pub(crate) node: NodeId,
    pub(crate) current_focus: Option<NodeId>,
    pub(crate) requests: &'a mut VecDeque<Request>,
}

impl HandlerContext<'_> {
    /// Id of the node whose callback is running.
    pub fn node_id(&self) -> &str { self.tree.id_of(self.node).unwrap_or_default() }

    pub fn current_focus_id(&self) -> Option<&str> {
        self.current_focus.and_then(|node| self.tree.id_of(node))
    }

    pub fn node_exists(&self, id: &str) -> bool { self.tree.contains(id) }

    pub fn node(&self, id: &str) -> Option<&FocusNode> { self.tree.get_by_id(id) }

    pub fn set_focus(&mut self, id: impl Into<String>, details: FocusDetails) {
        self.requests.push_back(Request::SetFocus(id.into(), details));
    }

    pub fn navigate(&mut self, direction: Direction, details: FocusDetails) {
        self.requests.push_back(Request::Navigate(direction, details));
    }
}

impl SpatialNavigation {
    /// Runs `f` against `node`'s handler. Returns `None` without calling
    /// anything when the node has been unregistered in the meantime.
    pub(crate) fn dispatch<R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut dyn FocusHandler, &mut HandlerContext<'_>) -> R,
    ) -> Option<R> {
        let Some(mut handler) = self.tree.take_handler(node) else {
            debug!(?node, "dropping callback for a node that is gone");
            return None;
        };
        let mut cx = HandlerContext {
            tree: &self.tree,
            node,
            current_focus: self.focus.current,
            requests: &mut self.requests,
        };
        let result = f(handler.as_mut(), &mut cx);
        self.tree.restore_handler(node, handler);
        Some(result)
    }
}
