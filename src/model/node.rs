use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::tree::NodeId;
use crate::navigation::FocusHandler;

/// Opaque handle the UI binding uses to identify its own element. The engine
/// only hands it back to the layout provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        const FOCUSABLE = 1 << 0;
        const FOCUS_BOUNDARY = 1 << 1;
        const TRACK_CHILDREN = 1 << 2;
        const AUTO_RESTORE_FOCUS = 1 << 3;
        const SAVE_LAST_FOCUSED_CHILD = 1 << 4;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::FOCUSABLE | NodeFlags::AUTO_RESTORE_FOCUS | NodeFlags::SAVE_LAST_FOCUSED_CHILD
    }
}

/// A registered focusable or grouping region.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusNode {
    pub id: String,
    /// Parent as requested by the binding. `None` means the root.
    pub parent_id: Option<String>,
    pub handle: NodeHandle,
    pub flags: NodeFlags,
    pub preferred_child_id: Option<String>,
    pub(crate) last_focused_child: Option<NodeId>,
}

impl FocusNode {
    pub fn focusable(&self) -> bool { self.flags.contains(NodeFlags::FOCUSABLE) }

    pub fn is_focus_boundary(&self) -> bool { self.flags.contains(NodeFlags::FOCUS_BOUNDARY) }

    pub fn track_children(&self) -> bool { self.flags.contains(NodeFlags::TRACK_CHILDREN) }

    pub fn auto_restore_focus(&self) -> bool { self.flags.contains(NodeFlags::AUTO_RESTORE_FOCUS) }

    pub fn save_last_focused_child(&self) -> bool {
        self.flags.contains(NodeFlags::SAVE_LAST_FOCUSED_CHILD)
    }
}

/// Everything the UI binding supplies when it mounts a node.
pub struct NodeDescriptor {
    pub id: String,
    pub parent_id: Option<String>,
    pub handle: NodeHandle,
    pub flags: NodeFlags,
    pub preferred_child_id: Option<String>,
    pub handler: Box<dyn FocusHandler>,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<String>, handle: NodeHandle) -> Self {
        NodeDescriptor {
            id: id.into(),
            parent_id: None,
            handle,
            flags: NodeFlags::default(),
            preferred_child_id: None,
            handler: Box::new(()),
        }
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn focusable(self, on: bool) -> Self { self.flag(NodeFlags::FOCUSABLE, on) }

    pub fn focus_boundary(self, on: bool) -> Self { self.flag(NodeFlags::FOCUS_BOUNDARY, on) }

    pub fn track_children(self, on: bool) -> Self { self.flag(NodeFlags::TRACK_CHILDREN, on) }

    pub fn auto_restore_focus(self, on: bool) -> Self { self.flag(NodeFlags::AUTO_RESTORE_FOCUS, on) }

    pub fn save_last_focused_child(self, on: bool) -> Self {
        self.flag(NodeFlags::SAVE_LAST_FOCUSED_CHILD, on)
    }

    pub fn preferred_child(mut self, id: impl Into<String>) -> Self {
        self.preferred_child_id = Some(id.into());
        self
    }

    pub fn handler(mut self, handler: impl FocusHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    fn flag(mut self, flag: NodeFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("handle", &self.handle)
            .field("flags", &self.flags)
            .field("preferred_child_id", &self.preferred_child_id)
            .finish_non_exhaustive()
    }
}

/// Partial refresh sent by the binding on re-render. `None` keeps the stored
/// value; nothing is cleared by omission.
#[derive(Default)]
pub struct NodeUpdate {
    /// `Some(None)` moves the node to the root.
    pub parent_id: Option<Option<String>>,
    pub handle: Option<NodeHandle>,
    pub focusable: Option<bool>,
    pub focus_boundary: Option<bool>,
    pub track_children: Option<bool>,
    pub auto_restore_focus: Option<bool>,
    pub save_last_focused_child: Option<bool>,
    /// `Some(None)` clears the preferred child.
    pub preferred_child_id: Option<Option<String>>,
    pub handler: Option<Box<dyn FocusHandler>>,
}

impl NodeUpdate {
    pub(crate) fn apply_flags(&self, flags: &mut NodeFlags) {
        let fields = [
            (self.focusable, NodeFlags::FOCUSABLE),
            (self.focus_boundary, NodeFlags::FOCUS_BOUNDARY),
            (self.track_children, NodeFlags::TRACK_CHILDREN),
            (self.auto_restore_focus, NodeFlags::AUTO_RESTORE_FOCUS),
            (self.save_last_focused_child, NodeFlags::SAVE_LAST_FOCUSED_CHILD),
        ];
        for (value, flag) in fields {
            if let Some(on) = value {
                flags.set(flag, on);
            }
        }
    }
}

impl fmt::Debug for NodeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeUpdate")
            .field("parent_id", &self.parent_id)
            .field("handle", &self.handle)
            .field("focusable", &self.focusable)
            .field("focus_boundary", &self.focus_boundary)
            .field("track_children", &self.track_children)
            .field("auto_restore_focus", &self.auto_restore_focus)
            .field("save_last_focused_child", &self.save_last_focused_child)
            .field("preferred_child_id", &self.preferred_child_id)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let d = NodeDescriptor::new("a", NodeHandle(1));
        assert!(d.flags.contains(NodeFlags::FOCUSABLE));
        assert!(d.flags.contains(NodeFlags::AUTO_RESTORE_FOCUS));
        assert!(d.flags.contains(NodeFlags::SAVE_LAST_FOCUSED_CHILD));
        assert!(!d.flags.contains(NodeFlags::FOCUS_BOUNDARY));
        assert!(!d.flags.contains(NodeFlags::TRACK_CHILDREN));
        assert_eq!(d.parent_id, None);
    }

    #[test]
    fn descriptor_builder_sets_flags() {
        let d = NodeDescriptor::new("a", NodeHandle(1))
            .parent("root")
            .focusable(false)
            .focus_boundary(true)
            .track_children(true);
        assert_eq!(d.parent_id.as_deref(), Some("root"));
        assert!(!d.flags.contains(NodeFlags::FOCUSABLE));
        assert!(d.flags.contains(NodeFlags::FOCUS_BOUNDARY | NodeFlags::TRACK_CHILDREN));
    }

    #[test]
    fn update_only_touches_supplied_flags() {
        let mut flags = NodeFlags::default() | NodeFlags::TRACK_CHILDREN;
        let update = NodeUpdate {
            focusable: Some(false),
            ..Default::default()
        };
        update.apply_flags(&mut flags);
        assert!(!flags.contains(NodeFlags::FOCUSABLE));
        assert!(flags.contains(NodeFlags::TRACK_CHILDREN));
        assert!(flags.contains(NodeFlags::AUTO_RESTORE_FOCUS));
    }
}
