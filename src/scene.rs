//! Static scenes for driving the engine without a UI toolkit.
//!
//! A scene is a TOML file listing nodes with fixed boxes:
//!
//! ```toml
//! focus = "menu"
//!
//! [[node]]
//! id = "menu"
//! focusable = false
//! rect = { left = 0, top = 0, width = 100, height = 20 }
//!
//! [[node]]
//! id = "home"
//! parent = "menu"
//! rect = { left = 0, top = 0, width = 40, height = 20 }
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::bail;
use serde::Deserialize;

use crate::common::collections::HashSet;
use crate::common::config::Settings;
use crate::engine::SpatialNavigation;
use crate::input::KeyDetails;
use crate::model::{NodeDescriptor, NodeHandle, Rect};
use crate::navigation::{FocusDetails, FocusHandler, HandlerContext};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SceneNode {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub rect: Rect,
    #[serde(default = "yes")]
    pub focusable: bool,
    #[serde(default)]
    pub focus_boundary: bool,
    #[serde(default)]
    pub track_children: bool,
    #[serde(default = "yes")]
    pub auto_restore_focus: bool,
    #[serde(default = "yes")]
    pub save_last_focused_child: bool,
    #[serde(default)]
    pub preferred_child: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Node to focus once everything is registered.
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default, rename = "node")]
    pub nodes: Vec<SceneNode>,
}

fn yes() -> bool { true }

impl Scene {
    pub fn read(path: &Path) -> anyhow::Result<Scene> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Scene> {
        let scene: Scene = toml::from_str(buf)?;
        let mut ids = HashSet::default();
        for node in &scene.nodes {
            if !ids.insert(node.id.as_str()) {
                bail!("node `{}` is defined twice", node.id);
            }
        }
        for node in &scene.nodes {
            if let Some(parent) = &node.parent
                && !ids.contains(parent.as_str())
            {
                bail!("node `{}` names unknown parent `{parent}`", node.id);
            }
        }
        if let Some(focus) = &scene.focus
            && !ids.contains(focus.as_str())
        {
            bail!("initial focus `{focus}` is not a node");
        }
        Ok(scene)
    }

    /// Builds an initialized engine with every node registered and the
    /// initial focus applied. Callbacks are recorded into `events`.
    pub fn build(&self, settings: Settings, events: &EventLog) -> SpatialNavigation {
        let boxes: Vec<Rect> = self.nodes.iter().map(|node| node.rect).collect();
        let provider =
            move |handle: NodeHandle| boxes.get(handle.0 as usize).copied().unwrap_or_default();
        let mut nav = SpatialNavigation::new(provider);
        nav.initialize(settings);
        for (index, node) in self.nodes.iter().enumerate() {
            nav.register(node.descriptor(NodeHandle(index as u64)).handler(events.clone()));
        }
        if let Some(focus) = &self.focus {
            nav.set_focus(focus, FocusDetails::default());
        }
        nav
    }
}

impl SceneNode {
    pub fn descriptor(&self, handle: NodeHandle) -> NodeDescriptor {
        let mut descriptor = NodeDescriptor::new(self.id.clone(), handle)
            .focusable(self.focusable)
            .focus_boundary(self.focus_boundary)
            .track_children(self.track_children)
            .auto_restore_focus(self.auto_restore_focus)
            .save_last_focused_child(self.save_last_focused_child);
        if let Some(parent) = &self.parent {
            descriptor = descriptor.parent(parent.clone());
        }
        if let Some(preferred) = &self.preferred_child {
            descriptor = descriptor.preferred_child(preferred.clone());
        }
        descriptor
    }
}

/// Handler that records callbacks as readable lines.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    pub fn take(&self) -> Vec<String> { std::mem::take(&mut *self.0.borrow_mut()) }

    fn push(&self, cx: &HandlerContext<'_>, event: &str) {
        self.0.borrow_mut().push(format!("{event} {}", cx.node_id()));
    }
}

impl FocusHandler for EventLog {
    fn on_focus(&mut self, cx: &mut HandlerContext<'_>, _layout: Rect, _details: &FocusDetails) {
        self.push(cx, "focus");
    }

    fn on_blur(&mut self, cx: &mut HandlerContext<'_>, _layout: Rect, _details: &FocusDetails) {
        self.push(cx, "blur");
    }

    fn on_has_focused_child_changed(&mut self, cx: &mut HandlerContext<'_>, has: bool) {
        self.push(cx, if has { "enter" } else { "leave" });
    }

    fn on_activate_press(&mut self, cx: &mut HandlerContext<'_>, _details: &KeyDetails) {
        self.push(cx, "activate");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Direction;

    const MENU: &str = r#"
        focus = "bar"

        [[node]]
        id = "bar"
        focusable = false
        track_children = true
        rect = { left = 0, top = 0, width = 300, height = 40 }

        [[node]]
        id = "home"
        parent = "bar"
        rect = { left = 0, top = 0, width = 100, height = 40 }

        [[node]]
        id = "search"
        parent = "bar"
        rect = { left = 100, top = 0, width = 100, height = 40 }
    "#;

    #[test]
    fn parses_and_builds() {
        let scene = Scene::parse(MENU).unwrap();
        assert_eq!(scene.nodes.len(), 3);
        assert!(!scene.nodes[0].focusable);
        assert!(scene.nodes[1].auto_restore_focus);

        let events = EventLog::default();
        let mut nav = scene.build(Settings::default(), &events);
        assert_eq!(nav.current_focus_id(), Some("home"));
        assert_eq!(events.take(), vec!["focus home", "enter bar"]);

        nav.navigate_by_direction(Direction::Right, FocusDetails::default());
        assert_eq!(nav.current_focus_id(), Some("search"));
        assert_eq!(events.take(), vec!["blur home", "focus search"]);
    }

    #[test]
    fn rejects_unknown_parent() {
        let err = Scene::parse(
            r#"
            [[node]]
            id = "a"
            parent = "b"
            rect = { left = 0, top = 0, width = 1, height = 1 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown parent `b`"), "{err}");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Scene::parse(
            r#"
            [[node]]
            id = "a"
            rect = { left = 0, top = 0, width = 1, height = 1 }
            [[node]]
            id = "a"
            rect = { left = 0, top = 0, width = 1, height = 1 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("defined twice"), "{err}");
    }

    #[test]
    fn rejects_unknown_initial_focus() {
        assert!(Scene::parse("focus = \"nope\"\n").is_err());
    }
}
