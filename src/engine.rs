//! The spatial navigation engine.
//!
//! [`SpatialNavigation`] owns the focus tree, the layout cache, the focus
//! state and the input state. Hosts construct one per independent UI, feed it
//! node lifecycle events and key events, and receive callbacks through each
//! node's [`FocusHandler`](crate::navigation::FocusHandler).
//!
//! Every public call runs to completion synchronously. Focus requests made
//! from inside callbacks are queued and handled, in order, before the call
//! that triggered them returns.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::common::config::{Settings, ThrottleSettings};
use crate::input::{Action, InputDispatcher, KeyBinding, KeyMap};
use crate::model::{
    Direction, FocusNode, FocusTree, LayoutCache, LayoutProvider, NodeDescriptor, NodeId,
    NodeUpdate, Rect,
};
use crate::navigation::{
    DirectionalResolver, FocusController, FocusDetails, NavigationTrace, Request,
};


pub struct SpatialNavigation {
    pub(crate) tree: FocusTree,
    pub(crate) layouts: LayoutCache,
    pub(crate) focus: FocusController,
    pub(crate) input: InputDispatcher,
    pub(crate) settings: Settings,
    pub(crate) requests: VecDeque<Request>,
    last_trace: Option<NavigationTrace>,
}

impl SpatialNavigation {
    /// Creates a disabled engine. Call [`Self::initialize`] before use.
    pub fn new(provider: impl LayoutProvider + 'static) -> Self {
        SpatialNavigation {
            tree: FocusTree::new(),
            layouts: LayoutCache::new(provider),
            focus: FocusController::default(),
            input: InputDispatcher::default(),
            settings: Settings::default(),
            requests: VecDeque::new(),
            last_trace: None,
        }
    }

    pub fn initialize(&mut self, settings: Settings) {
        if self.focus.enabled {
            debug!("engine already initialized");
            return;
        }
        info!(?settings, "initializing spatial navigation");
        self.input.set_throttle(settings.throttle());
        self.settings = settings;
        self.focus.enabled = true;
    }

    /// Disables the engine and forgets every node, the focus, the key map
    /// and the throttle. No callbacks fire.
    pub fn shutdown(&mut self) {
        if !self.focus.enabled {
            return;
        }
        info!("shutting down spatial navigation");
        self.focus = FocusController::default();
        self.tree = FocusTree::new();
        self.layouts.clear();
        self.input = InputDispatcher::default();
        self.settings = Settings::default();
        self.requests.clear();
        self.last_trace = None;
    }

    pub fn is_enabled(&self) -> bool { self.focus.enabled }

    pub fn pause(&mut self) { self.input.pause(); }

    pub fn resume(&mut self) { self.input.resume(); }

    pub fn is_paused(&self) -> bool { self.input.is_paused() }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn set_focus(&mut self, id: &str, details: FocusDetails) {
        self.layouts.invalidate_all();
        self.focus_target(id, &details);
        self.drain_requests();
    }

    /// Moves focus as if a directional key had been pressed, without the
    /// arrow-press callbacks.
    pub fn navigate_by_direction(&mut self, direction: Direction, details: FocusDetails) {
        self.layouts.invalidate_all();
        let details = FocusDetails { direction: Some(direction), ..details };
        self.navigate_from_focus(direction, &details);
        self.drain_requests();
    }

    /// Merges `entries` into the key map. Malformed entries are skipped and
    /// reported, the rest apply.
    pub fn set_key_map<I, K>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, KeyBinding)>,
        K: AsRef<str>,
    {
        self.input.merge_key_map(entries)
    }

    pub fn key_map(&self) -> &KeyMap { self.input.keymap() }

    pub fn set_throttle(&mut self, throttle: ThrottleSettings) {
        self.settings.throttle_ms = throttle.throttle_ms;
        self.settings.throttle_keypresses = throttle.throttle_keypresses;
        self.input.set_throttle(throttle);
    }

    pub fn recompute_all_layouts(&mut self) { self.layouts.recompute_all(&self.tree); }

    pub fn current_focus_id(&self) -> Option<&str> {
        self.focus.current.and_then(|node| self.tree.id_of(node))
    }

    /// Registers a node, or refreshes the one registered under the same id.
    pub fn register(&mut self, descriptor: NodeDescriptor) -> NodeId {
        let node = self.tree.add(descriptor);
        self.layouts.invalidate(node);
        if self.focus.current.is_some() {
            self.sync_focused_ancestors(&FocusDetails::default());
        }
        self.drain_requests();
        node
    }

    /// Merges the supplied fields into a registered node. Unknown ids are ignored.
    pub fn update(&mut self, id: &str, update: NodeUpdate) {
        let moves = update.parent_id.is_some();
        let Some(node) = self.tree.update(id, update) else {
            return;
        };
        self.layouts.invalidate(node);
        if moves && self.focus.current.is_some() {
            self.sync_focused_ancestors(&FocusDetails::default());
        }
        self.drain_requests();
    }

    /// Removes a node. If it held focus, focus moves to its parent when the
    /// parent allows auto-restore, and is dropped otherwise.
    pub fn unregister(&mut self, id: &str) {
        let Some(removed) = self.tree.remove(id) else {
            return;
        };
        self.layouts.forget(removed.node);
        self.focus.focused_ancestors.retain(|node| *node != removed.node);

        if self.focus.current == Some(removed.node) {
            let details = FocusDetails::default();
            let restore_to = removed
                .parent
                .filter(|parent| self.tree.get(*parent).is_some_and(FocusNode::auto_restore_focus))
                .and_then(|parent| self.tree.id_of(parent))
                .map(str::to_owned);
            match restore_to {
                Some(parent_id) => {
                    debug!(removed = %id, parent = %parent_id, "restoring focus to parent");
                    self.layouts.invalidate_all();
                    self.focus_target(&parent_id, &details);
                }
                None => {
                    debug!(removed = %id, "focused node removed");
                    self.clear_focus(&details);
                }
            }
        } else if self.focus.current.is_some() {
            // Children of the removed node now hang off its parent.
            self.sync_focused_ancestors(&FocusDetails::default());
        }
        self.drain_requests();
    }

    pub fn node_exists(&self, id: &str) -> bool { self.tree.contains(id) }

    pub fn node(&self, id: &str) -> Option<&FocusNode> { self.tree.get_by_id(id) }

    pub fn tree(&self) -> &FocusTree { &self.tree }

    /// Cached box of a node, measured if stale.
    pub fn layout_of(&mut self, id: &str) -> Option<Rect> {
        let node = self.tree.lookup(id)?;
        Some(self.layouts.get(&self.tree, node))
    }

    pub fn held_count(&self, action: Action) -> u32 { self.input.held_count(action) }

    /// Whether a key-down at `now` would be dropped by the throttle.
    pub fn is_throttled(&self, now: Instant) -> bool { self.input.is_throttled(now) }

    /// Ids of the ancestors currently told they contain the focus, nearest first.
    pub fn focused_ancestor_ids(&self) -> Vec<&str> {
        self.focus.focused_ancestors().iter().filter_map(|node| self.tree.id_of(*node)).collect()
    }

    /// What the last directional move looked at. Only recorded with
    /// `visual_debug` on.
    pub fn last_navigation_trace(&self) -> Option<&NavigationTrace> { self.last_trace.as_ref() }

    pub fn draw_tree(&self) -> String { self.tree.draw_tree() }

    pub(crate) fn navigate_from_focus(&mut self, direction: Direction, details: &FocusDetails) {
        if !self.focus.enabled {
            debug!(%direction, "navigation while disabled");
            return;
        }
        let Some(origin) = self.focus.current else {
            trace!(%direction, "navigation with nothing focused");
            return;
        };
        if let Some(Some(target)) =
            self.dispatch(origin, |handler, cx| handler.navigate_override(cx, direction))
        {
            debug!(%direction, %target, "navigation overridden");
            self.focus_target(&target, details);
            return;
        }

        let verbose = self.settings.debug_logging;
        let (target, nav_trace) = DirectionalResolver::new(&mut self.tree, &mut self.layouts)
            .verbose(verbose)
            .resolve(origin, direction);
        if verbose {
            debug!(%direction, target = ?nav_trace.target, rounds = nav_trace.rounds.len(), "navigated");
        } else {
            trace!(%direction, target = ?nav_trace.target, rounds = nav_trace.rounds.len(), "navigated");
        }
        if self.settings.visual_debug {
            self.last_trace = Some(nav_trace);
        }
        if let Some(target) = target {
            self.focus_node(target, details);
        }
    }

    /// Runs focus requests queued by callbacks until none are left.
    pub(crate) fn drain_requests(&mut self) {
        while let Some(request) = self.requests.pop_front() {
            trace!(?request, "running queued request");
            self.layouts.invalidate_all();
            match request {
                Request::SetFocus(id, details) => self.focus_target(&id, &details),
                Request::Navigate(direction, details) => {
                    let details = FocusDetails { direction: Some(direction), ..details };
                    self.navigate_from_focus(direction, &details)
                }
            }
        }
    }
}
