//! Key-down / key-up handling.
//!
//! [`InputDispatcher`] owns the input-side state (key map, held keys,
//! throttle, pause) and turns raw events into decisions. The engine then acts
//! on those decisions: activation callbacks, arrow delegation up the tree and
//! finally a directional move.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::common::config::ThrottleSettings;
use crate::engine::SpatialNavigation;
use crate::input::keymap::{Action, KeyBinding, KeyCode, KeyMap};
use crate::input::throttle::Throttle;
use crate::model::{Direction, NodeId};
use crate::navigation::FocusDetails;

/// The key event handed to callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDetails {
    pub key: KeyCode,
    pub action: Action,
    /// Held-down count per action, including this press.
    pub pressed_keys: BTreeMap<Action, u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyDown {
    /// Paused, throttled or unmapped.
    Ignored,
    Activate(KeyDetails),
    Arrow(Direction, KeyDetails),
}

#[derive(Debug, Default)]
pub struct InputDispatcher {
    keymap: KeyMap,
    pressed: BTreeMap<Action, u32>,
    throttle: Throttle,
    throttle_keypresses: bool,
    paused: bool,
}

impl InputDispatcher {
    pub fn new(keymap: KeyMap) -> Self { InputDispatcher { keymap, ..Default::default() } }

    pub fn keymap(&self) -> &KeyMap { &self.keymap }

    /// Merges entries into the key map. Returns one message per skipped entry.
    pub fn merge_key_map<I, K>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, KeyBinding)>,
        K: AsRef<str>,
    {
        self.keymap.merge(entries)
    }

    pub fn set_throttle(&mut self, settings: ThrottleSettings) {
        self.throttle = Throttle::new(Duration::from_millis(settings.throttle_ms));
        self.throttle_keypresses = settings.throttle_keypresses;
    }

    /// Whether a key-down at `now` would be dropped by the throttle.
    pub fn is_throttled(&self, now: Instant) -> bool { self.throttle.is_pending(now) }

    pub fn pause(&mut self) { self.paused = true; }

    pub fn resume(&mut self) { self.paused = false; }

    pub fn is_paused(&self) -> bool { self.paused }

    pub fn held_count(&self, action: Action) -> u32 {
        self.pressed.get(&action).copied().unwrap_or(0)
    }

    pub fn key_down(&mut self, key: &KeyCode, now: Instant) -> KeyDown {
        if self.paused {
            trace!(%key, "ignoring key while paused");
            return KeyDown::Ignored;
        }
        if !self.throttle.try_acquire(now) {
            trace!(%key, "key-down throttled");
            return KeyDown::Ignored;
        }
        let Some(action) = self.keymap.decode(key) else {
            trace!(%key, "unmapped key");
            return KeyDown::Ignored;
        };
        *self.pressed.entry(action).or_default() += 1;
        let details = KeyDetails {
            key: key.clone(),
            action,
            pressed_keys: self.pressed.clone(),
        };
        match action.direction() {
            Some(direction) => KeyDown::Arrow(direction, details),
            None => KeyDown::Activate(details),
        }
    }

    /// Returns the released action, if the key was mapped.
    pub fn key_up(&mut self, key: &KeyCode) -> Option<Action> {
        let action = self.keymap.decode(key);
        if let Some(action) = action {
            self.pressed.remove(&action);
        }
        if !self.throttle_keypresses {
            self.throttle.cancel();
        }
        action
    }
}

impl SpatialNavigation {
    pub fn on_key_down(&mut self, key: impl Into<KeyCode>) { self.on_key_down_at(key, Instant::now()) }

    /// Like [`Self::on_key_down`] with an explicit timestamp for throttling.
    pub fn on_key_down_at(&mut self, key: impl Into<KeyCode>, now: Instant) {
        if !self.focus.enabled {
            return;
        }
        self.layouts.invalidate_all();
        match self.input.key_down(&key.into(), now) {
            KeyDown::Ignored => {}
            KeyDown::Activate(details) => self.activate_press(details),
            KeyDown::Arrow(direction, details) => self.arrow_press(direction, details),
        }
        self.drain_requests();
    }

    pub fn on_key_up(&mut self, key: impl Into<KeyCode>) {
        if !self.focus.enabled {
            return;
        }
        let Some(action) = self.input.key_up(&key.into()) else {
            return;
        };
        if action == Action::Enter
            && let Some(focused) = self.focus.current
        {
            self.dispatch(focused, |handler, cx| handler.on_activate_release(cx));
        }
        self.drain_requests();
    }

    fn activate_press(&mut self, details: KeyDetails) {
        let Some(focused) = self.focus.current else {
            trace!("activate with nothing focused");
            return;
        };
        if !self.tree.is_focusable(focused) {
            debug!(id = ?self.tree.id_of(focused), "activate on a node that is not focusable");
            return;
        }
        self.dispatch(focused, |handler, cx| handler.on_activate_press(cx, &details));
    }

    fn arrow_press(&mut self, direction: Direction, details: KeyDetails) {
        let Some(focused) = self.focus.current else {
            trace!(%direction, "arrow with nothing focused");
            return;
        };
        for node in self.arrow_listeners(focused) {
            let proceed = self
                .dispatch(node, |handler, cx| handler.on_arrow_press(cx, direction, &details))
                .unwrap_or(true);
            if !proceed {
                debug!(id = ?self.tree.id_of(node), %direction, "arrow press intercepted");
                return;
            }
        }
        let details = FocusDetails {
            key: Some(details),
            direction: Some(direction),
            extra: None,
        };
        self.navigate_from_focus(direction, &details);
    }

    /// The focused node, then its ancestors up to and including the first
    /// focus boundary.
    fn arrow_listeners(&self, focused: NodeId) -> Vec<NodeId> {
        let mut listeners = vec![focused];
        if self.tree.get(focused).is_some_and(|n| n.is_focus_boundary()) {
            return listeners;
        }
        for ancestor in self.tree.ancestors(focused) {
            listeners.push(ancestor);
            if self.tree.get(ancestor).is_some_and(|n| n.is_focus_boundary()) {
                break;
            }
        }
        listeners
    }
}
