//! Logical actions and the raw key codes that trigger them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use tracing::warn;

use crate::common::collections::HashMap;
use crate::error::ParseError;
use crate::model::Direction;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left,
    Up,
    Right,
    Down,
    /// Activates the focused node. Also accepted as `activate`.
    #[serde(alias = "activate")]
    Enter,
}

impl Action {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Left => Some(Direction::Left),
            Action::Up => Some(Direction::Up),
            Action::Right => Some(Direction::Right),
            Action::Down => Some(Direction::Down),
            Action::Enter => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
            Action::Enter => "enter",
        }
    }

    /// Closest known action name to a misspelt one, if any is close enough.
    pub fn suggest(unknown: &str) -> Option<&'static str> {
        let unknown = unknown.to_lowercase();
        let candidates = Action::iter().map(Action::as_str).chain(["activate"]);
        let (best, dist) = candidates
            .map(|cand| (cand, levenshtein(&unknown, cand)))
            .min_by_key(|(_, dist)| *dist)?;
        (dist <= std::cmp::max(2, best.len() / 2)).then_some(best)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Action::Left),
            "up" => Ok(Action::Up),
            "right" => Ok(Action::Right),
            "down" => Ok(Action::Down),
            "enter" | "activate" => Ok(Action::Enter),
            _ => Err(ParseError::Action(s.to_owned())),
        }
    }
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => Action::Left,
            Direction::Up => Action::Up,
            Direction::Right => Action::Right,
            Direction::Down => Action::Down,
        }
    }
}

/// A raw key as delivered by the host: either a numeric key code or a key name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyCode {
    Code(u32),
    Named(String),
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Code(code) => write!(f, "{code}"),
            KeyCode::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for KeyCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::KeyCode(s.to_owned()));
        }
        Ok(s.parse::<u32>().map(KeyCode::Code).unwrap_or_else(|_| KeyCode::Named(s.to_owned())))
    }
}

impl From<u32> for KeyCode {
    fn from(code: u32) -> Self { KeyCode::Code(code) }
}

impl From<&str> for KeyCode {
    fn from(name: &str) -> Self { KeyCode::Named(name.to_owned()) }
}

/// One key code or a list of them, as written in a key map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyBinding {
    One(KeyCode),
    Many(Vec<KeyCode>),
}

impl KeyBinding {
    pub fn into_codes(self) -> Vec<KeyCode> {
        match self {
            KeyBinding::One(code) => vec![code],
            KeyBinding::Many(codes) => codes,
        }
    }
}

impl From<Vec<KeyCode>> for KeyBinding {
    fn from(codes: Vec<KeyCode>) -> Self { KeyBinding::Many(codes) }
}

/// Many-to-one mapping from raw key codes to logical actions.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyMap {
    actions: BTreeMap<Action, Vec<KeyCode>>,
    lookup: HashMap<KeyCode, Action>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let defaults: [(Action, u32, &str); 5] = [
            (Action::Left, 37, "ArrowLeft"),
            (Action::Up, 38, "ArrowUp"),
            (Action::Right, 39, "ArrowRight"),
            (Action::Down, 40, "ArrowDown"),
            (Action::Enter, 13, "Enter"),
        ];
        let actions = defaults
            .into_iter()
            .map(|(action, code, name)| (action, vec![code.into(), name.into()]))
            .collect();
        let mut map = KeyMap { actions, lookup: HashMap::default() };
        map.rebuild_lookup();
        map
    }
}

impl KeyMap {
    pub fn decode(&self, key: &KeyCode) -> Option<Action> { self.lookup.get(key).copied() }

    pub fn codes(&self, action: Action) -> &[KeyCode] {
        self.actions.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the codes bound to `action`. Other actions keep theirs.
    pub fn set(&mut self, action: Action, codes: Vec<KeyCode>) {
        self.actions.insert(action, codes);
        self.rebuild_lookup();
    }

    /// Merges textual entries into the map. Entries with an unknown action or
    /// no key codes are skipped; the rest still apply. Returns one message per
    /// skipped entry.
    pub fn merge<I, K>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, KeyBinding)>,
        K: AsRef<str>,
    {
        let mut issues = Vec::new();
        for (name, binding) in entries {
            let name = name.as_ref();
            let Ok(action) = name.parse::<Action>() else {
                let issue = match Action::suggest(name) {
                    Some(suggestion) => {
                        format!("unknown action `{name}` in key map. Did you mean `{suggestion}`?")
                    }
                    None => format!("unknown action `{name}` in key map"),
                };
                warn!("{issue}");
                issues.push(issue);
                continue;
            };
            let codes = binding.into_codes();
            if codes.is_empty() {
                let issue = format!("key map entry `{name}` has no key codes");
                warn!("{issue}");
                issues.push(issue);
                continue;
            }
            self.actions.insert(action, codes);
        }
        self.rebuild_lookup();
        issues
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, &[KeyCode])> {
        self.actions.iter().map(|(action, codes)| (*action, codes.as_slice()))
    }

    // The first action in declaration order wins when two share a code.
    fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for action in Action::iter() {
            for code in self.codes(action).to_vec() {
                self.lookup.entry(code).or_insert(action);
            }
        }
    }
}

/// no need to pull in a dep for just this
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut cur = vec![i; b.len() + 1];
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        prev = cur;
    }
    prev[b.len()]
}
