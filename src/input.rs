//! Raw key events in, logical actions out.

pub mod dispatcher;
pub mod keymap;
pub mod throttle;

pub use dispatcher::{InputDispatcher, KeyDetails, KeyDown};
pub use keymap::{Action, KeyBinding, KeyCode, KeyMap};
pub use throttle::Throttle;
