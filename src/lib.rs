pub mod common;
pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod navigation;
pub mod scene;

pub use engine::SpatialNavigation;
pub use error::ParseError;
pub use input::{Action, KeyBinding, KeyCode, KeyDetails, KeyMap};
pub use model::{Direction, LayoutProvider, NodeDescriptor, NodeHandle, NodeUpdate, Rect};
pub use navigation::{FocusDetails, FocusHandler, HandlerContext};
