pub mod focus_tree;
pub mod geometry;
pub mod layout_cache;
pub mod node;
pub mod tree;

pub use focus_tree::{FocusTree, RemovedNode};
pub use geometry::{Direction, Orientation, Point, Rect};
pub use layout_cache::{LayoutCache, LayoutProvider};
pub use node::{FocusNode, NodeDescriptor, NodeFlags, NodeHandle, NodeUpdate};
pub use tree::NodeId;
