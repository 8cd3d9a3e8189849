//! Focus movement: directional search, leaf resolution and focus commits.

pub mod controller;
pub mod directional;
pub mod handler;
pub mod leaf;

pub use controller::FocusController;
pub use directional::{DirectionalResolver, NavigationTrace, ScoredCandidate, Score, Step, TraceRound};
pub use handler::{FocusDetails, FocusHandler, HandlerContext};
pub(crate) use handler::Request;
pub use leaf::LeafResolver;
