use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid direction: {0:?}")]
    Direction(String),
    #[error("unknown action: {0:?}")]
    Action(String),
    #[error("invalid key code: {0:?}")]
    KeyCode(String),
}
