//! Screen-space geometry shared by the layout cache and the resolvers.
//!
//! Coordinates grow rightwards and downwards, matching what layout providers
//! report for on-screen boxes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }

    /// Component along `orientation`: `x` for horizontal, `y` for vertical.
    pub fn along(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// Bounding box of a focus node as reported by the layout provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect { left, top, width, height }
    }

    pub fn right(&self) -> f64 { self.left + self.width }

    pub fn bottom(&self) -> f64 { self.top + self.height }

    /// Start coordinate and extent along `orientation`.
    pub fn span(&self, orientation: Orientation) -> (f64, f64) {
        match orientation {
            Orientation::Horizontal => (self.left, self.width),
            Orientation::Vertical => (self.top, self.height),
        }
    }

    /// Manhattan distance of the top-left corner from the page origin.
    pub fn origin_distance(&self) -> f64 { self.left.abs() + self.top.abs() }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.left, self.top, self.width, self.height
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn cross(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    /// Axis the move travels along.
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Whether moving this way increases the coordinate on the move axis.
    pub fn is_incremental(self) -> bool { matches!(self, Direction::Right | Direction::Down) }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseError::Direction(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.span(Orientation::Horizontal), (10.0, 30.0));
        assert_eq!(rect.span(Orientation::Vertical), (20.0, 40.0));
    }

    #[test]
    fn origin_distance_uses_absolute_values() {
        assert_eq!(Rect::new(-5.0, 3.0, 1.0, 1.0).origin_distance(), 8.0);
        assert_eq!(Rect::new(0.0, 0.0, 100.0, 100.0).origin_distance(), 0.0);
    }

    #[test]
    fn direction_orientation() {
        assert_eq!(Direction::Left.orientation(), Orientation::Horizontal);
        assert_eq!(Direction::Right.orientation(), Orientation::Horizontal);
        assert_eq!(Direction::Up.orientation(), Orientation::Vertical);
        assert_eq!(Direction::Down.orientation(), Orientation::Vertical);
        assert_eq!(Orientation::Vertical.cross(), Orientation::Horizontal);
    }

    #[test]
    fn direction_parse() {
        assert_eq!("left".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!(" Down ".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(ParseError::Direction("sideways".into()))
        );
    }
}
