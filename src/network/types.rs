//! Lattice types shared by the validator and the network builder.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// A point on the integer lattice, used both as a graph key and as a
/// geometric endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    pub x: i64,
    pub y: i64,
}

impl Node {
    pub const ORIGIN: Node = Node { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The neighbouring lattice point one unit away in `direction`, or
    /// `None` at the edge of the lattice
    pub fn step(self, direction: Direction) -> Option<Node> {
        let (dx, dy) = direction.delta();
        Some(Node::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Both coordinates multiplied by `scalar`, or `None` on overflow
    pub fn scaled(self, scalar: i64) -> Option<Node> {
        Some(Node::new(self.x.checked_mul(scalar)?, self.y.checked_mul(scalar)?))
    }
}

impl From<(i64, i64)> for Node {
    fn from((x, y): (i64, i64)) -> Self {
        Node::new(x, y)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal unit vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }

    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Up | Direction::Down => Orientation::Vertical,
            Direction::Right | Direction::Left => Orientation::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn name(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

/// A directed pair of lattice points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    pub start: Node,
    pub end: Node,
}

impl Segment {
    pub const fn new(start: Node, end: Node) -> Self {
        Self { start, end }
    }

    /// Unit direction of the segment.
    ///
    /// Fails for zero-length and diagonal segments.
    pub fn direction(&self) -> Result<Direction> {
        match (self.end.x.cmp(&self.start.x), self.end.y.cmp(&self.start.y)) {
            (Ordering::Equal, Ordering::Equal) => {
                Err(Error::Geometry(*self, "segments with no direction are disallowed"))
            }
            (Ordering::Equal, Ordering::Greater) => Ok(Direction::Up),
            (Ordering::Equal, Ordering::Less) => Ok(Direction::Down),
            (Ordering::Greater, Ordering::Equal) => Ok(Direction::Right),
            (Ordering::Less, Ordering::Equal) => Ok(Direction::Left),
            _ => Err(Error::Geometry(*self, "diagonal segments are disallowed")),
        }
    }

    pub fn orientation(&self) -> Result<Orientation> {
        self.direction().map(Direction::orientation)
    }

    /// Lattice length; only meaningful for axis-aligned segments, where
    /// it cannot overflow
    pub fn length(&self) -> u64 {
        self.end
            .x
            .abs_diff(self.start.x)
            .saturating_add(self.end.y.abs_diff(self.start.y))
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.end, self.start)
    }
}

impl From<((i64, i64), (i64, i64))> for Segment {
    fn from((start, end): ((i64, i64), (i64, i64))) -> Self {
        Segment::new(start.into(), end.into())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
