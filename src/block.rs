//! Hard macros and fixed terminals.

use std::fmt::{Display, Formatter};

use crate::{dimensions::Dimensions, point::Point};

/// A hard rectangular macro. Its dimensions never change; its coordinates
/// are rewritten by every packing pass.
#[derive(Debug, Clone)]
pub struct Block {
    name: String,
    dims: Dimensions,
    rotated: bool,
    left_x: u64,
    bottom_y: u64,
    right_x: u64,
    top_y: u64,
}

impl Block {
    pub fn new(name: impl Into<String>, width: u64, height: u64) -> Self {
        Block {
            name: name.into(),
            dims: Dimensions::new(width, height),
            rotated: false,
            left_x: 0,
            bottom_y: 0,
            right_x: 0,
            top_y: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective dimensions, accounting for rotation.
    pub const fn dims(&self) -> Dimensions {
        self.dims.flipped_if(self.rotated)
    }

    pub const fn width(&self) -> u64 {
        self.dims().width
    }

    pub const fn height(&self) -> u64 {
        self.dims().height
    }

    pub const fn is_rotated(&self) -> bool {
        self.rotated
    }

    /// Toggles the rotation flag, swapping effective width and height.
    /// Coordinates are stale until the next packing pass.
    pub const fn rotate(&mut self) {
        self.rotated = !self.rotated;
    }

    pub const fn place_x(&mut self, left: u64, right: u64) {
        self.left_x = left;
        self.right_x = right;
    }

    pub const fn place_y(&mut self, bottom: u64, top: u64) {
        self.bottom_y = bottom;
        self.top_y = top;
    }

    pub const fn left_x(&self) -> u64 {
        self.left_x
    }

    pub const fn bottom_y(&self) -> u64 {
        self.bottom_y
    }

    pub const fn right_x(&self) -> u64 {
        self.right_x
    }

    pub const fn top_y(&self) -> u64 {
        self.top_y
    }

    /// Centre of the placed rectangle, rounded down on both axes.
    pub const fn center(&self) -> Point {
        Point::new(
            ((self.left_x + self.right_x) / 2) as i64,
            ((self.bottom_y + self.top_y) / 2) as i64,
        )
    }

    /// True when the placed rectangles share interior area. Touching edges
    /// do not count.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.left_x < other.right_x
            && other.left_x < self.right_x
            && self.bottom_y < other.top_y
            && other.bottom_y < self.top_y
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.dims())
    }
}

/// A fixed pin on the chip boundary. Never placed, never rotated.
#[derive(Debug, Clone)]
pub struct Terminal {
    name: String,
    at: Point,
}

impl Terminal {
    pub fn new(name: impl Into<String>, x: i64, y: i64) -> Self {
        Terminal { name: name.into(), at: Point::new(x, y) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn point(&self) -> Point {
        self.at
    }
}
