//! Plain 2D geometry used by the window model.
//!
//! All coordinates are in screen space with the origin in the top-left
//! corner and `y` growing downwards, matching what window backends report.

use std::fmt;
use std::ops::{Add, Div, Sub};

/// One of the two screen axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The perpendicular axis.
    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// A 2D point or extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component along `axis`.
    pub fn along(self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Product of both components.
    pub fn prod(self) -> f32 {
        self.x * self.y
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// An axis-aligned rectangle given by its top-left and bottom-right corners.
///
/// For windows this is the *visible frame*, i.e. what the user perceives as
/// the window, without drop shadows or invisible resize borders.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top_left: Vec2,
    pub bottom_right: Vec2,
}

impl Rect {
    pub const fn new(top_left: Vec2, bottom_right: Vec2) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Build a rect from the four edges, the way most platform APIs report them.
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(Vec2::new(left, top), Vec2::new(right, bottom))
    }

    /// Build a rect from its top-left corner and its size.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_edges(x, y, x + width, y + height)
    }

    pub fn center(&self) -> Vec2 {
        (self.top_left + self.bottom_right) / 2.0
    }

    pub fn size(&self) -> Vec2 {
        self.bottom_right - self.top_left
    }

    pub fn area(&self) -> f32 {
        self.size().prod()
    }

    /// Distance to `other` measured along `axis`, biased towards rects that
    /// line up on the perpendicular axis.
    ///
    /// The primary term is the distance between both centers along `axis`.
    /// On top of that, any off-axis center offset that exceeds half of this
    /// rect's own off-axis extent is added, scaled by `off_axis_weight`. A
    /// rect straight below therefore beats one diagonally below even when
    /// their euclidean distances match.
    pub fn distance_with_axis_preference(&self, axis: Axis, other: &Rect, off_axis_weight: f32) -> f32 {
        let off_axis = axis.other();
        let c = self.center();
        let oc = other.center();
        let primary = (c.along(axis) - oc.along(axis)).abs();
        let misalignment =
            (c.along(off_axis) - oc.along(off_axis)).abs() - self.size().along(off_axis) / 2.0;
        primary + off_axis_weight * misalignment.max(0.0)
    }
}

impl Add for Rect {
    type Output = Rect;

    fn add(self, other: Rect) -> Rect {
        Rect::new(self.top_left + other.top_left, self.bottom_right + other.bottom_right)
    }
}

impl Sub for Rect {
    type Output = Rect;

    fn sub(self, other: Rect) -> Rect {
        Rect::new(self.top_left - other.top_left, self.bottom_right - other.bottom_right)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[top_left={}, bottom_right={}]",
            self.top_left, self.bottom_right
        )
    }
}
