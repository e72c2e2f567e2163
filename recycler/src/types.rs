use core::fmt;
use core::ops::{Add, AddAssign, Sub};
use std::sync::Arc;

/// A pair of scalars (position or size).
///
/// Host layout coordinates follow the "y grows upwards" convention: content flows towards
/// negative `y` and positive `x`. Absolute coordinates flip `y` so both axes grow positively.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The scroll axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    /// Component of `v` along the scroll axis.
    pub fn main(self, v: Vec2) -> f32 {
        match self {
            Self::Vertical => v.y,
            Self::Horizontal => v.x,
        }
    }

    /// Component of `v` across the scroll axis.
    pub fn cross(self, v: Vec2) -> f32 {
        match self {
            Self::Vertical => v.x,
            Self::Horizontal => v.y,
        }
    }

    /// Builds an absolute (positive) pair from main/cross components.
    pub fn compose(self, main: f32, cross: f32) -> Vec2 {
        match self {
            Self::Vertical => Vec2::new(cross, main),
            Self::Horizontal => Vec2::new(main, cross),
        }
    }

    /// Builds a host layout point from absolute main/cross components.
    pub fn layout_point(self, main: f32, cross: f32) -> Vec2 {
        let abs = self.compose(main, cross);
        Vec2::new(abs.x, -abs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    #[default]
    Forward,
    Backward,
}

impl ScrollDirection {
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }
}

/// How the host should constrain user scroll input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementRestriction {
    /// Free scrolling with overscroll.
    #[default]
    Elastic,
    /// The whole collection fits in the viewport; input is clamped.
    Clamped,
}

/// The materialized window, in line units.
///
/// A line is a single item for lists and a full row (vertical) or column (horizontal) of cells
/// for grids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowState {
    pub min_visible: usize,
    pub max_visible: usize,
    pub min_extra: usize,
    pub max_extra: usize,
}

impl WindowState {
    pub fn single(line: usize) -> Self {
        Self {
            min_visible: line,
            max_visible: line,
            min_extra: line,
            max_extra: line,
        }
    }

    /// `min_extra <= min_visible <= max_visible <= max_extra`.
    pub fn is_ordered(&self) -> bool {
        self.min_extra <= self.min_visible
            && self.min_visible <= self.max_visible
            && self.max_visible <= self.max_extra
    }

    pub fn contains_extra(&self, line: usize) -> bool {
        (self.min_extra..=self.max_extra).contains(&line)
    }

    pub fn contains_visible(&self, line: usize) -> bool {
        (self.min_visible..=self.max_visible).contains(&line)
    }
}

/// Identity of the template a view is instantiated from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrototypeId(Arc<str>);

impl PrototypeId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrototypeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PrototypeId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Debug for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrototypeId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
