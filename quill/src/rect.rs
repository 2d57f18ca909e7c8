// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// An integer pixel rectangle, y up.
///
/// Bounds are inclusive on the minimum side and exclusive on the maximum side
/// for measurement, so `x_max - x_min` is the width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x_min: i32,
    /// Right edge.
    pub x_max: i32,
    /// Bottom edge.
    pub y_min: i32,
    /// Top edge.
    pub y_max: i32,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Horizontal extent.
    pub const fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    /// Vertical extent.
    pub const fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// The smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Whether `other` lies entirely within this rectangle, edges included.
    pub fn contains_rect(&self, other: &Self) -> bool {
        self.x_min <= other.x_min
            && self.x_max >= other.x_max
            && self.y_min <= other.y_min
            && self.y_max >= other.y_max
    }

    /// An inverted rectangle that any union replaces.
    pub(crate) const fn empty_union() -> Self {
        Self::new(32000, -32000, 32000, -32000)
    }
}

/// Summary of a measured or drawn string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextInfo {
    /// Number of lines.
    pub lines: usize,
    /// Pen advance of the last line, in whole pixels.
    pub width: i32,
}
