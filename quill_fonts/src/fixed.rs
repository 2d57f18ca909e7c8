// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 26.6 fixed point pixel values and the integer helpers used to scale them.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A pixel distance in 26.6 fixed point: the raw value divided by 64 gives pixels.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct F26Dot6(i32);

impl F26Dot6 {
    /// Zero pixels.
    pub const ZERO: Self = Self(0);
    /// One whole pixel.
    pub const ONE: Self = Self(64);
    /// The largest representable distance, used as "unbounded".
    pub const MAX: Self = Self(i32::MAX);

    /// Wraps a raw 26.6 value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw 26.6 value.
    #[inline]
    pub const fn to_raw(self) -> i32 {
        self.0
    }

    /// Converts whole pixels to 26.6.
    #[inline]
    pub const fn from_int(px: i32) -> Self {
        Self(px.saturating_mul(64))
    }

    /// Converts a float pixel distance, rounding to the nearest 1/64.
    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "`as` saturates out of range floats, which is the wanted clamp"
    )]
    pub fn from_f32(px: f32) -> Self {
        Self((px * 64.0).round() as i32)
    }

    /// Converts to a float pixel distance.
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }

    /// Whole pixels, rounding towards negative infinity.
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> 6
    }

    /// Whole pixels, rounding towards negative infinity.
    ///
    /// Same as [`to_int`](Self::to_int); spelled out where the rounding direction matters.
    #[inline]
    pub const fn to_int_floor(self) -> i32 {
        self.0 >> 6
    }

    /// Whole pixels, rounding towards positive infinity.
    #[inline]
    pub const fn to_int_ceil(self) -> i32 {
        self.0.saturating_add(63) >> 6
    }

    /// Rounds half up to a whole pixel, keeping the 26.6 representation.
    ///
    /// `31/64` rounds down, `32/64` rounds up, negative values round towards
    /// positive infinity at the half.
    #[inline]
    pub const fn round(self) -> Self {
        Self(self.0.saturating_add(32) & !63)
    }

    /// Rounds down to a whole pixel, keeping the 26.6 representation.
    #[inline]
    pub const fn floor(self) -> Self {
        Self(self.0 & !63)
    }

    /// Rounds up to a whole pixel, keeping the 26.6 representation.
    #[inline]
    pub const fn ceil(self) -> Self {
        Self(self.0.saturating_add(63) & !63)
    }

    /// The fractional part in 1/64 units, always in `0..64`.
    #[inline]
    pub const fn fract(self) -> i32 {
        self.0 & 63
    }

    /// Returns the larger of two values.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Returns the smaller of two values.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }
}

impl fmt::Debug for F26Dot6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F26Dot6({}px)", self.to_f32())
    }
}

impl Add for F26Dot6 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for F26Dot6 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for F26Dot6 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for F26Dot6 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for F26Dot6 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i32> for F26Dot6 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

fn saturate(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

/// Multiplies `a` by the 16.16 fixed point value `b`, rounding to nearest.
///
/// This is how design units are scaled to 26.6 pixels with a size's scale factor.
pub fn mul_fix(a: i32, b: i32) -> i32 {
    let ab = i64::from(a) * i64::from(b);
    // Rounds half away from zero.
    let ab = ab + 0x8000 + (ab >> 63);
    saturate(ab >> 16)
}

/// Computes `a * b / c` with a 64-bit intermediate, rounding to nearest.
///
/// Division by zero saturates with the sign of `a * b`.
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    let negative = (a < 0) ^ (b < 0) ^ (c < 0);
    let (a, b, c) = (
        i64::from(a).abs(),
        i64::from(b).abs(),
        i64::from(c).abs(),
    );
    let d = if c > 0 {
        (a * b + (c >> 1)) / c
    } else {
        i64::from(i32::MAX)
    };
    saturate(if negative { -d } else { d })
}

/// Computes the 16.16 ratio `a / b`, rounding to nearest.
pub fn div_fix(a: i32, b: i32) -> i32 {
    mul_div(a, 0x10000, b)
}
