// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scaled face metrics.

use crate::fixed::{div_fix, mul_fix};
use crate::{DesignMetrics, Error, ErrorKind, F26Dot6};

/// Resolution all sizes are scaled at.
pub const DPI: u32 = 72;

/// A face scaled to one point size, in pixel space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SizeMetrics {
    /// The requested size in 26.6 points.
    pub size: F26Dot6,
    /// The em size in 26.6 pixels at the scaling resolution.
    pub pixel_size: F26Dot6,
    /// Integer pixels per em, horizontally.
    pub x_ppem: i32,
    /// Integer pixels per em, vertically.
    pub y_ppem: i32,
    /// 16.16 factor from design units to 26.6 pixels, horizontally.
    pub x_scale: i32,
    /// 16.16 factor from design units to 26.6 pixels, vertically.
    pub y_scale: i32,
    /// Ascender, rounded up to a whole pixel.
    pub ascender: F26Dot6,
    /// Descender, rounded down to a whole pixel. Negative.
    pub descender: F26Dot6,
    /// Line height, rounded to a whole pixel.
    pub height: F26Dot6,
    /// Maximum advance, rounded to a whole pixel.
    pub max_advance: F26Dot6,
}

impl SizeMetrics {
    /// Scales design metrics to `size` points at `dpi`.
    ///
    /// Fails when the face reports zero units per em, which leaves no scale.
    pub fn new(design: &DesignMetrics, size: F26Dot6, dpi: u32) -> Result<Self, Error> {
        if design.units_per_em == 0 {
            return Err(Error::new(ErrorKind::CacheCapacity).with_detail("zero units per em"));
        }
        let dpi = i32::try_from(dpi).unwrap_or(i32::MAX);
        let scaled = size.to_raw().saturating_mul(dpi).saturating_add(36) / 72;
        let upem = i32::from(design.units_per_em);
        let scale = div_fix(scaled, upem);
        let ppem = (scaled + 32) >> 6;
        let scaled_units = |units: i32| F26Dot6::from_raw(mul_fix(units, scale));
        Ok(Self {
            size,
            pixel_size: F26Dot6::from_raw(scaled),
            x_ppem: ppem,
            y_ppem: ppem,
            x_scale: scale,
            y_scale: scale,
            ascender: scaled_units(design.ascender).ceil(),
            descender: scaled_units(design.descender).floor(),
            height: scaled_units(design.height).round(),
            max_advance: scaled_units(design.max_advance).round(),
        })
    }

    /// Pixels per em as a float, as used for rasterization.
    pub fn ppem(&self) -> f32 {
        self.pixel_size.to_f32()
    }

    /// Scales a design unit distance to 26.6 pixels.
    pub fn scale_x(&self, units: i32) -> F26Dot6 {
        F26Dot6::from_raw(mul_fix(units, self.x_scale))
    }
}
