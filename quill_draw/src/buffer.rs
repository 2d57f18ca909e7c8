// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blitting glyph coverage into caller owned RGBA pixel buffers.

use quill_fonts::F26Dot6;

use crate::GlyphImage;

/// Channels per pixel the blitter writes.
pub const BUFFER_CHANNELS: usize = 4;

/// Destination of buffer drawing.
///
/// Row 0 is the bottom row. Either or both of a float and a byte buffer may be
/// set; glyphs are mixed into each one present.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    /// Premultiplied RGBA floats, `width * height * 4` long.
    pub float: Option<&'a mut [f32]>,
    /// Straight RGBA bytes, `width * height * 4` long.
    pub bytes: Option<&'a mut [u8]>,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Text color as straight RGBA floats.
    pub color: [f32; 4],
}

impl<'a> PixelBuffer<'a> {
    /// Creates a buffer view with no storage attached.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            float: None,
            bytes: None,
            width,
            height,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Attaches float storage.
    #[must_use]
    pub fn with_float(mut self, float: &'a mut [f32]) -> Self {
        self.float = Some(float);
        self
    }

    /// Attaches byte storage.
    #[must_use]
    pub fn with_bytes(mut self, bytes: &'a mut [u8]) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// Sets the text color.
    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    fn color_bytes(&self) -> [u8; 4] {
        self.color.map(unit_float_to_u8)
    }

    /// Mixes `image` into the buffer with its pen at (`pen_x`, `pen_y`).
    ///
    /// Pixels outside the buffer are skipped.
    pub fn blit(&mut self, image: &GlyphImage<'_>, pen_x: F26Dot6, pen_y: F26Dot6) {
        if image.is_empty() {
            return;
        }
        let left = (pen_x + F26Dot6::from_int(image.left)).to_int();
        let bottom = (pen_y + F26Dot6::from_int(image.top - image.height)).to_int();
        if left + image.width < 0
            || left >= self.width
            || bottom + image.height < 0
            || bottom >= self.height
        {
            return;
        }

        let color_bytes = self.color_bytes();
        let rows = bottom.max(0)..(bottom + image.height).min(self.height);
        let cols = left.max(0)..(left + image.width).min(self.width);
        for by in rows {
            let visual_row = bottom + image.height - 1 - by;
            let stored_row = if image.pitch < 0 {
                image.height - 1 - visual_row
            } else {
                visual_row
            };
            for bx in cols.clone() {
                let coverage = image.coverage(bx - left, stored_row);
                if coverage == 0 {
                    continue;
                }
                let Some(index) = self.pixel_index(bx, by) else {
                    continue;
                };
                let alpha = f32::from(coverage) / 255.0 * self.color[3];
                if let Some(pixel) = self
                    .float
                    .as_deref_mut()
                    .and_then(|buf| buf.get_mut(index..index + BUFFER_CHANNELS))
                {
                    let [r, g, b, _] = self.color;
                    blend_mix_f32(pixel, [r * alpha, g * alpha, b * alpha, alpha]);
                }
                if let Some(pixel) = self
                    .bytes
                    .as_deref_mut()
                    .and_then(|buf| buf.get_mut(index..index + BUFFER_CHANNELS))
                {
                    let [r, g, b, _] = color_bytes;
                    blend_mix_u8(pixel, [r, g, b, unit_float_to_u8(alpha)]);
                }
            }
        }
    }

    fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some((x + y * width) * BUFFER_CHANNELS)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is clamped to 0..=255 first"
)]
fn unit_float_to_u8(v: f32) -> u8 {
    if v <= 0.0 {
        0
    } else if v > 1.0 - 0.5 / 255.0 {
        255
    } else {
        (255.0 * v + 0.5) as u8
    }
}

/// Premultiplied over: `dst = (1 - a) * dst + src`.
fn blend_mix_f32(dst: &mut [f32], src: [f32; 4]) {
    let t = src[3];
    if t == 0.0 {
        return;
    }
    let mt = 1.0 - t;
    for (d, s) in dst.iter_mut().zip(&src[..3]) {
        *d = mt * *d + s;
    }
    dst[3] = mt * dst[3] + t;
}

fn divide_round(a: u32, b: u32) -> u32 {
    (2 * a + b) / (2 * b)
}

/// Straight alpha over on bytes.
#[expect(
    clippy::cast_possible_truncation,
    reason = "every quotient is at most 255"
)]
fn blend_mix_u8(dst: &mut [u8], src: [u8; 4]) {
    let t = u32::from(src[3]);
    if t == 0 {
        return;
    }
    let mt = 255 - t;
    let dst_alpha = u32::from(dst[3]);
    let alpha = mt * dst_alpha + t * 255;
    for (d, s) in dst.iter_mut().zip(&src[..3]) {
        let mixed = mt * dst_alpha * u32::from(*d) + t * 255 * u32::from(*s);
        *d = divide_round(mixed, alpha) as u8;
    }
    dst[3] = divide_round(alpha, 255) as u8;
}
