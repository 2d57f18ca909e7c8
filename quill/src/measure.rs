// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measuring text without drawing it.

use alloc::sync::Arc;

use quill_fonts::F26Dot6;

use crate::utf8::{decode_step, is_zero_width, prev_boundary, until_nul};
use crate::{Font, FontFlags, GlyphBitmap, GlyphCacheGuard, Rect, TextInfo};

/// Glyph extents in 26.6, before rounding out to whole pixels.
#[derive(Copy, Clone, Debug)]
struct FixedBox {
    x_min: F26Dot6,
    x_max: F26Dot6,
    y_min: F26Dot6,
    y_max: F26Dot6,
}

impl FixedBox {
    const EMPTY: Self = Self {
        x_min: F26Dot6::from_int(32000),
        x_max: F26Dot6::from_int(-32000),
        y_min: F26Dot6::from_int(32000),
        y_max: F26Dot6::from_int(-32000),
    };

    fn add(&mut self, x_min: F26Dot6, x_max: F26Dot6, y_min: F26Dot6, y_max: F26Dot6) {
        self.x_min = self.x_min.min(x_min);
        self.x_max = self.x_max.max(x_max);
        self.y_min = self.y_min.min(y_min);
        self.y_max = self.y_max.max(y_max);
    }

    /// Rounds out to whole pixels. A box nothing was added to is empty.
    fn to_rect(self) -> Rect {
        if self.x_min > self.x_max {
            return Rect::default();
        }
        Rect::new(
            self.x_min.to_int_floor(),
            self.x_max.to_int_ceil(),
            self.y_min.to_int_floor(),
            self.y_max.to_int_ceil(),
        )
    }
}

impl GlyphCacheGuard<'_> {
    /// Bounding box of one line whose baseline is `pen_y` below the origin.
    pub(crate) fn boundbox_line(&mut self, text: &[u8], pen_y: F26Dot6) -> (Rect, TextInfo) {
        let mut bounds = FixedBox::EMPTY;
        let mut pen_x = F26Dot6::ZERO;
        let mut prev: Option<Arc<GlyphBitmap>> = None;
        let mut i = 0;
        while i < text.len() {
            let Some(glyph) = self.step(text, &mut i, prev.as_deref(), Some(&mut pen_x)) else {
                continue;
            };
            bounds.add(
                pen_x,
                pen_x + glyph.advance,
                glyph.bounds.y_min + pen_y,
                glyph.bounds.y_max + pen_y,
            );
            pen_x += glyph.advance;
            prev = Some(glyph);
        }
        let info = TextInfo {
            lines: 1,
            width: pen_x.to_int(),
        };
        (bounds.to_rect(), info)
    }

    /// Longest prefix of `text` narrower than `width` pixels, as its byte
    /// length and pixel width.
    pub(crate) fn width_to_strlen(&mut self, text: &[u8], width: i32) -> (usize, i32) {
        let mut pen_x = F26Dot6::ZERO;
        let mut fitted = F26Dot6::ZERO;
        let mut prev: Option<Arc<GlyphBitmap>> = None;
        let mut i = 0;
        while i < text.len() {
            let start = i;
            let glyph = self.step(text, &mut i, prev.as_deref(), Some(&mut pen_x));
            if let Some(glyph) = &glyph {
                pen_x += glyph.advance;
                if pen_x.to_int() >= width {
                    return (start, fitted.to_int());
                }
            }
            fitted = pen_x;
            prev = glyph;
        }
        (text.len(), fitted.to_int())
    }

    /// Shortest byte offset whose suffix of `text` is narrower than `width`
    /// pixels, with the suffix's pixel width.
    pub(crate) fn width_to_rstrlen(&mut self, text: &[u8], width: i32) -> (usize, i32) {
        let mut pen_x = F26Dot6::ZERO;
        let mut fitted = F26Dot6::ZERO;
        let mut right: Option<Arc<GlyphBitmap>> = None;
        let mut end = text.len();
        while let Some(start) = prev_boundary(text, end) {
            let mut next = start;
            let glyph = self.step(text, &mut next, None, None);
            if let Some(glyph) = &glyph {
                if let Some(right) = &right {
                    self.kern(Some(&**glyph), right, &mut pen_x);
                }
                pen_x += glyph.advance;
                if pen_x.to_int() >= width {
                    return (end, fitted.to_int());
                }
            }
            fitted = pen_x;
            right = glyph;
            end = start;
        }
        (0, fitted.to_int())
    }

    /// Calls `f` with the byte offset and pixel bounds of each glyph of one
    /// line, until `f` returns `false` or a glyph starts at or past `limit`.
    ///
    /// Bounds are horizontal from the pen position of the string start and
    /// vertical from the baseline.
    pub(crate) fn glyph_bounds(
        &mut self,
        text: &[u8],
        limit: usize,
        mut f: impl FnMut(usize, Rect) -> bool,
    ) {
        let mut pen_x = F26Dot6::ZERO;
        let mut prev: Option<Arc<GlyphBitmap>> = None;
        let mut i = 0;
        while i < text.len() && i < limit {
            let i_curr = i;
            let Some(glyph) = self.step(text, &mut i, prev.as_deref(), Some(&mut pen_x)) else {
                continue;
            };
            let pen = pen_x.to_int_floor();
            let bounds = Rect::new(
                pen + glyph.bounds.x_min.to_int_floor(),
                pen + glyph.bounds.x_max.to_int_ceil(),
                glyph.bounds.y_min.to_int_floor(),
                glyph.bounds.y_max.to_int_ceil(),
            );
            if !f(i_curr, bounds) {
                break;
            }
            pen_x += glyph.advance;
            prev = Some(glyph);
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "pixel widths are far inside the i32 range"
)]
fn whole_pixels(width: f32) -> i32 {
    width as i32
}

impl Font {
    fn x_aspect(&self, flags: FontFlags) -> f32 {
        if flags.contains(FontFlags::ASPECT) {
            self.aspect[0]
        } else {
            1.0
        }
    }

    fn y_aspect(&self, flags: FontFlags) -> f32 {
        if flags.contains(FontFlags::ASPECT) {
            self.aspect[1]
        } else {
            1.0
        }
    }

    /// Pixel bounds of `text` drawn at the origin, and its line count and
    /// advance.
    ///
    /// With [`FontFlags::WORD_WRAP`] the box covers every wrapped line. An
    /// empty text, or one with no glyphs, has an all zero box.
    pub fn bounding_box_info(&self, text: impl AsRef<[u8]>) -> (Rect, TextInfo) {
        let text = until_nul(text.as_ref());
        if self.flags().contains(FontFlags::WORD_WRAP) {
            let mut bounds = Rect::empty_union();
            let mut lines = self.wrap_lines(text);
            while let Some(line) = lines.next() {
                let Some(guard) = lines.guard_mut() else {
                    break;
                };
                let (line_bounds, _) = guard.boundbox_line(line.bytes(), line.pen_y);
                bounds = bounds.union(&line_bounds);
            }
            if bounds.x_min > bounds.x_max {
                bounds = Rect::default();
            }
            (bounds, lines.info())
        } else {
            match self.acquire_glyph_cache() {
                Some(mut guard) => guard.boundbox_line(text, F26Dot6::ZERO),
                None => (Rect::default(), TextInfo::default()),
            }
        }
    }

    /// Pixel bounds of `text` drawn at the origin.
    pub fn bounding_box(&self, text: impl AsRef<[u8]>) -> Rect {
        self.bounding_box_info(text).0
    }

    /// Width of the bounding box, scaled by the aspect.
    pub fn width(&self, text: impl AsRef<[u8]>) -> f32 {
        self.width_and_height(text).0
    }

    /// Height of the bounding box, scaled by the aspect.
    pub fn height(&self, text: impl AsRef<[u8]>) -> f32 {
        self.width_and_height(text).1
    }

    /// Width and height of the bounding box, scaled by the aspect.
    pub fn width_and_height(&self, text: impl AsRef<[u8]>) -> (f32, f32) {
        let bounds = self.bounding_box(text);
        let flags = self.flags();
        (
            bounds.width() as f32 * self.x_aspect(flags),
            bounds.height() as f32 * self.y_aspect(flags),
        )
    }

    /// Byte length of the longest prefix of `text` narrower than `width`,
    /// and the prefix's width.
    pub fn width_to_strlen(&self, text: impl AsRef<[u8]>, width: f32) -> (usize, f32) {
        let text = until_nul(text.as_ref());
        let aspect = self.x_aspect(self.flags());
        let Some(mut guard) = self.acquire_glyph_cache() else {
            return (0, 0.0);
        };
        let (len, fitted) = guard.width_to_strlen(text, whole_pixels(width / aspect));
        (len, fitted as f32 * aspect)
    }

    /// Byte offset of the shortest suffix of `text` narrower than `width`,
    /// and the suffix's width.
    ///
    /// `text[offset..]` is the suffix; the offset is 0 when the whole text
    /// fits.
    pub fn width_to_rstrlen(&self, text: impl AsRef<[u8]>, width: f32) -> (usize, f32) {
        let text = until_nul(text.as_ref());
        let aspect = self.x_aspect(self.flags());
        let Some(mut guard) = self.acquire_glyph_cache() else {
            return (0, 0.0);
        };
        let (offset, fitted) = guard.width_to_rstrlen(text, whole_pixels(width / aspect));
        (offset, fitted as f32 * aspect)
    }

    /// Calls `f` with the byte offset and pixel bounds of each glyph of
    /// `text` until it returns `false`.
    ///
    /// Bounds are relative to the pen origin, y up from the baseline.
    pub fn glyph_bounds(&self, text: impl AsRef<[u8]>, f: impl FnMut(usize, Rect) -> bool) {
        let text = until_nul(text.as_ref());
        if let Some(mut guard) = self.acquire_glyph_cache() {
            guard.glyph_bounds(text, text.len(), f);
        }
    }

    /// Byte offset of the character a cursor `x` pixels from the string start
    /// lands before.
    ///
    /// A cursor on or left of a glyph's middle lands before it; one right of
    /// every glyph lands at the end of the text. Offsets never fall on a zero
    /// width character.
    pub fn str_offset_from_cursor(&self, text: impl AsRef<[u8]>, x: i32) -> usize {
        let text = until_nul(text.as_ref());
        let mut found = None;
        self.glyph_bounds(text, |offset, bounds| {
            if x <= (bounds.x_min + bounds.x_max) / 2 {
                found = Some(offset);
                return false;
            }
            true
        });
        let Some(mut offset) = found else {
            return text.len();
        };
        while offset > 0 {
            let mut next = offset;
            let c = decode_step(text, &mut next);
            if !is_zero_width(c) {
                break;
            }
            match prev_boundary(text, offset) {
                Some(prev) => offset = prev,
                None => break,
            }
        }
        offset
    }

    /// Pixel bounds of the glyph starting at byte `offset`.
    ///
    /// `None` when no glyph starts there.
    pub fn str_offset_to_glyph_bounds(
        &self,
        text: impl AsRef<[u8]>,
        offset: usize,
    ) -> Option<Rect> {
        let text = until_nul(text.as_ref());
        let mut found = None;
        let mut guard = self.acquire_glyph_cache()?;
        guard.glyph_bounds(text, offset + 1, |start, bounds| {
            if start == offset {
                found = Some(bounds);
                return false;
            }
            true
        });
        found
    }
}
