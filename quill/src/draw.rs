// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing text through the glyph batcher or into pixel buffers.

use alloc::sync::Arc;
use alloc::vec::Vec;

use quill_draw::{BatchKey, DrawBatcher, GlyphInstance, GpuDevice, Matrix4, PixelBuffer};
use quill_fonts::F26Dot6;

use crate::utf8::{display_width, until_nul};
use crate::{Font, FontFlags, GlyphBitmap, GlyphCacheGuard, Rect, TextInfo};

/// Flags that need a model-view transform instead of a baked pen offset.
const TRANSFORM_FLAGS: FontFlags = FontFlags::ROTATION
    .union(FontFlags::MATRIX)
    .union(FontFlags::ASPECT);

impl GlyphCacheGuard<'_> {
    /// Submits `glyph` with its pen at (`x`, `y`) relative to the font's
    /// position.
    fn draw_glyph(
        &self,
        gpu: &mut impl GpuDevice,
        batcher: &mut DrawBatcher,
        glyph: &GlyphBitmap,
        x: i32,
        y: i32,
    ) {
        if glyph.is_blank() {
            return;
        }
        let font = self.font;
        if self.flags().contains(FontFlags::CLIPPING) {
            let x_min = x + font.position[0] + glyph.left + 1;
            let y_min = y + font.position[1];
            let test = Rect::new(x_min, x_min + glyph.width - 2, y_min, y_min + glyph.top);
            if !font.clip_rect.contains_rect(&test) {
                return;
            }
        }
        let atlas = self.cache().atlas();
        let offset = glyph.upload(atlas);
        let [dx, dy] = batcher.offset();
        let left = x + glyph.left + dx;
        let top = y + glyph.top + dy;
        if self.flags().contains(FontFlags::SHADOW) {
            let [sx, sy] = font.shadow.offset;
            let (shadow_offset, [s_left, s_top, s_width, s_height]) =
                glyph.upload_shadow(atlas, font.shadow.blur);
            let shadow = GlyphInstance::new(
                x + s_left + dx + sx,
                y + s_top + dy + sy,
                s_width,
                s_height,
                font.shadow.color,
                shadow_offset,
            );
            batcher.submit(gpu, atlas, shadow);
        }
        let instance = GlyphInstance::new(left, top, glyph.width, glyph.height, font.color, offset);
        batcher.submit(gpu, atlas, instance);
    }

    /// Draws one line whose baseline is `pen_y` below the font's position.
    pub(crate) fn draw_line(
        &mut self,
        gpu: &mut impl GpuDevice,
        batcher: &mut DrawBatcher,
        text: &[u8],
        pen_y: F26Dot6,
    ) -> TextInfo {
        let mut pen_x = F26Dot6::ZERO;
        let mut prev: Option<Arc<GlyphBitmap>> = None;
        let mut i = 0;
        while i < text.len() {
            let Some(glyph) = self.step(text, &mut i, prev.as_deref(), Some(&mut pen_x)) else {
                continue;
            };
            self.draw_glyph(gpu, batcher, &glyph, pen_x.to_int_floor(), pen_y.to_int_floor());
            pen_x += glyph.advance;
            prev = Some(glyph);
        }
        TextInfo {
            lines: 1,
            width: pen_x.to_int(),
        }
    }

    /// Draws `text` in columns `cwidth` pixels wide, returning the number of
    /// columns used.
    pub(crate) fn draw_mono(
        &mut self,
        gpu: &mut impl GpuDevice,
        batcher: &mut DrawBatcher,
        text: &[u8],
        cwidth: i32,
        tab_columns: i32,
    ) -> i32 {
        let tab_columns = tab_columns.max(1);
        let mut columns = 0;
        let mut pen_x = 0;
        let mut i = 0;
        while i < text.len() {
            let Some(glyph) = self.step(text, &mut i, None, None) else {
                continue;
            };
            let col = if glyph.codepoint == '\t' {
                tab_columns - columns % tab_columns
            } else {
                i32::try_from(display_width(glyph.codepoint)).unwrap_or(1)
            };
            // Clipped glyphs still take their columns.
            self.draw_glyph(gpu, batcher, &glyph, pen_x, 0);
            columns += col;
            pen_x += cwidth * col;
        }
        columns
    }

    /// Blits one line into `buffer` with its baseline `pen_y` below the
    /// font's position.
    pub(crate) fn draw_buffer_line(
        &mut self,
        buffer: &mut PixelBuffer<'_>,
        text: &[u8],
        pen_y: F26Dot6,
    ) -> TextInfo {
        let [x, y] = self.font.position;
        let origin = F26Dot6::from_int(x);
        let mut pen_x = origin;
        let pen_y = F26Dot6::from_int(y) + pen_y;
        let mut prev: Option<Arc<GlyphBitmap>> = None;
        let mut i = 0;
        while i < text.len() {
            let Some(glyph) = self.step(text, &mut i, prev.as_deref(), Some(&mut pen_x)) else {
                continue;
            };
            buffer.blit(&glyph.image(), pen_x, pen_y);
            pen_x += glyph.advance;
            prev = Some(glyph);
        }
        TextInfo {
            lines: 1,
            width: (pen_x - origin).to_int(),
        }
    }
}

impl Font {
    /// Whether the font draws with a baked pen offset rather than a
    /// model-view transform.
    fn is_simple(flags: FontFlags) -> bool {
        !flags.intersects(TRANSFORM_FLAGS)
    }

    /// Model-view transform of non-simple draws, applied after `current`.
    fn transform(&self, flags: FontFlags, current: Matrix4) -> Matrix4 {
        let mut m = current;
        if flags.contains(FontFlags::MATRIX) {
            m = m * self.matrix;
        }
        let [x, y] = self.position;
        m = m * Matrix4::translation(x as f32, y as f32, 0.0);
        if flags.contains(FontFlags::ASPECT) {
            m = m * Matrix4::scale(self.aspect[0], self.aspect[1], 1.0);
        }
        if flags.contains(FontFlags::ROTATION) {
            m = m * Matrix4::rotation_z(self.angle);
        }
        m
    }

    /// Runs `f` between `begin` and `end` of the batcher, under the font's
    /// transform when it has one.
    fn with_batch<G: GpuDevice, R>(
        &self,
        gpu: &mut G,
        batcher: &mut DrawBatcher,
        guard: &mut GlyphCacheGuard<'_>,
        f: impl FnOnce(&mut G, &mut DrawBatcher, &mut GlyphCacheGuard<'_>) -> R,
    ) -> R {
        let flags = guard.flags();
        let simple = Self::is_simple(flags);
        let key = BatchKey {
            font: self.id(),
            simple,
        };
        batcher.begin(gpu, key, self.position);
        if !simple {
            gpu.push_matrix();
            let m = self.transform(flags, gpu.model_view());
            gpu.set_model_view(m);
        }
        let result = f(gpu, batcher, guard);
        batcher.end(gpu);
        if !simple {
            gpu.pop_matrix();
        }
        result
    }

    /// Draws `text` at the font's position.
    ///
    /// Glyphs go to `batcher`, which draws them at its next flush; simple
    /// draws may accumulate across calls while batching is enabled. With
    /// [`FontFlags::WORD_WRAP`] the text is wrapped at the wrap width and
    /// lines go down from the position.
    pub fn draw(
        &self,
        gpu: &mut impl GpuDevice,
        batcher: &mut DrawBatcher,
        text: impl AsRef<[u8]>,
    ) -> TextInfo {
        let text = until_nul(text.as_ref());
        if text.is_empty() {
            return TextInfo::default();
        }
        if self.flags().contains(FontFlags::WORD_WRAP) {
            let mut lines = self.wrap_lines(text);
            let batch: Vec<_> = lines.by_ref().collect();
            let info = lines.info();
            if let Some(guard) = lines.guard_mut() {
                self.with_batch(gpu, batcher, guard, |gpu, batcher, guard| {
                    for line in &batch {
                        guard.draw_line(gpu, batcher, line.bytes(), line.pen_y);
                    }
                });
            }
            return info;
        }
        let Some(mut guard) = self.acquire_glyph_cache() else {
            return TextInfo::default();
        };
        self.with_batch(gpu, batcher, &mut guard, |gpu, batcher, guard| {
            guard.draw_line(gpu, batcher, text, F26Dot6::ZERO)
        })
    }

    /// Draws `text` in fixed columns of `cwidth` pixels, with tab stops every
    /// `tab_columns` columns, and returns the number of columns used.
    ///
    /// Characters take as many columns as their display width; kerning is
    /// never applied.
    pub fn draw_mono(
        &self,
        gpu: &mut impl GpuDevice,
        batcher: &mut DrawBatcher,
        text: impl AsRef<[u8]>,
        cwidth: i32,
        tab_columns: i32,
    ) -> i32 {
        let text = until_nul(text.as_ref());
        if text.is_empty() {
            return 0;
        }
        let Some(mut guard) = self.acquire_glyph_cache() else {
            return 0;
        };
        self.with_batch(gpu, batcher, &mut guard, |gpu, batcher, guard| {
            guard.draw_mono(gpu, batcher, text, cwidth, tab_columns)
        })
    }

    /// Blits `text` into `buffer` with its first baseline at the font's
    /// position, in the buffer's color.
    ///
    /// Wraps like [`draw`](Self::draw) with [`FontFlags::WORD_WRAP`].
    /// Transforms and clipping do not apply.
    pub fn draw_buffer(&self, buffer: &mut PixelBuffer<'_>, text: impl AsRef<[u8]>) -> TextInfo {
        let text = until_nul(text.as_ref());
        if text.is_empty() {
            return TextInfo::default();
        }
        if self.flags().contains(FontFlags::WORD_WRAP) {
            let mut lines = self.wrap_lines(text);
            while let Some(line) = lines.next() {
                let Some(guard) = lines.guard_mut() else {
                    break;
                };
                guard.draw_buffer_line(buffer, line.bytes(), line.pen_y);
            }
            return lines.info();
        }
        match self.acquire_glyph_cache() {
            Some(mut guard) => guard.draw_buffer_line(buffer, text, F26Dot6::ZERO),
            None => TextInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_flags_make_draws_non_simple() {
        assert!(
            Font::is_simple(FontFlags::WORD_WRAP | FontFlags::SHADOW),
            "plain draws are simple"
        );
        assert!(!Font::is_simple(FontFlags::ROTATION), "rotation needs a transform");
        assert!(!Font::is_simple(FontFlags::ASPECT), "aspect needs a transform");
    }
}
