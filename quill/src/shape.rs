// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stepping the pen from one glyph to the next.

use alloc::sync::Arc;

use quill_fonts::F26Dot6;

use crate::kerning::kerning_adjustment;
use crate::utf8::decode_step;
use crate::{FontFlags, GlyphBitmap, GlyphCacheGuard};

/// Largest size, in points, subpixel variants are rendered for.
///
/// Above it whole pixel glyphs are indistinguishable.
const SUBPIXEL_SIZE_MAX: i32 = 35;

/// Subpixel variants are rendered in quarter pixel buckets.
const SUBPIXEL_BUCKET_MASK: i32 = !15;

/// How the pen is positioned between glyphs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PenMode {
    /// The pen is rounded to whole pixels after kerning.
    Hinted,
    /// The pen keeps its fractional position and glyphs are rendered at the
    /// nearest quarter pixel.
    SubpixelPositioned,
}

impl PenMode {
    /// The mode a font with `flags` draws in.
    ///
    /// Subpixel positioning needs anti-aliased rendering.
    pub fn from_flags(flags: FontFlags) -> Self {
        if flags.contains(FontFlags::RENDER_SUBPIXELAA) && !flags.contains(FontFlags::MONOCHROME) {
            Self::SubpixelPositioned
        } else {
            Self::Hinted
        }
    }
}

impl GlyphCacheGuard<'_> {
    /// Decodes the character at `*i`, advancing `*i` past it, and returns its
    /// glyph.
    ///
    /// With a pen, the pen is moved by the kerning between `prev` and the
    /// glyph and snapped according to the [`PenMode`]; in subpixel mode the
    /// glyph rendered for the pen's fractional position is returned. The
    /// advance is not applied. Monospaced fonts leave the pen alone.
    ///
    /// Returns `None` when the character has no glyph; callers skip it.
    pub fn step(
        &mut self,
        text: &[u8],
        i: &mut usize,
        prev: Option<&GlyphBitmap>,
        pen_x: Option<&mut F26Dot6>,
    ) -> Option<Arc<GlyphBitmap>> {
        let c = decode_step(text, i);
        let glyph = self.ensure_glyph(c)?;
        match pen_x {
            Some(pen) => Some(self.place(prev, glyph, pen)),
            None => Some(glyph),
        }
    }

    /// Moves `pen` to where `glyph` is drawn after `prev`.
    pub(crate) fn place(
        &mut self,
        prev: Option<&GlyphBitmap>,
        glyph: Arc<GlyphBitmap>,
        pen: &mut F26Dot6,
    ) -> Arc<GlyphBitmap> {
        if self.flags().contains(FontFlags::MONOSPACED) {
            return glyph;
        }
        self.kern(prev, &glyph, pen);
        match PenMode::from_flags(self.flags()) {
            PenMode::Hinted => glyph,
            PenMode::SubpixelPositioned => self.ensure_subpixel(glyph, *pen),
        }
    }

    /// Applies the kerning between `prev` and `glyph` to `pen`.
    pub(crate) fn kern(
        &mut self,
        prev: Option<&GlyphBitmap>,
        glyph: &GlyphBitmap,
        pen: &mut F26Dot6,
    ) {
        if self.flags().contains(FontFlags::MONOSPACED) {
            return;
        }
        *pen += kerning_adjustment(
            &*self.face,
            &self.metrics,
            self.state.kerning.as_mut(),
            prev,
            glyph,
        );
        if PenMode::from_flags(self.flags()) == PenMode::Hinted {
            *pen = pen.round();
        }
    }

    fn ensure_subpixel(&mut self, glyph: Arc<GlyphBitmap>, pen: F26Dot6) -> Arc<GlyphBitmap> {
        if glyph.is_blank()
            || glyph.advance < F26Dot6::ZERO
            || self.state.size > F26Dot6::from_int(SUBPIXEL_SIZE_MAX)
        {
            return glyph;
        }
        let bucket = pen.fract() & SUBPIXEL_BUCKET_MASK;
        let Ok(subpixel) = u8::try_from(bucket) else {
            return glyph;
        };
        if subpixel == 0 {
            return glyph;
        }
        self.ensure_variant(glyph.codepoint, subpixel)
            .unwrap_or(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::PenMode;
    use crate::FontFlags;

    #[test]
    fn pen_mode_from_flags() {
        assert_eq!(PenMode::from_flags(FontFlags::empty()), PenMode::Hinted);
        assert_eq!(
            PenMode::from_flags(FontFlags::RENDER_SUBPIXELAA),
            PenMode::SubpixelPositioned
        );
        assert_eq!(
            PenMode::from_flags(FontFlags::RENDER_SUBPIXELAA | FontFlags::MONOCHROME),
            PenMode::Hinted
        );
    }
}
