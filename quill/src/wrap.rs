// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breaking text into lines that fit the font's wrap width.

use alloc::sync::Arc;
use core::ops::Range;

use quill_fonts::F26Dot6;

use crate::utf8::until_nul;
use crate::{Font, GlyphBitmap, GlyphCacheGuard, TextInfo};

/// One line produced by [`WrapLines`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedLine<'t> {
    /// The whole text the line was taken from.
    pub text: &'t [u8],
    /// Byte range of the line, without the space or newline it broke at.
    pub range: Range<usize>,
    /// Zero based line number.
    pub index: usize,
    /// Baseline offset from the first line, zero or negative.
    pub pen_y: F26Dot6,
}

impl<'t> WrappedLine<'t> {
    /// The bytes of the line.
    pub fn bytes(&self) -> &'t [u8] {
        &self.text[self.range.clone()]
    }
}

/// Iterator over the lines of a text wrapped at the font's wrap width.
///
/// A line ends at a newline, or before the word that would cross the wrap
/// width. Words wider than the wrap width are kept whole. Created by
/// [`Font::wrap_lines`]; the font stays locked until the iterator is
/// dropped.
pub struct WrapLines<'f, 't> {
    guard: Option<GlyphCacheGuard<'f>>,
    text: &'t [u8],
    wrap_width: F26Dot6,
    line_height: F26Dot6,
    i: usize,
    start: usize,
    /// End of the current line's text and where the next line starts
    /// stepping from.
    last: [usize; 2],
    pen_x: F26Dot6,
    pen_x_next: F26Dot6,
    pen_y: F26Dot6,
    prev: Option<Arc<GlyphBitmap>>,
    /// Whether a glyph has been placed since the last line was emitted.
    pending: bool,
    lines: usize,
}

impl core::fmt::Debug for WrapLines<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WrapLines")
            .field("len", &self.text.len())
            .field("wrap_width", &self.wrap_width)
            .field("i", &self.i)
            .field("start", &self.start)
            .field("last", &self.last)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl<'f, 't> WrapLines<'f, 't> {
    pub(crate) fn new(guard: Option<GlyphCacheGuard<'f>>, text: &'t [u8]) -> Self {
        let (wrap_width, line_height) = match &guard {
            Some(guard) => {
                let width = guard.font().wrap_width;
                let width = width.map_or(F26Dot6::MAX, F26Dot6::from_int);
                (width, guard.metrics().height.max(F26Dot6::ONE))
            }
            None => (F26Dot6::MAX, F26Dot6::ONE),
        };
        Self {
            guard,
            text,
            wrap_width,
            line_height,
            i: 0,
            start: 0,
            last: [0, 0],
            pen_x: F26Dot6::ZERO,
            pen_x_next: F26Dot6::ZERO,
            pen_y: F26Dot6::ZERO,
            prev: None,
            pending: false,
            lines: 0,
        }
    }

    /// The glyph cache the lines are measured with, for drawing them.
    pub(crate) fn guard_mut(&mut self) -> Option<&mut GlyphCacheGuard<'f>> {
        self.guard.as_mut()
    }

    /// Lines emitted so far and the pen advance of the last one.
    ///
    /// Complete once the iterator is exhausted.
    pub fn info(&self) -> TextInfo {
        TextInfo {
            lines: self.lines,
            width: self.pen_x_next.to_int(),
        }
    }

    fn emit(&mut self, end: usize) -> WrappedLine<'t> {
        let line = WrappedLine {
            text: self.text,
            range: self.start..end.max(self.start),
            index: self.lines,
            pen_y: self.pen_y,
        };
        self.start = self.last[0];
        self.i = self.last[1];
        self.pen_x = F26Dot6::ZERO;
        self.pen_y -= self.line_height;
        self.prev = None;
        self.pending = false;
        self.lines += 1;
        line
    }
}

impl<'t> Iterator for WrapLines<'_, 't> {
    type Item = WrappedLine<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;
        let guard = self.guard.as_mut()?;
        while self.i < text.len() {
            let i_curr = self.i;
            let prev = self.prev.as_deref();
            let Some(glyph) = guard.step(text, &mut self.i, prev, Some(&mut self.pen_x)) else {
                continue;
            };
            self.pending = true;
            self.pen_x_next = self.pen_x + glyph.advance;
            let c = glyph.codepoint;

            let flush = if self.pen_x_next >= self.wrap_width && self.start != self.last[0] {
                true
            } else if self.i >= text.len() {
                self.last = [self.i + usize::from(c != '\n'), self.i];
                true
            } else if c == '\n' {
                self.last = [i_curr + 1, self.i];
                true
            } else {
                if c != ' ' && self.prev.as_ref().is_some_and(|prev| prev.codepoint == ' ') {
                    self.last = [i_curr, i_curr];
                }
                false
            };
            if flush {
                // The byte before `last[0]` is the space or newline the line
                // broke at, or one past the end of the text.
                return Some(self.emit(self.last[0] - 1));
            }
            self.pen_x = self.pen_x_next;
            self.prev = Some(glyph);
        }
        // The final character did not resolve, so no break closed the line.
        if self.pending && self.start < text.len() {
            self.last = [text.len(), text.len()];
            return Some(self.emit(text.len()));
        }
        None
    }
}

impl Font {
    /// Splits `text` into lines at the wrap width.
    ///
    /// The text ends at its first NUL byte. Yields nothing when the font
    /// cannot render.
    pub fn wrap_lines<'t>(&self, text: &'t (impl AsRef<[u8]> + ?Sized)) -> WrapLines<'_, 't> {
        WrapLines::new(self.acquire_glyph_cache(), until_nul(text.as_ref()))
    }
}
