// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear glyph coverage store backing the atlas texture.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// An atlas shared between a glyph cache and the batcher drawing from it.
pub type SharedAtlas = Arc<Mutex<GlyphAtlas>>;

/// A borrowed 8-bit coverage bitmap.
#[derive(Copy, Clone, Debug)]
pub struct GlyphImage<'a> {
    /// Horizontal distance from the pen to the left column.
    pub left: i32,
    /// Distance from the baseline up to the top row.
    pub top: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Bytes per row. Rows are stored top to bottom when positive, bottom to
    /// top when negative.
    pub pitch: i32,
    /// Coverage bytes.
    pub data: &'a [u8],
}

impl GlyphImage<'_> {
    /// Whether the bitmap covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Coverage at column `x` of stored row `row`, zero when out of range.
    pub(crate) fn coverage(&self, x: i32, row: i32) -> u8 {
        let index = i64::from(row) * i64::from(self.pitch.abs()) + i64::from(x);
        usize::try_from(index)
            .ok()
            .and_then(|index| self.data.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Stored row index of visual row `y`, counted from the top.
    fn stored_row(&self, y: i32) -> i32 {
        if self.pitch < 0 {
            self.height - 1 - y
        } else {
            y
        }
    }

    /// Coverage at column `x` of visual row `y`, zero outside the bitmap.
    fn visual(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage(x, self.stored_row(y))
    }

    /// A copy convolved with the separable `kernel` in both directions.
    ///
    /// The copy grows by half the kernel length on every side so no coverage
    /// is cut off. Weights are normalized by the square of their sum.
    pub fn blurred(&self, kernel: &[u16]) -> OwnedImage {
        let radius = i32::try_from(kernel.len() / 2).unwrap_or(0);
        let sum: u32 = kernel.iter().map(|&k| u32::from(k)).sum();
        let norm = (sum * sum).max(1);
        let width = (self.width + 2 * radius).max(0);
        let height = (self.height + 2 * radius).max(0);
        let taps = || (0..).zip(kernel.iter().map(|&k| u32::from(k)));

        // Horizontal pass over the source rows, then vertical into the copy.
        let mut rows = Vec::with_capacity(usize::try_from(width * self.height.max(0)).unwrap_or(0));
        for y in 0..self.height {
            for x in 0..width {
                let sum = taps()
                    .map(|(k, weight)| weight * u32::from(self.visual(x + k - 2 * radius, y)))
                    .sum::<u32>();
                rows.push(sum);
            }
        }
        let row = |x: i32, y: i32| -> u32 {
            if y < 0 || y >= self.height {
                return 0;
            }
            usize::try_from(y * width + x)
                .ok()
                .and_then(|i| rows.get(i))
                .copied()
                .unwrap_or(0)
        };
        let mut data = Vec::with_capacity(usize::try_from(width * height).unwrap_or(0));
        for y in 0..height {
            for x in 0..width {
                let sum = taps()
                    .map(|(k, weight)| weight * row(x, y + k - 2 * radius))
                    .sum::<u32>();
                data.push(u8::try_from((sum + norm / 2) / norm).unwrap_or(u8::MAX));
            }
        }
        OwnedImage {
            left: self.left - radius,
            top: self.top + radius,
            width,
            height,
            data,
        }
    }
}

/// An owned coverage bitmap with rows stored top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedImage {
    /// Horizontal distance from the pen to the left column.
    pub left: i32,
    /// Distance from the baseline up to the top row.
    pub top: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Coverage bytes, `width * height` long.
    pub data: Vec<u8>,
}

impl OwnedImage {
    /// Borrows the bitmap.
    pub fn as_image(&self) -> GlyphImage<'_> {
        GlyphImage {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            pitch: self.width,
            data: &self.data,
        }
    }
}

/// Texel count an atlas reserves before its first glyph.
const INITIAL_RESERVE: usize = 4096;

/// Glyph coverage appended texel by texel, in order of first use.
///
/// A glyph occupies `width * height` consecutive texels, rows top to bottom.
/// The GPU texture mirrors this store as a fixed width 2D texture that is
/// uploaded incrementally by the batcher.
#[derive(Debug)]
pub struct GlyphAtlas {
    id: u64,
    texels: Vec<u8>,
    reserved: usize,
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphAtlas {
    /// Creates an empty atlas.
    pub fn new() -> Self {
        static ATLAS_IDS: AtomicU64 = AtomicU64::new(1);
        Self {
            id: ATLAS_IDS.fetch_add(1, Ordering::Relaxed),
            texels: Vec::new(),
            reserved: 0,
        }
    }

    /// Creates an empty atlas ready to be shared.
    pub fn new_shared() -> SharedAtlas {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Identity used by the batcher to track the atlas' texture.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Appends a glyph and returns the offset of its first texel.
    pub fn push(&mut self, image: &GlyphImage<'_>) -> i32 {
        let offset = i32::try_from(self.texels.len()).unwrap_or(i32::MAX);
        if image.is_empty() {
            return offset;
        }
        for y in 0..image.height {
            let row = image.stored_row(y);
            self.texels
                .extend((0..image.width).map(|x| image.coverage(x, row)));
        }
        while self.reserved < self.texels.len() {
            self.reserved = (self.reserved * 2).max(INITIAL_RESERVE);
        }
        offset
    }

    /// Number of texels stored.
    pub fn len(&self) -> usize {
        self.texels.len()
    }

    /// Whether no glyph has been stored.
    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    /// Texels the atlas has grown to, always at least [`len`](Self::len).
    ///
    /// Textures are sized for this so that they are recreated only when the
    /// reservation doubles.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// The stored texels.
    pub fn texels(&self) -> &[u8] {
        &self.texels
    }
}
