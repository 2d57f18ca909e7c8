// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendered glyphs and the per-configuration caches that own them.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use std::sync::OnceLock;

use hashbrown::{HashMap, HashSet};
use parking_lot::MutexGuard;
use quill_draw::{GlyphAtlas, GlyphImage, SharedAtlas};
use quill_fonts::{
    F26Dot6, FontFace, GlyphBounds, Hinting, RasterRequest, RasterizedGlyph, RenderMode,
    SizeMetrics,
};
use smallvec::SmallVec;

use crate::font::FontState;
use crate::utf8::display_width;
use crate::{Font, FontFlags, ShadowBlur};

/// Glyph caches kept per font before the least recently used one is dropped.
pub const MAX_GLYPH_CACHES: usize = 8;

/// A glyph rendered at one size and configuration.
pub struct GlyphBitmap {
    /// The character this glyph was looked up for.
    pub codepoint: char,
    /// Index of the glyph in its face.
    pub glyph_index: u32,
    /// Horizontal pen offset the bitmap was rendered at, in 1/64 pixels.
    pub subpixel: u8,
    /// Distance from the pen to the left column, in pixels.
    pub left: i32,
    /// Distance from the baseline up to the top row, in pixels.
    pub top: i32,
    /// Bitmap width in pixels.
    pub width: i32,
    /// Bitmap height in rows.
    pub height: i32,
    /// Bytes per row; negative when rows are stored bottom to top.
    pub pitch: i32,
    /// Pen advance.
    pub advance: F26Dot6,
    /// Outline bounds relative to the pen.
    pub bounds: GlyphBounds,
    /// Left side bearing change introduced by hinting.
    pub lsb_delta: F26Dot6,
    /// Right side bearing change introduced by hinting.
    pub rsb_delta: F26Dot6,
    data: Box<[u8]>,
    atlas_offset: OnceLock<i32>,
    /// Atlas offsets of the blurred shadow copies, by [`ShadowBlur`] kernel.
    shadow_offsets: [OnceLock<i32>; 2],
}

impl fmt::Debug for GlyphBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphBitmap")
            .field("codepoint", &self.codepoint)
            .field("glyph_index", &self.glyph_index)
            .field("subpixel", &self.subpixel)
            .field("left", &self.left)
            .field("top", &self.top)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("advance", &self.advance)
            .field("atlas_offset", &self.atlas_offset.get())
            .finish_non_exhaustive()
    }
}

impl GlyphBitmap {
    fn new(codepoint: char, glyph_index: u32, subpixel: u8, raster: RasterizedGlyph) -> Self {
        Self {
            codepoint,
            glyph_index,
            subpixel,
            left: raster.left,
            top: raster.top,
            width: i32::try_from(raster.width).unwrap_or(0),
            height: i32::try_from(raster.height).unwrap_or(0),
            pitch: raster.pitch,
            advance: raster.advance,
            bounds: raster.bounds,
            lsb_delta: raster.lsb_delta,
            rsb_delta: raster.rsb_delta,
            data: raster.data.into_boxed_slice(),
            atlas_offset: OnceLock::new(),
            shadow_offsets: [OnceLock::new(), OnceLock::new()],
        }
    }

    /// Whether the glyph has no pixels, like a space.
    pub fn is_blank(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Coverage bytes, `|pitch| * height` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The bitmap as an image for the atlas or a pixel buffer.
    pub fn image(&self) -> GlyphImage<'_> {
        GlyphImage {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            data: &self.data,
        }
    }

    /// First atlas texel of the glyph, once it has been drawn.
    pub fn atlas_offset(&self) -> Option<i32> {
        self.atlas_offset.get().copied()
    }

    /// Copies the bitmap into `atlas` the first time it is needed.
    pub(crate) fn upload(&self, atlas: &SharedAtlas) -> i32 {
        *self
            .atlas_offset
            .get_or_init(|| atlas.lock().push(&self.image()))
    }

    /// Copies the shadow bitmap for `blur` into `atlas` the first time it is
    /// needed.
    ///
    /// Returns the atlas offset and the bitmap's `[left, top, width, height]`.
    /// A sharp shadow shares the glyph's own texels.
    pub(crate) fn upload_shadow(&self, atlas: &SharedAtlas, blur: ShadowBlur) -> (i32, [i32; 4]) {
        let slot = match blur {
            ShadowBlur::None => None,
            ShadowBlur::Blur3 => Some(&self.shadow_offsets[0]),
            ShadowBlur::Blur5 => Some(&self.shadow_offsets[1]),
        };
        let (Some(slot), Some(kernel)) = (slot, blur.kernel()) else {
            let bounds = [self.left, self.top, self.width, self.height];
            return (self.upload(atlas), bounds);
        };
        let radius = i32::try_from(kernel.len() / 2).unwrap_or(0);
        let offset = *slot.get_or_init(|| {
            let blurred = self.image().blurred(kernel);
            atlas.lock().push(&blurred.as_image())
        });
        let bounds = [
            self.left - radius,
            self.top + radius,
            self.width + 2 * radius,
            self.height + 2 * radius,
        ];
        (offset, bounds)
    }
}

/// The rendering configuration a [`GlyphCache`] holds glyphs for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphCacheKey {
    /// Size in 26.6 points.
    pub size: F26Dot6,
    /// Anti-aliasing mode.
    pub render_mode: RenderMode,
    /// Hinting strength.
    pub hinting: Hinting,
}

impl GlyphCacheKey {
    /// The configuration a font with `flags` at `size` renders with.
    pub fn new(size: F26Dot6, flags: FontFlags) -> Self {
        let render_mode = if flags.contains(FontFlags::MONOCHROME) {
            RenderMode::Monochrome
        } else {
            RenderMode::Antialiased
        };
        let hinting = if flags.contains(FontFlags::HINTING_NONE) {
            Hinting::None
        } else if flags.contains(FontFlags::HINTING_SLIGHT) {
            Hinting::Slight
        } else if flags.contains(FontFlags::HINTING_FULL) {
            Hinting::Full
        } else {
            Hinting::None
        };
        Self {
            size,
            render_mode,
            hinting,
        }
    }
}

/// Glyphs of one font in one configuration.
///
/// Glyphs are keyed by character; each has its whole pixel rendering plus any
/// subpixel positioned variants. Characters the face lacks are remembered so
/// they are looked up only once.
pub struct GlyphCache {
    key: GlyphCacheKey,
    glyphs: HashMap<char, SmallVec<[Arc<GlyphBitmap>; 1]>>,
    missing: HashSet<char>,
    fixed_width: i32,
    atlas: SharedAtlas,
}

impl fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphCache")
            .field("key", &self.key)
            .field("glyphs", &self.glyphs.len())
            .field("missing", &self.missing.len())
            .field("fixed_width", &self.fixed_width)
            .finish_non_exhaustive()
    }
}

impl GlyphCache {
    /// Creates an empty cache.
    ///
    /// The fixed width used for monospaced drawing is the advance of the
    /// digit zero (`zero_index`), or half the line height when the face has
    /// no such glyph.
    pub(crate) fn new(
        key: GlyphCacheKey,
        face: &dyn FontFace,
        metrics: &SizeMetrics,
        zero_index: u32,
    ) -> Self {
        let zero_advance = (zero_index != 0)
            .then(|| {
                face.rasterize(&RasterRequest {
                    glyph_index: zero_index,
                    ppem: metrics.ppem(),
                    x_offset: F26Dot6::ZERO,
                    render_mode: key.render_mode,
                    hinting: Hinting::None,
                })
            })
            .flatten()
            .map(|raster| raster.advance.to_int());
        let fixed_width = zero_advance
            .unwrap_or_else(|| F26Dot6::from_raw(metrics.height.to_raw() / 2).to_int())
            .max(1);
        Self {
            key,
            glyphs: HashMap::new(),
            missing: HashSet::new(),
            fixed_width,
            atlas: GlyphAtlas::new_shared(),
        }
    }

    /// The configuration glyphs are rendered with.
    pub fn key(&self) -> GlyphCacheKey {
        self.key
    }

    /// Column width of monospaced drawing, in whole pixels.
    pub fn fixed_width(&self) -> i32 {
        self.fixed_width
    }

    /// The atlas glyphs of this cache are drawn from.
    pub fn atlas(&self) -> &SharedAtlas {
        &self.atlas
    }

    /// Number of rendered glyphs, counting subpixel variants.
    pub fn len(&self) -> usize {
        self.glyphs.values().map(SmallVec::len).sum()
    }

    /// Whether nothing has been rendered yet.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    fn get(&self, c: char, subpixel: u8) -> Option<&Arc<GlyphBitmap>> {
        self.glyphs
            .get(&c)?
            .iter()
            .find(|glyph| glyph.subpixel == subpixel)
    }

    fn insert(&mut self, glyph: GlyphBitmap) -> Arc<GlyphBitmap> {
        let glyph = Arc::new(glyph);
        self.glyphs
            .entry(glyph.codepoint)
            .or_default()
            .push(Arc::clone(&glyph));
        glyph
    }
}

/// Exclusive access to a font's glyph cache for the current configuration.
///
/// Holds the font's lock together with the face and size the cache renders
/// with, leased from the face cache for as long as the guard lives. Dropping
/// the guard releases the lock.
pub struct GlyphCacheGuard<'a> {
    pub(crate) font: &'a Font,
    pub(crate) state: MutexGuard<'a, FontState>,
    pub(crate) face: Arc<dyn FontFace>,
    pub(crate) metrics: SizeMetrics,
    cache: usize,
}

impl fmt::Debug for GlyphCacheGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphCacheGuard")
            .field("font", &self.font.id())
            .field("metrics", &self.metrics)
            .field("cache", self.cache())
            .finish_non_exhaustive()
    }
}

impl<'a> GlyphCacheGuard<'a> {
    pub(crate) fn new(
        font: &'a Font,
        mut state: MutexGuard<'a, FontState>,
        face: Arc<dyn FontFace>,
        metrics: SizeMetrics,
    ) -> Self {
        let key = GlyphCacheKey::new(state.size, state.flags);
        let zero_index = font.glyph_index(&*face, '0');
        let cache = state
            .glyph_caches
            .entry_index(key, || GlyphCache::new(key, &*face, &metrics, zero_index));
        Self {
            font,
            state,
            face,
            metrics,
            cache,
        }
    }

    /// The font the cache belongs to.
    pub fn font(&self) -> &'a Font {
        self.font
    }

    /// The font's flags, including those set by the engine.
    pub fn flags(&self) -> FontFlags {
        self.state.flags
    }

    /// Scaled metrics of the font's current size.
    pub fn metrics(&self) -> &SizeMetrics {
        &self.metrics
    }

    /// The glyph cache of the current configuration.
    pub fn cache(&self) -> &GlyphCache {
        self.state.glyph_caches.get(self.cache)
    }

    fn cache_mut(&mut self) -> &mut GlyphCache {
        self.state.glyph_caches.get_mut(self.cache)
    }

    /// Returns the glyph for `c`, rendering it on first use.
    ///
    /// Returns `None` when the face has no glyph for `c` or rendering fails;
    /// callers skip such characters.
    pub fn ensure_glyph(&mut self, c: char) -> Option<Arc<GlyphBitmap>> {
        self.ensure_variant(c, 0)
    }

    /// Returns the rendering of `c` with its pen `subpixel` 1/64 pixels right
    /// of a whole pixel.
    pub(crate) fn ensure_variant(&mut self, c: char, subpixel: u8) -> Option<Arc<GlyphBitmap>> {
        let cache = self.cache();
        if let Some(glyph) = cache.get(c, subpixel) {
            return Some(Arc::clone(glyph));
        }
        if cache.missing.contains(&c) {
            return None;
        }
        let key = cache.key;
        let fixed_width = cache.fixed_width;

        let glyph_index = self.font.glyph_index(&*self.face, c);
        if glyph_index == 0 {
            self.cache_mut().missing.insert(c);
            return None;
        }
        let request = RasterRequest {
            glyph_index,
            ppem: self.metrics.ppem(),
            x_offset: F26Dot6::from_raw(i32::from(subpixel)),
            render_mode: key.render_mode,
            hinting: key.hinting,
        };
        let Some(mut raster) = self.face.rasterize(&request) else {
            log::warn!(
                "cannot render glyph {glyph_index} for {c:?} of {}",
                self.font.source().name()
            );
            self.cache_mut().missing.insert(c);
            return None;
        };
        if self.flags().contains(FontFlags::MONOSPACED) {
            let columns = i32::try_from(display_width(c)).unwrap_or(1);
            raster.advance = F26Dot6::from_int(fixed_width * columns);
        }
        let glyph = GlyphBitmap::new(c, glyph_index, subpixel, raster);
        Some(self.cache_mut().insert(glyph))
    }
}
