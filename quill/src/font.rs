// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font handles and the context they are loaded through.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use bitflags::bitflags;
use parking_lot::Mutex;
use quill_draw::Matrix4;
use quill_fonts::{
    known_face, open_face, Error, ErrorKind, F26Dot6, FaceCache, FaceCacheOptions, FaceFlags,
    FaceInfo, FaceRef, FontBackend, FontFace, FontId, FontSource, SizeMetrics, SizeRef,
    UnicodeRanges, DPI,
};

use crate::glyph::{GlyphCache, GlyphCacheGuard, GlyphCacheKey, MAX_GLYPH_CACHES};
use crate::lru_cache::LruCache;
use crate::{KerningTable, Rect};

bitflags! {
    /// Options and engine maintained state of a [`Font`].
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FontFlags: u32 {
        /// Rotate drawn text by the font's angle.
        const ROTATION = 1 << 0;
        /// Skip glyphs outside the clip rectangle.
        const CLIPPING = 1 << 1;
        /// Draw a shadow under each glyph.
        const SHADOW = 1 << 2;
        /// Transform drawn text by the font's matrix.
        const MATRIX = 1 << 3;
        /// Scale drawn text and measurements by the font's aspect.
        const ASPECT = 1 << 4;
        /// Wrap text at the font's wrap width.
        const WORD_WRAP = 1 << 5;
        /// Step every character by whole columns and never kern.
        ///
        /// Set automatically for fixed width faces.
        const MONOSPACED = 1 << 6;
        /// Render unhinted outlines.
        const HINTING_NONE = 1 << 7;
        /// Render with vertical-only hinting.
        const HINTING_SLIGHT = 1 << 8;
        /// Render with full hinting.
        const HINTING_FULL = 1 << 9;
        /// Render without anti-aliasing.
        const MONOCHROME = 1 << 10;
        /// Keep the pen at subpixel positions and render glyph variants for them.
        const RENDER_SUBPIXELAA = 1 << 11;
        /// The face failed to load; the font renders nothing.
        const BAD_FONT = 1 << 12;
        /// The face claims to cover every Unicode range.
        const LAST_RESORT = 1 << 13;
        /// The face is owned by the shared face cache.
        const CACHED = 1 << 14;
    }
}

/// Flags an application may not set or clear.
const ENGINE_FLAGS: FontFlags = FontFlags::BAD_FONT
    .union(FontFlags::LAST_RESORT)
    .union(FontFlags::CACHED);

/// Point size of newly loaded fonts.
pub const DEFAULT_SIZE: f32 = 11.0;

/// Shared state fonts are loaded through.
///
/// Every font loaded from one context shares its [`FaceCache`], so that the
/// number of open faces stays bounded however many fonts exist.
#[derive(Clone, Debug)]
pub struct FontContext {
    cache: Arc<FaceCache>,
}

impl FontContext {
    /// Creates a context whose faces are opened with `backend`.
    pub fn new(backend: Arc<dyn FontBackend>) -> Self {
        Self::with_options(backend, FaceCacheOptions::default())
    }

    /// Creates a context with custom face cache limits.
    pub fn with_options(backend: Arc<dyn FontBackend>, options: FaceCacheOptions) -> Self {
        Self {
            cache: Arc::new(FaceCache::with_options(backend, options)),
        }
    }

    /// The face cache shared by this context's fonts.
    pub fn face_cache(&self) -> &Arc<FaceCache> {
        &self.cache
    }

    /// Loads a font whose face is managed by the shared cache.
    ///
    /// Fonts whose file name is a known fallback font take their coverage
    /// from a built in table and open their face only when first used.
    /// Other fonts are opened immediately, so an unusable file fails here.
    pub fn load(&self, source: FontSource) -> Result<Font, Error> {
        Font::create(source, FaceProvider::Cached(Arc::clone(&self.cache)))
    }
}

/// Where a font gets its face from.
#[derive(Debug)]
pub(crate) enum FaceProvider {
    Cached(Arc<FaceCache>),
    Owned(Arc<dyn FontBackend>),
}

/// A font's mutable engine state, guarded by the font's lock.
pub(crate) struct FontState {
    pub(crate) flags: FontFlags,
    pub(crate) size: F26Dot6,
    face_ref: Option<FaceRef>,
    size_ref: Option<SizeRef>,
    owned_face: Option<Arc<dyn FontFace>>,
    owned_metrics: Option<SizeMetrics>,
    unicode_ranges: UnicodeRanges,
    family_name: Option<String>,
    style_name: Option<String>,
    pub(crate) kerning: Option<KerningTable>,
    pub(crate) glyph_caches: LruCache<GlyphCacheKey, GlyphCache>,
}

impl FontState {
    fn record_face(&mut self, info: FaceInfo) {
        if info.flags.contains(FaceFlags::FIXED_WIDTH) {
            self.flags.insert(FontFlags::MONOSPACED);
        }
        if info.flags.contains(FaceFlags::KERNING) && self.kerning.is_none() {
            self.kerning = Some(KerningTable::new());
        }
        // Known faces keep their precomputed coverage.
        if self.unicode_ranges == UnicodeRanges::EMPTY {
            self.unicode_ranges = info.unicode_ranges;
        }
        self.family_name = info.family_name;
        self.style_name = info.style_name;
    }
}

/// Shadow drawn under each glyph while [`FontFlags::SHADOW`] is set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Shadow {
    /// Offset from the glyph, in pixels.
    pub offset: [i32; 2],
    /// Shadow color.
    pub color: [u8; 4],
    /// Softening applied to the glyph's coverage.
    pub blur: ShadowBlur,
}

/// How much a [`Shadow`] is softened.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShadowBlur {
    /// A sharp copy of the glyph.
    #[default]
    None,
    /// A 3x3 binomial blur, one pixel wider on every side.
    Blur3,
    /// A 5x5 binomial blur, two pixels wider on every side.
    Blur5,
}

impl ShadowBlur {
    /// Separable kernel weights, `None` for a sharp shadow.
    pub(crate) fn kernel(self) -> Option<&'static [u16]> {
        match self {
            Self::None => None,
            Self::Blur3 => Some(&[1, 2, 1]),
            Self::Blur5 => Some(&[1, 4, 6, 4, 1]),
        }
    }
}

/// A font at one size, with its drawing state.
///
/// Setters take `&mut self`; drawing and measuring take `&self` and lock the
/// font internally, so a font may be measured from several threads.
pub struct Font {
    id: FontId,
    source: FontSource,
    provider: FaceProvider,
    pub(crate) position: [i32; 2],
    pub(crate) aspect: [f32; 2],
    pub(crate) angle: f32,
    pub(crate) matrix: Matrix4,
    pub(crate) color: [u8; 4],
    pub(crate) shadow: Shadow,
    pub(crate) clip_rect: Rect,
    pub(crate) wrap_width: Option<i32>,
    state: Mutex<FontState>,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("flags", &self.flags())
            .field("position", &self.position)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        if let FaceProvider::Cached(cache) = &self.provider {
            cache.remove_font(self.id);
        }
    }
}

impl Font {
    /// Loads a font that owns its face instead of sharing the face cache.
    ///
    /// The face is opened immediately with `backend` and never evicted.
    pub fn uncached(backend: Arc<dyn FontBackend>, source: FontSource) -> Result<Self, Error> {
        Self::create(source, FaceProvider::Owned(backend))
    }

    fn create(source: FontSource, provider: FaceProvider) -> Result<Self, Error> {
        let cached = matches!(provider, FaceProvider::Cached(_));
        let font = Self {
            id: FontId::new(),
            source,
            provider,
            position: [0, 0],
            aspect: [1.0, 1.0],
            angle: 0.0,
            matrix: Matrix4::IDENTITY,
            color: [255, 255, 0, 255],
            shadow: Shadow::default(),
            clip_rect: Rect::default(),
            wrap_width: None,
            state: Mutex::new(FontState {
                flags: if cached {
                    FontFlags::CACHED
                } else {
                    FontFlags::empty()
                },
                size: F26Dot6::from_f32(DEFAULT_SIZE),
                face_ref: None,
                size_ref: None,
                owned_face: None,
                owned_metrics: None,
                unicode_ranges: UnicodeRanges::EMPTY,
                family_name: None,
                style_name: None,
                kerning: None,
                glyph_caches: LruCache::new(MAX_GLYPH_CACHES),
            }),
        };
        {
            let mut state = font.state.lock();
            let known = font
                .source
                .file_name()
                .filter(|_| cached)
                .and_then(known_face);
            if let Some(known) = known {
                state.unicode_ranges = known.ranges;
            } else {
                font.resolve_face(&mut state)?;
            }
            if state.unicode_ranges.is_last_resort() {
                state.flags.insert(FontFlags::LAST_RESORT);
            }
        }
        log::debug!("loaded font {:?} from {}", font.id, font.source.name());
        Ok(font)
    }

    /// Unique identity of the font.
    pub fn id(&self) -> FontId {
        self.id
    }

    /// Where the font is loaded from.
    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Current flags, including those the engine maintains.
    pub fn flags(&self) -> FontFlags {
        self.state.lock().flags
    }

    /// Sets option flags. Engine maintained flags are ignored.
    pub fn enable(&mut self, flags: FontFlags) {
        self.state.get_mut().flags.insert(flags - ENGINE_FLAGS);
    }

    /// Clears option flags. Engine maintained flags are ignored.
    pub fn disable(&mut self, flags: FontFlags) {
        self.state.get_mut().flags.remove(flags - ENGINE_FLAGS);
    }

    /// Size in points, to the nearest 1/64.
    pub fn size(&self) -> f32 {
        self.state.lock().size.to_f32()
    }

    /// Sets the size in points, rounded to the nearest 1/64.
    ///
    /// Fails without changing the size when the face cannot be loaded or
    /// scaled.
    pub fn set_size(&mut self, points: f32) -> Result<(), Error> {
        let size = F26Dot6::from_f32(points);
        let mut state = self.state.lock();
        let face = self.resolve_face(&mut state)?;
        if state.size == size {
            return Ok(());
        }
        let previous = (state.size, state.size_ref, state.owned_metrics);
        state.size = size;
        state.size_ref = None;
        state.owned_metrics = None;
        if let Err(err) = self.resolve_size(&mut state, &*face) {
            (state.size, state.size_ref, state.owned_metrics) = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Sets the pen origin, in pixels.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = [x, y];
    }

    /// The pen origin, in pixels.
    pub fn position(&self) -> [i32; 2] {
        self.position
    }

    /// Sets the horizontal and vertical scale applied while
    /// [`FontFlags::ASPECT`] is set.
    pub fn set_aspect(&mut self, x: f32, y: f32) {
        self.aspect = [x, y];
    }

    /// Sets the counter-clockwise rotation, in radians, applied while
    /// [`FontFlags::ROTATION`] is set.
    pub fn set_rotation(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Sets the transform applied while [`FontFlags::MATRIX`] is set.
    pub fn set_matrix(&mut self, matrix: Matrix4) {
        self.matrix = matrix;
    }

    /// Sets the text color.
    pub fn set_color(&mut self, color: [u8; 4]) {
        self.color = color;
    }

    /// The text color.
    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    /// Sets the shadow drawn while [`FontFlags::SHADOW`] is set.
    pub fn set_shadow(&mut self, shadow: Shadow) {
        self.shadow = shadow;
    }

    /// Sets the rectangle glyphs must lie within while
    /// [`FontFlags::CLIPPING`] is set, relative to the screen origin.
    pub fn set_clip_rect(&mut self, rect: Rect) {
        self.clip_rect = rect;
    }

    /// Sets the width, in pixels, text wraps at while
    /// [`FontFlags::WORD_WRAP`] is set. `None` never wraps.
    pub fn set_wrap_width(&mut self, width: Option<i32>) {
        self.wrap_width = width;
    }

    /// OS/2 Unicode coverage of the face.
    pub fn unicode_ranges(&self) -> UnicodeRanges {
        self.state.lock().unicode_ranges
    }

    /// Drops every glyph cache. The next operation starts afresh.
    pub fn clear_caches(&self) {
        self.state.lock().glyph_caches.clear();
    }

    /// Number of rendering configurations with a glyph cache.
    pub fn glyph_cache_count(&self) -> usize {
        self.state.lock().glyph_caches.len()
    }

    /// Locks the font and returns its glyph cache for the current size and
    /// rendering configuration, creating it if needed.
    ///
    /// Returns `None` when the face or size cannot be resolved; the failure
    /// is logged and the operation should render nothing.
    pub fn acquire_glyph_cache(&self) -> Option<GlyphCacheGuard<'_>> {
        let mut state = self.state.lock();
        let face = self.resolve_face(&mut state).ok()?;
        let metrics = self.resolve_size(&mut state, &*face).ok()?;
        Some(GlyphCacheGuard::new(self, state, face, metrics))
    }

    /// Leases the font's face, opening it if it is not cached.
    ///
    /// Permanent failures mark the font bad; later calls fail immediately.
    fn resolve_face(&self, state: &mut FontState) -> Result<Arc<dyn FontFace>, Error> {
        if state.flags.contains(FontFlags::BAD_FONT) {
            return Err(Error::new(ErrorKind::BadFont).with_font(self.source.name()));
        }
        let resolved = match &self.provider {
            FaceProvider::Cached(cache) => cache
                .resolve_face(self.id, &self.source, state.face_ref)
                .map(|lease| {
                    state.face_ref = Some(lease.face_ref);
                    (lease.face, lease.opened)
                }),
            FaceProvider::Owned(backend) => match state.owned_face.clone() {
                Some(face) => Ok((face, None)),
                None => open_face(&**backend, &self.source).map(|(face, info)| {
                    let face: Arc<dyn FontFace> = Arc::from(face);
                    state.owned_face = Some(Arc::clone(&face));
                    (face, Some(info))
                }),
            },
        };
        match resolved {
            Ok((face, opened)) => {
                if let Some(info) = opened {
                    state.record_face(info);
                }
                Ok(face)
            }
            Err(err) => {
                if err.is_permanent() {
                    log::error!("{err}");
                    state.flags.insert(FontFlags::BAD_FONT);
                }
                Err(err)
            }
        }
    }

    /// Resolves scaled metrics at the current size.
    fn resolve_size(
        &self,
        state: &mut FontState,
        face: &dyn FontFace,
    ) -> Result<SizeMetrics, Error> {
        let resolved = match &self.provider {
            FaceProvider::Cached(cache) => cache
                .resolve_size(self.id, face, state.size, state.size_ref)
                .map(|(size_ref, metrics)| {
                    state.size_ref = Some(size_ref);
                    metrics
                }),
            FaceProvider::Owned(_) => match state.owned_metrics {
                Some(metrics) if metrics.size == state.size => Ok(metrics),
                _ => {
                    let metrics = SizeMetrics::new(&face.design_metrics(), state.size, DPI);
                    if let Ok(metrics) = &metrics {
                        state.owned_metrics = Some(*metrics);
                    }
                    metrics
                }
            },
        };
        if let Err(err) = &resolved {
            debug_assert_eq!(err.kind(), ErrorKind::CacheCapacity, "unexpected size error");
            log::error!("cannot scale {}: {err}", self.source.name());
        }
        resolved
    }

    /// Maps `c` to a glyph index of `face`.
    ///
    /// Control characters the face lacks map to its space glyph, so they
    /// occupy a blank advance instead of being dropped.
    pub(crate) fn glyph_index(&self, face: &dyn FontFace, c: char) -> u32 {
        let lookup = |c: char| match &self.provider {
            FaceProvider::Cached(cache) => cache.glyph_index(self.id, face, u32::from(c)),
            FaceProvider::Owned(_) => face.glyph_index(u32::from(c)),
        };
        match lookup(c) {
            0 if c < ' ' => lookup(' '),
            index => index,
        }
    }

    /// Leases the face for a metric query, zero when the face is unusable.
    fn pixel_metric(&self, f: impl FnOnce(&SizeMetrics) -> F26Dot6) -> i32 {
        let mut state = self.state.lock();
        let Ok(face) = self.resolve_face(&mut state) else {
            return 0;
        };
        match self.resolve_size(&mut state, &*face) {
            Ok(metrics) => f(&metrics).to_int(),
            Err(_) => 0,
        }
    }

    /// Line height in whole pixels, at least one.
    pub fn height_max(&self) -> i32 {
        self.pixel_metric(|metrics| metrics.height.max(F26Dot6::ONE))
    }

    /// Largest advance in whole pixels, at least one.
    pub fn width_max(&self) -> i32 {
        self.pixel_metric(|metrics| metrics.max_advance.max(F26Dot6::ONE))
    }

    /// Ascender in whole pixels.
    pub fn ascender(&self) -> i32 {
        self.pixel_metric(|metrics| metrics.ascender)
    }

    /// Descender in whole pixels, negative below the baseline.
    pub fn descender(&self) -> i32 {
        self.pixel_metric(|metrics| metrics.descender)
    }

    /// The family and style name, such as `"DejaVu Sans Bold"`.
    pub fn display_name(&self) -> Option<String> {
        let mut state = self.state.lock();
        self.resolve_face(&mut state).ok()?;
        let family = state.family_name.as_deref()?;
        Some(match state.style_name.as_deref() {
            Some(style) => format!("{family} {style}"),
            None => String::from(family),
        })
    }

    /// Column width of monospaced drawing, in pixels.
    ///
    /// Falls back to half the point size when the font cannot render.
    pub fn fixed_width(&self) -> f32 {
        match self.acquire_glyph_cache() {
            Some(guard) => guard.cache().fixed_width() as f32,
            None => self.size() / 2.0,
        }
    }
}
