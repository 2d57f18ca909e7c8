// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Quill Dev
//!
//! This crate provides test doubles for developing Quill: a font backend with
//! synthetic, predictable glyphs and a GPU device that records every call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use quill_draw::{
    BatchId, BlendMode, BufferId, GlyphInstance, GpuDevice, Matrix4, TextureId, VertexAttribute,
};
use quill_fonts::{
    CharMapEncoding, DesignMetrics, Error, ErrorKind, F26Dot6, FaceFlags, FaceInfo, FontBackend,
    FontFace, FontSource, GlyphBounds, RasterRequest, RasterizedGlyph, UnicodeRanges,
};

/// Calls made into a [`SyntheticBackend`] and the faces it opened.
#[derive(Debug, Default)]
pub struct SyntheticStats {
    /// Faces opened.
    pub opens: AtomicUsize,
    /// Faces dropped.
    pub closes: AtomicUsize,
    /// Codepoint to glyph index lookups.
    pub glyph_lookups: AtomicUsize,
    /// Kerning queries.
    pub kerning_queries: AtomicUsize,
    /// Glyphs rasterized.
    pub rasterizations: AtomicUsize,
}

impl SyntheticStats {
    /// Reads one counter.
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }

    /// Faces currently open.
    pub fn open_faces(&self) -> usize {
        Self::get(&self.opens) - Self::get(&self.closes)
    }
}

#[derive(Clone, Debug)]
struct Config {
    advance: i32,
    glyph_height: i32,
    units_per_em: u16,
    monospace: bool,
    scalable: bool,
    failing: bool,
    charmaps: Vec<CharMapEncoding>,
    kerning: HashMap<(u32, u32), i32>,
    missing: HashSet<u32>,
    zero_width: HashSet<u32>,
    unicode_ranges: UnicodeRanges,
    family_name: Option<String>,
    style_name: Option<String>,
    size_cost: usize,
}

/// A font backend whose glyphs all advance by the same whole pixel amount.
///
/// Every codepoint maps to glyph index `codepoint + 1` unless marked missing.
/// Visible glyphs rasterize to a solid box one pixel narrower than the advance
/// on each side and [`glyph_height`](Self::glyph_height) pixels tall, sitting
/// on the baseline. Spaces, control characters and zero width codepoints are
/// blank. Design metrics use 1000 units per em with an 800 unit ascender, a
/// -200 unit descender and a 1200 unit line height.
#[derive(Clone, Debug)]
pub struct SyntheticBackend {
    config: Config,
    stats: Arc<SyntheticStats>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticBackend {
    /// Creates a backend with a 10 pixel advance.
    pub fn new() -> Self {
        Self {
            config: Config {
                advance: 10,
                glyph_height: 8,
                units_per_em: 1000,
                monospace: false,
                scalable: true,
                failing: false,
                charmaps: vec![CharMapEncoding::Unicode],
                kerning: HashMap::new(),
                missing: HashSet::new(),
                zero_width: HashSet::new(),
                unicode_ranges: UnicodeRanges::EMPTY,
                family_name: Some("Synthetic".into()),
                style_name: Some("Regular".into()),
                size_cost: 2048,
            },
            stats: Arc::new(SyntheticStats::default()),
        }
    }

    /// Sets the advance of every non zero width glyph, in pixels.
    #[must_use]
    pub fn with_advance(mut self, advance: i32) -> Self {
        self.config.advance = advance;
        self
    }

    /// Sets the bitmap height of visible glyphs, in pixels.
    #[must_use]
    pub fn with_glyph_height(mut self, height: i32) -> Self {
        self.config.glyph_height = height;
        self
    }

    /// Reports faces as fixed width.
    #[must_use]
    pub fn monospace(mut self) -> Self {
        self.config.monospace = true;
        self
    }

    /// Adds a kerning pair in design units.
    #[must_use]
    pub fn with_kerning(mut self, left: char, right: char, units: i32) -> Self {
        self.config
            .kerning
            .insert((u32::from(left), u32::from(right)), units);
        self
    }

    /// Makes `c` unmapped.
    #[must_use]
    pub fn with_missing(mut self, c: char) -> Self {
        self.config.missing.insert(u32::from(c));
        self
    }

    /// Makes `c` a blank glyph with no advance, like a combining mark.
    #[must_use]
    pub fn with_zero_width(mut self, c: char) -> Self {
        self.config.zero_width.insert(u32::from(c));
        self
    }

    /// Reports faces without scalable outlines.
    #[must_use]
    pub fn not_scalable(mut self) -> Self {
        self.config.scalable = false;
        self
    }

    /// Fails every open.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.config.failing = true;
        self
    }

    /// Replaces the character maps faces report.
    #[must_use]
    pub fn with_charmaps(mut self, charmaps: Vec<CharMapEncoding>) -> Self {
        self.config.charmaps = charmaps;
        self
    }

    /// Sets the OS/2 coverage faces report.
    #[must_use]
    pub fn with_unicode_ranges(mut self, ranges: UnicodeRanges) -> Self {
        self.config.unicode_ranges = ranges;
        self
    }

    /// Sets the family and style names faces report.
    #[must_use]
    pub fn with_names(mut self, family: Option<&str>, style: Option<&str>) -> Self {
        self.config.family_name = family.map(Into::into);
        self.config.style_name = style.map(Into::into);
        self
    }

    /// Sets the cache cost of one scaled size.
    #[must_use]
    pub fn with_size_cost(mut self, bytes: usize) -> Self {
        self.config.size_cost = bytes;
        self
    }

    /// The glyph advance in pixels.
    pub fn advance(&self) -> i32 {
        self.config.advance
    }

    /// The bitmap height of visible glyphs in pixels.
    pub fn glyph_height(&self) -> i32 {
        self.config.glyph_height
    }

    /// Counters shared by the backend and every face it opened.
    pub fn stats(&self) -> Arc<SyntheticStats> {
        Arc::clone(&self.stats)
    }
}

impl FontBackend for SyntheticBackend {
    fn open(&self, source: &FontSource) -> Result<Box<dyn FontFace>, Error> {
        if self.config.failing {
            return Err(Error::new(ErrorKind::CannotOpen).with_font(source.name()));
        }
        self.stats.opens.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(SyntheticFace {
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }
}

#[derive(Debug)]
struct SyntheticFace {
    config: Config,
    stats: Arc<SyntheticStats>,
}

impl Drop for SyntheticFace {
    fn drop(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::Relaxed);
    }
}

impl SyntheticFace {
    fn is_blank(&self, codepoint: u32) -> bool {
        codepoint <= u32::from(b' ') || self.config.zero_width.contains(&codepoint)
    }
}

impl FontFace for SyntheticFace {
    fn info(&self) -> FaceInfo {
        let mut flags = FaceFlags::empty();
        flags.set(FaceFlags::SCALABLE, self.config.scalable);
        flags.set(FaceFlags::FIXED_WIDTH, self.config.monospace);
        flags.set(FaceFlags::KERNING, !self.config.kerning.is_empty());
        FaceInfo {
            flags,
            axis_count: 0,
            unicode_ranges: self.config.unicode_ranges,
            family_name: self.config.family_name.clone(),
            style_name: self.config.style_name.clone(),
        }
    }

    fn charmaps(&self) -> &[CharMapEncoding] {
        &self.config.charmaps
    }

    fn select_charmap(&mut self, encoding: CharMapEncoding) -> bool {
        self.config.charmaps.contains(&encoding)
    }

    fn glyph_index(&self, codepoint: u32) -> u32 {
        self.stats.glyph_lookups.fetch_add(1, Ordering::Relaxed);
        if self.config.missing.contains(&codepoint) {
            0
        } else {
            codepoint + 1
        }
    }

    fn kerning(&self, left: u32, right: u32) -> i32 {
        self.stats.kerning_queries.fetch_add(1, Ordering::Relaxed);
        if left == 0 || right == 0 {
            return 0;
        }
        self.config
            .kerning
            .get(&(left - 1, right - 1))
            .copied()
            .unwrap_or(0)
    }

    fn design_metrics(&self) -> DesignMetrics {
        DesignMetrics {
            units_per_em: self.config.units_per_em,
            ascender: 800,
            descender: -200,
            height: 1200,
            max_advance: 1000,
        }
    }

    fn rasterize(&self, request: &RasterRequest) -> Option<RasterizedGlyph> {
        self.stats.rasterizations.fetch_add(1, Ordering::Relaxed);
        let codepoint = request.glyph_index.checked_sub(1)?;
        if self.config.zero_width.contains(&codepoint) {
            return Some(RasterizedGlyph::default());
        }
        let advance = F26Dot6::from_int(self.config.advance);
        if self.is_blank(codepoint) {
            return Some(RasterizedGlyph {
                advance,
                ..RasterizedGlyph::default()
            });
        }
        let width = (self.config.advance - 2).max(1);
        let height = self.config.glyph_height;
        let len = usize::try_from(width * height).ok()?;
        Some(RasterizedGlyph {
            left: 1,
            top: height,
            width: u32::try_from(width).ok()?,
            height: u32::try_from(height).ok()?,
            pitch: width,
            data: vec![255; len],
            advance,
            bounds: GlyphBounds {
                x_min: F26Dot6::from_int(1),
                x_max: F26Dot6::from_int(1 + width),
                y_min: F26Dot6::ZERO,
                y_max: F26Dot6::from_int(height),
            },
            lsb_delta: F26Dot6::ZERO,
            rsb_delta: F26Dot6::ZERO,
        })
    }

    fn size_cost(&self) -> usize {
        self.config.size_cost
    }
}

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    /// An instance buffer was created.
    CreateInstanceBuffer {
        /// Attribute count of the layout.
        attributes: usize,
        /// Record capacity.
        capacity: usize,
    },
    /// A batch was created.
    CreateBatch,
    /// A batch was destroyed.
    DestroyBatch,
    /// Instances were uploaded.
    UploadInstances(Vec<GlyphInstance>),
    /// A texture was created.
    CreateTexture {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// A texture was destroyed.
    DestroyTexture(TextureId),
    /// Part of a texture row was written.
    UpdateTextureRow {
        /// First column.
        x: u32,
        /// Row.
        y: u32,
        /// Texels written.
        len: usize,
    },
    /// A texture was bound.
    BindTexture(TextureId),
    /// A texture was unbound.
    UnbindTexture(TextureId),
    /// An instanced draw was issued.
    Draw {
        /// Instances drawn.
        count: usize,
        /// Model-view matrix at the time of the draw.
        matrix: Matrix4,
    },
    /// The blend mode changed.
    SetBlend(BlendMode),
    /// The model-view matrix was replaced.
    SetModelView(Matrix4),
    /// The model-view matrix was pushed.
    PushMatrix,
    /// The model-view matrix was popped.
    PopMatrix,
}

/// A GPU device that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    /// Every call, in order. Queries are not recorded.
    pub calls: Vec<GpuCall>,
    next_id: u32,
    blend: BlendMode,
    matrix: Matrix4,
    stack: Vec<Matrix4>,
}

impl RecordingDevice {
    /// Creates a device with an identity model-view matrix.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Instance counts of every draw, in order.
    pub fn draw_counts(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::Draw { count, .. } => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Every instance uploaded, in order.
    pub fn instances(&self) -> Vec<GlyphInstance> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::UploadInstances(instances) => Some(instances.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Depth of the model-view matrix stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Forgets recorded calls, keeping device state.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl GpuDevice for RecordingDevice {
    fn create_instance_buffer(&mut self, layout: &[VertexAttribute], capacity: usize) -> BufferId {
        self.calls.push(GpuCall::CreateInstanceBuffer {
            attributes: layout.len(),
            capacity,
        });
        BufferId(self.next_id())
    }

    fn create_quad_batch(&mut self, _instances: BufferId) -> BatchId {
        self.calls.push(GpuCall::CreateBatch);
        BatchId(self.next_id())
    }

    fn destroy_batch(&mut self, _batch: BatchId) {
        self.calls.push(GpuCall::DestroyBatch);
    }

    fn upload_instances(&mut self, _buffer: BufferId, bytes: &[u8], count: usize) {
        let instances = bytes
            .chunks_exact(size_of::<GlyphInstance>())
            .take(count)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        self.calls.push(GpuCall::UploadInstances(instances));
    }

    fn create_texture(&mut self, width: u32, height: u32) -> TextureId {
        self.calls.push(GpuCall::CreateTexture { width, height });
        TextureId(self.next_id())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.calls.push(GpuCall::DestroyTexture(texture));
    }

    fn update_texture_row(&mut self, _texture: TextureId, x: u32, y: u32, data: &[u8]) {
        self.calls.push(GpuCall::UpdateTextureRow {
            x,
            y,
            len: data.len(),
        });
    }

    fn bind_texture(&mut self, _batch: BatchId, texture: TextureId) {
        self.calls.push(GpuCall::BindTexture(texture));
    }

    fn unbind_texture(&mut self, texture: TextureId) {
        self.calls.push(GpuCall::UnbindTexture(texture));
    }

    fn draw_instanced(&mut self, _batch: BatchId, count: usize) {
        self.calls.push(GpuCall::Draw {
            count,
            matrix: self.matrix,
        });
    }

    fn blend(&self) -> BlendMode {
        self.blend
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.calls.push(GpuCall::SetBlend(mode));
    }

    fn model_view(&self) -> Matrix4 {
        self.matrix
    }

    fn set_model_view(&mut self, matrix: Matrix4) {
        self.matrix = matrix;
        self.calls.push(GpuCall::SetModelView(matrix));
    }

    fn push_matrix(&mut self) {
        self.stack.push(self.matrix);
        self.calls.push(GpuCall::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        if let Some(matrix) = self.stack.pop() {
            self.matrix = matrix;
        }
        self.calls.push(GpuCall::PopMatrix);
    }
}
