// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instanced glyph batching.

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use parking_lot::Mutex;
use quill_fonts::FontId;

use crate::{
    BatchId, BlendMode, BufferId, GlyphAtlas, GlyphInstance, GpuDevice, Matrix4, SharedAtlas,
    TextureId, BATCH_LEN_MAX,
};

/// Limits of a [`DrawBatcher`].
#[derive(Copy, Clone, Debug)]
pub struct BatchOptions {
    /// Instances one draw call covers.
    ///
    /// The default value is [`BATCH_LEN_MAX`].
    pub capacity: usize,
    /// Widest atlas texture the batcher creates.
    ///
    /// The default value is 4096.
    pub max_texture_width: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            capacity: BATCH_LEN_MAX,
            max_texture_width: 4096,
        }
    }
}

/// The configuration pending instances were recorded under.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BatchKey {
    /// Font the glyphs come from.
    pub font: FontId,
    /// Whether the font draws without a custom transform.
    ///
    /// Only simple draws are accumulated across `begin`/`end` pairs.
    pub simple: bool,
}

#[derive(Copy, Clone, Debug)]
struct GpuBatch {
    buffer: BufferId,
    batch: BatchId,
}

/// The device texture mirroring one atlas.
#[derive(Debug)]
struct AtlasTexture {
    atlas: Weak<Mutex<GlyphAtlas>>,
    texture: TextureId,
    width: usize,
    capacity: usize,
    /// Texels already uploaded.
    landed: usize,
}

/// Hook run before every flush that draws something.
pub type FlushHook = Box<dyn FnMut()>;

/// Accumulates glyph instances and draws them with one instanced call.
///
/// Instances recorded between configuration changes share a font, a shader
/// variant, a model-view matrix and an atlas; a change to any of them draws
/// what is pending first. The batcher is owned by the thread holding the GPU
/// context and takes the device by `&mut` on every call.
pub struct DrawBatcher {
    options: BatchOptions,
    gpu: Option<GpuBatch>,
    instances: Vec<GlyphInstance>,
    key: Option<BatchKey>,
    matrix: Option<Matrix4>,
    offset: [i32; 2],
    enabled: bool,
    active: bool,
    atlas: Option<SharedAtlas>,
    textures: HashMap<u64, AtlasTexture>,
    flush_hook: Option<FlushHook>,
}

impl fmt::Debug for DrawBatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawBatcher")
            .field("options", &self.options)
            .field("gpu", &self.gpu)
            .field("pending", &self.instances.len())
            .field("key", &self.key)
            .field("matrix", &self.matrix)
            .field("offset", &self.offset)
            .field("enabled", &self.enabled)
            .field("active", &self.active)
            .field("textures", &self.textures.len())
            .field("flush_hook", &self.flush_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for DrawBatcher {
    fn default() -> Self {
        Self::new(BatchOptions::default())
    }
}

impl DrawBatcher {
    /// Creates a batcher. No device resources exist until the first `begin`.
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options: BatchOptions {
                capacity: options.capacity.max(1),
                max_texture_width: options.max_texture_width.max(1),
            },
            gpu: None,
            instances: Vec::new(),
            key: None,
            matrix: None,
            offset: [0, 0],
            enabled: false,
            active: false,
            atlas: None,
            textures: HashMap::new(),
            flush_hook: None,
        }
    }

    /// Registers a hook run before each flush, so that other deferred UI
    /// drawing lands underneath the text.
    pub fn set_flush_hook(&mut self, hook: Option<FlushHook>) {
        self.flush_hook = hook;
    }

    /// Lets simple draws accumulate across `begin`/`end` pairs.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Draws anything pending and returns to flushing at every `end`.
    pub fn disable(&mut self, gpu: &mut impl GpuDevice) {
        self.flush(gpu);
        self.enabled = false;
    }

    /// Whether accumulation is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the current `begin`/`end` pair accumulates.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pixel offset added to submitted glyphs of simple draws.
    pub fn offset(&self) -> [i32; 2] {
        self.offset
    }

    /// Number of instances waiting for a flush.
    pub fn pending(&self) -> usize {
        self.instances.len()
    }

    fn ensure_gpu(&mut self, gpu: &mut impl GpuDevice) {
        let capacity = self.options.capacity;
        self.gpu.get_or_insert_with(|| {
            let buffer = gpu.create_instance_buffer(&GlyphInstance::LAYOUT, capacity);
            let batch = gpu.create_quad_batch(buffer);
            log::debug!("created glyph batch for {capacity} instances");
            GpuBatch { buffer, batch }
        });
    }

    /// Starts drawing a string.
    ///
    /// `offset` is the font's pen origin, baked into instances of simple
    /// draws. When the configuration matches the pending instances this only
    /// compares state.
    pub fn begin(&mut self, gpu: &mut impl GpuDevice, key: BatchKey, offset: [i32; 2]) {
        self.ensure_gpu(gpu);

        let font_changed = self.key.map(|k| k.font) != Some(key.font);
        let shader_changed = self.key.is_none_or(|k| k.simple != key.simple);
        self.active = self.enabled && key.simple;
        self.offset = if key.simple { offset } else { [0, 0] };

        if !self.active {
            self.flush(gpu);
            self.key = Some(key);
            return;
        }

        let current = gpu.model_view();
        let previous = self.matrix.filter(|&m| m != current);
        let matrix_changed = self.matrix != Some(current);
        if !(matrix_changed || font_changed || shader_changed) {
            return;
        }
        // Pending instances are drawn under the transform they were recorded with.
        if let Some(previous) = previous {
            gpu.push_matrix();
            gpu.set_model_view(previous);
        }
        self.flush(gpu);
        if previous.is_some() {
            gpu.pop_matrix();
        }
        self.key = Some(key);
        self.matrix = Some(current);
    }

    /// Appends one glyph drawn from `atlas`.
    ///
    /// Flushes first when the atlas differs from the pending one, when the
    /// atlas outgrew its texture, or when the buffer is full.
    pub fn submit(
        &mut self,
        gpu: &mut impl GpuDevice,
        atlas: &SharedAtlas,
        instance: GlyphInstance,
    ) {
        self.ensure_gpu(gpu);
        if self
            .atlas
            .as_ref()
            .is_none_or(|bound| !Arc::ptr_eq(bound, atlas))
        {
            self.flush(gpu);
            self.atlas = Some(Arc::clone(atlas));
        }

        let (id, reserved) = {
            let atlas = atlas.lock();
            (atlas.id(), atlas.reserved())
        };
        let outgrown = self
            .textures
            .get(&id)
            .is_none_or(|texture| texture.capacity < reserved);
        if outgrown {
            self.flush(gpu);
            self.recreate_texture(gpu, atlas, id, reserved);
        }

        if self.instances.len() >= self.options.capacity {
            self.flush(gpu);
        }
        self.instances.push(instance);
    }

    fn recreate_texture(
        &mut self,
        gpu: &mut impl GpuDevice,
        atlas: &SharedAtlas,
        id: u64,
        reserved: usize,
    ) {
        if let Some(old) = self.textures.remove(&id) {
            gpu.destroy_texture(old.texture);
        }
        let reserved = reserved.max(1);
        let max_width = usize::try_from(self.options.max_texture_width).unwrap_or(usize::MAX);
        let width = reserved.min(max_width);
        let height = reserved.div_ceil(width);
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            log::error!("glyph atlas of {reserved} texels exceeds the texture size limit");
            return;
        };
        let texture = gpu.create_texture(w, h);
        log::debug!("created {w}x{h} glyph atlas texture");
        self.textures.insert(
            id,
            AtlasTexture {
                atlas: Arc::downgrade(atlas),
                texture,
                width,
                capacity: width * height,
                landed: 0,
            },
        );
    }

    /// Finishes a string. Draws immediately unless the pair accumulates.
    pub fn end(&mut self, gpu: &mut impl GpuDevice) {
        if !self.active {
            self.flush(gpu);
        }
    }

    /// Draws every pending instance with one instanced call.
    pub fn flush(&mut self, gpu: &mut impl GpuDevice) {
        if self.instances.is_empty() {
            return;
        }
        let Some(GpuBatch { buffer, batch }) = self.gpu else {
            return;
        };
        let Some(atlas) = self.atlas.clone() else {
            log::error!("dropping {} glyph instances without an atlas", self.instances.len());
            self.instances.clear();
            return;
        };

        let previous_blend = gpu.blend();
        gpu.set_blend(BlendMode::Alpha);
        if let Some(hook) = self.flush_hook.as_mut() {
            hook();
        }

        let texture = {
            let atlas = atlas.lock();
            self.textures
                .get_mut(&atlas.id())
                .map(|texture| texture.upload(gpu, atlas.texels()))
        };
        if let Some(texture) = texture {
            gpu.upload_instances(
                buffer,
                bytemuck::cast_slice(&self.instances),
                self.instances.len(),
            );
            gpu.bind_texture(batch, texture);
            gpu.draw_instanced(batch, self.instances.len());
            gpu.set_blend(previous_blend);
            gpu.unbind_texture(texture);
        } else {
            log::error!("glyph atlas has no texture, dropping pending glyphs");
            gpu.set_blend(previous_blend);
        }
        self.instances.clear();
        self.release_dead_textures(gpu);
    }

    fn release_dead_textures(&mut self, gpu: &mut impl GpuDevice) {
        self.textures.retain(|_, texture| {
            let alive = texture.atlas.strong_count() > 0;
            if !alive {
                gpu.destroy_texture(texture.texture);
            }
            alive
        });
    }

    /// Releases every device resource without drawing.
    ///
    /// The next `begin` recreates them.
    pub fn discard(&mut self, gpu: &mut impl GpuDevice) {
        if let Some(GpuBatch { batch, .. }) = self.gpu.take() {
            gpu.destroy_batch(batch);
        }
        for (_, texture) in self.textures.drain() {
            gpu.destroy_texture(texture.texture);
        }
        self.instances.clear();
        self.atlas = None;
        self.key = None;
        self.matrix = None;
    }
}

impl AtlasTexture {
    /// Uploads texels added since the last upload, row by row.
    fn upload(&mut self, gpu: &mut impl GpuDevice, texels: &[u8]) -> TextureId {
        let width = self.width;
        let total = texels.len().min(self.capacity);
        while self.landed < total {
            let x = self.landed % width;
            let y = self.landed / width;
            let len = (width - x).min(total - self.landed);
            let row = &texels[self.landed..self.landed + len];
            gpu.update_texture_row(
                self.texture,
                u32::try_from(x).unwrap_or(u32::MAX),
                u32::try_from(y).unwrap_or(u32::MAX),
                row,
            );
            self.landed += len;
        }
        self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GlyphImage, VertexAttribute};

    #[derive(Debug, Default)]
    struct TestGpu {
        next_id: u32,
        draws: Vec<usize>,
        rows: Vec<(u32, u32, usize)>,
        textures: Vec<(u32, u32)>,
        destroyed: Vec<TextureId>,
        matrix: Matrix4,
        stack: Vec<Matrix4>,
        draw_matrices: Vec<Matrix4>,
        blend: BlendMode,
        draw_blend: Vec<BlendMode>,
    }

    impl TestGpu {
        fn id(&mut self) -> u32 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl GpuDevice for TestGpu {
        fn create_instance_buffer(
            &mut self,
            layout: &[VertexAttribute],
            _capacity: usize,
        ) -> BufferId {
            assert_eq!(layout.len(), 4);
            BufferId(self.id())
        }
        fn create_quad_batch(&mut self, _instances: BufferId) -> BatchId {
            BatchId(self.id())
        }
        fn destroy_batch(&mut self, _batch: BatchId) {}
        fn upload_instances(&mut self, _buffer: BufferId, bytes: &[u8], count: usize) {
            assert_eq!(bytes.len(), count * size_of::<GlyphInstance>());
        }
        fn create_texture(&mut self, width: u32, height: u32) -> TextureId {
            self.textures.push((width, height));
            TextureId(self.id())
        }
        fn destroy_texture(&mut self, texture: TextureId) {
            self.destroyed.push(texture);
        }
        fn update_texture_row(&mut self, _texture: TextureId, x: u32, y: u32, data: &[u8]) {
            self.rows.push((x, y, data.len()));
        }
        fn bind_texture(&mut self, _batch: BatchId, _texture: TextureId) {}
        fn unbind_texture(&mut self, _texture: TextureId) {}
        fn draw_instanced(&mut self, _batch: BatchId, count: usize) {
            self.draws.push(count);
            self.draw_matrices.push(self.matrix);
            self.draw_blend.push(self.blend);
        }
        fn blend(&self) -> BlendMode {
            self.blend
        }
        fn set_blend(&mut self, mode: BlendMode) {
            self.blend = mode;
        }
        fn model_view(&self) -> Matrix4 {
            self.matrix
        }
        fn set_model_view(&mut self, matrix: Matrix4) {
            self.matrix = matrix;
        }
        fn push_matrix(&mut self) {
            self.stack.push(self.matrix);
        }
        fn pop_matrix(&mut self) {
            self.matrix = self.stack.pop().unwrap();
        }
    }

    fn atlas_with_glyph(len: usize) -> SharedAtlas {
        let atlas = GlyphAtlas::new_shared();
        let data = vec![255_u8; len];
        atlas.lock().push(&GlyphImage {
            left: 0,
            top: 1,
            width: i32::try_from(len).unwrap(),
            height: 1,
            pitch: i32::try_from(len).unwrap(),
            data: &data,
        });
        atlas
    }

    fn key(font: FontId) -> BatchKey {
        BatchKey { font, simple: true }
    }

    #[test]
    fn unchanged_begin_keeps_pending() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        batcher.enable();
        let atlas = atlas_with_glyph(4);
        let font = FontId::new();
        batcher.begin(&mut gpu, key(font), [0, 0]);
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        batcher.end(&mut gpu);
        batcher.begin(&mut gpu, key(font), [0, 0]);
        assert_eq!(batcher.pending(), 1);
        assert!(gpu.draws.is_empty());
        assert!(gpu.stack.is_empty());
    }

    #[test]
    fn font_change_flushes_once() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        batcher.enable();
        let atlas = atlas_with_glyph(4);
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        assert_eq!(gpu.draws, [1]);
        assert_eq!(gpu.draw_blend, [BlendMode::Alpha]);
        assert_eq!(gpu.blend, BlendMode::None);
        assert_eq!(batcher.pending(), 0);
    }

    #[test]
    fn matrix_change_flushes_under_old_matrix() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        batcher.enable();
        let atlas = atlas_with_glyph(4);
        let font = FontId::new();
        batcher.begin(&mut gpu, key(font), [0, 0]);
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        let moved = Matrix4::translation(5.0, 0.0, 0.0);
        gpu.matrix = moved;
        batcher.begin(&mut gpu, key(font), [0, 0]);
        assert_eq!(gpu.draw_matrices, [Matrix4::IDENTITY]);
        assert_eq!(gpu.matrix, moved);
        assert!(gpu.stack.is_empty());
    }

    #[test]
    fn inactive_pairs_flush_at_end() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        let atlas = atlas_with_glyph(4);
        let font = FontId::new();
        batcher.begin(&mut gpu, key(font), [3, 4]);
        assert!(!batcher.is_active());
        assert_eq!(batcher.offset(), [3, 4]);
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        batcher.end(&mut gpu);
        assert_eq!(gpu.draws, [1]);

        batcher.enable();
        let transformed = BatchKey {
            font,
            simple: false,
        };
        batcher.begin(&mut gpu, transformed, [3, 4]);
        assert!(!batcher.is_active());
        assert_eq!(batcher.offset(), [0, 0]);
    }

    #[test]
    fn full_buffer_flushes_before_overflow() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::new(BatchOptions {
            capacity: 2,
            ..BatchOptions::default()
        });
        batcher.enable();
        let atlas = atlas_with_glyph(4);
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        for _ in 0..5 {
            batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        }
        assert_eq!(gpu.draws, [2, 2]);
        assert_eq!(batcher.pending(), 1);
    }

    #[test]
    fn atlas_change_flushes_and_hook_runs_first() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        let hooked = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hooked);
        batcher.set_flush_hook(Some(Box::new(move || counter.set(counter.get() + 1))));
        batcher.enable();
        let (a, b) = (atlas_with_glyph(4), atlas_with_glyph(4));
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        batcher.submit(&mut gpu, &a, GlyphInstance::default());
        batcher.submit(&mut gpu, &b, GlyphInstance::default());
        assert_eq!(gpu.draws, [1]);
        assert_eq!(hooked.get(), 1);
        batcher.flush(&mut gpu);
        batcher.flush(&mut gpu);
        assert_eq!(gpu.draws, [1, 1]);
        assert_eq!(hooked.get(), 2);
    }

    #[test]
    fn uploads_only_new_texels() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::new(BatchOptions {
            max_texture_width: 1024,
            ..BatchOptions::default()
        });
        batcher.enable();
        let atlas = atlas_with_glyph(1000);
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        batcher.flush(&mut gpu);
        assert_eq!(gpu.textures, [(1024, 4)]);
        assert_eq!(gpu.rows, [(0, 0, 1000)]);

        let data = [9_u8; 100];
        atlas.lock().push(&GlyphImage {
            left: 0,
            top: 1,
            width: 100,
            height: 1,
            pitch: 100,
            data: &data,
        });
        batcher.submit(&mut gpu, &atlas, GlyphInstance::default());
        batcher.flush(&mut gpu);
        // The second glyph straddles the first texture row.
        assert_eq!(gpu.rows[1..], [(1000, 0, 24), (0, 1, 76)]);
        assert_eq!(gpu.textures.len(), 1);
    }

    #[test]
    fn textures_of_dropped_atlases_are_released() {
        let mut gpu = TestGpu::default();
        let mut batcher = DrawBatcher::default();
        batcher.enable();
        let first = atlas_with_glyph(4);
        batcher.begin(&mut gpu, key(FontId::new()), [0, 0]);
        batcher.submit(&mut gpu, &first, GlyphInstance::default());
        let second = atlas_with_glyph(4);
        batcher.submit(&mut gpu, &second, GlyphInstance::default());
        drop(first);
        batcher.flush(&mut gpu);
        assert_eq!(gpu.destroyed.len(), 1);
        batcher.discard(&mut gpu);
        assert_eq!(gpu.destroyed.len(), 2);
        assert_eq!(batcher.pending(), 0);
    }
}
