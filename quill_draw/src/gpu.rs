// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The GPU device seam.

use core::fmt;

use crate::Matrix4;

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        pub struct $name(pub u32);
    };
}

gpu_id!(
    /// A device instance buffer.
    BufferId
);
gpu_id!(
    /// A device draw primitive: a quad drawn once per instance.
    BatchId
);
gpu_id!(
    /// A single channel 8-bit device texture.
    TextureId
);

/// Component type of an instance attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    /// 32-bit floats.
    F32,
    /// Unsigned bytes normalized to `0..=1`.
    U8Normalized,
    /// 32-bit signed integers, not normalized.
    I32,
}

/// One attribute of the per-instance vertex layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader attribute name.
    pub name: &'static str,
    /// Component type.
    pub kind: AttributeKind,
    /// Component count.
    pub components: u8,
}

/// Blending applied to draws.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Source replaces destination.
    #[default]
    None,
    /// Source over destination by its alpha.
    Alpha,
}

/// The graphics API the batcher and atlas upload through.
///
/// Devices are single threaded; every call happens on the thread owning the
/// context.
pub trait GpuDevice: fmt::Debug {
    /// Creates an instance buffer able to hold `capacity` records of `layout`.
    fn create_instance_buffer(&mut self, layout: &[VertexAttribute], capacity: usize) -> BufferId;

    /// Creates a four vertex triangle strip drawn once per record of `instances`.
    ///
    /// The batch owns the buffer.
    fn create_quad_batch(&mut self, instances: BufferId) -> BatchId;

    /// Destroys a batch and its instance buffer.
    fn destroy_batch(&mut self, batch: BatchId);

    /// Sends `count` records, `bytes` long in total, to the instance buffer.
    fn upload_instances(&mut self, buffer: BufferId, bytes: &[u8], count: usize);

    /// Creates an uninitialized `width` x `height` texture.
    fn create_texture(&mut self, width: u32, height: u32) -> TextureId;

    /// Destroys a texture.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Writes `data` to row `y` of `texture`, starting at column `x`.
    fn update_texture_row(&mut self, texture: TextureId, x: u32, y: u32, data: &[u8]);

    /// Binds `texture` as the glyph texture of `batch`.
    fn bind_texture(&mut self, batch: BatchId, texture: TextureId);

    /// Unbinds `texture`.
    fn unbind_texture(&mut self, texture: TextureId);

    /// Draws the first `count` instances of `batch` with the text shader.
    fn draw_instanced(&mut self, batch: BatchId, count: usize);

    /// The current blend mode.
    fn blend(&self) -> BlendMode;

    /// Sets the blend mode.
    fn set_blend(&mut self, mode: BlendMode);

    /// The current model-view matrix.
    fn model_view(&self) -> Matrix4;

    /// Replaces the current model-view matrix.
    fn set_model_view(&mut self, matrix: Matrix4);

    /// Pushes a copy of the current model-view matrix.
    fn push_matrix(&mut self);

    /// Restores the last pushed model-view matrix.
    fn pop_matrix(&mut self);
}
