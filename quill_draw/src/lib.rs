// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quill Draw puts rasterized glyphs on screen or into pixel buffers.
//!
//! - [`DrawBatcher`] accumulates [`GlyphInstance`]s and draws them with one
//!   instanced call per configuration, through a [`GpuDevice`].
//! - [`GlyphAtlas`] is the linear coverage store the batcher mirrors into a
//!   texture, uploading only texels added since the previous flush.
//! - [`PixelBuffer`] mixes glyph coverage into caller owned RGBA memory.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod atlas;
mod batch;
mod buffer;
mod gpu;
mod instance;
mod math;

pub use atlas::{GlyphAtlas, GlyphImage, OwnedImage, SharedAtlas};
pub use batch::{BatchKey, BatchOptions, DrawBatcher, FlushHook};
pub use buffer::{PixelBuffer, BUFFER_CHANNELS};
pub use gpu::{AttributeKind, BatchId, BufferId, BlendMode, GpuDevice, TextureId, VertexAttribute};
pub use instance::{GlyphInstance, BATCH_LEN_MAX};
pub use math::Matrix4;
