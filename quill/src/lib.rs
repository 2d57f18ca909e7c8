// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quill draws and measures text with cached glyph bitmaps.
//!
//! A [`Font`] is loaded through a [`FontContext`], whose face cache bounds
//! the number of open font files across every font. Fonts step through text
//! in 26.6 fixed point, applying kerning and hinting corrections, and hand
//! glyph bitmaps either to a [`DrawBatcher`] for instanced GPU drawing or to
//! a [`PixelBuffer`].
//!
//! ```ignore
//! let context = FontContext::new(Arc::new(SwashBackend::new()));
//! let mut font = context.load(FontSource::from_path("DejaVuSans.ttf"))?;
//! font.set_size(14.0)?;
//! font.set_position(10, 200);
//! let mut batcher = DrawBatcher::default();
//! font.draw(&mut gpu, &mut batcher, "Hello, world");
//! batcher.flush(&mut gpu);
//! ```
//!
//! Text is taken as bytes. It ends at its first NUL byte, and bytes that are
//! not valid UTF-8 are read as Latin-1 characters.
//!
//! ## Features
//!
//! - `swash` (enabled by default): Enables the `swash` backend of
//!   [`quill_fonts`].

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

pub use quill_draw;
pub use quill_fonts;

mod draw;
mod font;
mod glyph;
mod kerning;
mod lru_cache;
mod measure;
mod rect;
mod shape;
mod wrap;

pub mod utf8;

#[cfg(test)]
mod tests;

pub use font::{Font, FontContext, FontFlags, Shadow, ShadowBlur, DEFAULT_SIZE};
pub use glyph::{GlyphBitmap, GlyphCache, GlyphCacheGuard, GlyphCacheKey, MAX_GLYPH_CACHES};
pub use kerning::{KerningTable, KERNING_TABLE_SIZE};
pub use rect::{Rect, TextInfo};
pub use shape::PenMode;
pub use wrap::{WrapLines, WrappedLine};

pub use quill_draw::{DrawBatcher, GpuDevice, Matrix4, PixelBuffer};
pub use quill_fonts::{Error, ErrorKind, F26Dot6, FontSource};
