// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font faces, scaled sizes and the shared cache that owns them.
//!
//! Quill Fonts sits between the glyph engine and a font rendering library.
//! It defines the [`FontBackend`] seam, the 26.6 fixed point scalar
//! [`F26Dot6`] every pen computation uses, and [`FaceCache`], a bounded cache
//! shared by every font that opens faces on demand and evicts the least
//! recently used ones.
//!
//! ## Features
//!
//! - `swash` (enabled by default): Provides [`SwashBackend`], a backend for
//!   TrueType and OpenType fonts built on `swash`.

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

mod backend;
mod cache;
mod coverage;
mod error;
mod fixed;
mod size;
mod source;

pub use backend::{
    CharMapEncoding, DesignMetrics, FaceFlags, FaceInfo, FontBackend, FontFace, GlyphBounds,
    Hinting, RasterRequest, RasterizedGlyph, RenderMode,
};
#[cfg(feature = "swash")]
pub use backend::SwashBackend;
pub use cache::{open_face, FaceCache, FaceCacheOptions, FaceLease, FaceRef, SizeRef};
pub use coverage::{known_face, KnownFace, UnicodeRanges, KNOWN_FACES};
pub use error::{Error, ErrorKind};
pub use fixed::{div_fix, mul_div, mul_fix, F26Dot6};
pub use size::{SizeMetrics, DPI};
pub use source::{metrics_sidecar, FontId, FontSource};
