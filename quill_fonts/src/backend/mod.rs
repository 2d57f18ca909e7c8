// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The font rendering library seam.
//!
//! Quill does not parse outlines or hint glyphs itself. A [`FontBackend`]
//! opens faces and a [`FontFace`] answers glyph, kerning and metric queries
//! and rasterizes glyph bitmaps.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use std::path::Path;

use bitflags::bitflags;

use crate::{Error, ErrorKind, F26Dot6, FontSource, UnicodeRanges};

#[cfg(feature = "swash")]
mod charmap;
#[cfg(feature = "swash")]
mod swash_face;

#[cfg(feature = "swash")]
pub use self::swash_face::SwashBackend;

/// Opens font faces.
///
/// Implementations must tolerate being called from several threads, though
/// the face cache serializes all calls to [`open`](Self::open).
pub trait FontBackend: Send + Sync + fmt::Debug {
    /// Opens the face stored at `source`.
    fn open(&self, source: &FontSource) -> Result<Box<dyn FontFace>, Error>;
}

/// An opened font face.
///
/// Read-only queries may run concurrently on distinct faces. A single face is
/// only ever used by one thread at a time, under its font's glyph cache lock.
pub trait FontFace: Send + Sync + fmt::Debug {
    /// Face level flags, coverage and names.
    fn info(&self) -> FaceInfo;

    /// The character maps the face carries, in file order.
    fn charmaps(&self) -> &[CharMapEncoding];

    /// Makes `encoding` the active character map. Returns `false` if the face
    /// has no such map.
    fn select_charmap(&mut self, encoding: CharMapEncoding) -> bool;

    /// Attaches an auxiliary metrics file such as an AFM sidecar.
    fn attach_metrics(&mut self, path: &Path) -> Result<(), Error> {
        let _ = path;
        Err(Error::new(ErrorKind::Unsupported))
    }

    /// Maps a codepoint through the active character map. Zero means missing.
    fn glyph_index(&self, codepoint: u32) -> u32;

    /// Kerning between two glyph indices in unscaled design units.
    ///
    /// Returns zero when the pair has no kerning or on any error.
    fn kerning(&self, left: u32, right: u32) -> i32;

    /// Unscaled face metrics.
    fn design_metrics(&self) -> DesignMetrics;

    /// Rasterizes one glyph to an 8-bit coverage bitmap.
    fn rasterize(&self, request: &RasterRequest) -> Option<RasterizedGlyph>;

    /// Approximate memory, in bytes, held by one scaled size of this face.
    fn size_cost(&self) -> usize {
        2048
    }
}

bitflags! {
    /// Face level properties reported by the backend.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FaceFlags: u32 {
        /// The face has scalable outlines.
        const SCALABLE = 1 << 0;
        /// Every glyph has the same advance.
        const FIXED_WIDTH = 1 << 1;
        /// The face carries a pair kerning table.
        const KERNING = 1 << 2;
        /// The face has variation axes.
        const VARIATIONS = 1 << 3;
    }
}

/// What the face cache records about a face when it is first opened.
#[derive(Clone, Debug, Default)]
pub struct FaceInfo {
    /// Face level properties.
    pub flags: FaceFlags,
    /// Number of variation axes.
    pub axis_count: usize,
    /// OS/2 Unicode range coverage.
    pub unicode_ranges: UnicodeRanges,
    /// Family name from the naming table.
    pub family_name: Option<String>,
    /// Style (subfamily) name from the naming table.
    pub style_name: Option<String>,
}

/// A character map's platform encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CharMapEncoding {
    /// Any Unicode map (platform 0, or Windows BMP / full repertoire).
    Unicode,
    /// The Macintosh Roman encoding.
    AppleRoman,
    /// The Windows symbol encoding.
    MsSymbol,
    /// Any other platform/encoding pair.
    Other {
        /// Platform identifier.
        platform: u16,
        /// Platform specific encoding identifier.
        encoding: u16,
    },
}

impl CharMapEncoding {
    /// Classifies a `cmap` encoding record.
    pub fn from_ids(platform: u16, encoding: u16) -> Self {
        match (platform, encoding) {
            (0, _) | (3, 1) | (3, 10) => Self::Unicode,
            (1, 0) => Self::AppleRoman,
            (3, 0) => Self::MsSymbol,
            (platform, encoding) => Self::Other { platform, encoding },
        }
    }
}

/// Unscaled face metrics in design units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DesignMetrics {
    /// Design units per em.
    pub units_per_em: u16,
    /// Typographic ascender, positive above the baseline.
    pub ascender: i32,
    /// Typographic descender, negative below the baseline.
    pub descender: i32,
    /// Baseline to baseline distance.
    pub height: i32,
    /// Largest advance of any glyph.
    pub max_advance: i32,
}

/// Anti-aliasing mode of rendered glyphs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// 8-bit coverage.
    #[default]
    Antialiased,
    /// Coverage thresholded to fully on or off.
    Monochrome,
}

/// Outline hinting strength.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Hinting {
    /// Unhinted outlines.
    None,
    /// Vertical-only hinting.
    #[default]
    Slight,
    /// Full hinting.
    Full,
}

/// A request to rasterize a glyph.
#[derive(Copy, Clone, Debug)]
pub struct RasterRequest {
    /// Glyph index in the face.
    pub glyph_index: u32,
    /// Pixels per em.
    pub ppem: f32,
    /// Horizontal subpixel offset of the pen, `0..64`.
    pub x_offset: F26Dot6,
    /// Anti-aliasing mode.
    pub render_mode: RenderMode,
    /// Hinting strength.
    pub hinting: Hinting,
}

/// A glyph rendered by the backend.
#[derive(Clone, Debug, Default)]
pub struct RasterizedGlyph {
    /// Horizontal distance from the pen to the bitmap's left edge, in pixels.
    pub left: i32,
    /// Vertical distance from the baseline up to the bitmap's top row, in pixels.
    pub top: i32,
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in rows.
    pub height: u32,
    /// Bytes per row. Positive pitch stores rows top to bottom.
    pub pitch: i32,
    /// Coverage bytes, `|pitch| * height` long.
    pub data: Vec<u8>,
    /// Horizontal advance.
    pub advance: F26Dot6,
    /// Outline bounding box.
    pub bounds: GlyphBounds,
    /// Left side bearing change introduced by hinting.
    pub lsb_delta: F26Dot6,
    /// Right side bearing change introduced by hinting.
    pub rsb_delta: F26Dot6,
}

/// An outline's control box relative to the pen, in 26.6 pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBounds {
    /// Left edge.
    pub x_min: F26Dot6,
    /// Right edge.
    pub x_max: F26Dot6,
    /// Bottom edge, negative below the baseline.
    pub y_min: F26Dot6,
    /// Top edge.
    pub y_max: F26Dot6,
}

#[cfg(test)]
mod tests {
    use super::CharMapEncoding;

    #[test]
    fn encoding_classification() {
        assert_eq!(CharMapEncoding::from_ids(0, 3), CharMapEncoding::Unicode);
        assert_eq!(CharMapEncoding::from_ids(3, 10), CharMapEncoding::Unicode);
        assert_eq!(CharMapEncoding::from_ids(1, 0), CharMapEncoding::AppleRoman);
        assert_eq!(CharMapEncoding::from_ids(3, 0), CharMapEncoding::MsSymbol);
        assert_eq!(
            CharMapEncoding::from_ids(3, 2),
            CharMapEncoding::Other {
                platform: 3,
                encoding: 2
            }
        );
    }
}
