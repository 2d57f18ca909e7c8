// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font backend built on `swash`.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use parking_lot::Mutex;
use read_fonts::tables::kern::{Subtable0, SubtableKind};
use read_fonts::types::GlyphId;
use read_fonts::TableProvider;
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::{Format, Vector};
use swash::{CacheKey, FontRef, StringId};

use super::charmap::{CharmapDirectory, CharmapIndex};
use super::{
    CharMapEncoding, DesignMetrics, FaceFlags, FaceInfo, FontBackend, FontFace, GlyphBounds,
    Hinting, RasterRequest, RasterizedGlyph, RenderMode,
};
use crate::{Error, ErrorKind, F26Dot6, FontSource, UnicodeRanges};

/// A [`FontBackend`] that reads TrueType/OpenType data and scales outlines with `swash`.
///
/// Collections open their first face. Metrics sidecars are not supported.
#[derive(Debug, Default)]
pub struct SwashBackend;

impl SwashBackend {
    /// Creates a new backend.
    pub fn new() -> Self {
        Self
    }
}

impl FontBackend for SwashBackend {
    fn open(&self, source: &FontSource) -> Result<Box<dyn FontFace>, Error> {
        let data: Arc<[u8]> = match source {
            FontSource::Path(path) => std::fs::read(path)
                .map_err(|err| {
                    Error::new(ErrorKind::CannotOpen)
                        .with_font(source.name())
                        .with_detail(err.to_string())
                })?
                .into(),
            FontSource::Memory { data, .. } => Arc::clone(data),
        };
        let face = SwashFace::new(data).ok_or_else(|| {
            Error::new(ErrorKind::CannotOpen)
                .with_font(source.name())
                .with_detail("unrecognized font format")
        })?;
        Ok(Box::new(face))
    }
}

struct SwashFace {
    data: Arc<[u8]>,
    offset: u32,
    key: CacheKey,
    charmaps: CharmapDirectory,
    selected: Option<CharmapIndex>,
    info: FaceInfo,
    context: Mutex<ScaleContext>,
}

impl core::fmt::Debug for SwashFace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SwashFace")
            .field("len", &self.data.len())
            .field("offset", &self.offset)
            .field("charmaps", &self.charmaps)
            .field("selected", &self.selected)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "design unit metrics fit in i32"
)]
fn units(v: f32) -> i32 {
    v.round() as i32
}

fn name(font: &FontRef<'_>, id: StringId) -> Option<String> {
    font.localized_strings()
        .find_by_id(id, None)
        .map(|s| s.chars().collect())
}

fn unicode_ranges(font: &read_fonts::FontRef<'_>) -> UnicodeRanges {
    font.os2().map_or(UnicodeRanges::EMPTY, |os2| {
        UnicodeRanges([
            os2.ul_unicode_range_1(),
            os2.ul_unicode_range_2(),
            os2.ul_unicode_range_3(),
            os2.ul_unicode_range_4(),
        ])
    })
}

/// The first horizontal, non cross-stream pair table of the `kern` table.
fn pair_table<'a>(font: &read_fonts::FontRef<'a>) -> Option<Subtable0<'a>> {
    let kern = font.kern().ok()?;
    kern.subtables().filter_map(Result::ok).find_map(|subtable| {
        if !subtable.is_horizontal() || subtable.is_cross_stream() {
            return None;
        }
        match subtable.kind().ok()? {
            SubtableKind::Format0(pairs) => Some(pairs),
            _ => None,
        }
    })
}

impl SwashFace {
    fn new(data: Arc<[u8]>) -> Option<Self> {
        let font = FontRef::from_index(&data, 0)?;
        let (offset, key) = (font.offset, font.key);
        let tables = read_fonts::FontRef::from_index(&data, 0).ok()?;

        let charmaps = CharmapDirectory::new(&tables);
        let mut flags = FaceFlags::empty();
        if tables.glyf().is_ok() || tables.cff().is_ok() || tables.cff2().is_ok() {
            flags |= FaceFlags::SCALABLE;
        }
        if font.metrics(&[]).is_monospace {
            flags |= FaceFlags::FIXED_WIDTH;
        }
        if pair_table(&tables).is_some() {
            flags |= FaceFlags::KERNING;
        }
        let axis_count = font.variations().count();
        if axis_count > 0 {
            flags |= FaceFlags::VARIATIONS;
        }
        let info = FaceInfo {
            flags,
            axis_count,
            unicode_ranges: unicode_ranges(&tables),
            family_name: name(&font, StringId::Family),
            style_name: name(&font, StringId::SubFamily),
        };

        Some(Self {
            offset,
            key,
            selected: charmaps.preferred(),
            charmaps,
            info,
            context: Mutex::new(ScaleContext::new()),
            data,
        })
    }

    fn font(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    fn tables(&self) -> Option<read_fonts::FontRef<'_>> {
        read_fonts::FontRef::from_index(&self.data, 0).ok()
    }
}

impl FontFace for SwashFace {
    fn info(&self) -> FaceInfo {
        self.info.clone()
    }

    fn charmaps(&self) -> &[CharMapEncoding] {
        self.charmaps.encodings()
    }

    fn select_charmap(&mut self, encoding: CharMapEncoding) -> bool {
        match self.charmaps.find(encoding) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    fn glyph_index(&self, codepoint: u32) -> u32 {
        self.selected.map_or(0, |charmap| charmap.map(&self.data, codepoint))
    }

    fn kerning(&self, left: u32, right: u32) -> i32 {
        if !self.info.flags.contains(FaceFlags::KERNING) {
            return 0;
        }
        self.tables()
            .as_ref()
            .and_then(pair_table)
            .and_then(|pairs| pairs.kerning(GlyphId::new(left), GlyphId::new(right)))
            .unwrap_or(0)
    }

    fn design_metrics(&self) -> DesignMetrics {
        let metrics = self.font().metrics(&[]);
        DesignMetrics {
            units_per_em: metrics.units_per_em,
            ascender: units(metrics.ascent),
            descender: -units(metrics.descent),
            height: units(metrics.ascent + metrics.descent + metrics.leading),
            max_advance: units(metrics.max_width),
        }
    }

    fn rasterize(&self, request: &RasterRequest) -> Option<RasterizedGlyph> {
        let glyph_id = u16::try_from(request.glyph_index).ok()?;
        let font = self.font();
        let hint = request.hinting != Hinting::None;

        let mut context = self.context.lock();
        let mut scaler = context
            .builder(font)
            .size(request.ppem)
            .hint(hint)
            .build();
        let image = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .offset(Vector::new(request.x_offset.to_f32(), 0.0))
            .render(&mut scaler, glyph_id);

        // Blank glyphs such as space render nothing but still advance.
        let (left, top, width, height, mut data) = match image {
            Some(image) => (
                image.placement.left,
                image.placement.top,
                image.placement.width,
                image.placement.height,
                image.data,
            ),
            None => (0, 0, 0, 0, Vec::new()),
        };
        if request.render_mode == RenderMode::Monochrome {
            for coverage in &mut data {
                *coverage = if *coverage >= 128 { 255 } else { 0 };
            }
        }

        let mut advance = font
            .glyph_metrics(&[])
            .scale(request.ppem)
            .advance_width(glyph_id);
        if hint {
            advance = advance.round();
        }
        let (w, h) = (i32::try_from(width).ok()?, i32::try_from(height).ok()?);
        Some(RasterizedGlyph {
            left,
            top,
            width,
            height,
            pitch: w,
            data,
            advance: F26Dot6::from_f32(advance),
            bounds: GlyphBounds {
                x_min: F26Dot6::from_int(left),
                x_max: F26Dot6::from_int(left + w),
                y_min: F26Dot6::from_int(top - h),
                y_max: F26Dot6::from_int(top),
            },
            lsb_delta: F26Dot6::ZERO,
            rsb_delta: F26Dot6::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage() {
        let source = FontSource::from_memory("garbage", vec![0_u8; 64]);
        let err = SwashBackend::new().open(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotOpen);
        assert_eq!(err.font(), Some("garbage"));
    }

    fn be16(out: &mut Vec<u8>, values: &[u16]) {
        for value in values {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    /// A minimal TrueType font with a `cmap`, an empty `glyf` and a `kern`
    /// table kerning glyphs 5 and 9 by -40 units.
    ///
    /// With `unicode` the `cmap` starts with a (0, 3) format 6 subtable mapping
    /// `A` and `B` to glyphs 9 and 10. It always has a Mac Roman format 0
    /// subtable mapping `A` to 5 and `0x8E` to 7.
    fn fixture_font(unicode: bool) -> Vec<u8> {
        let mut roman = Vec::new();
        be16(&mut roman, &[0, 262, 0]);
        let mut codes = [0_u8; 256];
        codes[usize::from(b'A')] = 5;
        codes[0x8E] = 7;
        roman.extend_from_slice(&codes);
        let mut subtables = Vec::new();
        let mut records = Vec::new();
        let record_count: u16 = if unicode { 2 } else { 1 };
        let mut offset = 4 + 8 * record_count;
        if unicode {
            be16(&mut records, &[0, 3, 0, offset]);
            be16(&mut subtables, &[6, 14, 0, 65, 2, 9, 10]);
            offset += 14;
        }
        be16(&mut records, &[1, 0, 0, offset]);
        subtables.extend_from_slice(&roman);
        let mut cmap = Vec::new();
        be16(&mut cmap, &[0, record_count]);
        cmap.extend_from_slice(&records);
        cmap.extend_from_slice(&subtables);

        let mut kern = Vec::new();
        be16(&mut kern, &[0, 1, 0, 20, 0x0001, 1, 6, 0, 0, 5, 9]);
        kern.extend_from_slice(&(-40_i16).to_be_bytes());

        let tables: [(&[u8; 4], Vec<u8>); 3] =
            [(b"cmap", cmap), (b"glyf", vec![0; 4]), (b"kern", kern)];
        let mut font = Vec::new();
        be16(&mut font, &[1, 0, 3, 32, 1, 16]);
        let mut offset = 12 + 16 * tables.len();
        for (tag, data) in &tables {
            font.extend_from_slice(*tag);
            font.extend_from_slice(&[0; 4]);
            let (start, len) = (u32::try_from(offset), u32::try_from(data.len()));
            font.extend_from_slice(&start.unwrap().to_be_bytes());
            font.extend_from_slice(&len.unwrap().to_be_bytes());
            offset += data.len().next_multiple_of(4);
        }
        for (_, data) in &tables {
            font.extend_from_slice(data);
            font.resize(font.len().next_multiple_of(4), 0);
        }
        font
    }

    fn open_fixture(unicode: bool) -> Box<dyn FontFace> {
        let source = FontSource::from_memory("fixture", fixture_font(unicode));
        SwashBackend::new().open(&source).unwrap()
    }

    #[test]
    fn glyphs_map_through_the_selected_charmap() {
        let mut face = open_fixture(true);
        assert_eq!(
            face.charmaps(),
            [CharMapEncoding::Unicode, CharMapEncoding::AppleRoman]
        );
        assert_eq!(face.glyph_index(u32::from('A')), 9);
        assert_eq!(face.glyph_index(u32::from('B')), 10);
        assert_eq!(face.glyph_index(0xE9), 0);

        assert!(face.select_charmap(CharMapEncoding::AppleRoman));
        assert_eq!(face.glyph_index(u32::from('A')), 5);
        assert_eq!(face.glyph_index(u32::from('B')), 0);
        // U+00E9 is 0x8E in Mac Roman.
        assert_eq!(face.glyph_index(0xE9), 7);

        assert!(!face.select_charmap(CharMapEncoding::MsSymbol));
        assert_eq!(face.glyph_index(u32::from('A')), 5);
        assert!(face.select_charmap(CharMapEncoding::Unicode));
        assert_eq!(face.glyph_index(u32::from('A')), 9);
    }

    #[test]
    fn faces_without_unicode_start_on_their_first_charmap() {
        let face = open_fixture(false);
        assert_eq!(face.charmaps(), [CharMapEncoding::AppleRoman]);
        assert_eq!(face.glyph_index(u32::from('A')), 5);
        assert_eq!(face.glyph_index(0xE9), 7);
    }

    #[test]
    fn pair_kerning_comes_from_the_kern_table() {
        let face = open_fixture(true);
        let flags = face.info().flags;
        assert!(flags.contains(FaceFlags::KERNING));
        assert!(flags.contains(FaceFlags::SCALABLE));
        assert_eq!(face.kerning(5, 9), -40);
        assert_eq!(face.kerning(9, 5), 0);
    }

    #[test]
    fn missing_file() {
        let source = FontSource::from_path("/nonexistent/quill/missing.ttf");
        let err = SwashBackend::new().open(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotOpen);
        assert!(err.detail().is_some());
    }
}
