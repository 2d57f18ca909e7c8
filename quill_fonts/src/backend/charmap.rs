// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping codepoints through one chosen `cmap` subtable.

use read_fonts::tables::cmap::{Cmap, CmapSubtable};
use read_fonts::{FontData, FontRead, FontRef, TableProvider, TopLevelTable};
use smallvec::SmallVec;

use super::CharMapEncoding;

/// The encoding records of a face's `cmap` table.
#[derive(Clone, Debug, Default)]
pub(crate) struct CharmapDirectory {
    encodings: SmallVec<[CharMapEncoding; 4]>,
    /// Subtable offsets from the start of the font data, parallel to
    /// `encodings`.
    offsets: SmallVec<[u32; 4]>,
}

impl CharmapDirectory {
    pub(crate) fn new(font: &FontRef<'_>) -> Self {
        let mut directory = Self::default();
        let Ok(cmap) = font.cmap() else {
            return directory;
        };
        let Some(cmap_offset) = font
            .table_directory()
            .table_records()
            .iter()
            .find(|record| record.tag() == Cmap::TAG)
            .map(|record| record.offset())
        else {
            return directory;
        };
        for record in cmap.encoding_records() {
            let Some(offset) = cmap_offset.checked_add(record.subtable_offset().to_u32()) else {
                continue;
            };
            let platform = record.platform_id() as u16;
            let encoding = CharMapEncoding::from_ids(platform, record.encoding_id());
            directory.encodings.push(encoding);
            directory.offsets.push(offset);
        }
        directory
    }

    /// Encodings in file order.
    pub(crate) fn encodings(&self) -> &[CharMapEncoding] {
        &self.encodings
    }

    /// The first subtable with `encoding`.
    pub(crate) fn find(&self, encoding: CharMapEncoding) -> Option<CharmapIndex> {
        let i = self.encodings.iter().position(|e| *e == encoding)?;
        Some(CharmapIndex {
            encoding,
            subtable_offset: self.offsets[i],
        })
    }

    /// The map used until another is selected: the first Unicode map, else
    /// the first map.
    pub(crate) fn preferred(&self) -> Option<CharmapIndex> {
        self.find(CharMapEncoding::Unicode)
            .or_else(|| self.encodings.first().and_then(|e| self.find(*e)))
    }
}

/// Location of one `cmap` subtable in the font data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CharmapIndex {
    encoding: CharMapEncoding,
    subtable_offset: u32,
}

impl CharmapIndex {
    /// Glyph index of `codepoint` in the subtable, zero when unmapped.
    pub(crate) fn map(&self, font_data: &[u8], codepoint: u32) -> u32 {
        let Some(subtable) = usize::try_from(self.subtable_offset)
            .ok()
            .and_then(|offset| font_data.get(offset..))
            .and_then(|data| CmapSubtable::read(FontData::new(data)).ok())
        else {
            return 0;
        };
        let code = match self.encoding {
            CharMapEncoding::AppleRoman if codepoint > 0x7F => {
                match unicode_to_mac_roman(codepoint) {
                    Some(code) => code,
                    None => return 0,
                }
            }
            _ => codepoint,
        };
        let glyph = map_code(&subtable, code).or_else(|| {
            // Symbol fonts place their glyphs at U+F000..U+F0FF.
            (self.encoding == CharMapEncoding::MsSymbol && code <= 0xFF)
                .then(|| map_code(&subtable, 0xF000 + code))
                .flatten()
        });
        glyph.unwrap_or(0)
    }
}

fn map_code(subtable: &CmapSubtable<'_>, code: u32) -> Option<u32> {
    let glyph = match subtable {
        CmapSubtable::Format0(table) => table.map_codepoint(code),
        CmapSubtable::Format4(table) => table.map_codepoint(code),
        CmapSubtable::Format6(table) => table.map_codepoint(code),
        CmapSubtable::Format12(table) => table.map_codepoint(code),
        CmapSubtable::Format13(table) => table.map_codepoint(code),
        _ => None,
    };
    glyph.map(|gid| gid.to_u32()).filter(|&gid| gid != 0)
}

/// Unicode values of the Mac OS Roman codes `0x80..=0xFF`.
#[rustfmt::skip]
const MAC_ROMAN_HIGH: [u16; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1,
    0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
    0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC,
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211,
    0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
    0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153,
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1,
    0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
    0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

fn unicode_to_mac_roman(codepoint: u32) -> Option<u32> {
    let codepoint = u16::try_from(codepoint).ok()?;
    let i = MAC_ROMAN_HIGH.iter().position(|&c| c == codepoint)?;
    u32::try_from(0x80 + i).ok()
}

#[cfg(test)]
mod tests {
    use super::unicode_to_mac_roman;

    #[test]
    fn mac_roman_high_half() {
        assert_eq!(unicode_to_mac_roman(0xE9), Some(0x8E), "e acute");
        assert_eq!(unicode_to_mac_roman(0x20AC), Some(0xDB), "euro sign");
        assert_eq!(unicode_to_mac_roman(0x02C7), Some(0xFF), "caron");
        assert_eq!(unicode_to_mac_roman(0x0416), None, "cyrillic is not encoded");
    }
}
