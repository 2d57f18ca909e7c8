// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! OS/2 Unicode range coverage, used to pick fallback fonts without opening them.

use core::fmt;

/// The four 32-bit `ulUnicodeRange` words of a font's OS/2 table.
///
/// Bit `n` of the 128-bit set claims functional coverage of Unicode range
/// `n`. See the [OS/2 specification].
///
/// [OS/2 specification]: https://learn.microsoft.com/en-us/typography/opentype/spec/os2#ur
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnicodeRanges(pub [u32; 4]);

impl UnicodeRanges {
    /// No coverage claimed.
    pub const EMPTY: Self = Self([0; 4]);
    /// Coverage claimed for every range.
    pub const ALL: Self = Self([u32::MAX; 4]);

    /// Basic Latin.
    pub const BASIC_LATIN: u32 = 1 << 0;
    /// Armenian.
    pub const ARMENIAN: u32 = 1 << 10;
    /// Hebrew.
    pub const HEBREW: u32 = 1 << 11;
    /// Arabic.
    pub const ARABIC: u32 = 1 << 13;
    /// Devanagari.
    pub const DEVANAGARI: u32 = 1 << 15;
    /// Bengali.
    pub const BENGALI: u32 = 1 << 16;
    /// Gurmukhi.
    pub const GURMUKHI: u32 = 1 << 17;
    /// Gujarati.
    pub const GUJARATI: u32 = 1 << 18;
    /// Tamil.
    pub const TAMIL: u32 = 1 << 20;
    /// Telugu.
    pub const TELUGU: u32 = 1 << 21;
    /// Kannada.
    pub const KANNADA: u32 = 1 << 22;
    /// Malayalam.
    pub const MALAYALAM: u32 = 1 << 23;
    /// Thai.
    pub const THAI: u32 = 1 << 24;
    /// Georgian.
    pub const GEORGIAN: u32 = 1 << 26;
    /// Mathematical Operators (second word, bit 38).
    pub const MATHEMATICAL_OPERATORS: u32 = 1 << (38 - 32);
    /// Arabic Presentation Forms-A (second word, bit 63).
    pub const ARABIC_PRESENTATION_FORMS_A: u32 = 1 << (63 - 32);
    /// Arabic Presentation Forms-B (third word, bit 67).
    pub const ARABIC_PRESENTATION_FORMS_B: u32 = 1 << (67 - 64);
    /// Myanmar (third word, bit 74).
    pub const MYANMAR: u32 = 1 << (74 - 64);
    /// Ethiopic (third word, bit 75).
    pub const ETHIOPIC: u32 = 1 << (75 - 64);

    /// Whether range bit `bit` (0..128) is set.
    pub fn contains(&self, bit: u32) -> bool {
        let Some(word) = self.0.get((bit / 32) as usize) else {
            return false;
        };
        word & (1 << (bit % 32)) != 0
    }

    /// Whether the ranges describe a "last resort" font that claims to cover
    /// everything, usually except the last few reserved bits.
    pub fn is_last_resort(&self) -> bool {
        let [a, b, c, d] = self.0;
        a == u32::MAX && b == u32::MAX && c == u32::MAX && d >= 0x07FF_FFFF
    }
}

impl fmt::Debug for UnicodeRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "UnicodeRanges({a:08x} {b:08x} {c:08x} {d:08x})")
    }
}

/// Coverage of a font file known ahead of time, so its face can stay closed
/// until a glyph is actually needed.
#[derive(Copy, Clone, Debug)]
pub struct KnownFace {
    /// File name (final path component) the details apply to.
    pub file_name: &'static str,
    /// The file's OS/2 Unicode ranges.
    pub ranges: UnicodeRanges,
}

const fn known(file_name: &'static str, a: u32, b: u32, c: u32, d: u32) -> KnownFace {
    KnownFace {
        file_name,
        ranges: UnicodeRanges([a, b, c, d]),
    }
}

/// The fallback fonts shipped with the application.
pub static KNOWN_FACES: &[KnownFace] = &[
    known("lastresort.woff2", u32::MAX, u32::MAX, u32::MAX, u32::MAX),
    known("Noto Sans CJK Regular.woff2", 0x3000_0083, 0x29DF_3C10, 0x16, 0),
    known(
        "NotoEmoji-VariableFont_wght.woff2",
        0x8000_0003,
        0x0241_E4AC,
        0x1400_0000,
        0x0400_0000,
    ),
    known(
        "NotoSansArabic-VariableFont_wdth,wght.woff2",
        UnicodeRanges::ARABIC,
        UnicodeRanges::ARABIC_PRESENTATION_FORMS_A,
        UnicodeRanges::ARABIC_PRESENTATION_FORMS_B,
        0,
    ),
    known(
        "NotoSansArmenian-VariableFont_wdth,wght.woff2",
        UnicodeRanges::ARMENIAN,
        0,
        0,
        0,
    ),
    known(
        "NotoSansBengali-VariableFont_wdth,wght.woff2",
        UnicodeRanges::BENGALI,
        0,
        0,
        0,
    ),
    known(
        "NotoSansDevanagari-Regular.woff2",
        UnicodeRanges::DEVANAGARI,
        0,
        0,
        0,
    ),
    known("NotoSansEthiopic-Regular.woff2", 0, 0, UnicodeRanges::ETHIOPIC, 0),
    known(
        "NotoSansGeorgian-VariableFont_wdth,wght.woff2",
        UnicodeRanges::GEORGIAN,
        0,
        0,
        0,
    ),
    known(
        "NotoSansGujarati-Regular.woff2",
        UnicodeRanges::GUJARATI,
        0,
        0,
        0,
    ),
    known(
        "NotoSansGurmukhi-VariableFont_wdth,wght.woff2",
        UnicodeRanges::GURMUKHI,
        0,
        0,
        0,
    ),
    known("NotoSansHebrew-Regular.woff2", UnicodeRanges::HEBREW, 0, 0, 0),
    known("NotoSansJavanese-Regular.woff2", 0x8000_0003, 0x2000, 0, 0),
    known(
        "NotoSansKannada-VariableFont_wdth,wght.woff2",
        UnicodeRanges::KANNADA,
        0,
        0,
        0,
    ),
    known(
        "NotoSansMalayalam-VariableFont_wdth,wght.woff2",
        UnicodeRanges::MALAYALAM,
        0,
        0,
        0,
    ),
    known(
        "NotoSansMath-Regular.woff2",
        0,
        UnicodeRanges::MATHEMATICAL_OPERATORS,
        0,
        0,
    ),
    known("NotoSansMyanmar-Regular.woff2", 0, 0, UnicodeRanges::MYANMAR, 0),
    known(
        "NotoSansSymbols-VariableFont_wght.woff2",
        0x3,
        0x0200_E4B4,
        0,
        0,
    ),
    known(
        "NotoSansSymbols2-Regular.woff2",
        0x8000_0003,
        0x0200_E3E4,
        0x0004_0020,
        0x0580_A048,
    ),
    known(
        "NotoSansTamil-VariableFont_wdth,wght.woff2",
        UnicodeRanges::TAMIL,
        0,
        0,
        0,
    ),
    known(
        "NotoSansTelugu-VariableFont_wdth,wght.woff2",
        UnicodeRanges::TELUGU,
        0,
        0,
        0,
    ),
    known(
        "NotoSansThai-VariableFont_wdth,wght.woff2",
        UnicodeRanges::THAI,
        0,
        0,
        0,
    ),
];

/// Looks up precomputed coverage for a font file name.
pub fn known_face(file_name: &str) -> Option<&'static KnownFace> {
    KNOWN_FACES.iter().find(|face| face.file_name == file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_resort_detection() {
        assert!(UnicodeRanges::ALL.is_last_resort());
        assert!(UnicodeRanges([u32::MAX, u32::MAX, u32::MAX, 0x07FF_FFFF]).is_last_resort());
        assert!(!UnicodeRanges([u32::MAX, u32::MAX, u32::MAX, 0x07FF_FFFE]).is_last_resort());
        assert!(!UnicodeRanges::EMPTY.is_last_resort());
    }

    #[test]
    fn range_bits() {
        let arabic = known_face("NotoSansArabic-VariableFont_wdth,wght.woff2").unwrap();
        assert!(arabic.ranges.contains(13));
        assert!(arabic.ranges.contains(63));
        assert!(arabic.ranges.contains(67));
        assert!(!arabic.ranges.contains(0));
        assert!(!arabic.ranges.contains(500));
        assert!(known_face("lastresort.woff2").unwrap().ranges.is_last_resort());
        assert!(known_face("DejaVuSans.ttf").is_none());
    }
}
