// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pair kerning and hinting corrections between consecutive glyphs.

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;

use quill_fonts::{mul_div, mul_fix, F26Dot6, FontFace, SizeMetrics};

use crate::GlyphBitmap;

/// Codepoints below this have their pair kerning cached.
pub const KERNING_TABLE_SIZE: usize = 128;

const UNSET: i32 = i32::MAX;

/// Below this many pixels per em kerning is scaled down proportionally.
const KERNING_DAMPING_PPEM: i32 = 25;

/// Unscaled kerning of ASCII pairs, filled in as pairs are first seen.
///
/// Cells hold design units, so one table serves every size of a face.
pub struct KerningTable {
    cells: Box<[i32]>,
}

impl fmt::Debug for KerningTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = self.cells.iter().filter(|&&cell| cell != UNSET).count();
        f.debug_struct("KerningTable")
            .field("filled", &filled)
            .finish_non_exhaustive()
    }
}

impl Default for KerningTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KerningTable {
    /// Creates a table with every cell unset.
    pub fn new() -> Self {
        Self {
            cells: vec![UNSET; KERNING_TABLE_SIZE * KERNING_TABLE_SIZE].into_boxed_slice(),
        }
    }

    fn cell(left: char, right: char) -> Option<usize> {
        let (left, right) = (left as usize, right as usize);
        (left < KERNING_TABLE_SIZE && right < KERNING_TABLE_SIZE)
            .then_some(right * KERNING_TABLE_SIZE + left)
    }

    /// The cached kerning of `left` followed by `right`, if known.
    pub fn get(&self, left: char, right: char) -> Option<i32> {
        let cell = Self::cell(left, right)?;
        Some(self.cells[cell]).filter(|&units| units != UNSET)
    }

    fn set(&mut self, left: char, right: char, units: i32) {
        if let Some(cell) = Self::cell(left, right) {
            self.cells[cell] = units;
        }
    }
}

/// Scales design unit kerning to the size, damping it at small sizes where
/// hinted advances leave little room.
fn scale_kerning(metrics: &SizeMetrics, units: i32) -> F26Dot6 {
    let mut scaled = mul_fix(units, metrics.x_scale);
    if metrics.x_ppem < KERNING_DAMPING_PPEM {
        scaled = mul_div(scaled, metrics.x_ppem, KERNING_DAMPING_PPEM);
    }
    F26Dot6::from_raw(scaled)
}

/// Pen adjustment to apply before placing `glyph` after `prev`.
///
/// Always includes the hinting side bearing corrections. Pair kerning is
/// added when the face has a kerning `table` and there is a previous glyph;
/// ASCII pairs are answered from the table, asking the face only the first
/// time a pair is seen.
pub(crate) fn kerning_adjustment(
    face: &dyn FontFace,
    metrics: &SizeMetrics,
    table: Option<&mut KerningTable>,
    prev: Option<&GlyphBitmap>,
    glyph: &GlyphBitmap,
) -> F26Dot6 {
    let mut adjustment = glyph.lsb_delta - prev.map_or(F26Dot6::ZERO, |prev| prev.rsb_delta);
    let (Some(table), Some(prev)) = (table, prev) else {
        return adjustment;
    };
    let units = match table.get(prev.codepoint, glyph.codepoint) {
        Some(units) => units,
        None => {
            let units = face.kerning(prev.glyph_index, glyph.glyph_index);
            table.set(prev.codepoint, glyph.codepoint, units);
            units
        }
    };
    if units != 0 {
        adjustment += scale_kerning(metrics, units);
    }
    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_fonts::{DesignMetrics, DPI};

    fn metrics(points: i32) -> SizeMetrics {
        let design = DesignMetrics {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            height: 1200,
            max_advance: 1000,
        };
        SizeMetrics::new(&design, F26Dot6::from_int(points), DPI).unwrap()
    }

    #[test]
    fn table_starts_unset() {
        let mut table = KerningTable::new();
        assert_eq!(table.get('A', 'V'), None);
        table.set('A', 'V', -80);
        assert_eq!(table.get('A', 'V'), Some(-80));
        assert_eq!(table.get('V', 'A'), None);
        // Non-ASCII pairs are never stored.
        table.set('A', 'é', -10);
        assert_eq!(table.get('A', 'é'), None);
    }

    #[test]
    fn scaling_is_damped_below_25_ppem() {
        // 100 units at 50 px/em is 5px.
        assert_eq!(scale_kerning(&metrics(50), 100), F26Dot6::from_int(5));
        // 100 units at 10 px/em is 1px, damped by 10/25.
        assert_eq!(scale_kerning(&metrics(10), 100).to_raw(), 26);
        assert_eq!(scale_kerning(&metrics(10), -100).to_raw(), -26);
    }
}
