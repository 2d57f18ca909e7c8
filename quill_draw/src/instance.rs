// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

use crate::{AttributeKind, VertexAttribute};

/// Maximum number of glyphs one instanced draw covers.
pub const BATCH_LEN_MAX: usize = 2048;

/// Per-glyph record of the instance buffer.
///
/// The text shader expands each record to a quad spanning `pos` and samples
/// `glyph_size[0] * glyph_size[1]` coverage texels starting at texel `offset`
/// of the atlas.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Quad corners as `[x1, x2, y1, y2]`, in pixels.
    pub pos: [f32; 4],
    /// Text color.
    pub color: [u8; 4],
    /// First atlas texel of the glyph.
    pub offset: i32,
    /// Bitmap width and height.
    pub glyph_size: [i32; 2],
}

impl GlyphInstance {
    /// The vertex layout the instance buffer is declared with.
    pub const LAYOUT: [VertexAttribute; 4] = [
        VertexAttribute {
            name: "pos",
            kind: AttributeKind::F32,
            components: 4,
        },
        VertexAttribute {
            name: "col",
            kind: AttributeKind::U8Normalized,
            components: 4,
        },
        VertexAttribute {
            name: "offset",
            kind: AttributeKind::I32,
            components: 1,
        },
        VertexAttribute {
            name: "glyph_size",
            kind: AttributeKind::I32,
            components: 2,
        },
    ];

    /// Places a `width` x `height` bitmap whose top left corner is at
    /// (`x`, `y`) in a y-up coordinate space.
    pub fn new(x: i32, y: i32, width: i32, height: i32, color: [u8; 4], offset: i32) -> Self {
        let (x1, y1) = (x as f32, y as f32);
        Self {
            pos: [x1, x1 + width as f32, y1, y1 - height as f32],
            color,
            offset,
            glyph_size: [width, height],
        }
    }
}
