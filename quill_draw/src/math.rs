// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Model-view matrices.

use core::ops::Mul;

/// A 4x4 column-major transform, laid out the way GPU APIs expect it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4(pub [[f32; 4]; 4]);

impl Matrix4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// A translation.
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[3] = [x, y, z, 1.0];
        m
    }

    /// A non-uniform scale.
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[0][0] = x;
        m.0[1][1] = y;
        m.0[2][2] = z;
        m
    }

    /// A counter-clockwise rotation about the Z axis by `radians`.
    pub fn rotation_z(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let mut m = Self::IDENTITY;
        m.0[0][0] = cos;
        m.0[0][1] = sin;
        m.0[1][0] = -sin;
        m.0[1][1] = cos;
        m
    }

    /// Builds a matrix from 16 column-major values.
    pub fn from_cols_array(values: &[f32; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (col, chunk) in m.iter_mut().zip(values.chunks_exact(4)) {
            col.copy_from_slice(chunk);
        }
        Self(m)
    }

    /// Transforms a point, ignoring perspective.
    pub fn transform_point(&self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0][0] * x + m[1][0] * y + m[2][0] * z + m[3][0],
            m[0][1] * x + m[1][1] * y + m[2][1] * z + m[3][1],
            m[0][2] * x + m[1][2] * y + m[2][2] * z + m[3][2],
        ]
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, cell) in out_col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.0[k][row] * rhs.0[col][k]).sum();
            }
        }
        Self(out)
    }
}
