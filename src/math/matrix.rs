//! Fixed-offset access into column-major 4x4 world matrices.
//!
//! Entity world matrices carry a 2D similarity transform: the linear 2x2
//! block lives at flat offsets 0, 1, 4, 5 and the translation at 12, 13.
//! AABB and radius derivation read these offsets directly.

use glam::{Mat2, Mat3, Mat4, Vec2};

/// Flat offsets of the linear 2x2 block, in column-major order.
pub const LINEAR_OFFSETS: [usize; 4] = [0, 1, 4, 5];
/// Flat offset of the x translation.
pub const TRANSLATION_X: usize = 12;
/// Flat offset of the y translation.
pub const TRANSLATION_Y: usize = 13;

/// Read one element of the matrix by its flat column-major offset.
///
/// Offsets past 15 read as `0.0`.
pub fn element(m: &Mat4, offset: usize) -> f32 {
    m.to_cols_array().get(offset).copied().unwrap_or(0.0)
}

/// The linear 2x2 block of a world matrix.
pub fn truncate_linear(m: &Mat4) -> Mat2 {
    let data = m.to_cols_array();
    Mat2::from_cols_array(&LINEAR_OFFSETS.map(|i| data[i]))
}

/// Upper-left 3x3 block.
pub fn truncate_mat3(m: &Mat4) -> Mat3 {
    Mat3::from_mat4(*m)
}

pub fn translation(m: &Mat4) -> Vec2 {
    let data = m.to_cols_array();
    Vec2::new(data[TRANSLATION_X], data[TRANSLATION_Y])
}

/// Overwrite the translation, leaving every other element untouched.
pub fn set_translation(m: &mut Mat4, pos: Vec2) {
    m.w_axis.x = pos.x;
    m.w_axis.y = pos.y;
}
