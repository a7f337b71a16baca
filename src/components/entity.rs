//! Renderable scene entity.
//!
//! A [`SceneEntity`] is what the scene stores and the renderer draws: a world
//! matrix, texture/program/renderable references, a UV rectangle and a tint.
//! The simulator reads its geometry (AABB, ellipse radii) and writes its
//! translation; everything else belongs to the renderer.
//!
//! The world matrix carries a 2D similarity transform. The model-space quad
//! spans `(-1, -1)..(1, 1)`, so a matrix scale of `s` yields an AABB half
//! extent of `s`, while [`SceneEntity::ellipse_radii`] recovers `s / 2`.

use std::cmp::Ordering;

use bevy_ecs::prelude::Component;
use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::math::Aabb;
use crate::math::matrix::{element, set_translation, translation, truncate_linear};

/// Stable id of a scene entity. Assigned by the scene on spawn.
pub type EntityId = u32;

/// Draw layer an entity belongs to. Lower layers draw first.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Layer(pub u32);

#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub id: EntityId,
    pub world_matrix: Mat4,
    /// Texture coordinates as a box, `min` = top-left of the sub-image.
    pub uvs: Aabb,
    /// Mirror the UV rectangle on the x and y axes respectively.
    pub flip_uvs: [bool; 2],
    pub texture_id: u32,
    pub program_id: u32,
    pub renderable_id: u32,
    pub color: [f32; 4],
    pub hidden: bool,
}

impl Default for SceneEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneEntity {
    /// Identity transform, full-texture UVs, opaque white, visible.
    pub fn new() -> Self {
        Self {
            id: 0,
            world_matrix: Mat4::IDENTITY,
            uvs: Aabb::from_scalars(0.0, 0.0, 1.0, 1.0),
            flip_uvs: [false, false],
            texture_id: 0,
            program_id: 0,
            renderable_id: 0,
            color: [1.0, 1.0, 1.0, 1.0],
            hidden: false,
        }
    }

    /// Builder variant of [`SceneEntity::set_transform`].
    pub fn with_transform(mut self, center: Vec2, scale: Vec2, rotation: f32) -> Self {
        self.set_transform(center, scale, rotation);
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_resources(mut self, texture_id: u32, program_id: u32, renderable_id: u32) -> Self {
        self.texture_id = texture_id;
        self.program_id = program_id;
        self.renderable_id = renderable_id;
        self
    }

    /// Rebuild the world matrix from center, scale and rotation (radians).
    ///
    /// Y is flipped to match the GL clip-space convention the renderer uses.
    pub fn set_transform(&mut self, center: Vec2, scale: Vec2, rotation: f32) {
        let (sin, cos) = rotation.sin_cos();
        self.world_matrix = Mat4::from_cols_array(&[
            scale.x * cos,
            scale.x * -sin,
            0.0,
            0.0,
            -scale.y * sin,
            -scale.y * cos,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
            center.x,
            center.y,
            0.0,
            1.0,
        ]);
    }

    pub fn position(&self) -> Vec2 {
        translation(&self.world_matrix)
    }

    pub fn set_position(&mut self, pos: Vec2) {
        set_translation(&mut self.world_matrix, pos);
    }

    /// World-space AABB: the model-space corners `(-1, -1)` and `(1, 1)`
    /// pushed through the linear block, offset by the translation.
    ///
    /// Only those two corners are transformed, so a rotated entity gets the
    /// box of its diagonal rather than a tight bound.
    pub fn aabb(&self) -> Aabb {
        let linear = truncate_linear(&self.world_matrix);
        let offset = self.position();
        let a = linear * Vec2::new(-1.0, -1.0) + offset;
        let b = linear * Vec2::new(1.0, 1.0) + offset;
        Aabb::from_corners(a, b)
    }

    /// Semi-axis radii of the ellipse inscribed in this entity.
    ///
    /// Recovers the rotation from the shear element with `asin` and divides
    /// the diagonal scale back out. Only valid for rotation plus scale; skew
    /// or a shear element outside `[-1, 1]` produces garbage or NaN.
    pub fn ellipse_radii(&self) -> Vec2 {
        let m = &self.world_matrix;
        let angle = element(m, 1).asin();
        let half_inv_cos = 1.0 / (angle.cos() * 2.0);
        Vec2::new(element(m, 0) * half_inv_cos, element(m, 5) * half_inv_cos).abs()
    }

    /// UV rectangle as bound for drawing, with flipped axes swapped.
    pub fn uv_rect(&self) -> Aabb {
        let mut uvs = self.uvs;
        if self.flip_uvs[0] {
            std::mem::swap(&mut uvs.min.x, &mut uvs.max.x);
        }
        if self.flip_uvs[1] {
            std::mem::swap(&mut uvs.min.y, &mut uvs.max.y);
        }
        uvs
    }

    /// Draw ordering inside a layer: program first, then texture, so state
    /// changes are batched.
    pub fn render_order(&self, other: &Self) -> Ordering {
        self.program_id
            .cmp(&other.program_id)
            .then(self.texture_id.cmp(&other.texture_id))
    }
}
