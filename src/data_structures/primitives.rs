//! CPU-side geometry for the built-in shapes.
//!
//! All triangles are counter-clockwise when seen from the side their normal
//! points to. Texture coordinates have `v = 0` at the top of the image.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

use crate::{data_structures::model::ModelVertex, scene::Shape};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn from_shape(shape: &Shape) -> Self {
        match *shape {
            Shape::Ground { width, height } => Self::ground(width, height),
            Shape::Box { size } => Self::cuboid(size),
            Shape::Cylinder {
                diameter,
                height,
                tessellation,
            } => Self::cylinder(diameter, height, tessellation),
        }
    }

    /// Plane on the XZ axes facing +Y.
    pub fn ground(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let mut geometry = Self::default();
        geometry.push_quad(
            [
                Vector3::new(-hw, 0.0, hh),
                Vector3::new(hw, 0.0, hh),
                Vector3::new(hw, 0.0, -hh),
                Vector3::new(-hw, 0.0, -hh),
            ],
            Vector3::unit_y(),
            [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        );
        geometry
    }

    /// Cube with one quad (and normal) per face.
    pub fn cuboid(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, u axis, v axis) with u x v == normal
        let faces = [
            (Vector3::unit_x(), -Vector3::unit_z(), Vector3::unit_y()),
            (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
            (Vector3::unit_y(), Vector3::unit_x(), -Vector3::unit_z()),
            (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
            (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
            (-Vector3::unit_z(), -Vector3::unit_x(), Vector3::unit_y()),
        ];
        let mut geometry = Self::default();
        for (n, u, v) in faces {
            let c = n * h;
            geometry.push_quad(
                [
                    c - u * h - v * h,
                    c + u * h - v * h,
                    c + u * h + v * h,
                    c - u * h + v * h,
                ],
                n,
                [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            );
        }
        geometry
    }

    /// Y-aligned cylinder with flat-shaded sides and two caps.
    ///
    /// The first side vertex sits on +X; fewer than three sides are raised to three.
    pub fn cylinder(diameter: f32, height: f32, tessellation: u32) -> Self {
        let n = tessellation.max(3);
        let r = diameter / 2.0;
        let hh = height / 2.0;
        let angle = |i: u32| -(i as f32) * TAU / n as f32;
        let ring = |i: u32, y: f32| {
            let (sin, cos) = angle(i).sin_cos();
            Vector3::new(r * cos, y, r * sin)
        };

        let mut geometry = Self::default();
        for i in 0..n {
            let (u0, u1) = (i as f32 / n as f32, (i + 1) as f32 / n as f32);
            let (sin, cos) = ((angle(i) + angle(i + 1)) / 2.0).sin_cos();
            geometry.push_quad(
                [ring(i, -hh), ring(i + 1, -hh), ring(i + 1, hh), ring(i, hh)],
                Vector3::new(cos, 0.0, sin),
                [[u0, 1.0], [u1, 1.0], [u1, 0.0], [u0, 0.0]],
            );
        }

        for (y, normal) in [(hh, Vector3::unit_y()), (-hh, -Vector3::unit_y())] {
            let centre = geometry.vertices.len() as u32;
            geometry.push_vertex(Vector3::new(0.0, y, 0.0), normal, [0.5, 0.5]);
            for i in 0..n {
                let (sin, cos) = angle(i).sin_cos();
                geometry.push_vertex(ring(i, y), normal, [0.5 + cos / 2.0, 0.5 - sin / 2.0]);
            }
            for i in 0..n {
                let a = centre + 1 + i;
                let b = centre + 1 + (i + 1) % n;
                if normal.y > 0.0 {
                    geometry.indices.extend_from_slice(&[centre, a, b]);
                } else {
                    geometry.indices.extend_from_slice(&[centre, b, a]);
                }
            }
        }
        geometry
    }

    fn push_vertex(&mut self, position: Vector3<f32>, normal: Vector3<f32>, tex_coords: [f32; 2]) {
        self.vertices.push(ModelVertex {
            position: position.into(),
            tex_coords,
            normal: normal.normalize().into(),
        });
    }

    /// Corners in counter-clockwise order around `normal`.
    fn push_quad(&mut self, corners: [Vector3<f32>; 4], normal: Vector3<f32>, uvs: [[f32; 2]; 4]) {
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.push_vertex(corner, normal, uv);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
