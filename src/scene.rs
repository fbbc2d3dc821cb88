//! Scene descriptors.
//!
//! Everything a [`Backend`](crate::backend::Backend) needs to build an object is
//! passed as one of the plain values below. Descriptors are immutable once
//! built: a mesh gets its whole [`Transform`] at construction time and keeps it
//! for the lifetime of the scene.

use std::fmt;

use cgmath::{Matrix4, Quaternion, Rad, Rotation3, Vector3};

/// Linear RGB colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    pub const WHITE: Color3 = Color3::new(1.0, 1.0, 1.0);
    pub const BLACK: Color3 = Color3::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Opaque 8-bit RGBA, as uploaded into a 1x1 texture.
    pub fn to_rgba8(self) -> [u8; 4] {
        let f_to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [f_to_u8(self.r), f_to_u8(self.g), f_to_u8(self.b), 255]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// One dimension of a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Extent {
    Percent(f32),
    Pixels(u32),
}

impl fmt::Display for Extent {
    /// CSS notation, e.g. `100%` or `640px`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Percent(p) => write!(f, "{p}%"),
            Extent::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// The drawing target the renderer writes pixels to.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceDesc {
    /// Element id in the browser, window title natively.
    pub id: String,
    pub width: Extent,
    pub height: Extent,
}

impl SurfaceDesc {
    /// A surface covering 100% of the viewport in both directions.
    pub fn full_viewport(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: Extent::Percent(100.0),
            height: Extent::Percent(100.0),
        }
    }

    pub fn is_full_viewport(&self) -> bool {
        self.width == Extent::Percent(100.0) && self.height == Extent::Percent(100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineDesc {
    pub antialias: bool,
}

impl Default for EngineDesc {
    fn default() -> Self {
        Self { antialias: true }
    }
}

/// Ambient light blended between a sky colour and a ground colour depending
/// on how much a surface faces `direction`.
#[derive(Clone, Debug, PartialEq)]
pub struct HemisphericLight {
    pub name: String,
    pub direction: Vector3<f32>,
    pub intensity: f32,
    pub diffuse: Color3,
    pub ground_color: Color3,
}

impl HemisphericLight {
    pub fn new(name: impl Into<String>, direction: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            direction,
            intensity: 1.0,
            diffuse: Color3::WHITE,
            ground_color: Color3::BLACK,
        }
    }
}

/// Position, Euler rotation (radians) and per-axis scaling of a mesh.
///
/// Built once through the `with_*` constructors and handed to the backend
/// together with the mesh. There are no setters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: Vector3<f32>,
    scaling: Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scaling: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_position(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..self
        }
    }

    pub fn with_rotation(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: Vector3::new(x, y, z),
            ..self
        }
    }

    pub fn with_scaling(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            scaling: Vector3::new(x, y, z),
            ..self
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn rotation(&self) -> Vector3<f32> {
        self.rotation
    }

    pub fn scaling(&self) -> Vector3<f32> {
        self.scaling
    }

    /// Yaw (y), then pitch (x), then roll (z); roll is applied to the mesh first.
    pub fn rotation_quaternion(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Rad(self.rotation.y))
            * Quaternion::from_angle_x(Rad(self.rotation.x))
            * Quaternion::from_angle_z(Rad(self.rotation.z))
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation_quaternion())
            * Matrix4::from_nonuniform_scale(self.scaling.x, self.scaling.y, self.scaling.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in mesh primitives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Flat plane on the XZ axes, centred at the origin.
    Ground { width: f32, height: f32 },
    /// Axis-aligned cube, centred at the origin.
    Box { size: f32 },
    /// Y-aligned cylinder; `tessellation` is the number of sides.
    Cylinder {
        diameter: f32,
        height: f32,
        tessellation: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshDesc {
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
}

impl MeshDesc {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            transform: Transform::new(),
        }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }
}

/// Where the bytes of an image texture come from.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// Absolute URL, fetched over HTTP(S).
    Remote(String),
    /// File name relative to the `assets` directory.
    Asset(String),
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Remote(url) => f.write_str(url),
            TextureSource::Asset(name) => write!(f, "assets/{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Diffuse {
    Color(Color3),
    Texture(TextureSource),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    pub diffuse: Diffuse,
}

impl MaterialDesc {
    pub fn flat(name: impl Into<String>, color: Color3) -> Self {
        Self {
            name: name.into(),
            diffuse: Diffuse::Color(color),
        }
    }

    pub fn textured(name: impl Into<String>, source: TextureSource) -> Self {
        Self {
            name: name.into(),
            diffuse: Diffuse::Texture(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::{InnerSpace, Vector4};

    use super::*;

    fn approx(a: Vector4<f32>, b: Vector4<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(t.rotation(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(t.scaling(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn with_constructors_keep_other_components() {
        let t = Transform::new()
            .with_scaling(0.75, 1.0, 1.0)
            .with_rotation(0.0, 0.0, FRAC_PI_2)
            .with_position(0.0, 1.22, 0.0);
        assert_eq!(t.scaling().x, 0.75);
        assert_eq!(t.rotation().z, FRAC_PI_2);
        assert_eq!(t.position().y, 1.22);
    }

    #[test]
    fn roll_turns_x_axis_into_y_axis() {
        let t = Transform::new().with_rotation(0.0, 0.0, FRAC_PI_2);
        let p = t.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(approx(p, Vector4::new(0.0, 1.0, 0.0, 1.0)), "{p:?}");
    }

    #[test]
    fn scale_is_applied_before_rotation_and_translation() {
        let t = Transform::new()
            .with_scaling(0.5, 1.0, 1.0)
            .with_rotation(0.0, 0.0, FRAC_PI_2)
            .with_position(0.0, 1.0, 0.0);
        let p = t.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(approx(p, Vector4::new(0.0, 1.5, 0.0, 1.0)), "{p:?}");
    }

    #[test]
    fn extent_renders_as_css() {
        assert_eq!(Extent::Percent(100.0).to_string(), "100%");
        assert_eq!(Extent::Pixels(640).to_string(), "640px");
        assert!(SurfaceDesc::full_viewport("gameCanvas").is_full_viewport());
    }

    #[test]
    fn color_to_rgba8_clamps() {
        assert_eq!(Color3::new(0.0, 1.0, 0.0).to_rgba8(), [0, 255, 0, 255]);
        assert_eq!(Color3::new(2.0, -1.0, 0.5).to_rgba8(), [255, 0, 128, 255]);
    }
}
