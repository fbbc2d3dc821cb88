//! Typed configuration of the demo scene.
//!
//! [`AppConfig::default`] is the house scene. There is no config file; the only
//! environment knob is `RUST_LOG` for native logging.

use std::f32::consts::FRAC_PI_2;

use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::{
    camera::OrbitCamera,
    input::KeyCombo,
    scene::{
        Color3, Diffuse, EngineDesc, HemisphericLight, MaterialDesc, MeshDesc, Shape, SurfaceDesc,
        TextureSource, Transform,
    },
};

pub const CANVAS_ID: &str = "gameCanvas";
pub const FLOOR_TEXTURE_URL: &str = "https://www.babylonjs-playground.com/textures/floor.png";
pub const ROOF_TEXTURE_URL: &str = "https://assets.babylonjs.com/environments/roof.jpg";

/// A mesh together with the material it is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSpec {
    pub mesh: MeshDesc,
    pub material: MaterialDesc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub surface: SurfaceDesc,
    pub engine: EngineDesc,
    pub camera: OrbitCamera,
    pub light: HemisphericLight,
    pub clear_colour: wgpu::Color,
    pub inspector_hotkey: KeyCombo,
    pub meshes: Vec<MeshSpec>,
}

impl AppConfig {
    /// Green 10x10 ground.
    pub fn ground() -> MeshSpec {
        MeshSpec {
            mesh: MeshDesc::new(
                "ground",
                Shape::Ground {
                    width: 10.0,
                    height: 10.0,
                },
            ),
            material: MaterialDesc::flat("groundMaterial", Color3::new(0.0, 1.0, 0.0)),
        }
    }

    /// Unit cube resting on the ground.
    pub fn house_box() -> MeshSpec {
        MeshSpec {
            mesh: MeshDesc::new("box", Shape::Box { size: 1.0 })
                .with_transform(Transform::new().with_position(0.0, 0.5, 0.0)),
            material: MaterialDesc::textured(
                "boxMaterial",
                TextureSource::Remote(FLOOR_TEXTURE_URL.to_string()),
            ),
        }
    }

    /// Triangular prism lying on its side on top of the box.
    pub fn roof() -> MeshSpec {
        MeshSpec {
            mesh: MeshDesc::new(
                "roof",
                Shape::Cylinder {
                    diameter: 1.3,
                    height: 1.2,
                    tessellation: 3,
                },
            )
            .with_transform(
                Transform::new()
                    .with_scaling(0.75, 1.0, 1.0)
                    .with_rotation(0.0, 0.0, FRAC_PI_2)
                    .with_position(0.0, 1.22, 0.0),
            ),
            material: MaterialDesc::textured(
                "roofMaterial",
                TextureSource::Remote(ROOF_TEXTURE_URL.to_string()),
            ),
        }
    }

    /// Same scene with the textures read from the local `assets` directory.
    pub fn with_local_textures(mut self) -> Self {
        for spec in &mut self.meshes {
            if let Diffuse::Texture(TextureSource::Remote(url)) = &spec.material.diffuse {
                let file = url.rsplit('/').next().unwrap_or(url).to_string();
                spec.material.diffuse = Diffuse::Texture(TextureSource::Asset(file));
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceDesc::full_viewport(CANVAS_ID),
            engine: EngineDesc { antialias: true },
            camera: OrbitCamera::new("Camera", FRAC_PI_2, FRAC_PI_2, 2.0, Point3::origin()),
            light: HemisphericLight::new("light1", Vector3::new(1.0, 1.0, 0.0)),
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
            inspector_hotkey: KeyCombo::INSPECTOR,
            meshes: vec![Self::ground(), Self::house_box(), Self::roof()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_house_scene() {
        let config = AppConfig::default();
        assert_eq!(config.surface.id, "gameCanvas");
        assert!(config.surface.is_full_viewport());
        assert!(config.engine.antialias);
        assert_eq!(config.light.name, "light1");
        let names: Vec<_> = config.meshes.iter().map(|m| m.mesh.name.as_str()).collect();
        assert_eq!(names, ["ground", "box", "roof"]);
    }

    #[test]
    fn roof_is_a_three_sided_cylinder() {
        let roof = AppConfig::roof();
        assert_eq!(
            roof.mesh.shape,
            Shape::Cylinder {
                diameter: 1.3,
                height: 1.2,
                tessellation: 3
            }
        );
        assert_eq!(roof.mesh.transform.scaling().x, 0.75);
        assert_eq!(roof.mesh.transform.rotation().z, FRAC_PI_2);
        assert_eq!(roof.mesh.transform.position().y, 1.22);
    }

    #[test]
    fn local_textures_keep_the_file_names() {
        let config = AppConfig::default().with_local_textures();
        let sources: Vec<_> = config
            .meshes
            .iter()
            .filter_map(|m| match &m.material.diffuse {
                Diffuse::Texture(src) => Some(src.clone()),
                Diffuse::Color(_) => None,
            })
            .collect();
        assert_eq!(
            sources,
            [
                TextureSource::Asset("floor.png".into()),
                TextureSource::Asset("roof.jpg".into())
            ]
        );
    }
}
