//! Scene inspector: a visibility flag plus a read-only report of the scene.
//!
//! How the report is shown is up to the backend; the wgpu backend uses a DOM
//! overlay in the browser and the log natively.

use std::fmt;

use cgmath::Vector3;

use crate::{
    data_structures::scene_graph::SceneGraph,
    scene::{Diffuse, Shape},
};

/// Whether the inspector overlay is shown. Starts hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inspector {
    visible: bool,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the visibility after toggling.
    pub fn toggle(&mut self) -> bool {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
        self.visible
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshInfo {
    pub name: String,
    pub shape: Shape,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scaling: [f32; 3],
    pub material: String,
}

/// Snapshot of a scene for display.
#[derive(Clone, Debug, PartialEq)]
pub struct InspectorReport {
    pub cameras: Vec<String>,
    pub lights: Vec<String>,
    pub meshes: Vec<MeshInfo>,
}

impl InspectorReport {
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let cameras = graph
            .cameras()
            .iter()
            .map(|node| {
                let c = &node.camera;
                format!(
                    "{} alpha={:.2} beta={:.2} radius={:.2} target=({:.2}, {:.2}, {:.2}){}",
                    c.name,
                    c.alpha,
                    c.beta,
                    c.radius,
                    c.target.x,
                    c.target.y,
                    c.target.z,
                    if node.attached_to.is_some() { " [controls]" } else { "" }
                )
            })
            .collect();

        let lights = graph
            .lights()
            .iter()
            .map(|node| {
                let l = &node.light;
                format!(
                    "{} direction={} intensity={:.2}",
                    l.name,
                    fmt_vec(l.direction),
                    l.intensity
                )
            })
            .collect();

        let meshes = graph
            .meshes()
            .iter()
            .map(|node| {
                let t = &node.desc.transform;
                let material = graph
                    .material(node.material)
                    .map(|m| match &m.desc.diffuse {
                        Diffuse::Color(c) => {
                            format!("{} (color {:.2}, {:.2}, {:.2})", m.desc.name, c.r, c.g, c.b)
                        }
                        Diffuse::Texture(src) => format!("{} (texture {src})", m.desc.name),
                    })
                    .unwrap_or_else(|_| "?".to_string());
                MeshInfo {
                    name: node.desc.name.clone(),
                    shape: node.desc.shape,
                    position: t.position().into(),
                    rotation: t.rotation().into(),
                    scaling: t.scaling().into(),
                    material,
                }
            })
            .collect();

        Self {
            cameras,
            lights,
            meshes,
        }
    }
}

fn fmt_vec(v: Vector3<f32>) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

impl fmt::Display for InspectorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scene: {} camera(s), {} light(s), {} mesh(es)",
            self.cameras.len(),
            self.lights.len(),
            self.meshes.len()
        )?;
        for camera in &self.cameras {
            writeln!(f, "  camera {camera}")?;
        }
        for light in &self.lights {
            writeln!(f, "  light {light}")?;
        }
        for mesh in &self.meshes {
            writeln!(
                f,
                "  mesh {} pos={} rot={} scale={} material={}",
                mesh.name,
                fmt_vec(mesh.position.into()),
                fmt_vec(mesh.rotation.into()),
                fmt_vec(mesh.scaling.into()),
                mesh.material
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, Point3};

    use super::*;
    use crate::{
        backend::EngineId,
        camera::OrbitCamera,
        scene::{Color3, HemisphericLight, MaterialDesc, MeshDesc, TextureSource, Transform},
    };

    #[test]
    fn starts_hidden_and_toggles_back_and_forth() {
        let mut inspector = Inspector::new();
        assert!(!inspector.is_visible());
        assert!(inspector.toggle());
        assert!(!inspector.toggle());
        assert!(!inspector.is_visible());
    }

    #[test]
    fn show_and_hide_are_idempotent() {
        let mut inspector = Inspector::new();
        inspector.show();
        inspector.show();
        assert!(inspector.is_visible());
        inspector.hide();
        inspector.hide();
        assert!(!inspector.is_visible());
    }

    #[test]
    fn report_lists_every_object() {
        let mut graph = SceneGraph::new(EngineId::from_index(0));
        graph.add_camera(OrbitCamera::new("Camera", 1.0, 1.0, 2.0, Point3::origin()), None);
        graph.add_light(HemisphericLight::new("light1", Vector3::new(1.0, 1.0, 0.0)));
        let green = graph.add_material(MaterialDesc::flat("groundMaterial", Color3::new(0.0, 1.0, 0.0)));
        let tex = graph.add_material(MaterialDesc::textured(
            "boxMaterial",
            TextureSource::Remote("https://example.com/floor.png".into()),
        ));
        graph
            .add_mesh(MeshDesc::new("ground", Shape::Ground { width: 10.0, height: 10.0 }), green)
            .unwrap();
        graph
            .add_mesh(
                MeshDesc::new("box", Shape::Box { size: 1.0 })
                    .with_transform(Transform::new().with_position(0.0, 0.5, 0.0)),
                tex,
            )
            .unwrap();

        let report = InspectorReport::from_graph(&graph);
        assert_eq!(report.meshes.len(), 2);
        assert_eq!(report.meshes[1].position, [0.0, 0.5, 0.0]);
        assert!(report.meshes[1].material.contains("floor.png"));

        let text = report.to_string();
        assert!(text.starts_with("Scene: 1 camera(s), 1 light(s), 2 mesh(es)"));
        assert!(text.contains("light light1 direction=(1.00, 1.00, 0.00)"));
        assert!(text.contains("mesh ground"));
    }
}
