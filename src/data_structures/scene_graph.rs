//! Backend-independent record of what a scene contains.
//!
//! Both backends keep one [`SceneGraph`] per scene. It owns the descriptors of
//! every camera, light, material and mesh and hands out the scene-local
//! handles for them; a backend keeps its own per-object resources in vectors
//! indexed by the same handles.

use anyhow::{Context as _, anyhow};

use crate::{
    backend::{CameraId, EngineId, LightId, MaterialId, MeshId, SurfaceId},
    camera::OrbitCamera,
    scene::{HemisphericLight, MaterialDesc, MeshDesc},
};

#[derive(Clone, Debug)]
pub struct CameraNode {
    pub id: CameraId,
    pub camera: OrbitCamera,
    pub attached_to: Option<SurfaceId>,
}

#[derive(Clone, Debug)]
pub struct LightNode {
    pub id: LightId,
    pub light: HemisphericLight,
}

#[derive(Clone, Debug)]
pub struct MaterialNode {
    pub id: MaterialId,
    pub desc: MaterialDesc,
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub id: MeshId,
    pub desc: MeshDesc,
    pub material: MaterialId,
}

impl MeshNode {
    pub fn name(&self) -> &str {
        &self.desc.name
    }
}

#[derive(Clone, Debug)]
pub struct SceneGraph {
    engine: EngineId,
    cameras: Vec<CameraNode>,
    lights: Vec<LightNode>,
    materials: Vec<MaterialNode>,
    meshes: Vec<MeshNode>,
}

impl SceneGraph {
    pub fn new(engine: EngineId) -> Self {
        Self {
            engine,
            cameras: Vec::new(),
            lights: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }

    pub fn add_camera(&mut self, camera: OrbitCamera, attached_to: Option<SurfaceId>) -> CameraId {
        let id = CameraId::from_index(self.cameras.len());
        self.cameras.push(CameraNode {
            id,
            camera,
            attached_to,
        });
        id
    }

    pub fn add_light(&mut self, light: HemisphericLight) -> LightId {
        let id = LightId::from_index(self.lights.len());
        self.lights.push(LightNode { id, light });
        id
    }

    pub fn add_material(&mut self, desc: MaterialDesc) -> MaterialId {
        let id = MaterialId::from_index(self.materials.len());
        self.materials.push(MaterialNode { id, desc });
        id
    }

    /// Fails if `material` was not issued by this scene.
    pub fn add_mesh(&mut self, desc: MeshDesc, material: MaterialId) -> anyhow::Result<MeshId> {
        self.material(material)
            .with_context(|| format!("mesh {:?} references an unknown material", desc.name))?;
        let id = MeshId::from_index(self.meshes.len());
        self.meshes.push(MeshNode { id, desc, material });
        Ok(id)
    }

    pub fn cameras(&self) -> &[CameraNode] {
        &self.cameras
    }

    pub fn lights(&self) -> &[LightNode] {
        &self.lights
    }

    pub fn materials(&self) -> &[MaterialNode] {
        &self.materials
    }

    pub fn meshes(&self) -> &[MeshNode] {
        &self.meshes
    }

    /// The camera the scene is rendered through: the first one added.
    pub fn active_camera(&self) -> Option<&CameraNode> {
        self.cameras.first()
    }

    pub fn material(&self, id: MaterialId) -> anyhow::Result<&MaterialNode> {
        self.materials
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown material {id}"))
    }

    pub fn mesh_by_name(&self, name: &str) -> Option<&MeshNode> {
        self.meshes.iter().find(|m| m.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, Point3, Vector3};

    use super::*;
    use crate::scene::{Color3, Shape};

    fn graph() -> SceneGraph {
        SceneGraph::new(EngineId::from_index(0))
    }

    #[test]
    fn handles_are_issued_in_insertion_order() {
        let mut g = graph();
        let a = g.add_material(MaterialDesc::flat("a", Color3::WHITE));
        let b = g.add_material(MaterialDesc::flat("b", Color3::BLACK));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(g.material(b).unwrap().desc.name, "b");
    }

    #[test]
    fn mesh_with_foreign_material_is_rejected() {
        let mut g = graph();
        let desc = MeshDesc::new("box", Shape::Box { size: 1.0 });
        let err = g.add_mesh(desc, MaterialId::from_index(7)).unwrap_err();
        assert!(format!("{err:#}").contains("unknown material"));
        assert!(g.meshes().is_empty());
    }

    #[test]
    fn meshes_are_found_by_name() {
        let mut g = graph();
        let mat = g.add_material(MaterialDesc::flat("m", Color3::WHITE));
        g.add_mesh(MeshDesc::new("ground", Shape::Ground { width: 1.0, height: 1.0 }), mat)
            .unwrap();
        let roof = g
            .add_mesh(MeshDesc::new("roof", Shape::Box { size: 1.0 }), mat)
            .unwrap();
        assert_eq!(g.mesh_by_name("roof").map(|m| m.id), Some(roof));
        assert!(g.mesh_by_name("chimney").is_none());
    }

    #[test]
    fn first_camera_is_active() {
        let mut g = graph();
        assert!(g.active_camera().is_none());
        g.add_camera(OrbitCamera::new("a", 0.0, 1.0, 2.0, Point3::origin()), None);
        g.add_camera(OrbitCamera::new("b", 0.0, 1.0, 2.0, Point3::origin()), None);
        g.add_light(HemisphericLight::new("l", Vector3::new(0.0, 1.0, 0.0)));
        assert_eq!(g.active_camera().unwrap().camera.name, "a");
        assert_eq!(g.lights().len(), 1);
    }
}
