//! A [`Backend`] that draws nothing.
//!
//! It keeps the surfaces, engines and scenes it was asked to create in memory
//! and counts how often each scene was rendered. Used by the tests and by hosts
//! without a GPU.

use anyhow::{anyhow, bail};

use crate::{
    backend::{Backend, CameraId, EngineId, LightId, MaterialId, MeshId, SceneId, SurfaceId},
    camera::OrbitCamera,
    data_structures::scene_graph::SceneGraph,
    inspector::{Inspector, InspectorReport},
    render_loop::RenderLoop,
    scene::{EngineDesc, HemisphericLight, MaterialDesc, MeshDesc, SurfaceDesc},
};

#[derive(Debug)]
struct HeadlessEngine {
    desc: EngineDesc,
    render_loop: RenderLoop,
}

#[derive(Debug)]
struct HeadlessScene {
    graph: SceneGraph,
    inspector: Inspector,
    renders: u64,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    /// Stand-in for the host document: every surface ever created, in order.
    surfaces: Vec<SurfaceDesc>,
    engines: Vec<HeadlessEngine>,
    scenes: Vec<HeadlessScene>,
    can_render: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
            engines: Vec::new(),
            scenes: Vec::new(),
            can_render: true,
        }
    }

    /// A host whose engine initialisation always fails, like a browser without WebGL.
    pub fn without_rendering_support() -> Self {
        Self {
            can_render: false,
            ..Self::new()
        }
    }

    pub fn surfaces(&self) -> &[SurfaceDesc] {
        &self.surfaces
    }

    /// Number of surfaces carrying `id`. Ids are not deduplicated.
    pub fn surfaces_with_id(&self, id: &str) -> usize {
        self.surfaces.iter().filter(|s| s.id == id).count()
    }

    pub fn surface(&self, id: SurfaceId) -> anyhow::Result<&SurfaceDesc> {
        self.surfaces
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown surface {id}"))
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn engine_desc(&self, id: EngineId) -> anyhow::Result<EngineDesc> {
        Ok(self.engine(id)?.desc)
    }

    pub fn render_loop(&self, id: EngineId) -> anyhow::Result<&RenderLoop> {
        Ok(&self.engine(id)?.render_loop)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn graph(&self, id: SceneId) -> anyhow::Result<&SceneGraph> {
        Ok(&self.scene(id)?.graph)
    }

    /// How many times `id` was drawn by a render tick.
    pub fn render_count(&self, id: SceneId) -> anyhow::Result<u64> {
        Ok(self.scene(id)?.renders)
    }

    pub fn inspector_report(&self, id: SceneId) -> anyhow::Result<InspectorReport> {
        Ok(InspectorReport::from_graph(self.graph(id)?))
    }

    fn engine(&self, id: EngineId) -> anyhow::Result<&HeadlessEngine> {
        self.engines
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown engine {id}"))
    }

    fn engine_mut(&mut self, id: EngineId) -> anyhow::Result<&mut HeadlessEngine> {
        self.engines
            .get_mut(id.index())
            .ok_or_else(|| anyhow!("unknown engine {id}"))
    }

    fn scene(&self, id: SceneId) -> anyhow::Result<&HeadlessScene> {
        self.scenes
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown scene {id}"))
    }

    fn scene_mut(&mut self, id: SceneId) -> anyhow::Result<&mut HeadlessScene> {
        self.scenes
            .get_mut(id.index())
            .ok_or_else(|| anyhow!("unknown scene {id}"))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    fn create_surface(&mut self, desc: &SurfaceDesc) -> anyhow::Result<SurfaceId> {
        let id = SurfaceId::from_index(self.surfaces.len());
        self.surfaces.push(desc.clone());
        Ok(id)
    }

    fn create_engine(&mut self, surface: SurfaceId, desc: &EngineDesc) -> anyhow::Result<EngineId> {
        self.surface(surface)?;
        if !self.can_render {
            bail!("no rendering context available for {surface}");
        }
        let id = EngineId::from_index(self.engines.len());
        self.engines.push(HeadlessEngine {
            desc: *desc,
            render_loop: RenderLoop::new(),
        });
        Ok(id)
    }

    fn create_scene(&mut self, engine: EngineId) -> anyhow::Result<SceneId> {
        self.engine(engine)?;
        let id = SceneId::from_index(self.scenes.len());
        self.scenes.push(HeadlessScene {
            graph: SceneGraph::new(engine),
            inspector: Inspector::new(),
            renders: 0,
        });
        Ok(id)
    }

    fn create_camera(
        &mut self,
        scene: SceneId,
        camera: &OrbitCamera,
        attach_to: Option<SurfaceId>,
    ) -> anyhow::Result<CameraId> {
        if let Some(surface) = attach_to {
            self.surface(surface)?;
        }
        Ok(self
            .scene_mut(scene)?
            .graph
            .add_camera(camera.clone(), attach_to))
    }

    fn create_light(&mut self, scene: SceneId, light: &HemisphericLight) -> anyhow::Result<LightId> {
        Ok(self.scene_mut(scene)?.graph.add_light(light.clone()))
    }

    fn create_material(&mut self, scene: SceneId, desc: &MaterialDesc) -> anyhow::Result<MaterialId> {
        Ok(self.scene_mut(scene)?.graph.add_material(desc.clone()))
    }

    fn create_mesh(
        &mut self,
        scene: SceneId,
        desc: &MeshDesc,
        material: MaterialId,
    ) -> anyhow::Result<MeshId> {
        self.scene_mut(scene)?.graph.add_mesh(desc.clone(), material)
    }

    fn run_render_loop(&mut self, engine: EngineId, scene: SceneId) -> anyhow::Result<()> {
        let owner = self.graph(scene)?.engine();
        if owner != engine {
            bail!("{scene} belongs to {owner}, not {engine}");
        }
        self.engine_mut(engine)?.render_loop.register(scene);
        Ok(())
    }

    fn stop_render_loop(&mut self, engine: EngineId) -> anyhow::Result<()> {
        self.engine_mut(engine)?.render_loop.stop();
        Ok(())
    }

    fn tick(&mut self, engine: EngineId) -> anyhow::Result<usize> {
        let scenes = &mut self.scenes;
        let engine = self
            .engines
            .get_mut(engine.index())
            .ok_or_else(|| anyhow!("unknown engine {engine}"))?;
        engine.render_loop.tick(|id| {
            let scene = scenes
                .get_mut(id.index())
                .ok_or_else(|| anyhow!("unknown scene {id}"))?;
            scene.renders += 1;
            Ok(())
        })
    }

    fn toggle_inspector(&mut self, scene: SceneId) -> anyhow::Result<bool> {
        let scene = self.scene_mut(scene)?;
        let visible = scene.inspector.toggle();
        if visible {
            log::debug!("{}", InspectorReport::from_graph(&scene.graph));
        }
        Ok(visible)
    }

    fn is_inspector_visible(&self, scene: SceneId) -> anyhow::Result<bool> {
        Ok(self.scene(scene)?.inspector.is_visible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handles_are_errors() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_scene(EngineId::from_index(0)).is_err());
        assert!(backend.tick(EngineId::from_index(3)).is_err());
        assert!(backend.toggle_inspector(SceneId::from_index(0)).is_err());
    }

    #[test]
    fn scenes_only_run_on_their_own_engine() {
        let mut backend = HeadlessBackend::new();
        let s = backend.create_surface(&SurfaceDesc::full_viewport("a")).unwrap();
        let e1 = backend.create_engine(s, &EngineDesc::default()).unwrap();
        let e2 = backend.create_engine(s, &EngineDesc::default()).unwrap();
        let scene = backend.create_scene(e1).unwrap();
        assert!(backend.run_render_loop(e2, scene).is_err());
        backend.run_render_loop(e1, scene).unwrap();
        assert_eq!(backend.tick(e1).unwrap(), 1);
        assert_eq!(backend.tick(e2).unwrap(), 0);
        assert_eq!(backend.render_count(scene).unwrap(), 1);
    }

    #[test]
    fn engine_fails_without_rendering_support() {
        let mut backend = HeadlessBackend::without_rendering_support();
        let s = backend.create_surface(&SurfaceDesc::full_viewport("a")).unwrap();
        let err = backend.create_engine(s, &EngineDesc::default()).unwrap_err();
        assert!(err.to_string().contains("no rendering context"));
        assert_eq!(backend.engine_count(), 0);
    }
}
