//! The wgpu [`Backend`].
//!
//! [`GpuState`] owns every window, GPU context and scene for the lifetime of
//! the event loop. Creating windows needs the [`ActiveEventLoop`], so the
//! backend itself is a short-lived [`WgpuBackend`] view that pairs the state
//! with the event loop of the callback it is used in.

use std::sync::Arc;

use anyhow::{Context as _, anyhow, bail};
use cgmath::Rad;
use winit::{
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    backend::{Backend, CameraId, EngineId, LightId, MaterialId, MeshId, SceneId, SurfaceId},
    camera::{CameraResources, OrbitCamera, Projection},
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, Material, Mesh},
        primitives::Geometry,
        scene_graph::SceneGraph,
        texture::Texture,
    },
    flow::FlowEvent,
    inspector::{Inspector, InspectorReport},
    pipelines::light::LightResources,
    render_loop::RenderLoop,
    resources::{loaded_image, spawn_texture_load},
    scene::{
        Color3, Diffuse, EngineDesc, HemisphericLight, MaterialDesc, MeshDesc, SurfaceDesc,
    },
};

pub const FIELD_OF_VIEW: Rad<f32> = Rad(0.8);
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;

#[derive(Debug)]
struct GpuSurface {
    desc: SurfaceDesc,
    window: Arc<Window>,
}

struct GpuEngine {
    surface: SurfaceId,
    ctx: Context,
    projection: Projection,
    render_loop: RenderLoop,
}

#[derive(Debug)]
struct GpuMesh {
    mesh: Mesh,
    material: MaterialId,
    instance_buffer: wgpu::Buffer,
}

struct GpuScene {
    graph: SceneGraph,
    inspector: Inspector,
    /// Parallel to `graph.cameras()`; the first one is rendered through.
    cameras: Vec<CameraResources>,
    /// Only the first light of a scene is used by the shader.
    light: Option<LightResources>,
    /// Parallel to `graph.materials()`.
    materials: Vec<Material>,
    /// Parallel to `graph.meshes()`.
    meshes: Vec<GpuMesh>,
}

impl GpuScene {
    fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        for camera in &mut self.cameras {
            camera.update(queue, projection);
        }
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> anyhow::Result<()> {
        let camera = self
            .graph
            .active_camera()
            .and_then(|node| self.cameras.get(node.id.index()));
        let (Some(camera), Some(light)) = (camera, &self.light) else {
            // Nothing can be seen without a camera and a light.
            return Ok(());
        };
        for mesh in &self.meshes {
            let material = self
                .materials
                .get(mesh.material.index())
                .ok_or_else(|| anyhow!("{} has no material {}", mesh.mesh.name, mesh.material))?;
            render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
            render_pass.draw_mesh_instanced(
                &mesh.mesh,
                material,
                0..1,
                &camera.bind_group,
                &light.bind_group,
            );
        }
        Ok(())
    }
}

/// Everything the wgpu backend has created so far.
pub struct GpuState {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    clear_colour: wgpu::Color,
    surfaces: Vec<GpuSurface>,
    engines: Vec<GpuEngine>,
    scenes: Vec<GpuScene>,
}

impl GpuState {
    pub fn new(proxy: EventLoopProxy<FlowEvent>, clear_colour: wgpu::Color) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()
                .context("Cannot start the async runtime")?,
            proxy,
            clear_colour,
            surfaces: Vec::new(),
            engines: Vec::new(),
            scenes: Vec::new(),
        })
    }

    /// A backend view usable for the duration of one event-loop callback.
    pub fn backend<'a>(&'a mut self, event_loop: &'a ActiveEventLoop) -> WgpuBackend<'a> {
        WgpuBackend {
            event_loop,
            state: self,
        }
    }

    fn surface_of_window(&self, window_id: WindowId) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .position(|s| s.window.id() == window_id)
            .map(SurfaceId::from_index)
    }

    /// Feeds pointer and keyboard input to the cameras attached to the window.
    pub fn handle_window_event(&mut self, window_id: WindowId, event: &WindowEvent) {
        let Some(surface) = self.surface_of_window(window_id) else {
            return;
        };
        for scene in &mut self.scenes {
            for (node, resources) in scene.graph.cameras().iter().zip(&mut scene.cameras) {
                if node.attached_to != Some(surface) {
                    continue;
                }
                if let Some(controller) = &mut resources.controller {
                    controller.handle_window_events(event);
                }
            }
        }
    }

    pub fn resize(&mut self, window_id: WindowId, width: u32, height: u32) {
        let Some(surface) = self.surface_of_window(window_id) else {
            return;
        };
        for engine in self.engines.iter_mut().filter(|e| e.surface == surface) {
            engine.ctx.resize(width, height);
            engine.projection.resize(width, height);
        }
    }

    pub fn request_redraw(&self) {
        for surface in &self.surfaces {
            surface.window.request_redraw();
        }
    }

    /// Swaps the placeholder of `material` for the loaded image. Load failures
    /// are logged and the placeholder stays.
    pub fn apply_texture(
        &mut self,
        scene: SceneId,
        material: MaterialId,
        image: anyhow::Result<image::DynamicImage>,
    ) -> anyhow::Result<()> {
        let gpu_scene = self
            .scenes
            .get_mut(scene.index())
            .ok_or_else(|| anyhow!("unknown scene {scene}"))?;
        let name = gpu_scene.graph.material(material)?.desc.name.clone();
        let Some(image) = loaded_image(&name, image) else {
            return Ok(());
        };
        let engine = self
            .engines
            .get(gpu_scene.graph.engine().index())
            .ok_or_else(|| anyhow!("{scene} lost its engine"))?;
        let ctx = &engine.ctx;
        let texture = Texture::from_image(&ctx.device, &ctx.queue, &image, Some(&name));
        gpu_scene
            .materials
            .get_mut(material.index())
            .ok_or_else(|| anyhow!("unknown material {material}"))?
            .set_diffuse_texture(&ctx.device, texture, &ctx.layouts.texture);
        log::info!("{name}: {}x{} texture applied", image.width(), image.height());
        Ok(())
    }

    fn present_inspector(&self, scene: SceneId, visible: bool) -> anyhow::Result<()> {
        let gpu_scene = self
            .scenes
            .get(scene.index())
            .ok_or_else(|| anyhow!("unknown scene {scene}"))?;
        let report = InspectorReport::from_graph(&gpu_scene.graph);

        #[cfg(target_arch = "wasm32")]
        {
            if visible {
                crate::dom::show_inspector(&report.to_string())
            } else {
                crate::dom::hide_inspector()
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let engine = self
                .engines
                .get(gpu_scene.graph.engine().index())
                .ok_or_else(|| anyhow!("{scene} lost its engine"))?;
            let surface = self
                .surfaces
                .get(engine.surface.index())
                .ok_or_else(|| anyhow!("unknown surface {}", engine.surface))?;
            if visible {
                log::info!("\n{report}");
                surface
                    .window
                    .set_title(&format!("{} [inspector]", surface.desc.id));
            } else {
                surface.window.set_title(&surface.desc.id);
            }
            Ok(())
        }
    }

    fn engine(&self, id: EngineId) -> anyhow::Result<&GpuEngine> {
        self.engines
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown engine {id}"))
    }

    fn engine_mut(&mut self, id: EngineId) -> anyhow::Result<&mut GpuEngine> {
        self.engines
            .get_mut(id.index())
            .ok_or_else(|| anyhow!("unknown engine {id}"))
    }

    fn scene(&self, id: SceneId) -> anyhow::Result<&GpuScene> {
        self.scenes
            .get(id.index())
            .ok_or_else(|| anyhow!("unknown scene {id}"))
    }

    /// The scene together with the engine it was created on.
    fn scene_and_engine(&mut self, id: SceneId) -> anyhow::Result<(&mut GpuScene, &GpuEngine)> {
        let scene = self
            .scenes
            .get_mut(id.index())
            .ok_or_else(|| anyhow!("unknown scene {id}"))?;
        let engine = self
            .engines
            .get(scene.graph.engine().index())
            .ok_or_else(|| anyhow!("{id} lost its engine"))?;
        Ok((scene, engine))
    }
}

pub struct WgpuBackend<'a> {
    event_loop: &'a ActiveEventLoop,
    state: &'a mut GpuState,
}

impl Backend for WgpuBackend<'_> {
    fn create_surface(&mut self, desc: &SurfaceDesc) -> anyhow::Result<SurfaceId> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(desc.id.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            use crate::scene::Extent;
            window_attributes = match (desc.width, desc.height) {
                (Extent::Pixels(w), Extent::Pixels(h)) => {
                    window_attributes.with_inner_size(winit::dpi::LogicalSize::new(w, h))
                }
                _ => window_attributes.with_maximized(desc.is_full_viewport()),
            };
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = crate::dom::create_canvas(desc)?;
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = self
            .event_loop
            .create_window(window_attributes)
            .with_context(|| format!("Cannot open a window for {:?}", desc.id))?;
        let id = SurfaceId::from_index(self.state.surfaces.len());
        self.state.surfaces.push(GpuSurface {
            desc: desc.clone(),
            window: Arc::new(window),
        });
        Ok(id)
    }

    fn create_engine(&mut self, surface: SurfaceId, desc: &EngineDesc) -> anyhow::Result<EngineId> {
        let window = self
            .state
            .surfaces
            .get(surface.index())
            .ok_or_else(|| anyhow!("unknown surface {surface}"))?
            .window
            .clone();

        let init = Context::new(window, desc);
        #[cfg(not(target_arch = "wasm32"))]
        let mut ctx = self.state.async_runtime.block_on(init)?;
        // Only valid with the WebGL backend, whose adapter and device requests
        // are ready on first poll. A WebGPU backend needs a spawned task instead.
        #[cfg(target_arch = "wasm32")]
        let mut ctx = futures::executor::block_on(init)?;

        ctx.clear_colour = self.state.clear_colour;
        let projection = Projection::new(ctx.config.width, ctx.config.height, FIELD_OF_VIEW, Z_NEAR, Z_FAR);
        log::info!(
            "engine on {surface}: {}x{}, {:?}, {} sample(s)",
            ctx.config.width,
            ctx.config.height,
            ctx.config.format,
            ctx.sample_count
        );

        let id = EngineId::from_index(self.state.engines.len());
        self.state.engines.push(GpuEngine {
            surface,
            ctx,
            projection,
            render_loop: RenderLoop::new(),
        });
        Ok(id)
    }

    fn create_scene(&mut self, engine: EngineId) -> anyhow::Result<SceneId> {
        self.state.engine(engine)?;
        let id = SceneId::from_index(self.state.scenes.len());
        self.state.scenes.push(GpuScene {
            graph: SceneGraph::new(engine),
            inspector: Inspector::new(),
            cameras: Vec::new(),
            light: None,
            materials: Vec::new(),
            meshes: Vec::new(),
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
            if surface.index() >= self.state.surfaces.len() {
                bail!("unknown surface {surface}");
            }
        }
        let (gpu_scene, engine) = self.state.scene_and_engine(scene)?;
        let resources = CameraResources::new(
            &engine.ctx.device,
            &engine.ctx.layouts.camera,
            camera.clone(),
            &engine.projection,
            attach_to.is_some(),
        );
        gpu_scene.cameras.push(resources);
        Ok(gpu_scene.graph.add_camera(camera.clone(), attach_to))
    }

    fn create_light(&mut self, scene: SceneId, light: &HemisphericLight) -> anyhow::Result<LightId> {
        let (gpu_scene, engine) = self.state.scene_and_engine(scene)?;
        if gpu_scene.light.is_some() {
            log::warn!("{scene} already has a light, {:?} will not be shaded", light.name);
        } else {
            gpu_scene.light = Some(LightResources::new(
                &engine.ctx.device,
                &engine.ctx.layouts.light,
                light,
            ));
        }
        Ok(gpu_scene.graph.add_light(light.clone()))
    }

    fn create_material(&mut self, scene: SceneId, desc: &MaterialDesc) -> anyhow::Result<MaterialId> {
        let (gpu_scene, engine) = self.state.scene_and_engine(scene)?;
        let ctx = &engine.ctx;
        let colour = match &desc.diffuse {
            Diffuse::Color(colour) => *colour,
            Diffuse::Texture(_) => Color3::WHITE,
        };
        let texture = Texture::solid(&ctx.device, &ctx.queue, colour, &desc.name);
        gpu_scene.materials.push(Material::new(
            &ctx.device,
            &desc.name,
            texture,
            &ctx.layouts.texture,
        ));
        let id = gpu_scene.graph.add_material(desc.clone());

        if let Diffuse::Texture(source) = &desc.diffuse {
            spawn_texture_load(
                #[cfg(not(target_arch = "wasm32"))]
                self.state.async_runtime.handle(),
                self.state.proxy.clone(),
                scene,
                id,
                source.clone(),
            );
        }
        Ok(id)
    }

    fn create_mesh(
        &mut self,
        scene: SceneId,
        desc: &MeshDesc,
        material: MaterialId,
    ) -> anyhow::Result<MeshId> {
        let (gpu_scene, engine) = self.state.scene_and_engine(scene)?;
        let id = gpu_scene.graph.add_mesh(desc.clone(), material)?;
        let device = &engine.ctx.device;
        let geometry = Geometry::from_shape(&desc.shape);
        gpu_scene.meshes.push(GpuMesh {
            mesh: Mesh::from_geometry(device, &desc.name, &geometry),
            material,
            instance_buffer: InstanceRaw::from_transform(&desc.transform)
                .mk_buffer(device, &format!("{} Instance Buffer", desc.name)),
        });
        log::debug!(
            "{}: {} triangles",
            desc.name,
            geometry.triangle_count()
        );
        Ok(id)
    }

    fn run_render_loop(&mut self, engine: EngineId, scene: SceneId) -> anyhow::Result<()> {
        let owner = self.state.scene(scene)?.graph.engine();
        if owner != engine {
            bail!("{scene} belongs to {owner}, not {engine}");
        }
        self.state.engine_mut(engine)?.render_loop.register(scene);
        if let Some(surface) = self.state.surfaces.get(self.state.engine(engine)?.surface.index()) {
            surface.window.request_redraw();
        }
        Ok(())
    }

    fn stop_render_loop(&mut self, engine: EngineId) -> anyhow::Result<()> {
        self.state.engine_mut(engine)?.render_loop.stop();
        Ok(())
    }

    fn tick(&mut self, engine: EngineId) -> anyhow::Result<usize> {
        let state = &mut *self.state;
        let GpuEngine {
            ctx,
            projection,
            render_loop,
            ..
        } = state
            .engines
            .get_mut(engine.index())
            .ok_or_else(|| anyhow!("unknown engine {engine}"))?;
        if !render_loop.is_running() {
            return Ok(0);
        }

        for id in render_loop.scenes() {
            if let Some(scene) = state.scenes.get_mut(id.index()) {
                scene.update(&ctx.queue, projection);
            }
        }

        let scenes = &state.scenes;
        ctx.render(|render_pass| {
            render_loop.tick(|id| {
                scenes
                    .get(id.index())
                    .ok_or_else(|| anyhow!("unknown scene {id}"))?
                    .draw(render_pass)
            })
        })
    }

    fn toggle_inspector(&mut self, scene: SceneId) -> anyhow::Result<bool> {
        let visible = self
            .state
            .scenes
            .get_mut(scene.index())
            .ok_or_else(|| anyhow!("unknown scene {scene}"))?
            .inspector
            .toggle();
        if let Err(e) = self.state.present_inspector(scene, visible) {
            log::warn!("Cannot display the inspector: {e:#}");
        }
        Ok(visible)
    }

    fn is_inspector_visible(&self, scene: SceneId) -> anyhow::Result<bool> {
        Ok(self.state.scene(scene)?.inspector.is_visible())
    }
}
