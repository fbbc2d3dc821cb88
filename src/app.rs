//! The bootstrapper: builds the demo scene on any [`Backend`] and keeps the
//! handles of what it built.

use anyhow::Context as _;

use crate::{
    backend::{Backend, CameraId, EngineId, LightId, MeshId, SceneId, SurfaceId},
    config::AppConfig,
    input::{Command, InputRouter, KeyPress, Subscription, hotkey},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Bootstrap has not finished yet.
    Initializing,
    /// Scene built and render loop registered.
    Running,
    /// Render loop stopped and input released.
    Stopped,
}

/// A bootstrapped scene.
///
/// Dropping the app releases its key listener; [`App::teardown`] additionally
/// stops the render loop.
#[derive(Debug)]
pub struct App {
    surface: SurfaceId,
    engine: EngineId,
    scene: SceneId,
    camera: CameraId,
    light: LightId,
    meshes: Vec<(String, MeshId)>,
    input: InputRouter,
    inspector_toggle: Option<Subscription>,
    lifecycle: Lifecycle,
}

impl App {
    /// Runs the setup steps in order: surface, engine, scene, camera, light,
    /// meshes, inspector hotkey, render loop. Stops at the first failing step.
    pub fn bootstrap<B: Backend + ?Sized>(
        backend: &mut B,
        input: &InputRouter,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        log::info!("bootstrapping scene on surface {:?}", config.surface.id);

        let surface = backend
            .create_surface(&config.surface)
            .context("Cannot create the drawing surface")?;
        log::debug!(
            "surface {surface} ({} x {})",
            config.surface.width,
            config.surface.height
        );

        let engine = backend
            .create_engine(surface, &config.engine)
            .context("Cannot initialize the render engine")?;
        log::debug!("engine {engine} (antialias: {})", config.engine.antialias);

        let scene = backend
            .create_scene(engine)
            .context("Cannot create the scene")?;

        let camera = backend
            .create_camera(scene, &config.camera, Some(surface))
            .with_context(|| format!("Cannot create camera {:?}", config.camera.name))?;

        let light = backend
            .create_light(scene, &config.light)
            .with_context(|| format!("Cannot create light {:?}", config.light.name))?;

        let mut meshes = Vec::with_capacity(config.meshes.len());
        for spec in &config.meshes {
            let material = backend
                .create_material(scene, &spec.material)
                .with_context(|| format!("Cannot create material {:?}", spec.material.name))?;
            let mesh = backend
                .create_mesh(scene, &spec.mesh, material)
                .with_context(|| format!("Cannot create mesh {:?}", spec.mesh.name))?;
            log::debug!("mesh {:?} -> {mesh} with {material}", spec.mesh.name);
            meshes.push((spec.mesh.name.clone(), mesh));
        }

        let inspector_toggle =
            input.subscribe(hotkey(config.inspector_hotkey, Command::ToggleInspector(scene)));

        backend
            .run_render_loop(engine, scene)
            .context("Cannot start the render loop")?;

        log::info!("scene ready: {} mesh(es), render loop running", meshes.len());
        Ok(Self {
            surface,
            engine,
            scene,
            camera,
            light,
            meshes,
            input: input.clone(),
            inspector_toggle: Some(inspector_toggle),
            lifecycle: Lifecycle::Running,
        })
    }

    /// Routes a key press to the subscribed listeners and applies what they ask for.
    pub fn on_key<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        key: &KeyPress,
    ) -> anyhow::Result<()> {
        for command in self.input.dispatch(key) {
            self.apply(backend, command)?;
        }
        Ok(())
    }

    pub fn apply<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        command: Command,
    ) -> anyhow::Result<()> {
        match command {
            Command::ToggleInspector(scene) => {
                let visible = backend.toggle_inspector(scene)?;
                log::info!(
                    "inspector of {scene} {}",
                    if visible { "shown" } else { "hidden" }
                );
            }
        }
        Ok(())
    }

    /// One render tick. Returns the number of scenes drawn.
    pub fn frame<B: Backend + ?Sized>(&mut self, backend: &mut B) -> anyhow::Result<usize> {
        backend.tick(self.engine)
    }

    /// Stops the render loop and drops the key listener. Calling it again is a no-op.
    pub fn teardown<B: Backend + ?Sized>(&mut self, backend: &mut B) -> anyhow::Result<()> {
        if self.lifecycle == Lifecycle::Stopped {
            return Ok(());
        }
        self.inspector_toggle = None;
        backend.stop_render_loop(self.engine)?;
        self.lifecycle = Lifecycle::Stopped;
        log::info!("scene torn down");
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn light(&self) -> LightId {
        self.light
    }

    pub fn meshes(&self) -> &[(String, MeshId)] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<MeshId> {
        self.meshes
            .iter()
            .find_map(|(n, id)| (n == name).then_some(*id))
    }

    /// Whether the inspector hotkey is still subscribed.
    pub fn is_listening(&self) -> bool {
        self.inspector_toggle
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::{headless::HeadlessBackend, input::Modifiers};

    fn inspector_key() -> KeyPress {
        KeyPress::new(
            KeyCode::KeyI,
            Modifiers {
                shift: true,
                ctrl: true,
                alt: true,
                meta: false,
            },
        )
    }

    #[test]
    fn bootstrap_ends_running() {
        let mut backend = HeadlessBackend::new();
        let input = InputRouter::new();
        let app = App::bootstrap(&mut backend, &input, &AppConfig::default()).unwrap();
        assert_eq!(app.lifecycle(), Lifecycle::Running);
        assert!(app.is_listening());
        assert!(app.mesh("roof").is_some());
        assert!(app.mesh("chimney").is_none());
    }

    #[test]
    fn hotkey_goes_through_the_router() {
        let mut backend = HeadlessBackend::new();
        let input = InputRouter::new();
        let mut app = App::bootstrap(&mut backend, &input, &AppConfig::default()).unwrap();
        app.on_key(&mut backend, &inspector_key()).unwrap();
        assert!(backend.is_inspector_visible(app.scene()).unwrap());
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let input = InputRouter::new();
        let mut app = App::bootstrap(&mut backend, &input, &AppConfig::default()).unwrap();
        app.teardown(&mut backend).unwrap();
        app.teardown(&mut backend).unwrap();
        assert_eq!(app.lifecycle(), Lifecycle::Stopped);
        assert!(!app.is_listening());
        assert_eq!(input.listener_count(), 0);
    }

    #[test]
    fn dropping_the_app_releases_the_hotkey() {
        let mut backend = HeadlessBackend::new();
        let input = InputRouter::new();
        let app = App::bootstrap(&mut backend, &input, &AppConfig::default()).unwrap();
        assert_eq!(input.listener_count(), 1);
        drop(app);
        assert_eq!(input.listener_count(), 0);
    }
}
