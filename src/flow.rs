//! Application event loop.
//!
//! [`Runner`] is the winit [`ApplicationHandler`]: it bootstraps the [`App`]
//! once the event loop is resumed, routes keyboard input to it, renders on
//! every redraw and swaps in textures as they finish loading.
//!
//! # Lifecycle
//!
//! 1. `resumed`: build the scene through the wgpu backend
//! 2. `window_event`: camera input, hotkeys, resizes and redraws
//! 3. `user_event`: textures arriving from background loads
//! 4. `exiting`: stop the render loop and release the hotkey

use std::fmt::Debug;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::PhysicalKey,
    window::WindowId,
};

use crate::{
    app::{App, Lifecycle},
    backend::{MaterialId, SceneId},
    config::AppConfig,
    engine::GpuState,
    input::{InputRouter, KeyPress, Modifiers},
};

/// How often the frame rate is logged.
const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Events sent to the event loop from background tasks.
pub enum FlowEvent {
    /// A material's image finished downloading and decoding, or failed to.
    TextureLoaded {
        scene: SceneId,
        material: MaterialId,
        image: anyhow::Result<image::DynamicImage>,
    },
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextureLoaded {
                scene,
                material,
                image,
            } => f
                .debug_struct("TextureLoaded")
                .field("scene", scene)
                .field("material", material)
                .field("ok", &image.is_ok())
                .finish(),
        }
    }
}

pub struct Runner {
    config: AppConfig,
    input: InputRouter,
    gpu: GpuState,
    app: Option<App>,
    modifiers: Modifiers,
    failure: Option<anyhow::Error>,
    last_report: Instant,
    frames_since_report: u32,
}

impl Runner {
    pub fn new(event_loop: &EventLoop<FlowEvent>, config: AppConfig) -> anyhow::Result<Self> {
        let proxy: EventLoopProxy<FlowEvent> = event_loop.create_proxy();
        let gpu = GpuState::new(proxy, config.clear_colour)?;
        Ok(Self {
            config,
            input: InputRouter::new(),
            gpu,
            app: None,
            modifiers: Modifiers::NONE,
            failure: None,
            last_report: Instant::now(),
            frames_since_report: 0,
        })
    }

    fn count_frame(&mut self) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed >= FPS_REPORT_INTERVAL {
            log::debug!(
                "{:.1} fps",
                self.frames_since_report as f32 / elapsed.as_secs_f32()
            );
            self.last_report = Instant::now();
            self.frames_since_report = 0;
        }
    }

    /// The error that stopped the bootstrap, if any.
    pub fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }
}

impl ApplicationHandler<FlowEvent> for Runner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again after a suspend; the scene only gets built once.
        if self.app.is_some() || self.failure.is_some() {
            return;
        }

        let mut backend = self.gpu.backend(event_loop);
        match App::bootstrap(&mut backend, &self.input, &self.config) {
            Ok(app) => self.app = Some(app),
            Err(e) => {
                log::error!("Startup failed: {e:#}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        log::debug!("{event:?}");
        match event {
            FlowEvent::TextureLoaded {
                scene,
                material,
                image,
            } => {
                if let Err(e) = self.gpu.apply_texture(scene, material, image) {
                    log::error!("{e:#}");
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        self.gpu.handle_window_event(window_id, &event);

        match event {
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state().into(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let Some(app) = &mut self.app else {
                    return;
                };
                let key = KeyPress::new(code, self.modifiers);
                if let Err(e) = app.on_key(&mut self.gpu.backend(event_loop), &key) {
                    log::error!("{e:#}");
                }
            }
            WindowEvent::Resized(size) => self.gpu.resize(window_id, size.width, size.height),
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                let Some(app) = &mut self.app else {
                    return;
                };
                if app.lifecycle() != Lifecycle::Running {
                    return;
                }
                match app.frame(&mut self.gpu.backend(event_loop)) {
                    Ok(0) => {}
                    Ok(_) => self.count_frame(),
                    Err(e) => log::error!("{e:#}"),
                }
                self.gpu.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            if let Err(e) = app.teardown(&mut self.gpu.backend(event_loop)) {
                log::error!("{e:#}");
            }
        }
    }
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }
}

/// Runs the default house scene.
pub fn run() -> anyhow::Result<()> {
    run_with(AppConfig::default())
}

/// Runs the scene described by `config`.
///
/// Natively this blocks until the window is closed and returns the startup
/// error, if there was one. In the browser the event loop is handed to the
/// page and this returns immediately.
pub fn run_with(config: AppConfig) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    #[allow(unused_mut)]
    let mut runner = Runner::new(&event_loop, config)?;

    #[cfg(not(target_arch = "wasm32"))]
    {
        event_loop.run_app(&mut runner)?;
        match runner.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;

        event_loop.spawn_app(runner);
        Ok(())
    }
}
