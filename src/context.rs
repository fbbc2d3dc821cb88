//! GPU context of one render engine: device, queue, the configured surface and
//! the render targets and pipeline that draw into it.

use std::{iter, sync::Arc};

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    data_structures::texture,
    pipelines::{Layouts, basic::mk_scene_pipeline},
    scene::EngineDesc,
};

/// Sample count used when anti-aliasing is requested and supported.
pub const MSAA_SAMPLES: u32 = 4;

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    /// Multisampled colour target, present when anti-aliasing is on.
    pub(crate) msaa_target: Option<texture::Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub layouts: Layouts,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, desc: &EngineDesc) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("Cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an Srgb surface texture; other formats come out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface is incompatible with the adapter")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let supports_msaa = |format: wgpu::TextureFormat| {
            adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        };
        let sample_count = if desc.antialias
            && supports_msaa(surface_format)
            && supports_msaa(texture::Texture::DEPTH_FORMAT)
        {
            MSAA_SAMPLES
        } else {
            if desc.antialias {
                log::warn!("{surface_format:?} cannot be multisampled, anti-aliasing disabled");
            }
            1
        };

        let layouts = Layouts::new(&device);
        let pipeline = mk_scene_pipeline(&device, surface_format, sample_count, &layouts);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );

        let mut ctx = Self {
            window,
            depth_texture,
            msaa_target: None,
            surface,
            device,
            queue,
            config,
            sample_count,
            layouts,
            pipeline,
            clear_colour: wgpu::Color::BLACK,
            is_surface_configured: false,
        };
        // The web canvas has no size until the first resize event.
        ctx.resize(size.width, size.height);
        Ok(ctx)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.is_surface_configured = true;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = texture::Texture::create_depth_texture(
                &self.device,
                [width, height],
                self.sample_count,
                "depth_texture",
            );
            self.msaa_target = (self.sample_count > 1).then(|| {
                texture::Texture::create_msaa_target(&self.device, &self.config, self.sample_count)
            });
        }
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    /// Acquires a frame, clears it and lets `draw` record into the pass.
    ///
    /// Returns what `draw` returned, or `0` when there was nothing to draw to
    /// (unconfigured or lost surface).
    pub fn render<F>(&mut self, draw: F) -> anyhow::Result<usize>
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>) -> anyhow::Result<usize>,
    {
        if !self.is_surface_configured {
            return Ok(0);
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height);
                return Ok(0);
            }
            Err(e) => return Err(e).context("Cannot acquire the next frame"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (target, resolve_target) = match &self.msaa_target {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let drawn = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            render_pass.set_pipeline(&self.pipeline);
            draw(&mut render_pass)?
        };

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(drawn)
    }
}
