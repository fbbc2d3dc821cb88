//! house-demo
//!
//! A small house scene rendered with wgpu: a green ground, a textured box and
//! a three-sided roof, lit by a hemispheric light and viewed through an orbit
//! camera. Runs natively and in the browser, where it draws into a
//! full-viewport `gameCanvas`. Shift+Ctrl+Alt+I toggles a scene inspector.
//!
//! High-level modules
//! - `app`: builds the scene on a backend and owns its handles and hotkey
//! - `backend`: the capability interface every renderer implements
//! - `camera`: orbit camera, its controller and view/projection uniforms
//! - `config`: the typed description of the scene to build
//! - `context`: GPU device, surface and render targets of one engine
//! - `data_structures`: meshes, instances, textures and the scene graph
//! - `engine`: the wgpu backend
//! - `flow`: the winit event loop
//! - `headless`: an in-memory backend for tests and tools
//! - `input`: key combos, the listener registry and scoped subscriptions
//! - `inspector`: debug inspector state and its scene report
//! - `pipelines`: the scene render pipeline and light uniforms
//! - `render_loop`: which scenes are drawn on each tick
//! - `resources`: background texture loading
//! - `scene`: descriptors for surfaces, lights, transforms, meshes and materials
//!

pub mod app;
pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
#[cfg(target_arch = "wasm32")]
pub mod dom;
pub mod engine;
pub mod flow;
pub mod headless;
pub mod input;
pub mod inspector;
pub mod pipelines;
pub mod render_loop;
pub mod resources;
pub mod scene;

pub use flow::{run, run_with};
pub use winit::keyboard::KeyCode;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
