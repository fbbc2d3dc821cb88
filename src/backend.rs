//! The capability interface between the bootstrapper and a rendering engine.
//!
//! [`Backend`] is everything [`App`](crate::app::App) needs from an engine. The
//! wgpu implementation lives in [`crate::engine`], an in-memory one in
//! [`crate::headless`]. Objects are referred to by small `Copy` handles issued
//! by the backend; scene-level handles (cameras, lights, materials, meshes) are
//! only meaningful together with the [`SceneId`] that issued them.

use std::fmt;

use crate::{
    camera::OrbitCamera,
    scene::{EngineDesc, HemisphericLight, MaterialDesc, MeshDesc, SurfaceDesc},
};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// A drawing surface (canvas element or window).
    SurfaceId
);
handle!(
    /// A render engine bound to one surface.
    EngineId
);
handle!(SceneId);
handle!(CameraId);
handle!(LightId);
handle!(MaterialId);
handle!(MeshId);

/// Factories and controls a rendering engine has to offer.
///
/// Every method reports unknown handles and engine failures as errors.
pub trait Backend {
    /// Creates a drawing surface and attaches it to the host (document body or desktop).
    fn create_surface(&mut self, desc: &SurfaceDesc) -> anyhow::Result<SurfaceId>;

    /// Binds a render engine to `surface`. Fails when the host cannot render.
    fn create_engine(&mut self, surface: SurfaceId, desc: &EngineDesc) -> anyhow::Result<EngineId>;

    fn create_scene(&mut self, engine: EngineId) -> anyhow::Result<SceneId>;

    /// Adds an orbit camera; with `attach_to` set, pointer and keyboard input
    /// on that surface drives the camera.
    fn create_camera(
        &mut self,
        scene: SceneId,
        camera: &OrbitCamera,
        attach_to: Option<SurfaceId>,
    ) -> anyhow::Result<CameraId>;

    fn create_light(&mut self, scene: SceneId, light: &HemisphericLight) -> anyhow::Result<LightId>;

    /// Image textures may finish loading after this returns.
    fn create_material(&mut self, scene: SceneId, desc: &MaterialDesc) -> anyhow::Result<MaterialId>;

    fn create_mesh(
        &mut self,
        scene: SceneId,
        desc: &MeshDesc,
        material: MaterialId,
    ) -> anyhow::Result<MeshId>;

    /// From now on every [`tick`](Self::tick) of `engine` renders `scene`.
    fn run_render_loop(&mut self, engine: EngineId, scene: SceneId) -> anyhow::Result<()>;

    fn stop_render_loop(&mut self, engine: EngineId) -> anyhow::Result<()>;

    /// One engine tick. Returns how many scenes were rendered.
    fn tick(&mut self, engine: EngineId) -> anyhow::Result<usize>;

    /// Shows the inspector if hidden, hides it if shown. Returns the new visibility.
    fn toggle_inspector(&mut self, scene: SceneId) -> anyhow::Result<bool>;

    fn is_inspector_visible(&self, scene: SceneId) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_round_trip_their_index() {
        assert_eq!(MeshId::from_index(2).index(), 2);
        assert_ne!(MeshId::from_index(0), MeshId::from_index(1));
    }

    #[test]
    fn handles_display_their_kind() {
        assert_eq!(SceneId::from_index(0).to_string(), "SceneId#0");
    }
}
