//! Loading of external resources.
//!
//! Image textures are fetched in the background and handed back to the event
//! loop as a [`FlowEvent::TextureLoaded`], so rendering never waits on the
//! network.

pub mod texture;

use winit::event_loop::EventLoopProxy;

use crate::{
    backend::{MaterialId, SceneId},
    flow::FlowEvent,
    scene::TextureSource,
};

/// The image to upload for `material`, or `None` when loading failed. Failures
/// are logged; the material keeps its placeholder.
pub fn loaded_image(
    material: &str,
    image: anyhow::Result<image::DynamicImage>,
) -> Option<image::DynamicImage> {
    match image {
        Ok(image) => Some(image),
        Err(e) => {
            log::error!("Texture of {material} not loaded, keeping a blank one: {e:#}");
            None
        }
    }
}

/// Starts loading `source` for `material` of `scene`. The result, success or
/// failure, arrives later through `proxy`.
pub fn spawn_texture_load(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Handle,
    proxy: EventLoopProxy<FlowEvent>,
    scene: SceneId,
    material: MaterialId,
    source: TextureSource,
) {
    log::debug!("loading {source} for {material}");
    let fut = async move {
        let image = texture::load_image(&source).await;
        if proxy
            .send_event(FlowEvent::TextureLoaded {
                scene,
                material,
                image,
            })
            .is_err()
        {
            log::warn!("Event loop closed before {source} could be applied");
        }
    };

    #[cfg(not(target_arch = "wasm32"))]
    async_runtime.spawn(fut);

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(fut);
}

#[cfg(test)]
mod tests {
    use anyhow::Context as _;

    use super::*;

    #[test]
    fn failed_load_keeps_the_placeholder() {
        let failed: anyhow::Result<image::DynamicImage> =
            Err(anyhow::anyhow!("404 Not Found")).context("Cannot load texture roof.jpg");
        assert!(loaded_image("roofMaterial", failed).is_none());
    }

    #[test]
    fn loaded_image_is_uploaded() {
        let image = image::DynamicImage::new_rgba8(2, 2);
        let uploaded = loaded_image("boxMaterial", Ok(image)).unwrap();
        assert_eq!((uploaded.width(), uploaded.height()), (2, 2));
    }
}
