use anyhow::Context as _;

use crate::scene::TextureSource;

pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("diffuse_bind_group_layout"),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("No window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Cannot read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    std::path::Path::new("./").join("assets").join(file_name)
}

async fn fetch(url: reqwest::Url) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url.clone()).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    log::debug!("fetched {} bytes from {url}", bytes.len());
    Ok(bytes.to_vec())
}

/// Raw bytes of a texture, downloaded or read from the assets directory.
pub async fn load_binary(source: &TextureSource) -> anyhow::Result<Vec<u8>> {
    let data = match source {
        TextureSource::Remote(url) => {
            let url = reqwest::Url::parse(url).with_context(|| format!("Invalid URL {url:?}"))?;
            fetch(url).await
        }
        #[cfg(target_arch = "wasm32")]
        TextureSource::Asset(file_name) => fetch(format_url(file_name)?).await,
        #[cfg(not(target_arch = "wasm32"))]
        TextureSource::Asset(file_name) => tokio::fs::read(asset_path(file_name))
            .await
            .map_err(anyhow::Error::from),
    };
    data.with_context(|| format!("Cannot load texture {source}"))
}

pub fn decode_image(bytes: &[u8], label: &str) -> anyhow::Result<image::DynamicImage> {
    image::load_from_memory(bytes).with_context(|| format!("Cannot decode image {label}"))
}

pub async fn load_image(source: &TextureSource) -> anyhow::Result<image::DynamicImage> {
    let bytes = load_binary(source).await?;
    decode_image(&bytes, &source.to_string())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 255, 0, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png() {
        let img = decode_image(&png_bytes(3, 2), "green.png").unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn garbage_names_the_texture() {
        let err = decode_image(b"<html>404</html>", "roof.jpg").unwrap_err();
        assert!(err.to_string().contains("roof.jpg"));
    }

    #[test]
    fn assets_resolve_below_the_assets_directory() {
        assert!(asset_path("floor.png").ends_with("assets/floor.png"));
    }

    #[tokio::test]
    async fn missing_asset_is_an_error() {
        let source = TextureSource::Asset("does-not-exist.png".into());
        let err = load_binary(&source).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot load texture assets/does-not-exist.png");
    }

    #[tokio::test]
    async fn malformed_url_is_an_error() {
        let source = TextureSource::Remote("not a url".into());
        assert!(load_image(&source).await.is_err());
    }
}
