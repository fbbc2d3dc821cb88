//! Render pipelines and the bind group layouts they share.
//!
//! - `basic` builds the scene pipeline every mesh is drawn with
//! - `light` holds the hemispheric light uniform

pub mod basic;
pub mod light;

use crate::{camera, resources::texture::diffuse_layout};

/// Bind group layouts of the scene pipeline, in group order.
#[derive(Debug)]
pub struct Layouts {
    pub texture: wgpu::BindGroupLayout,
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            texture: diffuse_layout(device),
            camera: camera::mk_bind_group_layout(device),
            light: light::mk_bind_group_layout(device),
        }
    }
}
