use wgpu::util::DeviceExt;

use crate::scene::HemisphericLight;

/// A scene's hemispheric light on the GPU.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, light: &HemisphericLight) -> Self {
        let uniform = LightUniform::from(light);
        let buffer = mk_buffer(device, uniform);
        let bind_group = mk_bind_group(device, layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    direction: [f32; 3],
    intensity: f32,
    diffuse: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    ground_color: [f32; 3],
    _padding2: u32,
}

impl From<&HemisphericLight> for LightUniform {
    fn from(light: &HemisphericLight) -> Self {
        Self {
            direction: light.direction.into(),
            intensity: light.intensity,
            diffuse: light.diffuse.to_array(),
            _padding: 0,
            ground_color: light.ground_color.to_array(),
            _padding2: 0,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    #[test]
    fn uniform_matches_wgsl_layout() {
        // vec3 + f32, vec3 + pad, vec3 + pad
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }

    #[test]
    fn uniform_copies_the_light() {
        let light = HemisphericLight::new("light1", Vector3::new(1.0, 1.0, 0.0));
        let uniform = LightUniform::from(&light);
        assert_eq!(uniform.direction, [1.0, 1.0, 0.0]);
        assert_eq!(uniform.intensity, 1.0);
        assert_eq!(uniform.diffuse, [1.0, 1.0, 1.0]);
        assert_eq!(uniform.ground_color, [0.0, 0.0, 0.0]);
    }
}
