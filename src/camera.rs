//! Orbit camera, its input controller and the GPU-side camera uniform.
//!
//! The camera sits on a sphere around `target`, parameterised by a horizontal
//! angle `alpha`, a vertical angle `beta` and a `radius`. Input never moves the
//! camera directly: it accumulates inertial offsets that [`OrbitController::update`]
//! applies and decays once per frame.

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// `beta` stays this far away from the poles so the view matrix never degenerates.
const BETA_MARGIN: f32 = 0.01;
const MIN_RADIUS: f32 = 0.1;
/// Offsets below this are snapped to zero when decaying.
const INERTIA_EPSILON: f32 = 1e-4;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub name: String,
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Point3<f32>,
}

impl OrbitCamera {
    pub fn new(name: impl Into<String>, alpha: f32, beta: f32, radius: f32, target: Point3<f32>) -> Self {
        Self {
            name: name.into(),
            alpha,
            beta: clamp_beta(beta),
            radius: radius.max(MIN_RADIUS),
            target,
        }
    }

    /// Eye position in world space.
    pub fn position(&self) -> Point3<f32> {
        let (sin_a, cos_a) = self.alpha.sin_cos();
        let (sin_b, cos_b) = self.beta.sin_cos();
        Point3::new(
            self.target.x + self.radius * cos_a * sin_b,
            self.target.y + self.radius * cos_b,
            self.target.z + self.radius * sin_a * sin_b,
        )
    }

    pub fn rotate(&mut self, d_alpha: f32, d_beta: f32) {
        self.alpha += d_alpha;
        self.beta = clamp_beta(self.beta + d_beta);
    }

    pub fn zoom(&mut self, d_radius: f32) {
        self.radius = (self.radius + d_radius).max(MIN_RADIUS);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }
}

fn clamp_beta(beta: f32) -> f32 {
    beta.clamp(BETA_MARGIN, std::f32::consts::PI - BETA_MARGIN)
}

#[derive(Debug, Default)]
struct HeldKeys {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

/// Maps pointer, touch, wheel and arrow-key input onto an [`OrbitCamera`].
#[derive(Debug)]
pub struct OrbitController {
    /// Pixels of pointer travel per radian.
    pub angular_sensibility: f32,
    /// Wheel lines per unit of radius.
    pub wheel_precision: f32,
    /// Radians per frame while an arrow key is held.
    pub keyboard_speed: f32,
    /// Fraction of the offsets kept from one frame to the next.
    pub inertia: f32,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    /// The finger currently orbiting; other fingers are ignored.
    touch: Option<u64>,
    last_touch: Option<PhysicalPosition<f64>>,
    keys: HeldKeys,
    alpha_offset: f32,
    beta_offset: f32,
    radius_offset: f32,
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            angular_sensibility: 1000.0,
            wheel_precision: 3.0,
            keyboard_speed: 0.01,
            inertia: 0.9,
            dragging: false,
            last_cursor: None,
            touch: None,
            last_touch: None,
            keys: HeldKeys::default(),
            alpha_offset: 0.0,
            beta_offset: 0.0,
            radius_offset: 0.0,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state.is_pressed();
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some(last) = self.last_cursor {
                        self.handle_pointer_delta(position.x - last.x, position.y - last.y);
                    }
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.last_cursor = None;
            }
            WindowEvent::Touch(touch) => self.handle_touch(touch.id, touch.phase, touch.location),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
                };
                self.handle_wheel(lines);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code, event.state.is_pressed());
                }
            }
            _ => (),
        }
    }

    pub fn handle_pointer_delta(&mut self, dx: f64, dy: f64) {
        self.alpha_offset -= dx as f32 / self.angular_sensibility;
        self.beta_offset -= dy as f32 / self.angular_sensibility;
    }

    /// A single finger drags like the left mouse button.
    pub fn handle_touch(&mut self, id: u64, phase: TouchPhase, location: PhysicalPosition<f64>) {
        match phase {
            TouchPhase::Started => {
                if self.touch.is_none() {
                    self.touch = Some(id);
                    self.last_touch = Some(location);
                }
            }
            TouchPhase::Moved => {
                if self.touch != Some(id) {
                    return;
                }
                if let Some(last) = self.last_touch {
                    self.handle_pointer_delta(location.x - last.x, location.y - last.y);
                }
                self.last_touch = Some(location);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.touch == Some(id) {
                    self.touch = None;
                    self.last_touch = None;
                }
            }
        }
    }

    /// Positive `lines` (scrolling up) moves the camera closer.
    pub fn handle_wheel(&mut self, lines: f32) {
        self.radius_offset -= lines / self.wheel_precision;
    }

    /// Returns true when the key is one of the orbit keys.
    pub fn handle_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        match code {
            KeyCode::ArrowLeft => self.keys.left = pressed,
            KeyCode::ArrowRight => self.keys.right = pressed,
            KeyCode::ArrowUp => self.keys.up = pressed,
            KeyCode::ArrowDown => self.keys.down = pressed,
            _ => return false,
        }
        true
    }

    /// Applies pending offsets to `camera` and decays them by `inertia`.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        if self.keys.left {
            self.alpha_offset -= self.keyboard_speed;
        }
        if self.keys.right {
            self.alpha_offset += self.keyboard_speed;
        }
        if self.keys.up {
            self.beta_offset -= self.keyboard_speed;
        }
        if self.keys.down {
            self.beta_offset += self.keyboard_speed;
        }

        camera.rotate(self.alpha_offset, self.beta_offset);
        // Zoom is applied at once rather than eased.
        camera.zoom(self.radius_offset);
        self.radius_offset = 0.0;

        let decay = |v: f32| {
            let v = v * self.inertia;
            if v.abs() < INERTIA_EPSILON { 0.0 } else { v }
        };
        self.alpha_offset = decay(self.alpha_offset);
        self.beta_offset = decay(self.beta_offset);
    }

    pub fn is_idle(&self) -> bool {
        self.alpha_offset == 0.0 && self.beta_offset == 0.0 && self.radius_offset == 0.0
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
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
        label: Some("camera_bind_group_layout"),
    })
}

/// A scene's camera together with its controls and GPU buffer.
pub struct CameraResources {
    pub camera: OrbitCamera,
    /// `None` when the camera was created without input attached.
    pub controller: Option<OrbitController>,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera: OrbitCamera,
        projection: &Projection,
        attach_control: bool,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: attach_control.then(OrbitController::new),
            uniform,
            buffer,
            bind_group,
        }
    }

    /// Runs the controller and uploads the new view-projection.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        if let Some(controller) = &mut self.controller {
            controller.update(&mut self.camera);
        }
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use cgmath::{EuclideanSpace, InnerSpace};

    use super::*;

    fn house_camera() -> OrbitCamera {
        OrbitCamera::new("Camera", FRAC_PI_2, FRAC_PI_2, 2.0, Point3::origin())
    }

    #[test]
    fn right_angles_put_the_eye_on_the_z_axis() {
        let eye = house_camera().position();
        assert!((eye.to_vec() - Vector3::new(0.0, 0.0, 2.0)).magnitude() < 1e-5, "{eye:?}");
    }

    #[test]
    fn eye_keeps_radius_distance_from_target() {
        let mut cam = OrbitCamera::new("c", 0.3, 1.1, 5.0, Point3::new(1.0, 2.0, 3.0));
        cam.rotate(0.7, -0.2);
        let dist = (cam.position() - cam.target).magnitude();
        assert!((dist - 5.0).abs() < 1e-4);
    }

    #[test]
    fn beta_is_clamped_away_from_poles() {
        let mut cam = house_camera();
        cam.rotate(0.0, 10.0);
        assert!(cam.beta < PI);
        cam.rotate(0.0, -10.0);
        assert!(cam.beta > 0.0);
        assert!(!cam.view_matrix().x.x.is_nan());
    }

    #[test]
    fn radius_never_collapses() {
        let mut cam = house_camera();
        cam.zoom(-100.0);
        assert!(cam.radius > 0.0);
    }

    #[test]
    fn drag_to_the_right_decreases_alpha() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        ctrl.handle_pointer_delta(100.0, 0.0);
        ctrl.update(&mut cam);
        assert!(cam.alpha < FRAC_PI_2);
        assert_eq!(cam.beta, FRAC_PI_2);
    }

    #[test]
    fn inertia_decays_to_idle() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        ctrl.handle_pointer_delta(10.0, 10.0);
        for _ in 0..200 {
            ctrl.update(&mut cam);
        }
        assert!(ctrl.is_idle());
    }

    fn touch(id: u64, phase: TouchPhase, x: f64) -> WindowEvent {
        WindowEvent::Touch(winit::event::Touch {
            // SAFETY: only compared, never handed to the platform.
            device_id: unsafe { winit::event::DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, 50.0),
            force: None,
            id,
        })
    }

    #[test]
    fn finger_drag_orbits() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        ctrl.handle_window_events(&touch(1, TouchPhase::Started, 100.0));
        ctrl.handle_window_events(&touch(1, TouchPhase::Moved, 300.0));
        ctrl.handle_window_events(&touch(1, TouchPhase::Ended, 300.0));
        ctrl.update(&mut cam);
        assert!((cam.alpha - (FRAC_PI_2 - 0.2)).abs() < 1e-5, "{}", cam.alpha);
        assert_eq!(cam.beta, FRAC_PI_2);
    }

    #[test]
    fn second_finger_and_lifted_finger_are_ignored() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        ctrl.handle_touch(1, TouchPhase::Started, PhysicalPosition::new(0.0, 0.0));
        ctrl.handle_touch(2, TouchPhase::Started, PhysicalPosition::new(10.0, 0.0));
        ctrl.handle_touch(2, TouchPhase::Moved, PhysicalPosition::new(500.0, 0.0));
        ctrl.handle_touch(1, TouchPhase::Cancelled, PhysicalPosition::new(0.0, 0.0));
        ctrl.handle_touch(1, TouchPhase::Moved, PhysicalPosition::new(400.0, 0.0));
        ctrl.update(&mut cam);
        assert!(ctrl.is_idle());
        assert_eq!(cam.alpha, FRAC_PI_2);
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        ctrl.handle_wheel(1.5);
        ctrl.update(&mut cam);
        assert!(cam.radius < 2.0);
        assert!(ctrl.is_idle());
    }

    #[test]
    fn held_arrow_key_keeps_orbiting() {
        let mut cam = house_camera();
        let mut ctrl = OrbitController::new();
        assert!(ctrl.handle_key(KeyCode::ArrowRight, true));
        ctrl.update(&mut cam);
        let after_one = cam.alpha;
        ctrl.update(&mut cam);
        assert!(cam.alpha > after_one);
        assert!(!ctrl.handle_key(KeyCode::KeyW, true));
    }

    #[test]
    fn projection_handles_zero_sized_surfaces() {
        let mut proj = Projection::new(0, 0, Rad(0.8), 0.1, 1000.0);
        proj.resize(800, 0);
        assert!(!proj.calc_matrix().x.x.is_nan());
    }
}
