use house_demo::{
    KeyCode,
    app::App,
    config::AppConfig,
    headless::HeadlessBackend,
    input::{InputRouter, KeyPress, Modifiers},
};

/// A bootstrapped default scene on a fresh headless backend.
pub struct Booted {
    pub backend: HeadlessBackend,
    pub input: InputRouter,
    pub app: App,
}

pub fn bootstrap_headless() -> Booted {
    let mut backend = HeadlessBackend::new();
    let input = InputRouter::new();
    let app = App::bootstrap(&mut backend, &input, &AppConfig::default())
        .expect("bootstrap on the headless backend");
    Booted {
        backend,
        input,
        app,
    }
}

pub fn modifiers(shift: bool, ctrl: bool, alt: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta: false,
    }
}

/// Shift+Ctrl+Alt+I.
pub fn inspector_key() -> KeyPress {
    KeyPress::new(KeyCode::KeyI, modifiers(true, true, true))
}

#[allow(dead_code)]
pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}
