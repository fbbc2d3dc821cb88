use std::f32::consts::FRAC_PI_2;

use house_demo::{
    KeyCode,
    app::{App, Lifecycle},
    backend::Backend,
    config::{AppConfig, CANVAS_ID},
    headless::HeadlessBackend,
    input::{InputRouter, KeyPress},
    scene::{Extent, Shape},
};

use crate::common::test_utils::{approx, bootstrap_headless, inspector_key, modifiers};

mod common;

#[test]
fn creates_one_full_viewport_canvas() {
    let booted = bootstrap_headless();
    let surfaces = booted.backend.surfaces();
    assert_eq!(surfaces.len(), 1);
    assert_eq!(surfaces[0].id, CANVAS_ID);
    assert_eq!(surfaces[0].width, Extent::Percent(100.0));
    assert_eq!(surfaces[0].height, Extent::Percent(100.0));
    assert!(booted.backend.engine_desc(booted.app.engine()).unwrap().antialias);
}

#[test]
fn scene_has_camera_light_and_three_meshes() {
    let booted = bootstrap_headless();
    let graph = booted.backend.graph(booted.app.scene()).unwrap();

    assert_eq!(graph.cameras().len(), 1);
    let camera = &graph.cameras()[0];
    assert!(approx(camera.camera.alpha, FRAC_PI_2));
    assert!(approx(camera.camera.beta, FRAC_PI_2));
    assert!(approx(camera.camera.radius, 2.0));
    assert_eq!(camera.attached_to, Some(booted.app.surface()));

    assert_eq!(graph.lights().len(), 1);
    assert_eq!(graph.lights()[0].light.name, "light1");

    let names: Vec<_> = graph.meshes().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["ground", "box", "roof"]);
}

#[test]
fn meshes_carry_their_construction_transforms() {
    let booted = bootstrap_headless();
    let graph = booted.backend.graph(booted.app.scene()).unwrap();

    let ground = graph.mesh_by_name("ground").unwrap();
    assert_eq!(
        ground.desc.shape,
        Shape::Ground {
            width: 10.0,
            height: 10.0
        }
    );

    let house = graph.mesh_by_name("box").unwrap();
    assert!(approx(house.desc.transform.position().y, 0.5));

    let roof = graph.mesh_by_name("roof").unwrap();
    let t = &roof.desc.transform;
    assert!(approx(t.position().y, 1.22));
    assert!(approx(t.rotation().z, FRAC_PI_2));
    assert!(approx(t.scaling().x, 0.75));
    assert_eq!(
        roof.desc.shape,
        Shape::Cylinder {
            diameter: 1.3,
            height: 1.2,
            tessellation: 3
        }
    );
}

#[test]
fn inspector_hotkey_toggles_visibility() {
    let mut booted = bootstrap_headless();
    let scene = booted.app.scene();
    assert!(!booted.backend.is_inspector_visible(scene).unwrap());

    booted.app.on_key(&mut booted.backend, &inspector_key()).unwrap();
    assert!(booted.backend.is_inspector_visible(scene).unwrap());

    booted.app.on_key(&mut booted.backend, &inspector_key()).unwrap();
    assert!(!booted.backend.is_inspector_visible(scene).unwrap());
}

#[test]
fn other_key_combinations_do_nothing() {
    let mut booted = bootstrap_headless();
    let scene = booted.app.scene();
    let presses = [
        KeyPress::new(KeyCode::KeyI, modifiers(true, true, false)),
        KeyPress::new(KeyCode::KeyI, modifiers(false, true, true)),
        KeyPress::new(KeyCode::KeyI, modifiers(false, false, false)),
        KeyPress::new(KeyCode::KeyJ, modifiers(true, true, true)),
    ];
    for press in &presses {
        booted.app.on_key(&mut booted.backend, press).unwrap();
    }
    assert!(!booted.backend.is_inspector_visible(scene).unwrap());
}

#[test]
fn inspector_report_lists_the_scene() {
    let mut booted = bootstrap_headless();
    booted.app.on_key(&mut booted.backend, &inspector_key()).unwrap();
    let report = booted
        .backend
        .inspector_report(booted.app.scene())
        .unwrap()
        .to_string();
    assert!(report.starts_with("Scene: 1 camera(s), 1 light(s), 3 mesh(es)"));
    assert!(report.contains("roof"));
    assert!(report.contains("light1"));
}

#[test]
fn every_tick_renders_the_scene_once() {
    let mut booted = bootstrap_headless();
    for _ in 0..5 {
        assert_eq!(booted.app.frame(&mut booted.backend).unwrap(), 1);
    }
    assert_eq!(booted.backend.render_count(booted.app.scene()).unwrap(), 5);
    assert_eq!(
        booted
            .backend
            .render_loop(booted.app.engine())
            .unwrap()
            .frames(),
        5
    );
}

#[test]
fn teardown_stops_rendering_and_releases_the_hotkey() {
    let mut booted = bootstrap_headless();
    booted.app.frame(&mut booted.backend).unwrap();
    assert_eq!(booted.input.listener_count(), 1);

    booted.app.teardown(&mut booted.backend).unwrap();
    assert_eq!(booted.app.lifecycle(), Lifecycle::Stopped);
    assert!(!booted.app.is_listening());
    assert_eq!(booted.input.listener_count(), 0);

    assert_eq!(booted.app.frame(&mut booted.backend).unwrap(), 0);
    assert_eq!(booted.backend.render_count(booted.app.scene()).unwrap(), 1);

    // The listener is gone, so the hotkey no longer reaches the inspector.
    booted.app.on_key(&mut booted.backend, &inspector_key()).unwrap();
    assert!(
        !booted
            .backend
            .is_inspector_visible(booted.app.scene())
            .unwrap()
    );
}

#[test]
fn bootstrapping_twice_creates_a_second_canvas() {
    let mut backend = HeadlessBackend::new();
    let input = InputRouter::new();
    let config = AppConfig::default();
    let first = App::bootstrap(&mut backend, &input, &config).unwrap();
    let second = App::bootstrap(&mut backend, &input, &config).unwrap();

    assert_eq!(backend.surfaces_with_id(CANVAS_ID), 2);
    assert_ne!(first.surface(), second.surface());
    assert_eq!(backend.scene_count(), 2);
    assert_eq!(input.listener_count(), 2);

    // One hotkey press reaches both scenes.
    let mut first = first;
    let mut second = second;
    first.on_key(&mut backend, &inspector_key()).unwrap();
    assert!(backend.is_inspector_visible(first.scene()).unwrap());
    assert!(backend.is_inspector_visible(second.scene()).unwrap());
    second.teardown(&mut backend).unwrap();
    assert_eq!(input.listener_count(), 1);
}

#[test]
fn engine_failure_aborts_the_bootstrap() {
    let mut backend = HeadlessBackend::without_rendering_support();
    let input = InputRouter::new();
    let err = App::bootstrap(&mut backend, &input, &AppConfig::default()).unwrap_err();

    assert!(err.to_string().contains("Cannot initialize the render engine"));
    assert!(format!("{err:#}").contains("no rendering context"));
    assert_eq!(backend.scene_count(), 0);
    assert_eq!(input.listener_count(), 0);
}
