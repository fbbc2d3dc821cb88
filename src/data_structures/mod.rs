//! Engine data structures: geometry, models, textures, scene graphs, and instances.
//!
//! - `primitives` builds CPU geometry for the built-in shapes
//! - `model` contains GPU mesh and material resources
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-mesh transformation data
//! - `scene_graph` records what a scene contains, independent of the backend

pub mod instance;
pub mod model;
pub mod primitives;
pub mod scene_graph;
pub mod texture;
