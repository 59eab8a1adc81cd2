//! Umbra engine crate.
//!
//! Platform + GPU runtime (window, device, input, time, logging), the scene
//! model (transforms, cameras, lights, materials, entities) and the multi-pass
//! renderer (shadow map, lit scene, sky, post-processing chain).

pub mod config;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
