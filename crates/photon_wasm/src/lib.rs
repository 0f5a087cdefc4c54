//! WASM bridge for the photon path engine.
//!
//! The host (a three.js scene) owns rendering, camera and DOM wiring. It drives the
//! engine once per animation frame and supplies the occlusion test and display sink
//! as JavaScript callbacks.

mod callbacks;
mod engine;
mod tags;

pub use engine::WasmPhotonEngine;
