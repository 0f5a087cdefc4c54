//! WASM wrapper around the frame-driven photon engine.

use crate::callbacks::{JsDisplay, JsOcclusion};
use crate::tags::{js_error, parse_lobe};
use anyhow::{Context, Result};
use js_sys::{Float64Array, Function, Uint8Array};
use nalgebra::Vector3;
use photon_core::engine::FrameSnapshot;
use photon_core::params::{
    photon_speed_from_slider, ParticleType, PathMode, SpinDirection, WindingRatio,
};
use photon_core::path::Lobe;
use photon_core::PhotonEngine;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPhotonEngine {
    pub(crate) engine: PhotonEngine,
    last_frame: Option<FrameSnapshot>,
}

fn flatten(points: &[Vector3<f64>]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

impl WasmPhotonEngine {
    fn run_tick(
        &mut self,
        now_ms: f64,
        occlusion: Option<&Function>,
        display: Option<&Function>,
    ) -> Result<FrameSnapshot> {
        let mut oracle = JsOcclusion::new(occlusion);
        let mut sink = JsDisplay::new(display);
        let frame = self.engine.tick(now_ms, &mut oracle, &mut sink);
        self.last_frame = Some(frame);
        oracle.finish().context("Occlusion test failed during tick")?;
        sink.finish().context("Display refresh failed during tick")?;
        Ok(frame)
    }

    pub(crate) fn trail_positions_vec(&self, lobe: &str) -> Result<Vec<f64>, String> {
        let lobe = parse_lobe(lobe).map_err(|e| e.to_string())?;
        Ok(self.engine.trail(lobe).flat_positions())
    }

    pub(crate) fn sample_path_vec(&self, points: usize) -> Result<Vec<f64>> {
        let positions = self.engine.sample_path(points)?;
        Ok(flatten(&positions))
    }
}

#[wasm_bindgen]
impl WasmPhotonEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmPhotonEngine {
        console_error_panic_hook::set_once();
        WasmPhotonEngine {
            engine: PhotonEngine::default(),
            last_frame: None,
        }
    }

    pub fn set_inner_radius(&mut self, value: f64) -> Result<(), JsValue> {
        self.engine.set_inner_radius(value).map_err(js_error)
    }

    pub fn set_outer_radius(&mut self, value: f64) -> Result<(), JsValue> {
        self.engine.set_outer_radius(value).map_err(js_error)
    }

    pub fn set_precession(&mut self, value: f64) -> Result<(), JsValue> {
        self.engine.set_precession(value).map_err(js_error)
    }

    pub fn set_winding_ratio(&mut self, tag: &str) -> Result<(), JsValue> {
        let winding: WindingRatio = tag.parse().map_err(js_error)?;
        self.engine.set_winding(winding);
        Ok(())
    }

    pub fn set_spin_direction(&mut self, tag: &str) -> Result<(), JsValue> {
        let spin: SpinDirection = tag.parse().map_err(js_error)?;
        self.engine.set_spin(spin);
        Ok(())
    }

    pub fn set_path_mode(&mut self, tag: &str) -> Result<(), JsValue> {
        let mode: PathMode = tag.parse().map_err(js_error)?;
        self.engine.set_mode(mode);
        Ok(())
    }

    pub fn set_particle_type(&mut self, tag: &str) -> Result<(), JsValue> {
        let particle: ParticleType = tag.parse().map_err(js_error)?;
        self.engine.set_particle(particle);
        Ok(())
    }

    pub fn set_photon_speed(&mut self, speed: f64) -> Result<(), JsValue> {
        self.engine.set_photon_speed(speed).map_err(js_error)
    }

    /// Log-scale slider input: speed = 10^position.
    pub fn set_photon_speed_slider(&mut self, position: f64) -> Result<(), JsValue> {
        self.set_photon_speed(photon_speed_from_slider(position))
    }

    pub fn set_trail_length_rotations(&mut self, rotations: f64) -> Result<(), JsValue> {
        self.engine
            .set_trail_length_rotations(rotations)
            .map_err(js_error)
    }

    pub fn set_transparency(&mut self, value: f64) -> Result<(), JsValue> {
        self.engine.set_transparency(value).map_err(js_error)
    }

    pub fn transparency(&self) -> f64 {
        self.engine.params().transparency
    }

    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        to_value(self.engine.params())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.engine.set_paused(paused);
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.engine.toggle_pause()
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    pub fn animation_time(&self) -> f64 {
        self.engine.animation_time()
    }

    pub fn reset_fields(&mut self) {
        self.engine.reset_fields();
    }

    pub fn reset_momentum(&mut self) {
        self.engine.reset_momentum();
    }

    pub fn clear_trails(&mut self) {
        self.engine.clear_trails();
    }

    /// Runs one frame. `occlusion(x, y, z) -> bool` and `display(report, text)` are optional.
    pub fn tick(
        &mut self,
        now_ms: f64,
        occlusion: Option<Function>,
        display: Option<Function>,
    ) -> Result<JsValue, JsValue> {
        let frame = self
            .run_tick(now_ms, occlusion.as_ref(), display.as_ref())
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_value(&frame).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Photon position of the most recent frame as `[x, y, z]`.
    pub fn photon_position(&self) -> Float64Array {
        let position = self
            .last_frame
            .map(|f| f.position)
            .unwrap_or_else(|| self.engine.current_sample().position);
        Float64Array::from(flatten(&[position]).as_slice())
    }

    /// Trail positions for `"single"`, `"left"` or `"right"` as a flat `[x, y, z, ...]` array.
    pub fn trail_positions(&self, lobe: &str) -> Result<Float64Array, JsValue> {
        let positions = self.trail_positions_vec(lobe).map_err(js_error)?;
        Ok(Float64Array::from(positions.as_slice()))
    }

    /// One obstruction flag per trail point (1 = obstructed).
    pub fn trail_obstruction(&self, lobe: &str) -> Result<Uint8Array, JsValue> {
        let lobe = parse_lobe(lobe).map_err(js_error)?;
        Ok(Uint8Array::from(
            self.engine.trail(lobe).obstruction_flags().as_slice(),
        ))
    }

    /// One lap of the current path, flattened, for drawing the guide curve.
    pub fn sample_path(&self, points: u32) -> Result<Float64Array, JsValue> {
        let flat = self
            .sample_path_vec(points as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Float64Array::from(flat.as_slice()))
    }

    pub fn is_split_mode(&self) -> bool {
        self.engine.params().motion.mode == PathMode::LemniscateS
    }

    pub fn active_lobe(&self) -> String {
        match self.engine.current_sample().lobe {
            Lobe::Single => "single",
            Lobe::Left => "left",
            Lobe::Right => "right",
        }
        .to_string()
    }
}

impl Default for WasmPhotonEngine {
    fn default() -> Self {
        Self::new()
    }
}
