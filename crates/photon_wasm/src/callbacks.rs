//! Adapters from JavaScript callbacks to the core's oracle and sink traits.

use anyhow::{anyhow, Result};
use js_sys::Function;
use photon_core::display::{DisplayReport, DisplaySink};
use photon_core::{OcclusionOracle, Vec3};
use wasm_bindgen::prelude::*;

/// Calls `occlusion(x, y, z)` and treats a truthy result as obstructed.
///
/// The trait cannot fail, so the first JS exception is kept and reported once the
/// frame has finished; later points in the same frame count as visible.
pub(crate) struct JsOcclusion<'a> {
    callback: Option<&'a Function>,
    error: Option<JsValue>,
}

impl<'a> JsOcclusion<'a> {
    pub(crate) fn new(callback: Option<&'a Function>) -> Self {
        Self {
            callback,
            error: None,
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(anyhow!("Occlusion callback threw: {:?}", err)),
            None => Ok(()),
        }
    }
}

impl OcclusionOracle for JsOcclusion<'_> {
    fn is_obstructed(&mut self, position: &Vec3) -> bool {
        let Some(callback) = self.callback else {
            return false;
        };
        if self.error.is_some() {
            return false;
        }
        match callback.call3(
            &JsValue::NULL,
            &JsValue::from_f64(position.x),
            &JsValue::from_f64(position.y),
            &JsValue::from_f64(position.z),
        ) {
            Ok(value) => value.is_truthy(),
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }
}

/// Calls `display(report, text)` with the serialized report and its formatted text.
pub(crate) struct JsDisplay<'a> {
    callback: Option<&'a Function>,
    error: Option<anyhow::Error>,
}

impl<'a> JsDisplay<'a> {
    pub(crate) fn new(callback: Option<&'a Function>) -> Self {
        Self {
            callback,
            error: None,
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn send(&self, report: &DisplayReport) -> Result<()> {
        let Some(callback) = self.callback else {
            return Ok(());
        };
        let payload = serde_wasm_bindgen::to_value(report)
            .map_err(|err| anyhow!("Failed to serialize display report: {}", err))?;
        callback
            .call2(&JsValue::NULL, &payload, &JsValue::from_str(&report.to_string()))
            .map_err(|err| anyhow!("Display callback threw: {:?}", err))?;
        Ok(())
    }
}

impl DisplaySink for JsDisplay<'_> {
    fn publish(&mut self, report: &DisplayReport) {
        if let Err(err) = self.send(report) {
            self.error.get_or_insert(err);
        }
    }
}
