//! Parsing of the string tags the UI sends.

use photon_core::error::ParameterError;
use photon_core::path::Lobe;
use wasm_bindgen::prelude::*;

pub(crate) fn parse_lobe(tag: &str) -> Result<Lobe, ParameterError> {
    match tag.trim() {
        "" | "single" | "main" => Ok(Lobe::Single),
        "left" => Ok(Lobe::Left),
        "right" => Ok(Lobe::Right),
        other => Err(ParameterError::UnknownTag {
            kind: "trail",
            value: other.to_string(),
        }),
    }
}

pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
