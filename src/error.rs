use thiserror::Error;
use wasm_bindgen::JsValue;

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Failures at the fallible edges of the overlay (config decoding, DOM wiring).
///
/// Positioning and reconciliation never produce these; they degrade instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    #[error("invalid overlay config: {0}")]
    Config(String),

    #[error("dom: {0}")]
    Dom(String),
}

impl From<serde_json::Error> for OverlayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<JsValue> for OverlayError {
    fn from(v: JsValue) -> Self {
        Self::Dom(v.as_string().unwrap_or_else(|| format!("{v:?}")))
    }
}
