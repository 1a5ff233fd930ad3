//! Engine error taxonomy
//!
//! None of these reach the user as a visible message. Callers degrade
//! (skip a frame, show a static placeholder) and log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Drawing context could not be created (e.g. no WebGL/WebGPU)
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Surface vanished while the loop was running (element unmounted)
    #[error("drawing surface lost")]
    SurfaceLost,

    /// Engine was already torn down
    #[error("engine has been destroyed")]
    Destroyed,

    /// A listener, timer or frame registration was refused by the host
    #[error("host registration failed: {0}")]
    Host(String),

    #[error("invalid engine options: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for EngineError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        EngineError::Host(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<EngineError> for wasm_bindgen::JsValue {
    fn from(err: EngineError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
