use serde::Deserialize;

use crate::overlay::overlay_error::OverlayError;
use crate::shared::constants::{CAMERA_NAME_ATTRIBUTE, MODEL_NAME};

/// Attributes of an FPS overlay: which source to wrap.
///
/// Unknown attributes are ignored so hosts can pass their full attribute map.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct OverlayConfig {
    #[serde(default)]
    pub camera_name: String,
}

impl OverlayConfig {
    pub fn new(camera_name: impl Into<String>) -> Self {
        Self {
            camera_name: camera_name.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        serde_json::from_str(json).map_err(|e| OverlayError::Configuration(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, OverlayError> {
        serde_json::from_value(value).map_err(|e| OverlayError::Configuration(e.to_string()))
    }

    /// Checks required attributes and returns the names this config depends on.
    pub fn validate(&self) -> Result<Vec<String>, OverlayError> {
        if self.camera_name.trim().is_empty() {
            return Err(OverlayError::Configuration(format!(
                "expected {CAMERA_NAME_ATTRIBUTE:?} attribute for {MODEL_NAME}"
            )));
        }
        Ok(vec![self.camera_name.clone()])
    }
}
