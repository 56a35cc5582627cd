use crate::shared::constants::{FPS_LABEL_PREFIX, FPS_UNAVAILABLE};

/// Overlay text for a frame rate, e.g. `avg. FPS: 25.00`.
pub fn fps_label(fps: Option<f64>) -> String {
    match fps {
        Some(fps) if fps.is_finite() => format!("{FPS_LABEL_PREFIX}: {fps:.2}"),
        _ => format!("{FPS_LABEL_PREFIX}: {FPS_UNAVAILABLE}"),
    }
}
