/// Label printed in front of the averaged frame rate.
pub const FPS_LABEL_PREFIX: &str = "avg. FPS";

/// Rendered in place of a number when no finite rate can be computed.
pub const FPS_UNAVAILABLE: &str = "n/a";

/// Top-left anchor of the overlay text, in pixels.
pub const OVERLAY_ANCHOR: (u32, u32) = (30, 30);

/// Overlay text color (opaque red).
pub const OVERLAY_COLOR: [u8; 3] = [255, 0, 0];

pub const OVERLAY_FONT_SIZE: f32 = 30.0;

/// Family of the bundled overlay face (`assets/DejaVuSans-Bold.ttf`).
pub const OVERLAY_FONT_FAMILY: &str = "DejaVu Sans";

/// Samples folded into the running average before it restarts.
///
/// Every count below 2^52 is exactly representable as `f64`, so the
/// weight denominator stays precise up to the reset.
pub const SAMPLE_COUNT_CEILING: u64 = 1 << 52;

/// Config attribute naming the wrapped source.
pub const CAMERA_NAME_ATTRIBUTE: &str = "camera_name";

pub const MODEL_NAME: &str = "overlay-fps";
