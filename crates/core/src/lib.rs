//! Passthrough frame-source decorator that measures upstream delivery
//! latency and stamps every frame with the running-average FPS.

pub mod overlay;
pub mod shared;
pub mod sink;
pub mod source;
