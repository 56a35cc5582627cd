pub mod config;
pub mod domain;
pub mod fps_overlay_reader;
pub mod infrastructure;
pub mod overlay_error;
