pub mod fps_label;
pub mod running_average;
pub mod text_renderer;
