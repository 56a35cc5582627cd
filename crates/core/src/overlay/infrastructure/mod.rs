pub mod svg_text_renderer;
