use tiny_skia::{Pixmap, Transform};
use usvg::{Options, Tree};

use crate::overlay::domain::text_renderer::TextRenderer;
use crate::shared::constants::{
    OVERLAY_ANCHOR, OVERLAY_COLOR, OVERLAY_FONT_FAMILY, OVERLAY_FONT_SIZE,
};
use crate::shared::frame::Frame;

const OVERLAY_FONT: &[u8] = include_bytes!("../../../assets/DejaVuSans-Bold.ttf");

/// Position, color and font of the overlay text.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    /// Left edge and baseline of the text, in pixels.
    pub anchor: (u32, u32),
    pub color: [u8; 3],
    pub font_size: f32,
    pub font_family: String,
    pub bold: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            anchor: OVERLAY_ANCHOR,
            color: OVERLAY_COLOR,
            font_size: OVERLAY_FONT_SIZE,
            font_family: OVERLAY_FONT_FAMILY.to_string(),
            bold: true,
        }
    }
}

/// Rasterises overlay text through an SVG document and composites it onto
/// a copy of the frame.
///
/// The overlay face is bundled with the crate and registered once per
/// renderer. Non-empty text that no loaded face can lay out is an error.
pub struct SvgTextRenderer {
    options: Options<'static>,
    style: OverlayStyle,
}

impl SvgTextRenderer {
    /// Renderer using the bundled overlay face and the default style.
    pub fn new() -> Self {
        let mut options = Options {
            font_family: OVERLAY_FONT_FAMILY.to_string(),
            ..Options::default()
        };
        options.fontdb_mut().load_font_data(OVERLAY_FONT.to_vec());
        log::debug!("Loaded {} font faces for overlay text", options.fontdb.len());
        Self::with_options(options, OverlayStyle::default())
    }

    pub fn with_options(options: Options<'static>, style: OverlayStyle) -> Self {
        Self { options, style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// SVG document drawing `text` over a transparent `width` x `height` canvas.
    pub fn svg_document(&self, width: u32, height: u32, text: &str) -> String {
        let style = &self.style;
        let [r, g, b] = style.color;
        let (x, y) = style.anchor;
        let weight = if style.bold { "bold" } else { "normal" };
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" fill="#{r:02x}{g:02x}{b:02x}">{text}</text></svg>"##,
            family = escape_xml(&style.font_family),
            size = style.font_size,
            text = escape_xml(text),
        )
    }
}

impl Default for SvgTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer for SvgTextRenderer {
    fn render(&self, frame: &Frame, text: &str) -> Result<Frame, Box<dyn std::error::Error>> {
        let channels = frame.channels();
        if channels != 3 && channels != 4 {
            return Err(format!("cannot draw on a {channels}-channel frame").into());
        }

        let svg = self.svg_document(frame.width(), frame.height(), text);
        let tree = Tree::from_str(&svg, &self.options)?;
        if tree.root().children().is_empty() && !text.trim().is_empty() {
            return Err(format!(
                "no font face matches \"{}\" for overlay text",
                self.style.font_family
            )
            .into());
        }
        let mut pixmap = Pixmap::new(frame.width(), frame.height())
            .ok_or("cannot allocate overlay canvas for an empty frame")?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        let mut out = frame.clone();
        composite(&mut out, &pixmap);
        Ok(out)
    }
}

/// Alpha-blends `overlay` (same dimensions as `frame`) onto `frame`.
fn composite(frame: &mut Frame, overlay: &Pixmap) {
    let width = frame.width() as usize;
    let has_alpha = frame.channels() == 4;
    let mut view = frame.as_ndarray_mut();

    for (i, pixel) in overlay.pixels().iter().enumerate() {
        let alpha = pixel.alpha();
        if alpha == 0 {
            continue;
        }
        let (row, col) = (i / width, i % width);
        let color = pixel.demultiply();
        let rgb = [color.red(), color.green(), color.blue()];
        for (c, &value) in rgb.iter().enumerate() {
            let base = view[[row, col, c]];
            view[[row, col, c]] = blend_channel(base, value, alpha);
        }
        if has_alpha {
            let base = view[[row, col, 3]];
            view[[row, col, 3]] = blend_channel(base, 255, alpha);
        }
    }
}

fn blend_channel(base: u8, overlay: u8, alpha: u8) -> u8 {
    let alpha_f = alpha as f32 / 255.0;
    (base as f32 * (1.0 - alpha_f) + overlay as f32 * alpha_f).round() as u8
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn renderer() -> SvgTextRenderer {
        SvgTextRenderer::new()
    }

    fn is_red(pixel: &[u8]) -> bool {
        pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60
    }

    #[test]
    fn test_svg_document_uses_fixed_style() {
        let svg = renderer().svg_document(640, 480, "avg. FPS: 25.00");
        assert!(svg.contains(r#"width="640""#));
        assert!(svg.contains(r#"height="480""#));
        assert!(svg.contains(r#"x="30" y="30""#));
        assert!(svg.contains(r#"font-size="30""#));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains("#ff0000"));
        assert!(svg.contains(">avg. FPS: 25.00</text>"));
    }

    #[test]
    fn test_svg_document_escapes_text() {
        let svg = renderer().svg_document(10, 10, "a<b & \"c\"");
        assert!(svg.contains("a&lt;b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_render_preserves_dimensions_and_input() {
        let frame = Frame::filled(64, 48, &[10, 20, 30], 3);
        let out = renderer().render(&frame, "avg. FPS: 10.00").unwrap();
        assert_eq!(out.width(), 64);
        assert_eq!(out.height(), 48);
        assert_eq!(out.channels(), 3);
        assert_eq!(out.index(), 3);
        assert_eq!(frame, Frame::filled(64, 48, &[10, 20, 30], 3));
    }

    #[test]
    fn test_render_draws_red_text_near_anchor() {
        let frame = Frame::filled(300, 60, &[0, 0, 0], 0);
        let out = renderer().render(&frame, "avg. FPS: 25.00").unwrap();
        let view = out.as_ndarray();

        let red_near_anchor = (5..40)
            .flat_map(|y| (30..220).map(move |x| (y, x)))
            .filter(|&(y, x)| is_red(&[view[[y, x, 0]], view[[y, x, 1]], view[[y, x, 2]]]))
            .count();
        assert!(red_near_anchor > 100, "only {red_near_anchor} red pixels");

        for (y, x) in [(0, 0), (59, 299), (50, 10)] {
            assert_eq!(&[view[[y, x, 0]], view[[y, x, 1]], view[[y, x, 2]]], &[0, 0, 0]);
        }
    }

    #[test]
    fn test_render_keeps_alpha_channel_opaque_under_text() {
        let frame = Frame::filled(300, 60, &[0, 0, 0, 0], 0);
        let out = renderer().render(&frame, "avg. FPS: 25.00").unwrap();
        let drawn = out
            .data()
            .chunks_exact(4)
            .filter(|px| is_red(px))
            .collect::<Vec<_>>();
        assert!(!drawn.is_empty());
        assert!(drawn.iter().all(|px| px[3] > 200));
    }

    #[test]
    fn test_render_fails_without_matching_font() {
        let bare = SvgTextRenderer::with_options(Options::default(), OverlayStyle::default());
        let frame = Frame::filled(300, 60, &[0, 0, 0], 0);
        let err = bare.render(&frame, "avg. FPS: 25.00").unwrap_err();
        assert!(err.to_string().contains("DejaVu Sans"));
    }

    #[test]
    fn test_empty_text_leaves_pixels_unchanged() {
        let frame = Frame::filled(16, 16, &[1, 2, 3, 255], 0);
        let out = renderer().render(&frame, "").unwrap();
        assert_eq!(out, frame);
    }

    #[rstest]
    #[case::gray(1)]
    #[case::gray_alpha(2)]
    fn test_rejects_unsupported_channel_count(#[case] channels: u8) {
        let frame = Frame::new(vec![0; 4 * channels as usize], 2, 2, channels, 0);
        assert!(renderer().render(&frame, "x").is_err());
    }

    #[test]
    fn test_rejects_empty_frame() {
        let frame = Frame::new(Vec::new(), 0, 0, 3, 0);
        assert!(renderer().render(&frame, "x").is_err());
    }

    #[test]
    fn test_composite_draws_opaque_overlay() {
        let mut frame = Frame::filled(2, 1, &[0, 0, 0], 0);
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        composite(&mut frame, &pixmap);
        assert_eq!(frame.data(), &[255, 0, 0, 255, 0, 0]);
    }

    #[test]
    fn test_composite_skips_transparent_pixels() {
        let mut frame = Frame::filled(2, 2, &[7, 8, 9, 100], 0);
        let pixmap = Pixmap::new(2, 2).unwrap();
        composite(&mut frame, &pixmap);
        assert_eq!(frame, Frame::filled(2, 2, &[7, 8, 9, 100], 0));
    }

    #[rstest]
    #[case::opaque(0, 255, 255, 255)]
    #[case::transparent(100, 255, 0, 100)]
    #[case::half(0, 255, 128, 128)]
    fn test_blend_channel(#[case] base: u8, #[case] overlay: u8, #[case] alpha: u8, #[case] expected: u8) {
        assert_eq!(blend_channel(base, overlay, alpha), expected);
    }
}
