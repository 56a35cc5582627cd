use std::path::Path;

use crate::shared::frame::Frame;
use crate::sink::domain::image_writer::ImageWriter;

/// Encodes RGB or RGBA frames with the `image` crate; the format follows
/// the path's extension.
#[derive(Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (width, height) = (frame.width(), frame.height());
        let data = frame.data().to_vec();
        match frame.channels() {
            3 => image::RgbImage::from_raw(width, height, data)
                .ok_or("frame data does not match its dimensions")?
                .save(path)?,
            4 => image::RgbaImage::from_raw(width, height, data)
                .ok_or("frame data does not match its dimensions")?
                .save(path)?,
            n => return Err(format!("cannot encode a {n}-channel frame").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_rgb_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.png");
        let frame = Frame::filled(20, 10, &[50, 100, 200], 0);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(5, 5).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_rgba_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = Frame::filled(4, 4, &[1, 2, 3, 128], 0);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 128]);
    }

    #[test]
    fn test_write_rejects_unsupported_channels() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(vec![0; 8], 2, 2, 2, 0);
        assert!(ImageFileWriter::new()
            .write(&dir.path().join("out.png"), &frame)
            .is_err());
    }
}
