//! Frame content for the host daemon: image files and a test pattern.

pub mod transform;

pub use transform::scale_to_fit;

use crate::framebuffer::Framebuffer;
use std::path::Path;
use thiserror::Error;

/// Image processing errors
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
}

/// Colour bars, left to right
pub const TEST_PATTERN: [(u8, u8, u8); 8] = [
    (0xff, 0xff, 0xff),
    (0xff, 0xff, 0x00),
    (0x00, 0xff, 0xff),
    (0x00, 0xff, 0x00),
    (0xff, 0x00, 0xff),
    (0xff, 0x00, 0x00),
    (0x00, 0x00, 0xff),
    (0x00, 0x00, 0x00),
];

/// Load `path` and draw it into `fb`, scaled to fit
pub fn render_image<P: AsRef<Path>>(path: P, fb: &Framebuffer) -> Result<(), ProcessingError> {
    let path = path.as_ref();
    tracing::info!("Loading image {}", path.display());

    let img = image::open(path)?;
    let canvas = scale_to_fit(&img, fb.width(), fb.height());
    fb.fill_with(|x, y| {
        let px = canvas.get_pixel(x, y);
        (px[0], px[1], px[2])
    });

    Ok(())
}

/// Draw vertical colour bars into `fb`
pub fn test_pattern(fb: &Framebuffer) {
    tracing::info!("Drawing test pattern");

    let bar_width = (fb.width() / TEST_PATTERN.len() as u32).max(1);
    fb.fill_with(|x, _| {
        let bar = ((x / bar_width) as usize).min(TEST_PATTERN.len() - 1);
        TEST_PATTERN[bar]
    });
}
