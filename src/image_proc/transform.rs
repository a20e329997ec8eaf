//! Image scaling for the panel's logical frame size.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

/// Scale `img` to fit within `max_width` x `max_height`, centred on a black
/// canvas of exactly that size (letterbox/pillarbox)
pub fn scale_to_fit(img: &DynamicImage, max_width: u32, max_height: u32) -> RgbImage {
    let (src_width, src_height) = img.dimensions();
    let mut canvas = RgbImage::from_pixel(max_width, max_height, Rgb([0, 0, 0]));
    if src_width == 0 || src_height == 0 {
        return canvas;
    }

    let scale_w = max_width as f32 / src_width as f32;
    let scale_h = max_height as f32 / src_height as f32;
    let scale = scale_w.min(scale_h);

    let new_width = ((src_width as f32 * scale) as u32).clamp(1, max_width);
    let new_height = ((src_height as f32 * scale) as u32).clamp(1, max_height);

    tracing::debug!(
        "Scaling {}x{} -> {}x{} (fit into {}x{})",
        src_width,
        src_height,
        new_width,
        new_height,
        max_width,
        max_height
    );

    let resized = img
        .resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
        .to_rgb8();

    let offset_x = (max_width - new_width) / 2;
    let offset_y = (max_height - new_height) / 2;
    image::imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    canvas
}
