//! Host-side frame buffers and conversion into the panel's pixel encoding.
//!
//! Frame buffers use the little-endian layouts common to Linux graphics
//! stacks. The panel expects RGB565 with the high byte first, which is what
//! [`FrameMapping::copy_to_rgb565be`] produces.

use std::ops::Deref;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use thiserror::Error;

/// Frame buffer pixel layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit little-endian `RRRRRGGGGGGBBBBB`
    Rgb565,
    /// 32-bit little-endian `xxxxxxxxRRRRRRRRGGGGGGGGBBBBBBBB`
    Xrgb8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }
}

/// Frame conversion errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame {width}x{height} does not cover rectangle {rect:?}")]
    OutOfBounds { width: u32, height: u32, rect: Rect },

    #[error("Staging buffer holds {actual} bytes, expected {expected}")]
    StagingSize { expected: usize, actual: usize },
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Rectangle covering a whole `width` x `height` surface
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Pack 8-bit channels into RGB565
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xf8) << 8) | ((g as u16 & 0xfc) << 3) | (b as u16 >> 3)
}

/// A CPU-accessible frame buffer
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    pitch: usize,
    pixels: RwLock<Vec<u8>>,
}

impl Framebuffer {
    /// Allocate a zeroed (black) frame buffer
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let pitch = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            pitch,
            pixels: RwLock::new(vec![0; pitch * height as usize]),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Map the pixels for CPU reads. Writers are blocked until the mapping
    /// is dropped.
    pub fn vmap(&self) -> FrameMapping<'_> {
        let pixels = self.pixels.read().unwrap_or_else(PoisonError::into_inner);
        tracing::trace!("fb: mapped {}x{} {:?}", self.width, self.height, self.format);
        FrameMapping { fb: self, pixels }
    }

    /// Overwrite every pixel with the colour `f(x, y)` returns
    pub fn fill_with<F>(&self, mut f: F)
    where
        F: FnMut(u32, u32) -> (u8, u8, u8),
    {
        let mut pixels = self.pixels.write().unwrap_or_else(PoisonError::into_inner);
        let bpp = self.format.bytes_per_pixel();

        for y in 0..self.height {
            let row = &mut pixels[y as usize * self.pitch..][..self.pitch];
            for (x, px) in row.chunks_exact_mut(bpp).enumerate() {
                let (r, g, b) = f(x as u32, y);
                match self.format {
                    PixelFormat::Rgb565 => px.copy_from_slice(&rgb565(r, g, b).to_le_bytes()),
                    PixelFormat::Xrgb8888 => px.copy_from_slice(&[b, g, r, 0xff]),
                }
            }
        }
    }
}

/// Read mapping of a [`Framebuffer`]; unmapped on drop
pub struct FrameMapping<'a> {
    fb: &'a Framebuffer,
    pixels: RwLockReadGuard<'a, Vec<u8>>,
}

impl FrameMapping<'_> {
    /// Convert `rect` into packed big-endian RGB565 in `dst`
    pub fn copy_to_rgb565be(&self, dst: &mut [u8], rect: &Rect) -> Result<(), FrameError> {
        let fb = self.fb;
        let covered = rect.x.checked_add(rect.width).is_some_and(|r| r <= fb.width)
            && rect.y.checked_add(rect.height).is_some_and(|b| b <= fb.height);
        if !covered {
            return Err(FrameError::OutOfBounds {
                width: fb.width,
                height: fb.height,
                rect: *rect,
            });
        }

        let out_pitch = rect.width as usize * 2;
        let expected = out_pitch * rect.height as usize;
        if dst.len() != expected {
            return Err(FrameError::StagingSize {
                expected,
                actual: dst.len(),
            });
        }

        let bpp = fb.format.bytes_per_pixel();
        for (row, out) in dst.chunks_exact_mut(out_pitch).enumerate() {
            let start = (rect.y as usize + row) * fb.pitch + rect.x as usize * bpp;
            let src = &self.pixels[start..start + rect.width as usize * bpp];

            for (px, out) in src.chunks_exact(bpp).zip(out.chunks_exact_mut(2)) {
                let value = match fb.format {
                    PixelFormat::Rgb565 => u16::from_le_bytes([px[0], px[1]]),
                    PixelFormat::Xrgb8888 => rgb565(px[2], px[1], px[0]),
                };
                out.copy_from_slice(&value.to_be_bytes());
            }
        }

        Ok(())
    }
}

impl Deref for FrameMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.pixels
    }
}

impl Drop for FrameMapping<'_> {
    fn drop(&mut self) {
        tracing::trace!("fb: unmapped");
    }
}
