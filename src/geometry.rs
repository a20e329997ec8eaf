//! Panel geometry: rotation, memory-access-order byte and addressing window.
//!
//! The controller scans its memory in native orientation. Rotation is realised
//! entirely in hardware through the MADCTL bits, so the host only needs to
//! swap the logical dimensions and program a matching window.

use thiserror::Error;

/// Row address order (mirror Y)
pub const MADCTL_MY: u8 = 1 << 7;
/// Column address order (mirror X)
pub const MADCTL_MX: u8 = 1 << 6;
/// Row/column exchange (swap axes)
pub const MADCTL_MV: u8 = 1 << 5;
/// BGR colour filter order
pub const MADCTL_BGR: u8 = 1 << 3;

/// Geometry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Illegal rotation {0}: must be a multiple of 90 degrees")]
    IllegalRotation(u32),

    #[error("Addressing window {start}+{len} exceeds the 16-bit address range")]
    WindowOverflow { start: u16, len: u16 },
}

/// Rotation angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Parse a rotation property. Values are reduced modulo 360 first, so
    /// 450 is accepted as 90.
    pub fn from_degrees(degrees: u32) -> Result<Self, GeometryError> {
        match degrees % 360 {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            _ => Err(GeometryError::IllegalRotation(degrees)),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// True when the panel's X and Y axes are exchanged
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }

    /// Logical (post-rotation) size for a panel of the given native size
    pub fn logical_size(self, native_width: u16, native_height: u16) -> (u16, u16) {
        if self.swaps_axes() {
            (native_height, native_width)
        } else {
            (native_width, native_height)
        }
    }
}

/// Memory-access-order (MADCTL) byte for a rotation and colour order.
pub fn address_mode(rotation: Rotation, bgr: bool) -> u8 {
    let mode = match rotation {
        Rotation::None => MADCTL_MX | MADCTL_MY,
        Rotation::Rotate90 => MADCTL_MX | MADCTL_MV,
        Rotation::Rotate180 => 0,
        Rotation::Rotate270 => MADCTL_MY | MADCTL_MV,
    };

    if bgr { mode | MADCTL_BGR } else { mode }
}

/// Column and page ranges the panel will fill with subsequent pixel data.
///
/// The end coordinates are programmed as `start + len`, the same values the
/// controller has always been given by this driver family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    pub column_start: u16,
    pub column_end: u16,
    pub page_start: u16,
    pub page_end: u16,
}

impl AddressWindow {
    /// Build the window for a logical area at the given panel offsets
    pub fn new(left: u16, top: u16, width: u16, height: u16) -> Result<Self, GeometryError> {
        let column_end = left
            .checked_add(width)
            .ok_or(GeometryError::WindowOverflow { start: left, len: width })?;
        let page_end = top
            .checked_add(height)
            .ok_or(GeometryError::WindowOverflow { start: top, len: height })?;

        Ok(Self {
            column_start: left,
            column_end,
            page_start: top,
            page_end,
        })
    }

    pub fn width(&self) -> u16 {
        self.column_end - self.column_start
    }

    pub fn height(&self) -> u16 {
        self.page_end - self.page_start
    }

    /// CASET payload: start and end as big-endian 16-bit values
    pub fn column_args(&self) -> [u8; 4] {
        be_pair(self.column_start, self.column_end)
    }

    /// RASET payload: start and end as big-endian 16-bit values
    pub fn page_args(&self) -> [u8; 4] {
        be_pair(self.page_start, self.page_end)
    }
}

fn be_pair(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}
