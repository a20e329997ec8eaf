//! Sitronix ST7735R register map and compiled-in panel profiles.
//!
//! Register payloads used during bring-up are calibration constants from the
//! panel datasheets. They are reproduced byte for byte and must not be derived.

/// Controller opcodes (MIPI DCS subset plus ST7735R vendor registers)
pub mod cmd {
    pub const SOFT_RESET: u8 = 0x01;
    pub const ENTER_SLEEP_MODE: u8 = 0x10;
    pub const EXIT_SLEEP_MODE: u8 = 0x11;
    pub const ENTER_NORMAL_MODE: u8 = 0x13;
    pub const EXIT_INVERT_MODE: u8 = 0x20;
    pub const SET_DISPLAY_OFF: u8 = 0x28;
    pub const SET_DISPLAY_ON: u8 = 0x29;
    pub const SET_COLUMN_ADDRESS: u8 = 0x2a;
    pub const SET_PAGE_ADDRESS: u8 = 0x2b;
    pub const WRITE_MEMORY_START: u8 = 0x2c;
    pub const SET_ADDRESS_MODE: u8 = 0x36;
    pub const SET_PIXEL_FORMAT: u8 = 0x3a;

    pub const FRMCTR1: u8 = 0xb1; // Frame rate, normal mode
    pub const FRMCTR2: u8 = 0xb2; // Frame rate, idle mode
    pub const FRMCTR3: u8 = 0xb3; // Frame rate, partial mode
    pub const INVCTR: u8 = 0xb4;
    pub const PWCTR1: u8 = 0xc0;
    pub const PWCTR2: u8 = 0xc1;
    pub const PWCTR3: u8 = 0xc2;
    pub const PWCTR4: u8 = 0xc3;
    pub const PWCTR5: u8 = 0xc4;
    pub const VMCTR1: u8 = 0xc5;
    pub const GAMCTRP1: u8 = 0xe0;
    pub const GAMCTRN1: u8 = 0xe1;

    /// DCS pixel format code for 16 bits per pixel
    pub const PIXEL_FMT_16BIT: u8 = 0x05;
}

/// Power/timing register script issued between sleep-exit and inversion-off.
pub const REGISTER_PROGRAM: &[(u8, &[u8])] = &[
    (cmd::FRMCTR1, &[0x01, 0x2c, 0x2d]),
    (cmd::FRMCTR2, &[0x01, 0x2c, 0x2d]),
    (cmd::FRMCTR3, &[0x01, 0x2c, 0x2d, 0x01, 0x2c, 0x2d]),
    (cmd::INVCTR, &[0x07]),
    (cmd::PWCTR1, &[0xa2, 0x02, 0x84]),
    (cmd::PWCTR2, &[0xc5]),
    (cmd::PWCTR3, &[0x0a, 0x00]),
    (cmd::PWCTR4, &[0x8a, 0x2a]),
    (cmd::PWCTR5, &[0x8a, 0xee]),
    (cmd::VMCTR1, &[0x0e]),
];

/// Positive gamma curve
pub const GAMMA_POSITIVE: [u8; 16] = [
    0x02, 0x1c, 0x07, 0x12, 0x37, 0x32, 0x29, 0x2d, 0x29, 0x25, 0x2b, 0x39, 0x00, 0x01, 0x03,
    0x10,
];

/// Negative gamma curve
pub const GAMMA_NEGATIVE: [u8; 16] = [
    0x03, 0x1d, 0x07, 0x06, 0x2e, 0x2c, 0x29, 0x2d, 0x2e, 0x2e, 0x37, 0x3f, 0x00, 0x00, 0x02,
    0x10,
];

/// Fixed video mode of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub hdisplay: u16,
    pub vdisplay: u16,
    pub width_mm: u16,
    pub height_mm: u16,
}

impl DisplayMode {
    pub const fn simple(hdisplay: u16, vdisplay: u16, width_mm: u16, height_mm: u16) -> Self {
        Self {
            hdisplay,
            vdisplay,
            width_mm,
            height_mm,
        }
    }

    /// Whether `candidate` can be driven by a panel fixed to this mode.
    /// Physical size is informational and does not take part.
    pub fn accepts(&self, candidate: &DisplayMode) -> bool {
        self.hdisplay == candidate.hdisplay && self.vdisplay == candidate.vdisplay
    }
}

/// Per-variant panel description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelProfile {
    /// Device-tree style compatible string
    pub compatible: &'static str,
    /// SPI device id
    pub id: &'static str,
    pub mode: DisplayMode,
    pub left_offset: u16,
    pub top_offset: u16,
    /// Panel cannot be read back over SPI
    pub write_only: bool,
    /// Panel colour filter is BGR ordered
    pub bgr: bool,
}

pub const YYH_TFT18019: PanelProfile = PanelProfile {
    compatible: "yyh,tft18019",
    id: "tft18019",
    mode: DisplayMode::simple(128, 160, 28, 35),
    left_offset: 1,
    top_offset: 2,
    write_only: true,
    bgr: false,
};

/// Adafruit 1.8" breakout
pub const JD_T18003_T01: PanelProfile = PanelProfile {
    compatible: "jianda,jd-t18003-t01",
    id: "jd-t18003-t01",
    mode: DisplayMode::simple(128, 160, 28, 35),
    left_offset: 0,
    top_offset: 0,
    write_only: true,
    bgr: false,
};

pub const OKAYA_RH128128T: PanelProfile = PanelProfile {
    compatible: "okaya,rh128128t",
    id: "rh128128t",
    mode: DisplayMode::simple(128, 128, 25, 26),
    left_offset: 2,
    top_offset: 3,
    write_only: true,
    bgr: true,
};

/// All supported panel variants
pub static PANELS: &[PanelProfile] = &[YYH_TFT18019, JD_T18003_T01, OKAYA_RH128128T];

/// Find the profile for a compatible string or SPI device id
pub fn lookup(name: &str) -> Option<&'static PanelProfile> {
    let name = name.trim();
    PANELS.iter().find(|p| p.compatible == name || p.id == name)
}
