//! Raspberry Pi hardware backing for the driver (rppal).

pub mod gpio;
pub mod spi;

pub use gpio::{GpioBacklight, GpioReset};
pub use spi::RppalLink;

use crate::config::Config;
use crate::device::Device;
use crate::error::DriverError;
use crate::platform::{Backlight, Level, NoBacklight, PanelIo, ThreadDelay};
use rppal::gpio::Gpio;

/// Claim the pins and SPI device named in `config` and probe the panel
pub fn open(config: &Config) -> Result<Device<RppalLink>, DriverError> {
    let chip = Gpio::new().map_err(|e| DriverError::Configuration(format!("GPIO: {}", e)))?;

    let dc = gpio::output(&chip, config.gpio.dc, Level::Low).map_err(config_error)?;
    let reset = GpioReset::new(&chip, config.gpio.reset).map_err(config_error)?;
    let backlight: Box<dyn Backlight> = match config.gpio.backlight {
        Some(pin) => Box::new(GpioBacklight::new(&chip, pin).map_err(config_error)?),
        None => Box::new(NoBacklight),
    };

    let bus = spi::bus(config.spi.bus).ok_or_else(|| {
        DriverError::Configuration(format!("No SPI bus {}", config.spi.bus))
    })?;
    let ss = spi::slave_select(config.spi.slave_select).ok_or_else(|| {
        DriverError::Configuration(format!("No slave select {}", config.spi.slave_select))
    })?;
    let link = RppalLink::open(bus, ss, config.spi.clock_hz, dc)
        .map_err(|e| DriverError::Configuration(e.to_string()))?;

    let io = PanelIo {
        reset: Box::new(reset),
        delay: Box::new(ThreadDelay),
        backlight,
    };

    Device::probe(link, io, &config.panel)
}

fn config_error(err: crate::platform::PlatformError) -> DriverError {
    DriverError::Configuration(err.to_string())
}
