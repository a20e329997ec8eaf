//! GPIO lines for the panel: reset and backlight enable.

use crate::platform::{Backlight, Level, PlatformError, ResetLine};
use rppal::gpio::{Gpio, OutputPin};

/// Claim `pin` as an output, driven to `initial`
pub fn output(gpio: &Gpio, pin: u8, initial: Level) -> Result<OutputPin, PlatformError> {
    let mut out = gpio
        .get(pin)
        .map_err(|e| PlatformError::Gpio(format!("GPIO {}: {}", pin, e)))?
        .into_output();
    match initial {
        Level::Low => out.set_low(),
        Level::High => out.set_high(),
    }
    Ok(out)
}

/// Active-low reset line
pub struct GpioReset {
    pin: OutputPin,
}

impl GpioReset {
    /// Idles high so the panel is not held in reset
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, PlatformError> {
        let pin = output(gpio, pin, Level::High)?;
        tracing::debug!("Reset line on GPIO {}", pin.pin());
        Ok(Self { pin })
    }
}

impl ResetLine for GpioReset {
    fn set_level(&mut self, level: Level) {
        match level {
            Level::Low => self.pin.set_low(),
            Level::High => self.pin.set_high(),
        }
    }
}

/// Backlight switched by a GPIO, high = on
pub struct GpioBacklight {
    pin: OutputPin,
}

impl GpioBacklight {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, PlatformError> {
        let pin = output(gpio, pin, Level::Low)?;
        tracing::debug!("Backlight on GPIO {}", pin.pin());
        Ok(Self { pin })
    }
}

impl Backlight for GpioBacklight {
    fn enable(&mut self) -> Result<(), PlatformError> {
        tracing::debug!("Backlight ON");
        self.pin.set_high();
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PlatformError> {
        tracing::debug!("Backlight OFF");
        self.pin.set_low();
        Ok(())
    }
}

impl Drop for GpioBacklight {
    fn drop(&mut self) {
        // Leave the panel dark when the daemon exits
        self.pin.set_low();
    }
}
