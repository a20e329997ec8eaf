//! rppal SPI link with a dedicated data/command GPIO.
//!
//! Four-wire DBI type C: the selector is a separate line, so command and data
//! bytes go out as plain 8-bit SPI writes. Pixel data is already big-endian
//! in the staging buffer and is written unchanged.

use crate::transport::{ByteOrder, Interface, LinkError, Selector, SpiLink, TransportConfig};
use rppal::gpio::OutputPin;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

/// Map a config bus number onto rppal's enum
pub fn bus(index: u8) -> Option<Bus> {
    Some(match index {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        _ => return None,
    })
}

pub fn slave_select(index: u8) -> Option<SlaveSelect> {
    Some(match index {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        _ => return None,
    })
}

/// SPI device plus D/C line
pub struct RppalLink {
    spi: Spi,
    dc: OutputPin,
}

impl RppalLink {
    /// Open `bus`/`ss` in mode 0 at `clock_hz`
    pub fn open(bus: Bus, ss: SlaveSelect, clock_hz: u32, dc: OutputPin) -> Result<Self, LinkError> {
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0)
            .map_err(|e| LinkError::ConfigError(e.to_string()))?;

        tracing::debug!(
            "SPI initialized: Bus={:?}, SS={:?}, Speed={}Hz, Mode=0, DC=GPIO {}",
            bus,
            ss,
            clock_hz,
            dc.pin()
        );

        Ok(Self { spi, dc })
    }
}

impl SpiLink for RppalLink {
    fn configure(&mut self, config: &TransportConfig) -> Result<(), LinkError> {
        if config.interface == Interface::ThreeWire {
            return Err(LinkError::ConfigError(
                "9-bit three-wire framing is not supported by spidev".to_string(),
            ));
        }
        if config.byte_order == ByteOrder::LsbFirst {
            return Err(LinkError::ConfigError(
                "pixel data must be sent MSB first".to_string(),
            ));
        }

        match config.selector {
            Selector::Command => self.dc.set_low(),
            Selector::Data => self.dc.set_high(),
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), LinkError> {
        self.spi
            .write(buf)
            .map_err(|e| LinkError::WriteError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_mapping() {
        assert_eq!(bus(0), Some(Bus::Spi0));
        assert_eq!(bus(6), Some(Bus::Spi6));
        assert_eq!(bus(7), None);
        assert_eq!(slave_select(2), Some(SlaveSelect::Ss2));
        assert_eq!(slave_select(3), None);
    }
}
