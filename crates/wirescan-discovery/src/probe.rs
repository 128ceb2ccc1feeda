//! Display controller subtype probing
//!
//! SSD1306 and SH1106 controllers share the display address. Their status
//! register tells them apart, but it returns garbage for the first reads after
//! power-up, so it is polled until two consecutive reads agree.

use tracing::debug;
use wirescan_bus::Bus;
use wirescan_core::address::HexAddr;
use wirescan_core::ScreenModel;

/// Reads attempted before giving up on stabilization
pub const MAX_PROBE_ATTEMPTS: u8 = 4;

const STATUS_REGISTER: u8 = 0x00;

/// Outcome of a display probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayProbe {
    /// Last classification made
    pub model: ScreenModel,
    /// Last masked status nibble
    pub status: u8,
    /// Number of reads performed
    pub attempts: u8,
}

/// Identify the controller behind a display address
pub fn probe_display<B: Bus + ?Sized>(bus: &mut B, address: u8) -> ScreenModel {
    probe_display_detailed(bus, address).model
}

/// Identify the controller behind a display address, reporting how it went
///
/// A nibble outside both families keeps the previous classification, and the
/// result is the last classification made even if the status never settled.
pub fn probe_display_detailed<B: Bus + ?Sized>(bus: &mut B, address: u8) -> DisplayProbe {
    let mut status: u8 = 0;
    let mut attempts: u8 = 0;
    let mut model = ScreenModel::Unknown;

    loop {
        let previous = status;
        bus.begin_transmission(address);
        bus.write(STATUS_REGISTER);
        bus.end_transmission();
        bus.request_from(address, 1);
        // Nothing received keeps the last value
        if bus.available() > 0 {
            if let Some(byte) = bus.read() {
                status = byte;
            }
        }
        status &= 0x0F;

        match status {
            0x08 | 0x00 => model = ScreenModel::Sh1106,
            0x03 | 0x04 | 0x06 | 0x07 => model = ScreenModel::Ssd1306,
            _ => {}
        }
        attempts += 1;

        if status == previous || attempts >= MAX_PROBE_ATTEMPTS {
            break;
        }
    }

    debug!(
        address = %HexAddr(address),
        status = %format!("{:#x}", status),
        attempts,
        "Display subtype probed"
    );

    DisplayProbe {
        model,
        status,
        attempts,
    }
}
