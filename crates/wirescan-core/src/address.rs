//! Well-known 7-bit I2C addresses
//!
//! Most peripherals sit at a fixed address; a few families share one and are
//! told apart by register probing in the scanner.

use std::ops::RangeInclusive;

/// First address visited by a scan
pub const SCAN_FIRST: u8 = 1;
/// Last address visited by a scan
pub const SCAN_LAST: u8 = 126;

/// Addresses visited by a full scan, in ascending order
pub fn scan_range() -> RangeInclusive<u8> {
    SCAN_FIRST..=SCAN_LAST
}

// Displays
pub const SSD1306_ADDR: u8 = 0x3C;
pub const ST7567_ADDR: u8 = 0x3F;

// Secure element
pub const ATECC608B_ADDR: u8 = 0x35;

// Real-time clocks
pub const RV3028_ADDR: u8 = 0x52;
pub const PCF8563_ADDR: u8 = 0x51;

// Input
pub const CARDKB_ADDR: u8 = 0x5F;

/// AXP192 and AXP2101 share this address
pub const AXP_PMU_ADDR: u8 = 0x34;

// Environmental sensors (BME680 / BME280 / BMP280)
pub const BME_ADDR: u8 = 0x76;
pub const BME_ADDR_ALT: u8 = 0x77;

// Power monitors (INA260 / INA219)
pub const INA_ADDR: u8 = 0x40;
pub const INA_ADDR_ALT: u8 = 0x41;

// Fixed-identity sensors
pub const MCP9808_ADDR: u8 = 0x18;
pub const SHTC3_ADDR: u8 = 0x70;
pub const LPS22HB_ADDR: u8 = 0x5C;
pub const LPS22HB_ADDR_ALT: u8 = 0x5D;
pub const QMC6310_ADDR: u8 = 0x1C;
pub const QMI8658_ADDR: u8 = 0x6B;
pub const QMC5883L_ADDR: u8 = 0x0D;

/// Displays an address as `0x3c` in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexAddr(pub u8);

impl std::fmt::Display for HexAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Check whether an address can belong to a device (0x01-0x7F)
///
/// Address 0 is the general-call address and never identifies one device.
pub fn is_valid(address: u8) -> bool {
    (0x01..=0x7F).contains(&address)
}
