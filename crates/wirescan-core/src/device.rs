//! Types for tracking discovered bus peripherals

use serde::{Deserialize, Serialize};

/// Numeric identifier of a physical bus instance (0 for the first bus, 1 for the second, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(pub u8);

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display controller family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenModel {
    #[default]
    Unknown = 0,
    Ssd1306 = 1,
    Sh1106 = 2,
}

impl ScreenModel {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// The display chosen for this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenState {
    pub address: u8,
    pub model: ScreenModel,
}

/// Keyboard variant sharing the keyboard address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardModel {
    /// M5Stack CardKB
    #[default]
    CardKb = 0x00,
    /// RAK14004 keypad
    Rak14004 = 0x02,
}

impl KeyboardModel {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Real-time clock chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtcModel {
    Rv3028,
    Pcf8563,
}

/// Telemetry sensor kinds consumed by the sensor drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Bme280,
    Bme680,
    Bmp280,
    Mcp9808,
    Ina260,
    Ina219,
    Shtc3,
    Lps22,
    Qmc6310,
    Qmi8658,
    Qmc5883l,
}

impl SensorKind {
    /// Part name as printed in diagnostics
    pub fn part_name(self) -> &'static str {
        match self {
            Self::Bme280 => "BME-280",
            Self::Bme680 => "BME-680",
            Self::Bmp280 => "BMP-280",
            Self::Mcp9808 => "MCP9808",
            Self::Ina260 => "INA260",
            Self::Ina219 => "INA219",
            Self::Shtc3 => "SHTC3",
            Self::Lps22 => "LPS22HB",
            Self::Qmc6310 => "QMC6310",
            Self::Qmi8658 => "QMI8658",
            Self::Qmc5883l => "QMC5883L",
        }
    }

    /// High-rate sensors are sampled internally rather than reported as telemetry
    pub fn is_high_rate(self) -> bool {
        matches!(self, Self::Qmc6310 | Self::Qmi8658 | Self::Qmc5883l)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.part_name())
    }
}

/// What the scanner decided lives at an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum DeviceKind {
    /// Responded, but no identification rule matched
    #[default]
    Unidentified,
    Display(ScreenModel),
    MonochromeDisplay,
    SecureElement,
    Rtc(RtcModel),
    Keyboard(KeyboardModel),
    Pmu,
    Sensor(SensorKind),
}

/// A device that acknowledged its address during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// 7-bit bus address
    pub address: u8,
    /// Bus the device was found on
    pub bus: BusId,
    /// Identification result
    #[serde(default)]
    pub kind: DeviceKind,
}

impl DeviceRecord {
    /// Create a record for a device that has not been identified yet
    pub fn new(address: u8, bus: BusId) -> Self {
        Self {
            address,
            bus,
            kind: DeviceKind::Unidentified,
        }
    }
}
