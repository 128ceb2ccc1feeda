//! Real-time clock rules

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wirescan_bus::{write_register, Bus};
use wirescan_core::address::{HexAddr, PCF8563_ADDR, RV3028_ADDR};
use wirescan_core::RtcModel;

/// RV3028 EEPROM backup register
const RV3028_EEPROM_BACKUP: u8 = 0x37;
/// RV3028 EEPROM clock-output register
const RV3028_EEPROM_CLKOUT: u8 = 0x35;

/// Which real-time clock the board carries, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockVariant {
    #[default]
    None,
    Rv3028,
    Pcf8563,
}

impl ClockVariant {
    /// Address the clock answers on
    pub fn address(self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Rv3028 => Some(RV3028_ADDR),
            Self::Pcf8563 => Some(PCF8563_ADDR),
        }
    }

    pub fn model(self) -> Option<RtcModel> {
        match self {
            Self::None => None,
            Self::Rv3028 => Some(RtcModel::Rv3028),
            Self::Pcf8563 => Some(RtcModel::Pcf8563),
        }
    }
}

/// Bring up a clock found at its address
///
/// The RV3028 gets its clock output disabled and its backup register
/// programmed; the PCF8563 needs nothing.
pub fn configure_clock<B: Bus + ?Sized>(bus: &mut B, model: RtcModel, address: u8) {
    match model {
        RtcModel::Rv3028 => {
            info!(address = %HexAddr(address), "RV3028 RTC found");
            for (register, value) in [(RV3028_EEPROM_CLKOUT, 0x07), (RV3028_EEPROM_BACKUP, 0xB4)] {
                let status = write_register(bus, address, register, value);
                if !status.is_success() {
                    warn!(
                        address = %HexAddr(address),
                        register,
                        status = ?status,
                        "RV3028 register write failed"
                    );
                }
            }
        }
        RtcModel::Pcf8563 => info!(address = %HexAddr(address), "PCF8563 RTC found"),
    }
}
