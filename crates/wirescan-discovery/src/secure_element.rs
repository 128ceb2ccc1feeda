//! Secure-element (ATECC608B) reporting
//!
//! The driver itself is supplied by the caller through [`SecureElement`]. The
//! scanner only initializes it, reports its identity and lock state, and asks
//! for the public key once every zone is locked. Failures are diagnostics.

use thiserror::Error;
use tracing::{info, warn};
use wirescan_core::address::HexAddr;

#[derive(Error, Debug)]
pub enum SecureElementError {
    #[error("Secure element initialization failed at {0:#04x}")]
    InitFailed(u8),
    #[error("Failed to read configuration zone: {0}")]
    ConfigRead(String),
    #[error("Failed to generate public key: {0}")]
    KeyGeneration(String),
}

/// Identity and lock state read from the configuration zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureElementConfig {
    pub serial_number: [u8; 9],
    pub revision_number: [u8; 4],
    pub config_locked: bool,
    pub data_otp_locked: bool,
    pub slot0_locked: bool,
}

impl SecureElementConfig {
    /// Config zone, data/OTP zone and slot 0 are all locked
    pub fn is_fully_locked(&self) -> bool {
        self.config_locked && self.data_otp_locked && self.slot0_locked
    }
}

/// Driver for a secure element on the bus
pub trait SecureElement {
    fn begin(&mut self, address: u8) -> Result<(), SecureElementError>;
    fn read_config_zone(&mut self) -> Result<SecureElementConfig, SecureElementError>;
    fn generate_public_key(&mut self) -> Result<[u8; 64], SecureElementError>;
}

fn lock_label(locked: bool) -> &'static str {
    if locked {
        "Locked"
    } else {
        "Unlocked"
    }
}

/// Initialize the secure element at `address` and log what it reports
///
/// Returns the configuration zone when it could be read.
pub fn report_secure_element(
    element: &mut dyn SecureElement,
    address: u8,
) -> Option<SecureElementConfig> {
    if let Err(e) = element.begin(address) {
        warn!(address = %HexAddr(address), error = %e, "ATECC608B initialization failed");
        return None;
    }
    info!(address = %HexAddr(address), "ATECC608B initialized");

    let config = match element.read_config_zone() {
        Ok(config) => config,
        Err(e) => {
            warn!(
                address = %HexAddr(address),
                error = %e,
                "ATECC608B configuration read failed"
            );
            return None;
        }
    };

    info!(
        serial = %hex::encode(config.serial_number),
        revision = %hex::encode(config.revision_number),
        config = lock_label(config.config_locked),
        data = lock_label(config.data_otp_locked),
        slot0 = lock_label(config.slot0_locked),
        "ATECC608B identity"
    );

    if config.is_fully_locked() {
        match element.generate_public_key() {
            Ok(key) => info!(public_key = %hex::encode(key), "ATECC608B public key"),
            Err(e) => warn!(error = %e, "ATECC608B error generating public key"),
        }
    }

    Some(config)
}
