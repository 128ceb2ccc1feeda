//! Wirescan Discovery - I2C bus scanning and device identification
//!
//! This crate provides:
//! - Display controller subtype probing
//! - Secure-element and real-time-clock rule helpers
//! - The bus scanner that presence-tests every address and identifies what answered

pub mod probe;
pub mod rtc;
pub mod scanner;
pub mod secure_element;

pub use probe::{probe_display, probe_display_detailed, DisplayProbe};
pub use rtc::ClockVariant;
pub use scanner::{ScanReport, Scanner, ScannerConfig};
pub use secure_element::{SecureElement, SecureElementConfig, SecureElementError};
