//! Wirescan Bus - I2C transaction primitives and register access
//!
//! The [`Bus`] trait mirrors the begin/write/end and request/read transaction
//! model of microcontroller two-wire libraries. Implementations provided here:
//! - [`SimulatedBus`] for tests and replaying captured fixtures
//! - [`LinuxI2cBus`] for `/dev/i2c-N` character devices (Linux only)

#[cfg(target_os = "linux")]
pub mod linux;
pub mod register;
pub mod sim;
pub mod transport;

#[cfg(target_os = "linux")]
pub use linux::LinuxI2cBus;
pub use register::{read_register, write_register, RegisterWidth, SETTLE_DELAY_MS};
pub use sim::{FixtureError, SimulatedBus, SimulatedDevice, Transaction};
pub use transport::{Bus, BusError, TransmissionStatus};
