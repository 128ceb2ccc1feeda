//! Wirescan Core - Core types and discovery tables
//!
//! This crate provides the foundational types for the Wirescan system:
//! - Well-known I2C addresses of the peripherals the scanner recognises
//! - Device, sensor, screen and keyboard types recorded by a scan
//! - The caller-owned discovery tables a scan writes into

pub mod address;
pub mod device;
pub mod registry;

pub use device::{
    BusId, DeviceKind, DeviceRecord, KeyboardModel, RtcModel, ScreenModel, ScreenState, SensorKind,
};
pub use registry::DiscoveryResult;
