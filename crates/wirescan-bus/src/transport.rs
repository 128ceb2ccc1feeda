//! Bus transaction primitives

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Failed to open bus device {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Bus device {0} does not support plain I2C transfers")]
    Unsupported(PathBuf),
}

/// Completion status of a write transaction
///
/// Codes follow the two-wire convention used by microcontroller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionStatus {
    /// Transaction acknowledged
    Success,
    /// Payload did not fit the transmit buffer
    DataTooLong,
    /// No acknowledge on the address byte
    AddressNack,
    /// No acknowledge on a data byte
    DataNack,
    /// Any other bus error
    Other,
    /// Bus timed out
    Timeout,
    /// A code outside the two-wire convention, kept as reported
    Unrecognised(u8),
}

impl TransmissionStatus {
    /// Decode a raw completion code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::DataTooLong,
            2 => Self::AddressNack,
            3 => Self::DataNack,
            4 => Self::Other,
            5 => Self::Timeout,
            other => Self::Unrecognised(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::DataTooLong => 1,
            Self::AddressNack => 2,
            Self::DataNack => 3,
            Self::Other => 4,
            Self::Timeout => 5,
            Self::Unrecognised(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// A physical or simulated I2C bus
///
/// Writes are staged between `begin_transmission` and `end_transmission`,
/// which performs the transfer. Reads are performed by `request_from` and the
/// received bytes are then drained with `read`.
pub trait Bus {
    /// Start staging a write to `address`
    fn begin_transmission(&mut self, address: u8);

    /// Stage one payload byte
    fn write(&mut self, byte: u8);

    /// Perform the staged write; an empty payload only probes the address
    fn end_transmission(&mut self) -> TransmissionStatus;

    /// Read up to `len` bytes from `address`, returning how many arrived
    fn request_from(&mut self, address: u8, len: usize) -> usize;

    /// Bytes received and not yet consumed
    fn available(&self) -> usize;

    /// Consume the next received byte
    fn read(&mut self) -> Option<u8>;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}
