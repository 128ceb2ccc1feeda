//! Simulated I2C bus
//!
//! Devices answer with a configurable completion status and serve register
//! contents from per-register response sequences. Each read consumes the next
//! response in the sequence; the last one repeats forever. Every primitive call
//! is recorded so tests can assert on the exact traffic a scan generated.
//!
//! Buses can also be loaded from TOML fixtures:
//!
//! ```toml
//! [[device]]
//! address = 0x76
//!
//! [[device.register]]
//! register = 0xD0
//! responses = [[0x61]]
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};
use wirescan_core::address;

use crate::transport::{Bus, TransmissionStatus};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse fixture: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid device address in fixture: {0:#04x}")]
    InvalidAddress(u8),
}

/// One primitive call observed by the simulated bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Begin(u8),
    Write(u8),
    End(TransmissionStatus),
    RequestFrom {
        address: u8,
        requested: usize,
        received: usize,
    },
    Delay(u32),
}

/// A device attached to a [`SimulatedBus`]
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub address: u8,
    /// Status returned by every write transaction addressed to this device
    pub status: TransmissionStatus,
    registers: HashMap<u8, VecDeque<Vec<u8>>>,
    pointer: Option<u8>,
}

impl SimulatedDevice {
    /// A device that acknowledges and has no readable registers
    pub fn new(address: u8) -> Self {
        Self {
            address,
            status: TransmissionStatus::Success,
            registers: HashMap::new(),
            pointer: None,
        }
    }

    /// Answer every write with `status` instead of acknowledging
    pub fn with_status(mut self, status: TransmissionStatus) -> Self {
        self.status = status;
        self
    }

    /// Serve the same bytes on every read of `register`
    pub fn with_register(self, register: u8, bytes: Vec<u8>) -> Self {
        self.with_register_sequence(register, vec![bytes])
    }

    /// Serve successive reads of `register` from `responses`, repeating the last
    pub fn with_register_sequence(mut self, register: u8, responses: Vec<Vec<u8>>) -> Self {
        self.registers.insert(register, responses.into_iter().collect());
        self
    }

    fn next_response(&mut self, register: u8) -> Vec<u8> {
        match self.registers.get_mut(&register) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default, rename = "device")]
    devices: Vec<DeviceFixture>,
}

#[derive(Debug, Deserialize)]
struct DeviceFixture {
    address: u8,
    #[serde(default)]
    status: Option<u8>,
    #[serde(default, rename = "register")]
    registers: Vec<RegisterFixture>,
}

#[derive(Debug, Deserialize)]
struct RegisterFixture {
    register: u8,
    responses: Vec<Vec<u8>>,
}

/// In-memory bus populated with [`SimulatedDevice`]s
#[derive(Debug, Default)]
pub struct SimulatedBus {
    devices: BTreeMap<u8, SimulatedDevice>,
    staged: Option<(u8, Vec<u8>)>,
    rx: VecDeque<u8>,
    transcript: Vec<Transaction>,
    writes: Vec<(u8, u8, u8)>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device, replacing any device at the same address
    pub fn add_device(&mut self, device: SimulatedDevice) {
        self.devices.insert(device.address, device);
    }

    /// Detach the device at `address`
    pub fn remove_device(&mut self, address: u8) -> Option<SimulatedDevice> {
        self.devices.remove(&address)
    }

    /// Load a bus from a TOML fixture file
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        let bus = Self::from_toml(&content)?;
        debug!(path = %path.display(), devices = bus.devices.len(), "Loaded bus fixture");
        Ok(bus)
    }

    /// Load a bus from a TOML fixture string
    pub fn from_toml(content: &str) -> Result<Self, FixtureError> {
        let file: FixtureFile = toml::from_str(content)?;
        let mut bus = Self::new();

        for fixture in file.devices {
            if !address::is_valid(fixture.address) {
                return Err(FixtureError::InvalidAddress(fixture.address));
            }
            let mut device = SimulatedDevice::new(fixture.address);
            if let Some(code) = fixture.status {
                device = device.with_status(TransmissionStatus::from_code(code));
            }
            for register in fixture.registers {
                device = device.with_register_sequence(register.register, register.responses);
            }
            bus.add_device(device);
        }

        Ok(bus)
    }

    /// Every primitive call since creation
    pub fn transcript(&self) -> &[Transaction] {
        &self.transcript
    }

    /// Addresses that received a zero-payload write, in order
    pub fn probed_addresses(&self) -> Vec<u8> {
        self.transcript
            .windows(2)
            .filter_map(|pair| match pair {
                [Transaction::Begin(address), Transaction::End(_)] => Some(*address),
                _ => None,
            })
            .collect()
    }

    /// Every address named by a write or read, in order
    pub fn touched_addresses(&self) -> Vec<u8> {
        self.transcript
            .iter()
            .filter_map(|t| match t {
                Transaction::Begin(address) => Some(*address),
                Transaction::RequestFrom { address, .. } => Some(*address),
                _ => None,
            })
            .collect()
    }

    /// Register writes acknowledged by devices, as (address, register, value)
    pub fn register_writes(&self) -> &[(u8, u8, u8)] {
        &self.writes
    }
}

impl Bus for SimulatedBus {
    fn begin_transmission(&mut self, address: u8) {
        self.transcript.push(Transaction::Begin(address));
        self.staged = Some((address, Vec::new()));
    }

    fn write(&mut self, byte: u8) {
        self.transcript.push(Transaction::Write(byte));
        if let Some((_, payload)) = self.staged.as_mut() {
            payload.push(byte);
        }
    }

    fn end_transmission(&mut self) -> TransmissionStatus {
        let status = match self.staged.take() {
            Some((address, payload)) => match self.devices.get_mut(&address) {
                Some(device) if device.status.is_success() => {
                    if let Some((&register, values)) = payload.split_first() {
                        device.pointer = Some(register);
                        for (offset, &value) in values.iter().enumerate() {
                            let target = register.wrapping_add(offset as u8);
                            self.writes.push((address, target, value));
                        }
                    }
                    TransmissionStatus::Success
                }
                Some(device) => device.status,
                None => TransmissionStatus::AddressNack,
            },
            None => TransmissionStatus::Other,
        };
        self.transcript.push(Transaction::End(status));
        status
    }

    fn request_from(&mut self, address: u8, len: usize) -> usize {
        self.rx.clear();
        if let Some(device) = self.devices.get_mut(&address) {
            if device.status.is_success() {
                if let Some(register) = device.pointer {
                    let response = device.next_response(register);
                    self.rx.extend(response.into_iter().take(len));
                }
            }
        }

        let received = self.rx.len();
        trace!(address, requested = len, received, "Simulated read");
        self.transcript.push(Transaction::RequestFrom {
            address,
            requested: len,
            received,
        });
        received
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.transcript.push(Transaction::Delay(ms));
    }
}
