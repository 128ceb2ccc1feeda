//! Discovery tables filled by a bus scan
//!
//! The tables are owned by the caller and handed to the scanner by mutable
//! reference. Every key follows overwrite semantics: a later write for the same
//! address or sensor kind replaces the earlier one, nothing is merged, and
//! nothing is ever removed by a scan. A device that stops answering keeps its
//! stale entry until the caller clears the tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

use crate::address::HexAddr;
use crate::device::{DeviceKind, DeviceRecord, KeyboardModel, ScreenState, SensorKind};

/// Everything a scan has learned about the attached buses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Address -> device record, for every address that acknowledged
    #[serde(default)]
    pub devices: BTreeMap<u8, DeviceRecord>,
    /// Telemetry sensor kind -> address
    #[serde(default)]
    pub sensors: BTreeMap<SensorKind, u8>,
    /// Display selected for the node
    #[serde(default)]
    pub screen: Option<ScreenState>,
    /// Keyboard variant, when a keyboard answered
    #[serde(default)]
    pub keyboard: Option<KeyboardModel>,
}

impl DiscoveryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for an address
    pub fn record_device(&mut self, record: DeviceRecord) {
        if let Some(previous) = self.devices.insert(record.address, record) {
            if previous != record {
                trace!(
                    address = %HexAddr(record.address),
                    old_bus = %previous.bus,
                    new_bus = %record.bus,
                    "Device record replaced"
                );
            }
        }
    }

    /// Label an already recorded address with its identified kind
    ///
    /// Returns false when the address has no record.
    pub fn set_device_kind(&mut self, address: u8, kind: DeviceKind) -> bool {
        match self.devices.get_mut(&address) {
            Some(record) => {
                record.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Insert or replace the address for a sensor kind
    pub fn record_sensor(&mut self, kind: SensorKind, address: u8) {
        if let Some(previous) = self.sensors.insert(kind, address) {
            if previous != address {
                trace!(
                    sensor = %kind,
                    old = %HexAddr(previous),
                    new = %HexAddr(address),
                    "Sensor address replaced"
                );
            }
        }
    }

    pub fn set_screen(&mut self, screen: ScreenState) {
        self.screen = Some(screen);
    }

    pub fn set_keyboard(&mut self, model: KeyboardModel) {
        self.keyboard = Some(model);
    }

    /// Get the record for an address
    pub fn device(&self, address: u8) -> Option<&DeviceRecord> {
        self.devices.get(&address)
    }

    /// Get the address a sensor kind was found at
    pub fn sensor_address(&self, kind: SensorKind) -> Option<u8> {
        self.sensors.get(&kind).copied()
    }

    /// Number of addresses with a record
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
            && self.sensors.is_empty()
            && self.screen.is_none()
            && self.keyboard.is_none()
    }

    /// Drop every entry, for callers that want a re-scan without stale records
    pub fn clear(&mut self) {
        self.devices.clear();
        self.sensors.clear();
        self.screen = None;
        self.keyboard = None;
    }
}
