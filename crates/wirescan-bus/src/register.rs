//! Register access over a [`Bus`]

use tracing::{debug, trace};

use crate::transport::{Bus, TransmissionStatus};

/// Turnaround time between selecting a register and reading it back
pub const SETTLE_DELAY_MS: u32 = 20;

/// Width of an identification register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWidth {
    Byte = 1,
    Word = 2,
}

impl RegisterWidth {
    /// Bytes read back for this width
    pub fn bytes(self) -> usize {
        self as usize
    }
}

/// Read a one- or two-byte register
///
/// Two bytes are composed big-endian. A short read returns the single byte
/// received, and an empty read returns 0, which cannot be told apart from a
/// register that really holds zero. Nothing is retried and nothing fails.
pub fn read_register<B: Bus + ?Sized>(
    bus: &mut B,
    address: u8,
    register: u8,
    width: RegisterWidth,
) -> u16 {
    bus.begin_transmission(address);
    bus.write(register);
    // Status deliberately ignored, a failed select shows up as a short read
    let _ = bus.end_transmission();
    bus.delay_ms(SETTLE_DELAY_MS);

    bus.request_from(address, width.bytes());
    let available = bus.available();
    debug!(address, register, available, "Register read");

    let value = if available == 2 {
        let msb = bus.read().unwrap_or(0) as u16;
        let lsb = bus.read().unwrap_or(0) as u16;
        (msb << 8) | lsb
    } else if available > 0 {
        bus.read().unwrap_or(0) as u16
    } else {
        0
    };

    trace!(address, register, value, "Register value");
    value
}

/// Write a single register in one transaction
pub fn write_register<B: Bus + ?Sized>(
    bus: &mut B,
    address: u8,
    register: u8,
    value: u8,
) -> TransmissionStatus {
    bus.begin_transmission(address);
    bus.write(register);
    bus.write(value);
    let status = bus.end_transmission();
    trace!(address, register, value, status = ?status, "Register write");
    status
}
