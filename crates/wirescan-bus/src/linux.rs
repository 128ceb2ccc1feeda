//! Linux i2c-dev backend
//!
//! Transfers go through the `I2C_RDWR` ioctl so a zero-length write can be
//! issued for presence probing, exactly like a two-wire address-only
//! transaction on a microcontroller.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

use crate::transport::{Bus, BusError, TransmissionStatus};

const I2C_RDWR: u64 = 0x0707;
const I2C_FUNCS: u64 = 0x0705;
const I2C_FUNC_I2C: u64 = 0x0000_0001;
const I2C_M_RD: u16 = 0x0001;

#[repr(C)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

/// A `/dev/i2c-N` adapter
pub struct LinuxI2cBus {
    file: File,
    staged: Option<(u8, Vec<u8>)>,
    rx: Vec<u8>,
    cursor: usize,
}

impl LinuxI2cBus {
    /// Open an adapter by device path
    pub fn open(path: &Path) -> Result<Self, BusError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| BusError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut funcs: libc::c_ulong = 0;
        // SAFETY: I2C_FUNCS writes a single unsigned long into `funcs`
        let rc = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                I2C_FUNCS as _,
                &mut funcs as *mut libc::c_ulong,
            )
        };
        if rc < 0 {
            return Err(BusError::Open {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }
        if (funcs as u64) & I2C_FUNC_I2C == 0 {
            return Err(BusError::Unsupported(path.to_path_buf()));
        }

        debug!(path = %path.display(), "Opened I2C adapter");
        Ok(Self {
            file,
            staged: None,
            rx: Vec::new(),
            cursor: 0,
        })
    }

    fn transfer(&self, address: u8, flags: u16, buf: &mut [u8]) -> io::Result<()> {
        let mut msg = I2cMsg {
            addr: address as u16,
            flags,
            len: buf.len() as u16,
            buf: buf.as_mut_ptr(),
        };
        let mut data = I2cRdwrIoctlData {
            msgs: &mut msg,
            nmsgs: 1,
        };
        // SAFETY: `msg` and `buf` outlive the call and `len` matches the buffer
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                I2C_RDWR as _,
                &mut data as *mut I2cRdwrIoctlData,
            )
        };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

/// Map a failed transfer onto the two-wire completion codes
pub(crate) fn status_from_errno(errno: Option<i32>) -> TransmissionStatus {
    match errno {
        Some(libc::ENXIO) | Some(libc::EREMOTEIO) => TransmissionStatus::AddressNack,
        Some(libc::ETIMEDOUT) => TransmissionStatus::Timeout,
        _ => TransmissionStatus::Other,
    }
}

impl Bus for LinuxI2cBus {
    fn begin_transmission(&mut self, address: u8) {
        self.staged = Some((address, Vec::new()));
    }

    fn write(&mut self, byte: u8) {
        if let Some((_, payload)) = self.staged.as_mut() {
            payload.push(byte);
        }
    }

    fn end_transmission(&mut self) -> TransmissionStatus {
        let Some((address, mut payload)) = self.staged.take() else {
            return TransmissionStatus::Other;
        };
        match self.transfer(address, 0, &mut payload) {
            Ok(()) => TransmissionStatus::Success,
            Err(e) => {
                let status = status_from_errno(e.raw_os_error());
                trace!(address, error = %e, status = ?status, "Write transfer failed");
                status
            }
        }
    }

    fn request_from(&mut self, address: u8, len: usize) -> usize {
        let mut buf = vec![0u8; len];
        self.cursor = 0;
        self.rx = match self.transfer(address, I2C_M_RD, &mut buf) {
            Ok(()) => buf,
            Err(e) => {
                trace!(address, error = %e, "Read transfer failed");
                Vec::new()
            }
        };
        self.rx.len()
    }

    fn available(&self) -> usize {
        self.rx.len() - self.cursor
    }

    fn read(&mut self) -> Option<u8> {
        let byte = self.rx.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
