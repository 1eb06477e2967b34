//! Linux spidev backend.
//!
//! Opens `/dev/spidev0.<channel>`, takes an exclusive lock on it, applies the
//! bus parameters with the `SPI_IOC_WR_*` requests and runs each transfer as a
//! single `SPI_IOC_MESSAGE(1)`.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use glove_traits::{BoxError, SpiBus};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};
use crate::spi::{BusConfig, SpiIocTransfer, SpiMode};

mod ioctl {
    use crate::spi::{SPI_IOC_MAGIC, SpiIocTransfer};

    nix::ioctl_write_ptr!(wr_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_read!(rd_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_write_ptr!(wr_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    nix::ioctl_read!(rd_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    nix::ioctl_write_ptr!(wr_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
    nix::ioctl_read!(rd_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
    // Request size is `len * size_of::<SpiIocTransfer>()`, i.e. SPI_IOC_MESSAGE(len).
    nix::ioctl_write_buf!(message, SPI_IOC_MAGIC, 0, SpiIocTransfer<'_>);
}

/// Device node for a channel on SPI controller 0.
pub fn device_path(channel: u8) -> PathBuf {
    PathBuf::from(format!("/dev/spidev0.{channel}"))
}

pub struct SpidevBus {
    file: File,
    path: PathBuf,
    config: BusConfig,
    mask_transfer_errors: bool,
}

impl SpidevBus {
    /// Open channel `channel` in mode 0. Non-positive speed or word size
    /// select the defaults (5 MHz, 8 bits).
    pub fn open(channel: u8, max_speed_hz: i64, bits_per_word: i64) -> Result<Self> {
        let config = BusConfig::resolve(max_speed_hz, bits_per_word);
        Self::open_path(&device_path(channel), config)
    }

    /// Open `path` exclusively and apply `config`. A failing configuration
    /// step drops the handle; nothing already applied is rolled back.
    pub fn open_path(path: &Path, config: BusConfig) -> Result<Self> {
        let shown = path.display().to_string();
        debug!(path = %shown, "spi: opening device");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| HwError::Open {
                path: shown.clone(),
                source,
            })?;
        lock_exclusive(&file, &shown)?;

        let fd = file.as_raw_fd();
        let mode = config.mode.bits();
        // SAFETY: fd is open for the lifetime of `file`; the pointers refer to live locals.
        unsafe { ioctl::wr_mode(fd, &mode) }.map_err(|e| config_err("mode", e))?;
        debug!(mode, "spi: mode set");
        unsafe { ioctl::wr_max_speed_hz(fd, &config.max_speed_hz) }
            .map_err(|e| config_err("max_speed_hz", e))?;
        debug!(max_speed_hz = config.max_speed_hz, "spi: max speed set");
        unsafe { ioctl::wr_bits_per_word(fd, &config.bits_per_word) }
            .map_err(|e| config_err("bits_per_word", e))?;
        debug!(bits_per_word = config.bits_per_word, "spi: word size set");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            config,
            mask_transfer_errors: false,
        })
    }

    /// Reproduce the legacy behaviour where a failed transfer reports success
    /// with an all-zero reply. Off by default.
    pub fn with_legacy_error_masking(mut self, on: bool) -> Self {
        self.mask_transfer_errors = on;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parameters requested at open time.
    pub fn config(&self) -> BusConfig {
        self.config
    }

    /// Parameters as the driver currently reports them.
    pub fn read_back(&self) -> Result<BusConfig> {
        let fd = self.file.as_raw_fd();
        let mut mode = 0u8;
        let mut max_speed_hz = 0u32;
        let mut bits_per_word = 0u8;
        // SAFETY: fd is open; each pointer refers to a live, correctly sized local.
        unsafe { ioctl::rd_mode(fd, &mut mode) }.map_err(|e| config_err("read mode", e))?;
        unsafe { ioctl::rd_max_speed_hz(fd, &mut max_speed_hz) }
            .map_err(|e| config_err("read max_speed_hz", e))?;
        unsafe { ioctl::rd_bits_per_word(fd, &mut bits_per_word) }
            .map_err(|e| config_err("read bits_per_word", e))?;
        Ok(BusConfig {
            mode: SpiMode::from_bits(mode),
            max_speed_hz,
            // The driver reports 0 for the 8-bit default.
            bits_per_word: if bits_per_word == 0 { 8 } else { bits_per_word },
        })
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let outcome = {
            let xfer = SpiIocTransfer::half_duplex(buf, &self.config)?;
            // SAFETY: the descriptor borrows `buf` mutably for this block, so the
            // addresses it carries stay valid until the ioctl returns.
            unsafe { ioctl::message(fd, std::slice::from_ref(&xfer)) }
        };
        settle(buf, outcome, self.mask_transfer_errors)
    }
}

impl SpiBus for SpidevBus {
    fn transfer(&mut self, buf: &mut [u8]) -> std::result::Result<(), BoxError> {
        self.transfer_in_place(buf).map_err(Into::into)
    }
}

/// Turn the ioctl result into the transfer result. With `mask` set a failure
/// leaves an all-zero reply and reports success.
fn settle(buf: &mut [u8], outcome: nix::Result<libc::c_int>, mask: bool) -> Result<()> {
    match outcome {
        Ok(_) => {
            trace!(len = buf.len(), "spi: transfer ok");
            Ok(())
        }
        Err(errno) if mask => {
            warn!(error = %errno, "spi: transfer failed; masking as zero reply");
            buf.fill(0);
            Ok(())
        }
        Err(errno) => Err(HwError::Transfer(std::io::Error::from(errno))),
    }
}

fn config_err(what: &'static str, errno: nix::errno::Errno) -> HwError {
    warn!(what, error = %errno, "spi: configuration failed");
    HwError::Config {
        what,
        source: std::io::Error::from(errno),
    }
}

fn lock_exclusive(file: &File, path: &str) -> Result<()> {
    // SAFETY: flock only inspects the descriptor, which `file` keeps open.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        Err(HwError::Busy {
            path: path.to_string(),
        })
    } else {
        Err(HwError::Open {
            path: path.to_string(),
            source: err,
        })
    }
}
