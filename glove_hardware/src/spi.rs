//! SPI bus parameters and the kernel transfer descriptor.
//!
//! Everything here is plain data and builds on every target; the code that
//! actually issues ioctls lives in `spidev` behind the `hardware` feature.

use std::marker::PhantomData;

use crate::error::{HwError, Result};

/// ioctl type byte shared by every spidev request.
pub const SPI_IOC_MAGIC: u8 = b'k';

/// Used when the configured max speed is unset or non-positive.
pub const DEFAULT_MAX_SPEED_HZ: u32 = 5_000_000;
/// Used when the configured word size is unset or non-positive.
pub const DEFAULT_BITS_PER_WORD: u8 = 8;

const SPI_CPHA: u8 = 0x01;
const SPI_CPOL: u8 = 0x02;

/// Clock polarity/phase combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum SpiMode {
    /// CPOL 0, CPHA 0
    #[default]
    Mode0 = 0,
    /// CPOL 0, CPHA 1
    Mode1 = SPI_CPHA,
    /// CPOL 1, CPHA 0
    Mode2 = SPI_CPOL,
    /// CPOL 1, CPHA 1
    Mode3 = SPI_CPOL | SPI_CPHA,
}

impl SpiMode {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the CPOL/CPHA bits of a mode byte read back from the driver.
    /// Other flags (CS_HIGH, LSB_FIRST, ...) are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & (SPI_CPOL | SPI_CPHA) {
            0 => Self::Mode0,
            SPI_CPHA => Self::Mode1,
            SPI_CPOL => Self::Mode2,
            _ => Self::Mode3,
        }
    }
}

/// Bus parameters applied once when the device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub mode: SpiMode,
    pub max_speed_hz: u32,
    pub bits_per_word: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode0,
            max_speed_hz: DEFAULT_MAX_SPEED_HZ,
            bits_per_word: DEFAULT_BITS_PER_WORD,
        }
    }
}

impl BusConfig {
    /// Mode 0 with the requested speed and word size, substituting the
    /// defaults for non-positive values. Oversized values saturate; the
    /// driver rejects anything it cannot honour when the config is applied.
    pub fn resolve(max_speed_hz: i64, bits_per_word: i64) -> Self {
        let max_speed_hz = if max_speed_hz > 0 {
            u32::try_from(max_speed_hz).unwrap_or(u32::MAX)
        } else {
            DEFAULT_MAX_SPEED_HZ
        };
        let bits_per_word = if bits_per_word > 0 {
            u8::try_from(bits_per_word).unwrap_or(u8::MAX)
        } else {
            DEFAULT_BITS_PER_WORD
        };
        Self {
            mode: SpiMode::Mode0,
            max_speed_hz,
            bits_per_word,
        }
    }
}

/// Mirror of the kernel's `struct spi_ioc_transfer` (32 bytes).
///
/// The descriptor mutably borrows the buffer it points at for `'a`, so the
/// buffer cannot be read or moved while a transfer built from it is alive.
#[repr(C)]
#[derive(Debug, Default)]
pub struct SpiIocTransfer<'a> {
    pub tx_buf: u64,
    pub rx_buf: u64,
    pub len: u32,
    pub speed_hz: u32,
    pub delay_usecs: u16,
    pub bits_per_word: u8,
    pub cs_change: u8,
    pub tx_nbits: u8,
    pub rx_nbits: u8,
    pub word_delay_usecs: u8,
    pub pad: u8,
    buf: PhantomData<&'a mut [u8]>,
}

impl<'a> SpiIocTransfer<'a> {
    /// Build a half-duplex descriptor: tx and rx both point at `buf`, so the
    /// reply overwrites the request in place.
    pub fn half_duplex(buf: &'a mut [u8], config: &BusConfig) -> Result<Self> {
        if buf.is_empty() {
            return Err(HwError::EmptyTransfer);
        }
        let len = u32::try_from(buf.len()).map_err(|_| HwError::TransferTooLong(buf.len()))?;
        let addr = buf.as_mut_ptr() as usize as u64;
        Ok(Self {
            tx_buf: addr,
            rx_buf: addr,
            len,
            speed_hz: config.max_speed_hz,
            delay_usecs: 0,
            bits_per_word: config.bits_per_word,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn descriptor_matches_kernel_abi_size() {
        assert_eq!(std::mem::size_of::<SpiIocTransfer<'static>>(), 32);
        assert_eq!(std::mem::align_of::<SpiIocTransfer<'static>>(), 8);
    }

    #[rstest]
    #[case(0, 0, DEFAULT_MAX_SPEED_HZ, DEFAULT_BITS_PER_WORD)]
    #[case(-1, -8, DEFAULT_MAX_SPEED_HZ, DEFAULT_BITS_PER_WORD)]
    #[case(1_000_000, 0, 1_000_000, DEFAULT_BITS_PER_WORD)]
    #[case(0, 16, DEFAULT_MAX_SPEED_HZ, 16)]
    #[case(i64::MAX, 4096, u32::MAX, u8::MAX)]
    fn resolve_substitutes_defaults(
        #[case] speed: i64,
        #[case] bpw: i64,
        #[case] want_speed: u32,
        #[case] want_bpw: u8,
    ) {
        let cfg = BusConfig::resolve(speed, bpw);
        assert_eq!(cfg.mode, SpiMode::Mode0);
        assert_eq!(cfg.max_speed_hz, want_speed);
        assert_eq!(cfg.bits_per_word, want_bpw);
    }

    #[test]
    fn half_duplex_aliases_buffer_and_copies_defaults() {
        let cfg = BusConfig::resolve(1_000_000, 0);
        let mut buf = [0x01u8, 0x80, 0x00];
        let addr = buf.as_ptr() as usize as u64;
        let xfer = SpiIocTransfer::half_duplex(&mut buf, &cfg).expect("descriptor");
        assert_eq!(xfer.tx_buf, addr);
        assert_eq!(xfer.rx_buf, addr);
        assert_eq!(xfer.len, 3);
        assert_eq!(xfer.speed_hz, 1_000_000);
        assert_eq!(xfer.bits_per_word, 8);
        assert_eq!(xfer.delay_usecs, 0);
        assert_eq!(xfer.cs_change, 0);
    }

    #[test]
    fn half_duplex_rejects_empty_buffer() {
        let mut buf: [u8; 0] = [];
        let err = SpiIocTransfer::half_duplex(&mut buf, &BusConfig::default())
            .expect_err("empty transfer must fail");
        assert!(matches!(err, HwError::EmptyTransfer));
    }

    #[rstest]
    #[case(0x00, SpiMode::Mode0)]
    #[case(0x01, SpiMode::Mode1)]
    #[case(0x02, SpiMode::Mode2)]
    #[case(0x03, SpiMode::Mode3)]
    #[case(0x04, SpiMode::Mode0)] // CS_HIGH flag ignored
    fn mode_bits_decode(#[case] bits: u8, #[case] mode: SpiMode) {
        assert_eq!(SpiMode::from_bits(bits), mode);
        assert_eq!(SpiMode::from_bits(mode.bits()), mode);
    }
}
