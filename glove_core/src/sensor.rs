//! Bend sensor reads through a 10-bit SPI converter.

use std::fmt;

use glove_traits::SpiBus;

use crate::error::GloveError;
use crate::hw_error::map_hw_error;

/// Start bit, single-ended channel 0, pad byte.
pub const REQUEST: [u8; 3] = [0x01, 0x80, 0x00];

/// An undecoded 10-bit reading in `[0, 1023]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawSample(u16);

impl RawSample {
    pub const MAX: u16 = 0x03FF;

    /// `None` when `v` does not fit in 10 bits.
    pub fn new(v: u16) -> Option<Self> {
        (v <= Self::MAX).then_some(Self(v))
    }

    /// Decode the two payload bytes of a reply: the low two bits of `hi` are
    /// bits 9..8 of the sample, `lo` is bits 7..0.
    #[inline]
    pub fn from_payload(hi: u8, lo: u8) -> Self {
        Self((u16::from(hi & 0x03) << 8) | u16::from(lo))
    }

    #[inline]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<RawSample> for i64 {
    fn from(s: RawSample) -> Self {
        Self::from(s.0)
    }
}

impl fmt::Display for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Issue one request frame and decode the reply.
pub fn read_sample<B: SpiBus + ?Sized>(bus: &mut B) -> Result<RawSample, GloveError> {
    let mut frame = REQUEST;
    bus.transfer(&mut frame)
        .map_err(|e| map_hw_error(e.as_ref()))?;
    let sample = RawSample::from_payload(frame[1], frame[2]);
    tracing::trace!(sample = sample.value(), "sensor read");
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedBus;
    use rstest::rstest;

    #[rstest]
    #[case(0x00, 0x00, 0)]
    #[case(0x03, 0xFF, 1023)]
    #[case(0x01, 0x2C, 300)]
    #[case(0xFE, 0x10, 0x210)] // noise in the upper bits is masked off
    #[case(0xFC, 0xFF, 255)]
    fn decodes_payload(#[case] hi: u8, #[case] lo: u8, #[case] want: u16) {
        assert_eq!(RawSample::from_payload(hi, lo).value(), want);
    }

    #[test]
    fn new_rejects_values_over_ten_bits() {
        assert_eq!(RawSample::new(1023).map(RawSample::value), Some(1023));
        assert!(RawSample::new(1024).is_none());
    }

    #[test]
    fn read_sample_sends_request_frame_and_decodes_reply() {
        let mut bus = ScriptedBus::new([Ok(612)]);
        let s = read_sample(&mut bus).expect("read");
        assert_eq!(s.value(), 612);
        assert_eq!(bus.requests(), vec![REQUEST.to_vec()]);
    }

    #[test]
    fn read_sample_propagates_transport_error() {
        let mut bus = ScriptedBus::new([Err("EIO".to_string())]);
        let err = read_sample(&mut bus).expect_err("transfer fails");
        assert!(matches!(err, GloveError::Transport(_)));
    }
}
