//! Hardware access for the glove controller: SPI bus parameters, the Linux
//! spidev transport and a simulated converter for development builds.
pub mod error;
pub mod sim;
pub mod spi;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod spidev;

pub use error::HwError;
pub use sim::SimulatedBus;
pub use spi::{BusConfig, SpiIocTransfer, SpiMode};
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use spidev::SpidevBus;

#[cfg(test)]
mod tests {
    use super::*;
    use glove_traits::SpiBus;

    fn decode(buf: &[u8; 3]) -> u16 {
        (u16::from(buf[1] & 0x03) << 8) | u16::from(buf[2])
    }

    fn read(bus: &mut SimulatedBus) -> u16 {
        let mut buf = [0x01, 0x80, 0x00];
        bus.transfer(&mut buf).expect("sim transfer");
        decode(&buf)
    }

    #[test]
    fn test_simulated_bus_calibration_then_sweep() {
        let mut bus = SimulatedBus::new(900, 100, 3, 400);
        let got: Vec<u16> = (0..10).map(|_| read(&mut bus)).collect();
        assert_eq!(got, vec![900, 900, 900, 100, 100, 100, 100, 500, 900, 500]);
        assert_eq!(bus.reads(), 10);
    }

    #[test]
    fn test_simulated_bus_rejects_empty_buffer() {
        let mut bus = SimulatedBus::new(900, 100, 3, 10);
        let err = bus.transfer(&mut []).expect_err("empty transfer");
        assert!(err.to_string().contains("empty"));
        assert_eq!(bus.reads(), 0);
    }

    #[test]
    fn test_simulated_bus_fault_injection() {
        let mut bus = SimulatedBus::new(900, 100, 3, 10).fail_after(2);
        let mut buf = [0x01, 0x80, 0x00];
        assert!(bus.transfer(&mut buf).is_ok());
        assert!(bus.transfer(&mut buf).is_ok());
        let err = bus.transfer(&mut buf).expect_err("third transfer fails");
        let hw = err.downcast_ref::<HwError>().expect("typed hw error");
        assert!(matches!(hw, HwError::Transfer(_)));
    }
}
