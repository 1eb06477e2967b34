pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error used at every hardware/network trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Half-duplex SPI bus.
pub trait SpiBus {
    /// Clock `buf` out and the peripheral's reply back into the same buffer.
    ///
    /// On success `buf` holds the received bytes; the request is overwritten.
    /// Implementations must reject an empty `buf` without touching the device.
    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), BoxError>;
}

impl<B: SpiBus + ?Sized> SpiBus for &mut B {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), BoxError> {
        (**self).transfer(buf)
    }
}

impl<B: SpiBus + ?Sized> SpiBus for Box<B> {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), BoxError> {
        (**self).transfer(buf)
    }
}

/// Outbound message stream for control values.
pub trait Sink {
    /// Send one complete text message.
    fn send(&mut self, msg: &str) -> Result<(), BoxError>;
    /// Close the stream. Further sends are an error.
    fn close(&mut self) -> Result<(), BoxError>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn send(&mut self, msg: &str) -> Result<(), BoxError> {
        (**self).send(msg)
    }
    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}
