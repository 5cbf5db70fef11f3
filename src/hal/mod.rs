//! Hardware Abstraction Layer for the serial CLI.
//!
//! Thin seams around the serial transceiver.
//! Business logic stays in core modules, HAL is just I/O.

#[cfg(target_os = "espidf")]
pub mod uart;

/// Interrupt-side view of one serial transceiver.
///
/// Mirrors the two hardware events the CLI reacts to (transmit register
/// empty, receive register full) and the primitives it drives.
pub trait SerialPort {
    /// Bring-up failure reported by `configure`.
    type Error;

    /// One-time configuration: peripheral clock and line speed.
    fn configure(&mut self, clock_hz: u32, baud_rate: u32) -> Result<(), Self::Error>;

    /// Transmit-ready event is enabled and pending.
    fn is_tx_ready(&mut self) -> bool;

    /// A received byte is waiting.
    fn is_rx_ready(&mut self) -> bool;

    /// Hand one byte to the transmitter (clears the TX-ready event).
    fn write_byte(&mut self, byte: u8);

    /// Take the received byte (clears the RX-ready event).
    fn read_byte(&mut self) -> u8;

    fn enable_tx_interrupt(&mut self);

    /// The only way to stop the TX-ready cycle when nothing is left to send.
    fn disable_tx_interrupt(&mut self);
}

/// Foreground-side handle that re-arms the transmit-ready event after a
/// producer queued output.
pub trait TxWaker {
    fn wake_tx(&self);
}

impl<W: TxWaker + ?Sized> TxWaker for &W {
    fn wake_tx(&self) {
        (**self).wake_tx()
    }
}
