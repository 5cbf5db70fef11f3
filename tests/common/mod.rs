//! Simulated USART shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use rust_usart_cli::{Interrupt, SerialPort, TxWaker};

/// Upper bound on ISR invocations per pump, catches a TX cycle that never stops.
const MAX_EVENTS: usize = 100_000;

/// Transceiver model: TX-ready fires whenever the TX interrupt is enabled,
/// RX-ready while the receive queue holds bytes.
pub struct SimUart {
    tx_irq: Rc<Cell<bool>>,
    pub rx: VecDeque<u8>,
    pub wire: Vec<u8>,
    pub configured: Option<(u32, u32)>,
    /// Baud rate the transceiver refuses in `configure`.
    pub unsupported_baud: Option<u32>,
}

/// Configuration refused by the simulated transceiver.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsupportedBaud(pub u32);

/// Foreground-side waker that re-enables the simulated TX interrupt.
pub struct SimWaker(Rc<Cell<bool>>);

impl TxWaker for SimWaker {
    fn wake_tx(&self) {
        self.0.set(true);
    }
}

impl SimUart {
    pub fn new() -> Self {
        Self {
            tx_irq: Rc::new(Cell::new(false)),
            rx: VecDeque::new(),
            wire: Vec::new(),
            configured: None,
            unsupported_baud: None,
        }
    }

    pub fn waker(&self) -> SimWaker {
        SimWaker(Rc::clone(&self.tx_irq))
    }

    pub fn tx_enabled(&self) -> bool {
        self.tx_irq.get()
    }

    /// Bytes transmitted since the last call.
    pub fn take_wire(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.wire)
    }
}

impl SerialPort for SimUart {
    type Error = UnsupportedBaud;

    fn configure(&mut self, clock_hz: u32, baud_rate: u32) -> Result<(), UnsupportedBaud> {
        if self.unsupported_baud == Some(baud_rate) {
            return Err(UnsupportedBaud(baud_rate));
        }
        self.configured = Some((clock_hz, baud_rate));
        Ok(())
    }

    fn is_tx_ready(&mut self) -> bool {
        self.tx_irq.get()
    }

    fn is_rx_ready(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn write_byte(&mut self, byte: u8) {
        self.wire.push(byte);
    }

    fn read_byte(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn enable_tx_interrupt(&mut self) {
        self.tx_irq.set(true);
    }

    fn disable_tx_interrupt(&mut self) {
        self.tx_irq.set(false);
    }
}

/// Run the ISR until the simulated port has nothing left to do.
pub fn pump(isr: &mut Interrupt<'_>, uart: &mut SimUart) {
    for _ in 0..MAX_EVENTS {
        if !uart.tx_enabled() && uart.rx.is_empty() {
            return;
        }
        isr.isr_entry(uart);
    }
    panic!("serial port never went idle");
}

/// Type `bytes` one at a time, letting the port settle after each.
pub fn type_bytes(isr: &mut Interrupt<'_>, uart: &mut SimUart, bytes: &[u8]) {
    for &b in bytes {
        uart.rx.push_back(b);
        pump(isr, uart);
    }
}
