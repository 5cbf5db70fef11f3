//! ESP-IDF UART binding for the CLI port.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 GPIO6 (TX) ──────▶ USB-UART RX
//! ESP32-S3 GPIO7 (RX) ◀────── USB-UART TX
//!                              └─▶ PC terminal (115200 8N1)
//! ```
//!
//! The IDF UART driver owns the hardware interrupt and its own FIFOs.
//! [`EspSerial`] presents it as the two events the CLI core reacts to, and
//! the firmware calls `isr_entry` from its poll loop.

use core::sync::atomic::{AtomicBool, Ordering};

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use super::{SerialPort, TxWaker};
use crate::config::CliConfig;

/// Initialize UART1 for the CLI.
pub fn init_cli_uart<'d>(
    uart: impl Peripheral<P = uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    rx_pin: impl Peripheral<P = impl gpio::InputPin> + 'd,
    config: &CliConfig,
) -> Result<UartDriver<'d>, EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));

    UartDriver::new(
        uart,
        tx_pin,
        rx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Software transmit-ready enable, shared between the foreground (arms it)
/// and the serial adapter.
pub struct TxEnable(AtomicBool);

impl TxEnable {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    fn set(&self, armed: bool) {
        self.0.store(armed, Ordering::Release);
    }

    fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for TxEnable {
    fn default() -> Self {
        Self::new()
    }
}

impl TxWaker for TxEnable {
    fn wake_tx(&self) {
        self.set(true);
    }
}

/// [`SerialPort`] over the IDF UART driver.
pub struct EspSerial<'d> {
    driver: UartDriver<'d>,
    tx_enable: &'d TxEnable,
    /// Byte fetched by `is_rx_ready`, handed out by `read_byte`.
    rx_stash: Option<u8>,
}

impl<'d> EspSerial<'d> {
    pub fn new(driver: UartDriver<'d>, tx_enable: &'d TxEnable) -> Self {
        Self {
            driver,
            tx_enable,
            rx_stash: None,
        }
    }

    /// Either event is pending.
    pub fn has_work(&mut self) -> bool {
        self.is_tx_ready() || self.is_rx_ready()
    }
}

impl SerialPort for EspSerial<'_> {
    type Error = EspError;

    fn configure(&mut self, _clock_hz: u32, baud_rate: u32) -> Result<(), EspError> {
        // Source clock is picked by the driver.
        self.driver.change_baudrate(Hertz(baud_rate))?;
        Ok(())
    }

    fn is_tx_ready(&mut self) -> bool {
        // The driver queues writes into its own TX FIFO.
        self.tx_enable.is_armed()
    }

    fn is_rx_ready(&mut self) -> bool {
        if self.rx_stash.is_none() {
            let mut byte = [0u8; 1];
            if let Ok(1) = self.driver.read(&mut byte, NON_BLOCK) {
                self.rx_stash = Some(byte[0]);
            }
        }
        self.rx_stash.is_some()
    }

    fn write_byte(&mut self, byte: u8) {
        let _ = self.driver.write(&[byte]);
    }

    fn read_byte(&mut self) -> u8 {
        self.rx_stash.take().unwrap_or(0)
    }

    fn enable_tx_interrupt(&mut self) {
        self.tx_enable.set(true);
    }

    fn disable_tx_interrupt(&mut self) {
        self.tx_enable.set(false);
    }
}
