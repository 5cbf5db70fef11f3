//! RustUsartCli - Demo firmware
//!
//! 1. Bring up UART1 on GPIO6/GPIO7
//! 2. Split the static CLI port into foreground and interrupt handles
//! 3. Poll loop: service the UART, answer completed lines, emit a heartbeat

#![no_std]
#![no_main]

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::sys as esp_idf_sys;

use rust_usart_cli::config::LINE_SIZE;
use rust_usart_cli::console::VERSION;
use rust_usart_cli::hal::uart::{init_cli_uart, EspSerial, TxEnable};
use rust_usart_cli::{cli_error, cli_info, CliConfig, CliPort};

/// APB clock feeding the UART.
const UART_CLOCK_HZ: u32 = 80_000_000;

/// Heartbeat trace period.
const HEARTBEAT_US: i64 = 10_000_000;

static PORT: CliPort = CliPort::new(CliConfig::DEFAULT);
static TX_ENABLE: TxEnable = TxEnable::new();
static LINE_READY: AtomicBool = AtomicBool::new(false);

fn on_line(_len: usize) {
    LINE_READY.store(true, Ordering::Release);
}

static ON_LINE: fn(usize) = on_line;

#[no_mangle]
fn main() {
    // Initialize ESP-IDF
    esp_idf_sys::link_patches();

    let Ok(peripherals) = Peripherals::take() else {
        return;
    };

    let driver = match init_cli_uart(
        peripherals.uart1,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        PORT.config(),
    ) {
        Ok(driver) => driver,
        Err(_) => return,
    };
    let mut serial = EspSerial::new(driver, &TX_ENABLE);

    let Ok((mut fg, mut isr)) = PORT.split(&TX_ENABLE) else {
        return;
    };
    isr.register_rx_callback(&ON_LINE);
    if isr.module_init(&mut serial, UART_CLOCK_HZ).is_err() {
        return;
    }

    cli_info!(fg, "{}", VERSION);

    let mut line = [0u8; LINE_SIZE + 1];
    let mut last_heartbeat = timestamp_us();

    loop {
        while serial.has_work() {
            isr.isr_entry(&mut serial);
        }

        if LINE_READY.swap(false, Ordering::Acquire) {
            let len = fg.get_line(&mut line);
            let text = core::str::from_utf8(&line[..len]).unwrap_or("").trim_end();

            match text {
                "stats" => {
                    let counts = fg.overflow_counts();
                    let _ = write!(
                        fg,
                        "overflow: input={} echo={} response={} trace={}\r\n",
                        counts.input, counts.echo, counts.response, counts.trace
                    );
                }
                "version" => {
                    let _ = write!(fg, "{}\r\n", VERSION);
                }
                _ => {
                    if write!(fg, "unknown: {}\r\n", text).is_err() {
                        cli_error!(fg, "response dropped");
                    }
                }
            }
        }

        let now = timestamp_us();
        if now - last_heartbeat > HEARTBEAT_US {
            cli_info!(fg, "uptime {} s", now / 1_000_000);
            last_heartbeat = now;
        }

        unsafe {
            esp_idf_sys::vTaskDelay(1);
        }
    }
}

fn timestamp_us() -> i64 {
    unsafe { esp_idf_sys::esp_timer_get_time() }
}
