//! One serial CLI port: storage, and the two handles that use it.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────── CliPort (static) ───────────────┐
//!                    │ input  echo  response  trace   LinePair  diag  │
//!                    └────────────────────────────────────────────────┘
//!                             │ split() (once)
//!              ┌──────────────┴───────────────┐
//!         Foreground                      Interrupt
//!   put_response / put_trace        isr_entry: TX-ready, RX-ready
//!   get_line / trace!               line discipline + scheduler
//! ```
//!
//! Each ring has exactly one producer and one consumer, and each of them is
//! owned by exactly one of the two handles. Neither handle is `Clone`, and
//! `split` succeeds once, so the single-producer/single-consumer rule holds
//! by construction.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{
    CliConfig, ECHO_BUFFER_SIZE, INPUT_BUFFER_SIZE, MAX_TRACE_LEN, RESPONSE_BUFFER_SIZE,
    TRACE_BUFFER_SIZE,
};
use crate::console::{CliError, LineDiscipline, LineListener, LinePair, TxScheduler, TxState};
use crate::diag::{OverflowCounters, OverflowSnapshot, Stream};
use crate::hal::{SerialPort, TxWaker};
use crate::ring::{Producer, RingBuffer};
use crate::trace::{format_trace_line, TraceLevel};

/// All state of one serial CLI, statically allocatable.
///
/// # Example
///
/// ```ignore
/// static PORT: CliPort = CliPort::new(CliConfig::DEFAULT);
/// let (mut fg, mut isr) = PORT.split(&TX_ENABLE)?;
/// ```
pub struct CliPort {
    config: CliConfig,
    input: RingBuffer<INPUT_BUFFER_SIZE>,
    echo: RingBuffer<ECHO_BUFFER_SIZE>,
    response: RingBuffer<RESPONSE_BUFFER_SIZE>,
    trace: RingBuffer<TRACE_BUFFER_SIZE>,
    lines: LinePair,
    counters: OverflowCounters,
    trace_level: AtomicU8,
    taken: AtomicBool,
}

impl CliPort {
    pub const fn new(config: CliConfig) -> Self {
        Self {
            config,
            input: RingBuffer::new(),
            echo: RingBuffer::new(),
            response: RingBuffer::new(),
            trace: RingBuffer::new(),
            lines: LinePair::new(),
            counters: OverflowCounters::new(),
            trace_level: AtomicU8::new(config.trace_level as u8),
            taken: AtomicBool::new(false),
        }
    }

    /// Hand out the foreground and interrupt handles.
    ///
    /// Fails with [`CliError::AlreadySplit`] on every call after the first
    /// successful one, and with [`CliError::PromptTooLong`] if the prompt
    /// cannot be redrawn together with a full line.
    pub fn split<W: TxWaker>(
        &self,
        waker: W,
    ) -> Result<(Foreground<'_, W>, Interrupt<'_>), CliError> {
        if !self.config.prompt_fits() {
            return Err(CliError::PromptTooLong);
        }
        if self.taken.swap(true, Ordering::AcqRel) {
            return Err(CliError::AlreadySplit);
        }

        // SAFETY: `taken` makes this block run once per port, so every ring
        // gets exactly one producer and one consumer.
        let (
            input_tx,
            input_rx,
            echo_tx,
            echo_rx,
            response_tx,
            response_rx,
            trace_tx,
            trace_rx,
        ) = unsafe {
            (
                self.input.producer(),
                self.input.consumer(),
                self.echo.producer(),
                self.echo.consumer(),
                self.response.producer(),
                self.response.consumer(),
                self.trace.producer(),
                self.trace.consumer(),
            )
        };

        let foreground = Foreground {
            response: response_tx,
            trace: trace_tx,
            lines: &self.lines,
            counters: &self.counters,
            trace_level: &self.trace_level,
            waker,
        };

        let interrupt = Interrupt {
            baud_rate: self.config.baud_rate,
            input: input_tx,
            discipline: LineDiscipline::new(
                &self.lines,
                echo_tx,
                &self.counters,
                self.config.prompt,
                self.config.xon_at_start,
            ),
            scheduler: TxScheduler::new(input_rx, echo_rx, response_rx, trace_rx),
            counters: &self.counters,
            listener: None,
        };

        Ok((foreground, interrupt))
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn overflow_counts(&self) -> OverflowSnapshot {
        self.counters.snapshot()
    }
}

/// Foreground handle: command processor and trace producer side.
///
/// No call blocks. Output is queued whole or dropped whole.
pub struct Foreground<'a, W: TxWaker> {
    response: Producer<'a, RESPONSE_BUFFER_SIZE>,
    trace: Producer<'a, TRACE_BUFFER_SIZE>,
    lines: &'a LinePair,
    counters: &'a OverflowCounters,
    trace_level: &'a AtomicU8,
    waker: W,
}

impl<W: TxWaker> Foreground<'_, W> {
    /// Queue command output.
    ///
    /// Returns `false` (and counts a response overflow) if `bytes` does not
    /// fit entirely.
    pub fn put_response(&mut self, bytes: &[u8]) -> bool {
        if (self.response.slots_available() as usize) < bytes.len() {
            self.counters.record(Stream::Response);
            return false;
        }

        for &b in bytes {
            self.response.write(b);
        }
        self.waker.wake_tx();
        true
    }

    /// Queue pre-formatted trace output.
    ///
    /// Returns `false` (and counts a trace overflow) if `bytes` does not fit
    /// entirely.
    pub fn put_trace(&mut self, bytes: &[u8]) -> bool {
        if (self.trace.slots_available() as usize) < bytes.len() {
            self.counters.record(Stream::Trace);
            return false;
        }

        for &b in bytes {
            self.trace.write(b);
        }
        self.waker.wake_tx();
        true
    }

    pub fn response_slots_available(&self) -> usize {
        self.response.slots_available() as usize
    }

    pub fn trace_slots_available(&self) -> usize {
        self.trace.slots_available() as usize
    }

    /// Copy the completed line into `out`, NUL-terminated.
    ///
    /// Returns the number of bytes copied, `0` if no line is ready. A line
    /// longer than `out.len() - 1` is handed out over several calls.
    pub fn get_line(&mut self, out: &mut [u8]) -> usize {
        // SAFETY: `Foreground` is the only reader of the ready line.
        unsafe { self.lines.drain_ready_into(out) }
    }

    /// A completed line is waiting for `get_line`.
    pub fn line_ready(&self) -> bool {
        self.lines.is_pending()
    }

    /// Format and queue one trace line: `[LEVEL] message\r\n`.
    ///
    /// Returns `true` if the line was queued. Messages below the minimum
    /// level are filtered without counting.
    pub fn trace(&mut self, level: TraceLevel, args: fmt::Arguments<'_>) -> bool {
        if !level.passes(self.trace_level()) {
            return false;
        }

        let mut buf = [0u8; MAX_TRACE_LEN];
        let len = format_trace_line(&mut buf, level, args);
        self.put_trace(&buf[..len])
    }

    pub fn set_trace_level(&self, level: TraceLevel) {
        self.trace_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn trace_level(&self) -> TraceLevel {
        TraceLevel::from_u8(self.trace_level.load(Ordering::Relaxed))
    }

    pub fn overflow_counts(&self) -> OverflowSnapshot {
        self.counters.snapshot()
    }
}

/// Response output through `write!`.
impl<W: TxWaker> fmt::Write for Foreground<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.put_response(s.as_bytes()) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Interrupt handle: everything driven from the serial ISR.
pub struct Interrupt<'a> {
    baud_rate: u32,
    input: Producer<'a, INPUT_BUFFER_SIZE>,
    discipline: LineDiscipline<'a>,
    scheduler: TxScheduler<'a>,
    counters: &'a OverflowCounters,
    listener: Option<&'a dyn LineListener>,
}

impl<'a> Interrupt<'a> {
    /// One-time bring-up: configure the transceiver, queue the prompt and
    /// arm the transmit-ready event.
    ///
    /// Nothing is queued if the transceiver rejects the configuration.
    pub fn module_init<S: SerialPort + ?Sized>(
        &mut self,
        serial: &mut S,
        clock_hz: u32,
    ) -> Result<(), S::Error> {
        serial.configure(clock_hz, self.baud_rate)?;
        self.discipline.show_prompt();
        serial.enable_tx_interrupt();
        Ok(())
    }

    /// Called synchronously from the TX-ready handling whenever a line
    /// completes.
    pub fn register_rx_callback(&mut self, listener: &'a dyn LineListener) {
        self.listener = Some(listener);
    }

    /// Interrupt vector body for this port.
    pub fn isr_entry<S: SerialPort + ?Sized>(&mut self, serial: &mut S) {
        if serial.is_tx_ready() {
            match self.scheduler.next_byte(&mut self.discipline, self.listener) {
                Some(byte) => serial.write_byte(byte),
                None => serial.disable_tx_interrupt(),
            }
        }

        if serial.is_rx_ready() {
            let byte = serial.read_byte();
            if self.input.slots_available() == 0 {
                self.counters.record(Stream::Input);
            } else {
                self.input.write(byte);
            }
            // Input is processed on the next TX-ready event.
            serial.enable_tx_interrupt();
        }
    }

    /// Trace stream currently allowed (Ctrl-Q / Ctrl-S).
    pub fn is_xon(&self) -> bool {
        self.discipline.xon()
    }

    pub fn tx_state(&self) -> TxState {
        self.scheduler.state()
    }

    pub fn overflow_counts(&self) -> OverflowSnapshot {
        self.counters.snapshot()
    }
}
