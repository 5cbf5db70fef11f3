//! # RustUsartCli
//!
//! Interrupt-driven serial command line over a single USART.
//!
//! ## Architecture
//!
//! One transceiver carries one inbound stream (typed lines) and three
//! outbound streams (echo, response, trace), all on lock-free SPSC rings:
//! - The ISR side edits the user's line, echoes it, and schedules output
//! - The foreground side pulls completed lines and pushes responses/traces
//! - Nothing blocks, nothing allocates; overflow is dropped and counted
//!
//! [`CliPort::split`] hands out the two sides exactly once.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod ring;
pub mod diag;
pub mod trace;
pub mod console;
pub mod port;
pub mod hal;

pub use config::CliConfig;
pub use ring::{RingBuffer, Producer, Consumer};
pub use diag::{OverflowCounters, OverflowSnapshot, Stream};
pub use trace::TraceLevel;
pub use console::{CliError, LineListener, Source, TxState};
pub use port::{CliPort, Foreground, Interrupt};
pub use hal::{SerialPort, TxWaker};
