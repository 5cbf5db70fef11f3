//! Transmit output scheduler
//!
//! Decides, on every TX-ready event, which byte goes on the wire next.
//!
//! # Priority (highest first)
//!
//! 1. The paired half of a line ending just sent (`\r` ↔ `\n`)
//! 2. The stream already being drained, until it is empty
//! 3. Received bytes, run through the line discipline
//! 4. A new stream: echo, then response, then trace (trace only while XON)
//!
//! Selecting response or trace output marks the user's line for a redraw.
//! When nothing is left the caller disables the TX-ready event.

use super::discipline::{LineDiscipline, LineListener};
use crate::config::{ECHO_BUFFER_SIZE, INPUT_BUFFER_SIZE, RESPONSE_BUFFER_SIZE, TRACE_BUFFER_SIZE};
use crate::ring::Consumer;

/// Output stream feeding the transmitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Echo,
    Response,
    Trace,
}

/// Scheduler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    /// No stream in progress.
    Idle,
    /// Draining one stream until it is empty.
    Draining(Source),
    /// The partner of a line-ending byte goes out next, then `resume`
    /// continues.
    PairedDelimiter { byte: u8, resume: Source },
}

fn partner(byte: u8) -> Option<u8> {
    match byte {
        b'\r' => Some(b'\n'),
        b'\n' => Some(b'\r'),
        _ => None,
    }
}

/// Output scheduler (ISR side).
pub struct TxScheduler<'a> {
    input: Consumer<'a, INPUT_BUFFER_SIZE>,
    echo: Consumer<'a, ECHO_BUFFER_SIZE>,
    response: Consumer<'a, RESPONSE_BUFFER_SIZE>,
    trace: Consumer<'a, TRACE_BUFFER_SIZE>,
    state: TxState,
    /// Set while the cursor sits at the start of a fresh line produced by a
    /// `PairedDelimiter`; holds the byte a stream may still send redundantly.
    just_paired: Option<u8>,
}

impl<'a> TxScheduler<'a> {
    pub(crate) fn new(
        input: Consumer<'a, INPUT_BUFFER_SIZE>,
        echo: Consumer<'a, ECHO_BUFFER_SIZE>,
        response: Consumer<'a, RESPONSE_BUFFER_SIZE>,
        trace: Consumer<'a, TRACE_BUFFER_SIZE>,
    ) -> Self {
        Self {
            input,
            echo,
            response,
            trace,
            state: TxState::Idle,
            just_paired: None,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Next byte for the transmitter, `None` when nothing is eligible.
    pub fn next_byte(
        &mut self,
        discipline: &mut LineDiscipline<'_>,
        listener: Option<&dyn LineListener>,
    ) -> Option<u8> {
        loop {
            match self.state {
                TxState::PairedDelimiter { byte, resume } => {
                    self.state = TxState::Draining(resume);
                    self.just_paired = Some(byte);
                    return Some(byte);
                }

                TxState::Draining(source) => {
                    let Some(byte) = self.pop(source) else {
                        self.state = TxState::Idle;
                        continue;
                    };

                    if self.is_redundant(byte) {
                        // Cursor already at the start of a fresh line.
                        self.just_paired = Some(b'\r');
                        continue;
                    }
                    self.just_paired = None;

                    return Some(self.emit(source, byte));
                }

                TxState::Idle => {
                    while self.input.is_not_empty() {
                        let byte = self.input.read();
                        discipline.process_byte(byte, listener);
                    }

                    let trace_eligible = discipline.xon() && self.trace.is_not_empty();

                    // A redraw that does not fit is retried once echo drained.
                    if discipline.restore_pending()
                        && self.echo.is_empty()
                        && self.response.is_empty()
                        && !trace_eligible
                    {
                        discipline.redraw();
                    }

                    let next = if self.echo.is_not_empty() {
                        Source::Echo
                    } else if self.response.is_not_empty() {
                        discipline.request_restore();
                        Source::Response
                    } else if trace_eligible {
                        discipline.request_restore();
                        Source::Trace
                    } else {
                        return None;
                    };

                    self.state = TxState::Draining(next);
                }
            }
        }
    }

    fn pop(&mut self, source: Source) -> Option<u8> {
        match source {
            Source::Echo if self.echo.is_not_empty() => Some(self.echo.read()),
            Source::Response if self.response.is_not_empty() => Some(self.response.read()),
            Source::Trace if self.trace.is_not_empty() => Some(self.trace.read()),
            _ => None,
        }
    }

    /// The injected half itself, or a carriage return right after a
    /// completed line ending.
    fn is_redundant(&self, byte: u8) -> bool {
        match self.just_paired {
            Some(paired) => byte == paired || byte == b'\r',
            None => false,
        }
    }

    /// Schedule the partner of a line-ending byte about to be transmitted.
    fn emit(&mut self, source: Source, byte: u8) -> u8 {
        if let Some(other) = partner(byte) {
            self.state = TxState::PairedDelimiter { byte: other, resume: source };
        }
        byte
    }
}
