//! Receive line discipline
//!
//! Consumes received bytes one at a time, edits the in-progress pending
//! line, echoes to the terminal and hands completed lines over to the
//! foreground. Runs inside the TX-ready handler.

use super::line_buffer::{LinePair, PendingLine};
use crate::config::ECHO_BUFFER_SIZE;
use crate::diag::{OverflowCounters, Stream};
use crate::ring::Producer;

const ENTER: u8 = b'\r';
const ESCAPE: u8 = 0x1B;
/// Ctrl-Q
const XON: u8 = 0x11;
/// Ctrl-S
const XOFF: u8 = 0x13;
/// BS, DEL, and DEL with the eighth bit set (mark parity).
const BACKSPACE: [u8; 3] = [0x08, 0x7F, 0xFF];

/// Echoed for a backspace: cursor left, then ANSI erase to end of line.
const ERASE_LAST: &[u8] = b"\x08\x1b[K";
const CR: &[u8] = b"\r";
const LF: &[u8] = b"\n";

/// Notification that a completed line is ready for `get_line`.
///
/// Invoked synchronously from the interrupt context.
pub trait LineListener {
    /// `len` is the line length including its `\n` delimiter.
    fn line_available(&self, len: usize);
}

impl<F: Fn(usize)> LineListener for F {
    fn line_available(&self, len: usize) {
        self(len)
    }
}

/// Line editing state machine (ISR side).
pub struct LineDiscipline<'a> {
    lines: &'a LinePair,
    echo: Producer<'a, ECHO_BUFFER_SIZE>,
    counters: &'a OverflowCounters,
    prompt: &'static [u8],
    /// Index of the in-progress buffer (0 = A, 1 = B).
    in_progress: usize,
    /// Trace stream flow control.
    xon: bool,
    /// Other output interleaved with the user's line since it was drawn.
    restore_pending: bool,
}

impl<'a> LineDiscipline<'a> {
    pub(crate) fn new(
        lines: &'a LinePair,
        echo: Producer<'a, ECHO_BUFFER_SIZE>,
        counters: &'a OverflowCounters,
        prompt: &'static str,
        xon: bool,
    ) -> Self {
        Self {
            lines,
            echo,
            counters,
            prompt: prompt.as_bytes(),
            in_progress: 0,
            xon,
            restore_pending: false,
        }
    }

    /// Trace output allowed (Ctrl-Q / Ctrl-S).
    pub fn xon(&self) -> bool {
        self.xon
    }

    pub fn restore_pending(&self) -> bool {
        self.restore_pending
    }

    /// Redraw the user's line once the current output has drained.
    pub fn request_restore(&mut self) {
        self.restore_pending = true;
    }

    /// Length of the line being typed.
    pub fn line_len(&self) -> usize {
        // SAFETY: ISR side, in-progress buffer; the reference does not escape.
        let line = unsafe { self.editing() };
        line.len()
    }

    /// Index of the in-progress buffer.
    pub fn in_progress_index(&self) -> usize {
        self.in_progress
    }

    /// Process a single input byte.
    pub fn process_byte(&mut self, byte: u8, listener: Option<&dyn LineListener>) {
        if self.restore_pending && byte != ENTER {
            self.redraw();
        }

        // SAFETY: ISR side, in-progress buffer. Re-fetched after any call
        // that may swap buffers.
        let line = unsafe { self.editing() };
        if line.is_full() {
            self.complete_line(listener);
            return;
        }

        match byte {
            ENTER => self.complete_line(listener),

            // Discarded; redraws the line if output interleaved
            ESCAPE => {}

            XOFF => self.xon = false,
            XON => self.xon = true,

            b if BACKSPACE.contains(&b) => {
                line.erase_last_char();
                self.put_echo(&[ERASE_LAST]);
            }

            // Printable character
            0x20..=0x7E => {
                line.add_char(byte);
                self.put_echo(&[core::slice::from_ref(&byte)]);

                if line.is_full() {
                    self.complete_line(listener);
                }
            }

            _ => {}
        }
    }

    /// Carriage return, prompt, then the in-progress line as typed so far.
    ///
    /// Queued as one unit; if it does not fit, the restore stays pending.
    pub fn redraw(&mut self) {
        // SAFETY: ISR side, in-progress buffer; only used inside this block.
        let line = unsafe { self.editing() };

        if self.put_echo(&[CR, self.prompt, line.as_bytes()]) {
            self.restore_pending = false;
        }
    }

    /// Draw the prompt (used at start-up).
    pub fn show_prompt(&mut self) {
        if self.put_echo(&[self.prompt]) {
            self.restore_pending = false;
        }
    }

    fn complete_line(&mut self, listener: Option<&dyn LineListener>) {
        // SAFETY: ISR side, in-progress buffer.
        let line = unsafe { self.editing() };

        if line.is_empty() {
            if self.put_echo(&[LF, self.prompt]) {
                self.restore_pending = false;
            }
            return;
        }

        if self.lines.is_pending() {
            // Previous line not taken yet; keep typing into this one.
            self.counters.record(Stream::Input);
            return;
        }

        line.add_char(b'\n');
        line.reset_read_cursor();
        let len = line.len();
        self.put_echo(&[CR]);

        self.lines.publish(self.in_progress);
        self.in_progress ^= 1;
        // SAFETY: the new in-progress buffer is not the ready one, and the
        // foreground released it before `is_pending()` went false.
        let next = unsafe { self.editing() };
        next.reset();
        self.restore_pending = false;

        if let Some(listener) = listener {
            listener.line_available(len);
        }
    }

    /// The in-progress buffer.
    ///
    /// # Safety
    ///
    /// At most one returned reference may be alive at a time.
    #[allow(clippy::mut_from_ref)]
    unsafe fn editing(&self) -> &'a mut PendingLine {
        let lines: &'a LinePair = self.lines;
        lines.slot_mut(self.in_progress)
    }

    /// Queue one echo unit (all parts) or drop it whole.
    ///
    /// A drop leaves the terminal out of step with the line, so it also
    /// requests a redraw.
    fn put_echo(&mut self, parts: &[&[u8]]) -> bool {
        let len: usize = parts.iter().map(|p| p.len()).sum();
        if (self.echo.slots_available() as usize) < len {
            self.counters.record(Stream::Echo);
            self.restore_pending = true;
            return false;
        }

        for &b in parts.iter().flat_map(|p| p.iter()) {
            self.echo.write(b);
        }
        true
    }
}
