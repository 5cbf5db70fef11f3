//! Pending line buffers for console input
//!
//! Two buffers, A and B. One is always "in progress" (the ISR appends typed
//! characters to it), the other is idle or "ready" (a completed line waiting
//! for the foreground consumer). Completing a line hands the buffer over by
//! index; no bytes are copied.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::LINE_SIZE;

/// Ready index value when no completed line is waiting.
const NONE: u8 = 0xFF;

/// One line of input plus a replay cursor.
pub struct PendingLine<const N: usize = LINE_SIZE> {
    buf: [u8; N],
    /// End of accumulated content.
    tail_idx: usize,
    /// Replay cursor, used for draining and for redrawing.
    read_idx: usize,
}

impl<const N: usize> PendingLine<N> {
    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            tail_idx: 0,
            read_idx: 0,
        }
    }

    /// Append a character. Ignored once the storage is exhausted.
    pub fn add_char(&mut self, c: u8) {
        if self.tail_idx < N {
            self.buf[self.tail_idx] = c;
            self.tail_idx += 1;
        }
    }

    /// Remove last character (no-op on an empty line)
    pub fn erase_last_char(&mut self) {
        if self.tail_idx > 0 {
            self.tail_idx -= 1;
        }
        self.read_idx = self.read_idx.min(self.tail_idx);
    }

    /// Full once only the delimiter slot is left.
    pub fn is_full(&self) -> bool {
        self.tail_idx >= N - 1
    }

    pub fn is_empty(&self) -> bool {
        self.tail_idx == 0
    }

    pub fn len(&self) -> usize {
        self.tail_idx
    }

    /// Clear content and cursor
    pub fn reset(&mut self) {
        self.tail_idx = 0;
        self.read_idx = 0;
    }

    pub fn reset_read_cursor(&mut self) {
        self.read_idx = 0;
    }

    /// Next character under the replay cursor, `None` at end of line.
    pub fn read_next_char(&mut self) -> Option<u8> {
        if self.read_idx < self.tail_idx {
            let c = self.buf[self.read_idx];
            self.read_idx += 1;
            Some(c)
        } else {
            None
        }
    }

    /// True once the replay cursor reached the end of the content.
    pub fn is_drained(&self) -> bool {
        self.read_idx >= self.tail_idx
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.tail_idx]
    }
}

impl<const N: usize> Default for PendingLine<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The A/B pair of pending lines shared by the ISR and the foreground.
///
/// # Safety
///
/// - The ISR side only touches the in-progress buffer, which is never the
///   ready one
/// - The foreground side only touches the ready buffer
/// - `ready` is published with `Release` and observed with `Acquire`, so the
///   line content is visible before its index is
pub struct LinePair {
    slots: [UnsafeCell<PendingLine>; 2],
    ready: AtomicU8,
}

// SAFETY: Buffer ownership is partitioned by the `ready` index (see above).
unsafe impl Sync for LinePair {}
unsafe impl Send for LinePair {}

impl LinePair {
    pub const fn new() -> Self {
        Self {
            slots: [UnsafeCell::new(PendingLine::new()), UnsafeCell::new(PendingLine::new())],
            ready: AtomicU8::new(NONE),
        }
    }

    /// Index of the completed line waiting for the consumer, if any.
    #[inline]
    pub fn ready_index(&self) -> Option<usize> {
        match self.ready.load(Ordering::Acquire) {
            NONE => None,
            idx => Some(idx as usize),
        }
    }

    /// True while a completed line has not been fully drained.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.ready_index().is_some()
    }

    /// Mutable access to one buffer.
    ///
    /// # Safety
    ///
    /// ISR side: `idx` is the in-progress buffer (never the ready one).
    /// Foreground side: `idx` is the current ready index.
    /// No other reference to the same buffer may be alive.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slot_mut(&self, idx: usize) -> &mut PendingLine {
        &mut *self.slots[idx & 1].get()
    }

    /// Mark buffer `idx` as the ready line (ISR side).
    pub(crate) fn publish(&self, idx: usize) {
        self.ready.store((idx & 1) as u8, Ordering::Release);
    }

    /// Copy the ready line into `out` (foreground side).
    ///
    /// Stops after `out.len() - 1` bytes or after a `\n`, then NUL-terminates.
    /// The line stays ready until it has been read to its end.
    ///
    /// # Safety
    ///
    /// Only the single foreground consumer may call this.
    pub(crate) unsafe fn drain_ready_into(&self, out: &mut [u8]) -> usize {
        let Some(first) = out.first_mut() else {
            return 0;
        };
        *first = 0;

        let Some(idx) = self.ready_index() else {
            return 0;
        };

        let line = self.slot_mut(idx);
        let room = out.len() - 1;
        let mut n = 0;

        while n < room {
            match line.read_next_char() {
                Some(c) => {
                    out[n] = c;
                    n += 1;
                    if c == b'\n' {
                        break;
                    }
                }
                None => break,
            }
        }
        out[n] = 0;

        if line.is_drained() {
            self.ready.store(NONE, Ordering::Release);
        }

        n
    }
}

impl Default for LinePair {
    fn default() -> Self {
        Self::new()
    }
}
