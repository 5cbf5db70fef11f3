//! Overflow diagnostics for the CLI streams.
//!
//! Overflow is never reported back to a producer beyond the drop itself.
//! Each dropped write bumps a counter here so the loss can be inspected
//! later (debugger, diagnostic command, periodic trace).

use core::sync::atomic::{AtomicU32, Ordering};

/// Stream that lost data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Stream {
    /// Received byte dropped: input ring full, or a line completed while
    /// the previous one was still waiting for the consumer.
    Input = 0,

    /// Echo / line-editing byte dropped.
    Echo = 1,

    /// Command response dropped.
    Response = 2,

    /// Trace message dropped.
    Trace = 3,
}

impl Stream {
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Input => "input",
            Stream::Echo => "echo",
            Stream::Response => "response",
            Stream::Trace => "trace",
        }
    }
}

/// Thread-safe overflow counters, one per stream.
///
/// Counters only ever increase (wrapping at `u32::MAX`).
pub struct OverflowCounters {
    input: AtomicU32,
    echo: AtomicU32,
    response: AtomicU32,
    trace: AtomicU32,
}

impl OverflowCounters {
    pub const fn new() -> Self {
        Self {
            input: AtomicU32::new(0),
            echo: AtomicU32::new(0),
            response: AtomicU32::new(0),
            trace: AtomicU32::new(0),
        }
    }

    fn counter(&self, stream: Stream) -> &AtomicU32 {
        match stream {
            Stream::Input => &self.input,
            Stream::Echo => &self.echo,
            Stream::Response => &self.response,
            Stream::Trace => &self.trace,
        }
    }

    /// Count one dropped write.
    #[inline]
    pub fn record(&self, stream: Stream) {
        self.counter(stream).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn count(&self, stream: Stream) -> u32 {
        self.counter(stream).load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> OverflowSnapshot {
        OverflowSnapshot {
            input: self.count(Stream::Input),
            echo: self.count(Stream::Echo),
            response: self.count(Stream::Response),
            trace: self.count(Stream::Trace),
        }
    }
}

impl Default for OverflowCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the overflow counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverflowSnapshot {
    pub input: u32,
    pub echo: u32,
    pub response: u32,
    pub trace: u32,
}

impl OverflowSnapshot {
    /// Sum of all drops.
    pub fn total(&self) -> u32 {
        self.input
            .wrapping_add(self.echo)
            .wrapping_add(self.response)
            .wrapping_add(self.trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = OverflowCounters::new();
        assert_eq!(counters.snapshot(), OverflowSnapshot::default());
        assert_eq!(counters.snapshot().total(), 0);
    }

    #[test]
    fn test_counters_are_per_stream() {
        let counters = OverflowCounters::new();

        counters.record(Stream::Trace);
        counters.record(Stream::Trace);
        counters.record(Stream::Input);

        let snap = counters.snapshot();
        assert_eq!(snap.trace, 2);
        assert_eq!(snap.input, 1);
        assert_eq!(snap.echo, 0);
        assert_eq!(snap.response, 0);
        assert_eq!(snap.total(), 3);
    }

    #[test]
    fn test_stream_names() {
        assert_eq!(Stream::Input.as_str(), "input");
        assert_eq!(Stream::Response.as_str(), "response");
    }
}
