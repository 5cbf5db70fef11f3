//! Software trace output for the serial CLI.
//!
//! # Architecture
//!
//! ```text
//! Foreground             trace ring            TX scheduler
//! ──────────             ──────────            ────────────
//!
//! cli_info!() ─────────▶ [..bytes..] ────────▶ USART TX
//! formats into stack      lock-free             only while XON
//! never blocks            drop when full
//! ```
//!
//! # Rules
//!
//! - Tracing never blocks the caller and never allocates
//! - A message is queued whole or dropped whole (counted as a trace overflow)
//! - Messages below the minimum level are filtered, not counted

use crate::config::MAX_TRACE_LEN;

/// Trace level, least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum TraceLevel {
    Debug = 0,
    Info = 1,
    Error = 2,
    Fatal = 3,
    /// Used only as a minimum level: disables tracing.
    None = 4,
}

impl TraceLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            TraceLevel::Debug => "DEBUG",
            TraceLevel::Info => "INFO",
            TraceLevel::Error => "ERROR",
            TraceLevel::Fatal => "FATAL",
            TraceLevel::None => "NONE",
        }
    }

    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => TraceLevel::Debug,
            1 => TraceLevel::Info,
            2 => TraceLevel::Error,
            3 => TraceLevel::Fatal,
            _ => TraceLevel::None,
        }
    }

    /// True if a message at `self` passes the `min` filter.
    #[inline]
    pub fn passes(self, min: TraceLevel) -> bool {
        self != TraceLevel::None && self >= min
    }
}

/// Format a message into a buffer, truncating at the buffer end.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl Write for BufWriter<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Format one trace line.
///
/// Format: `[LEVEL] message\r\n`. The message is truncated so the line
/// ending always fits in `MAX_TRACE_LEN`.
pub fn format_trace_line(
    buf: &mut [u8; MAX_TRACE_LEN],
    level: TraceLevel,
    args: core::fmt::Arguments<'_>,
) -> usize {
    let body = MAX_TRACE_LEN - 2;
    let len = format_to_buffer(
        &mut buf[..body],
        format_args!("[{}] {}", level.as_str(), args),
    );
    buf[len] = b'\r';
    buf[len + 1] = b'\n';
    len + 2
}

/// Trace macro.
///
/// # Example
///
/// ```ignore
/// cli_trace!(fg, TraceLevel::Info, "link up after {} ms", elapsed);
/// ```
#[macro_export]
macro_rules! cli_trace {
    ($fg:expr, $level:expr, $($arg:tt)*) => {
        $fg.trace($level, format_args!($($arg)*))
    };
}

/// Debug trace.
#[macro_export]
macro_rules! cli_debug {
    ($fg:expr, $($arg:tt)*) => {
        $crate::cli_trace!($fg, $crate::trace::TraceLevel::Debug, $($arg)*)
    };
}

/// Info trace.
#[macro_export]
macro_rules! cli_info {
    ($fg:expr, $($arg:tt)*) => {
        $crate::cli_trace!($fg, $crate::trace::TraceLevel::Info, $($arg)*)
    };
}

/// Error trace.
#[macro_export]
macro_rules! cli_error {
    ($fg:expr, $($arg:tt)*) => {
        $crate::cli_trace!($fg, $crate::trace::TraceLevel::Error, $($arg)*)
    };
}

/// Fatal trace. Only logs; resetting the device is up to the caller.
#[macro_export]
macro_rules! cli_fatal {
    ($fg:expr, $($arg:tt)*) => {
        $crate::cli_trace!($fg, $crate::trace::TraceLevel::Fatal, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 4];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hell");
    }

    #[test]
    fn test_format_trace_line() {
        let mut buf = [0u8; MAX_TRACE_LEN];
        let len = format_trace_line(&mut buf, TraceLevel::Error, format_args!("code {}", 7));
        assert_eq!(&buf[..len], b"[ERROR] code 7\r\n");
    }

    #[test]
    fn test_format_trace_line_keeps_line_ending() {
        let mut buf = [0u8; MAX_TRACE_LEN];
        let long = [b'x'; 200];
        let msg = core::str::from_utf8(&long).unwrap();
        let len = format_trace_line(&mut buf, TraceLevel::Info, format_args!("{}", msg));

        assert_eq!(len, MAX_TRACE_LEN);
        assert!(buf.starts_with(b"[INFO] xxx"));
        assert_eq!(&buf[len - 2..len], b"\r\n");
    }

    #[test]
    fn test_trace_level_ordering() {
        assert!(TraceLevel::Debug < TraceLevel::Info);
        assert!(TraceLevel::Info < TraceLevel::Error);
        assert!(TraceLevel::Error < TraceLevel::Fatal);
        assert!(TraceLevel::Fatal < TraceLevel::None);
    }

    #[test]
    fn test_trace_level_filter() {
        assert!(TraceLevel::Error.passes(TraceLevel::Info));
        assert!(!TraceLevel::Debug.passes(TraceLevel::Info));
        assert!(!TraceLevel::Fatal.passes(TraceLevel::None));
        assert!(!TraceLevel::None.passes(TraceLevel::Debug));
    }

    #[test]
    fn test_trace_level_roundtrip_u8() {
        for level in [TraceLevel::Debug, TraceLevel::Info, TraceLevel::Error, TraceLevel::Fatal] {
            assert_eq!(TraceLevel::from_u8(level as u8), level);
        }
        assert_eq!(TraceLevel::from_u8(200), TraceLevel::None);
    }
}
