//! Module: config
//!
//! Purpose: Buffer sizing and runtime settings for the serial CLI.
//!
//! Architecture:
//! - Capacities are compile-time constants (static allocation, no heap)
//! - Every ring capacity must be a power of two (index masking)
//! - `CliConfig` is `Copy` and usable in `const` context so a whole
//!   `CliPort` can be built in a `static`

use crate::trace::TraceLevel;

/// Raw bytes received from the terminal, waiting for the line discipline.
pub const INPUT_BUFFER_SIZE: usize = 32;

/// Keystroke echo and line-editing output.
pub const ECHO_BUFFER_SIZE: usize = 256;

/// Command processor output.
pub const RESPONSE_BUFFER_SIZE: usize = 256;

/// Trace / log output.
pub const TRACE_BUFFER_SIZE: usize = 256;

/// Size of each pending line buffer, delimiter included.
pub const LINE_SIZE: usize = 128;

/// Trace content buffer: a single formatted trace line never exceeds this.
pub const MAX_TRACE_LEN: usize = 140;

const _: () = assert!(INPUT_BUFFER_SIZE.is_power_of_two(), "input buffer size must be power of 2");
const _: () = assert!(ECHO_BUFFER_SIZE.is_power_of_two(), "echo buffer size must be power of 2");
const _: () = assert!(RESPONSE_BUFFER_SIZE.is_power_of_two(), "response buffer size must be power of 2");
const _: () = assert!(TRACE_BUFFER_SIZE.is_power_of_two(), "trace buffer size must be power of 2");
const _: () = assert!(LINE_SIZE >= 2, "line must hold a character and its delimiter");

/// Runtime configuration for one CLI port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CliConfig {
    /// Serial baud rate, handed to the transceiver in `module_init`.
    pub baud_rate: u32,
    /// Prompt drawn in front of the user's line.
    pub prompt: &'static str,
    /// Initial software flow-control state of the trace stream.
    pub xon_at_start: bool,
    /// Minimum trace level dispatched to the trace stream.
    pub trace_level: TraceLevel,
}

impl CliConfig {
    /// Default settings: 115200 baud, `"> "` prompt, trace enabled at `Info`.
    pub const DEFAULT: Self = Self {
        baud_rate: 115_200,
        prompt: "> ",
        xon_at_start: true,
        trace_level: TraceLevel::Info,
    };

    /// Same configuration with a different prompt.
    pub const fn with_prompt(self, prompt: &'static str) -> Self {
        Self { prompt, ..self }
    }

    /// True if a redraw (`\r`, prompt, a full line) fits in the echo stream.
    pub const fn prompt_fits(&self) -> bool {
        1 + self.prompt.len() + LINE_SIZE <= ECHO_BUFFER_SIZE
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.prompt, "> ");
        assert!(config.xon_at_start);
        assert_eq!(config.trace_level, TraceLevel::Info);
        assert!(config.prompt_fits());
    }

    #[test]
    fn test_long_prompt_does_not_fit() {
        const LONG: &str = "0123456789012345678901234567890123456789012345678901234567890123456789\
                            0123456789012345678901234567890123456789012345678901234567890123456789";
        let config = CliConfig::DEFAULT.with_prompt(LONG);
        assert!(!config.prompt_fits());
    }
}
