//! Console error types

/// Setup error with code and message
///
/// Runtime overflow is never an error: it is dropped and counted
/// (see [`crate::diag`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliError {
    /// E01: Port handles were already taken
    AlreadySplit,
    /// E02: Prompt plus a full line does not fit the echo stream
    PromptTooLong,
}

impl CliError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadySplit => "E01",
            Self::PromptTooLong => "E02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadySplit => "port already split",
            Self::PromptTooLong => "prompt too long",
        }
    }
}

impl core::fmt::Display for CliError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
