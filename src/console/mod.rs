//! Serial console core: line editing and output scheduling
//!
//! Zero heap allocation - all static buffers.
//! Everything here runs in the interrupt context except the ready-line
//! reader used by the foreground.

pub mod discipline;
pub mod error;
pub mod line_buffer;
pub mod scheduler;

pub use discipline::{LineDiscipline, LineListener};
pub use error::CliError;
pub use line_buffer::{LinePair, PendingLine};
pub use scheduler::{Source, TxScheduler, TxState};

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");
