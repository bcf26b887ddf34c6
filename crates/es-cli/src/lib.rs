//! Support library for the `es-scrub` binary.

pub mod exit_codes;
pub mod logging;
pub mod stream;

pub use exit_codes::ExitCode;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use stream::{scrub_stream, InputMode, StreamError, StreamOutcome};
