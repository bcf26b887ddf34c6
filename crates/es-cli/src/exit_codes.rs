//! Process exit codes for `es-scrub`.
//!
//! - 0-9: the command ran; events (if any) were written
//! - 10-19: fix the invocation, the rules or the input and retry
//! - 20-29: internal or I/O failure

/// Exit status of an `es-scrub` run. Values are stable for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Everything scrubbed without contained failures.
    Clean = 0,
    /// `--strict` run in which a rule or scrub function failed.
    ScrubErrors = 1,

    /// Command line rejected.
    ArgsError = 10,
    /// Rules file missing, unparsable or invalid.
    ConfigError = 11,
    /// Input is not valid JSON.
    InputError = 12,

    /// Bug.
    InternalError = 20,
    /// Reading input or writing output failed.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_operational(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::ScrubErrors)
    }

    pub fn is_user_error(self) -> bool {
        matches!(
            self,
            ExitCode::ArgsError | ExitCode::ConfigError | ExitCode::InputError
        )
    }

    pub fn is_internal_error(self) -> bool {
        matches!(self, ExitCode::InternalError | ExitCode::IoError)
    }

    /// Symbolic name used in machine-readable output.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ScrubErrors => "OK_SCRUB_ERRORS",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
