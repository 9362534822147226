// src/exit.rs
//! Process exit codes for `a11ytrend`.
//!
//! CI jobs gate on `Regressed` to fail a build that introduced new
//! accessibility defects.

use std::process::Termination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum A11yExit {
    /// Run completed with no new occurrences.
    Success = 0,
    /// Generic error (I/O, config, persistence).
    Error = 1,
    /// Scanner input unreadable, or no site could be derived.
    InvalidInput = 2,
    /// Run completed and found new occurrences against the baseline.
    Regressed = 7,
}

impl A11yExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Termination for A11yExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}
