//! The single JSON object printed on stdout.

use std::io::{self, Write};
use std::process::ExitCode;

use serde::Serialize;

/// Run outcome as seen by callers: `{"success":true}` or `{"error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success { success: bool },
    Failure { error: String },
}

impl Envelope {
    pub fn success() -> Self {
        Self::Success { success: true }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Compact JSON. Falls back to a fixed error object if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"failed to encode result"}"#.to_string())
    }

    /// Write the envelope as one line.
    pub fn write_to(&self, mut out: impl Write) -> io::Result<()> {
        writeln!(out, "{}", self.to_json())?;
        out.flush()
    }

    /// Print to stdout and map to the process exit code.
    pub fn emit(&self) -> ExitCode {
        // stdout closed; the exit code still reports the outcome
        let _ = self.write_to(io::stdout().lock());
        self.exit_code()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
