//! Process exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::IngestStats;

/// Exit codes for the `rijdupe` binary.
///
/// - 0: every received record was accepted
/// - 1: general error
/// - 2: no record was accepted
/// - 3: partial success, some records were rejected
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NoRecords = 2,
    PartialSuccess = 3,
    Interrupted = 130,
}

impl ExitCode {
    /// The numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RJ000",
            Self::GeneralError => "RJ001",
            Self::NoRecords => "RJ002",
            Self::PartialSuccess => "RJ003",
            Self::Interrupted => "RJ130",
        }
    }

    /// Classify a finished (or interrupted) batch.
    #[must_use]
    pub fn from_batch(stats: &IngestStats, interrupted: bool) -> Self {
        if interrupted {
            Self::Interrupted
        } else if stats.accepted() == 0 {
            Self::NoRecords
        } else if stats.rejected > 0 {
            Self::PartialSuccess
        } else {
            Self::Success
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as `"RJ001"`.
    pub code: String,
    pub exit_code: i32,
    pub message: String,
    /// Full `anyhow` context chain, outermost first.
    pub causes: Vec<String>,
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NoRecords.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_from_batch() {
        let mut stats = IngestStats::default();
        assert_eq!(ExitCode::from_batch(&stats, false), ExitCode::NoRecords);

        stats.received = 3;
        stats.created = 2;
        assert_eq!(ExitCode::from_batch(&stats, false), ExitCode::Success);

        stats.rejected = 1;
        assert_eq!(ExitCode::from_batch(&stats, false), ExitCode::PartialSuccess);
        assert_eq!(ExitCode::from_batch(&stats, true), ExitCode::Interrupted);
    }

    #[test]
    fn test_structured_error_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to write backup");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);

        assert_eq!(structured.code, "RJ001");
        assert_eq!(structured.message, "Failed to write backup");
        assert_eq!(structured.causes, vec!["disk full".to_string()]);
        assert!(!structured.interrupted);

        let json = serde_json::to_string(&structured).unwrap();
        assert!(json.contains(r#""exit_code":1"#));
    }
}
