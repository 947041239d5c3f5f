// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stage;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Preconditions (checked before any stage runs) --
    #[error("source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("unsupported source document: {0}")]
    UnsupportedSource(String),

    #[error("invalid crop rectangle {0:?}: expected 'x1,y1,x2,y2' with x1 < x2 and y1 < y2")]
    InvalidCrop(String),

    #[error("invalid page list {0:?}: expected comma-separated page numbers such as '1,3,5'")]
    InvalidPageList(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("stage {stage} has no input: nothing produced earlier in this run and no files matching {pattern}")]
    MissingArtifacts { stage: Stage, pattern: String },

    // -- External tools (recovered through the built-in algorithms) --
    #[error("{0} is not available")]
    ToolUnavailable(String),

    #[error("{tool} failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    // -- Processing --
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How an error affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input or missing dependency; reported before (or instead of) work.
    Precondition,
    /// An external tool let us down; the built-in algorithm takes over.
    Degraded,
    /// Anything else. Aborts the run.
    Unclassified,
}

impl FolioError {
    /// Classify this error for fallback and exit-code decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SourceNotFound(_)
            | Self::UnsupportedSource(_)
            | Self::InvalidCrop(_)
            | Self::InvalidPageList(_)
            | Self::InvalidConfig(_)
            | Self::MissingArtifacts { .. } => ErrorClass::Precondition,

            Self::ToolUnavailable(_) | Self::ExternalTool { .. } | Self::ToolTimeout { .. } => {
                ErrorClass::Degraded
            }

            Self::Rasterize(_)
            | Self::ImageError(_)
            | Self::PdfError(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorClass::Unclassified,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failures_are_degraded() {
        let timeout = FolioError::ToolTimeout {
            tool: "convert".into(),
            seconds: 5,
        };
        assert_eq!(timeout.class(), ErrorClass::Degraded);
        assert_eq!(
            FolioError::ToolUnavailable("convert".into()).class(),
            ErrorClass::Degraded
        );
    }

    #[test]
    fn input_errors_are_preconditions() {
        assert_eq!(
            FolioError::InvalidCrop("1,2,3".into()).class(),
            ErrorClass::Precondition
        );
        let missing = FolioError::MissingArtifacts {
            stage: Stage::Split,
            pattern: "MonLivre_NNN_double.png".into(),
        };
        assert_eq!(missing.class(), ErrorClass::Precondition);
        assert!(missing.to_string().contains("MonLivre_NNN_double.png"));
    }

    #[test]
    fn io_errors_abort() {
        let err = FolioError::from(std::io::Error::other("disk full"));
        assert_eq!(err.class(), ErrorClass::Unclassified);
    }
}
