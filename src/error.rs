//! Typed error handling for declsweep.
//!
//! Provides structured errors that library consumers can match on,
//! with full context about which file or index store failed.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for declsweep operations.
#[derive(Error, Debug, Diagnostic)]
pub enum ScanError {
    /// One or more source files have no compilation unit in any index store.
    #[error("{} source file(s) have no index unit: {}", files.len(), format_paths(files))]
    #[diagnostic(help("ensure the project was built with indexing enabled before scanning"))]
    UnindexedFiles { files: Vec<PathBuf> },

    /// The same file appears in multiple units that disagree on module name.
    #[error("index units disagree on the module of {}: {}", file.display(), modules.join(", "))]
    ConflictingIndexUnits { file: PathBuf, modules: Vec<String> },

    /// The underlying index cannot be opened or a record is malformed.
    #[error("failed to read index at {}: {message}", path.display())]
    IndexRead { path: PathBuf, message: String },

    /// The syntax parser failed on a file the analyzer needs.
    #[error("syntax report unavailable for {}: {message}", file.display())]
    Syntax { file: PathBuf, message: String },
}

impl ScanError {
    /// Create an index read error with path context.
    pub fn index_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IndexRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a syntax failure for a whole file.
    pub fn syntax(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            message: message.into(),
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for fallible declsweep operations.
pub type SweepResult<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unindexed_files_message() {
        let err = ScanError::UnindexedFiles {
            files: vec![PathBuf::from("A.swift"), PathBuf::from("B.swift")],
        };
        let message = err.to_string();
        assert!(message.contains("2 source file(s)"));
        assert!(message.contains("A.swift"));
    }

    #[test]
    fn test_conflicting_units_message() {
        let err = ScanError::ConflictingIndexUnits {
            file: PathBuf::from("A.swift"),
            modules: vec!["App".to_string(), "Kit".to_string()],
        };
        assert!(err.to_string().contains("App, Kit"));
    }
}
