use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;

use crate::analysis::ScanResult;

/// JSON reporter, to stdout or a file.
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, results: &[ScanResult]) -> Result<()> {
        let json = serde_json::to_string_pretty(results).into_diagnostic()?;

        match &self.output_path {
            Some(path) => std::fs::write(path, json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report to {}", path.display())),
            None => {
                println!("{}", json);
                Ok(())
            }
        }
    }
}
