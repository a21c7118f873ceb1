mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::ScanResult;
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Formatter boundary: consumes the collected result records.
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
        }
    }

    pub fn report(&self, results: &[ScanResult]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(results),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(results),
        }
    }
}
