use colored::Colorize;
use miette::Result;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::analysis::{ResultCategory, ScanResult};

/// Terminal reporter with colored output, grouped by file.
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, results: &[ScanResult]) -> Result<()> {
        if results.is_empty() {
            println!("{}", "No unused declarations found!".green().bold());
            return Ok(());
        }

        let mut by_file: HashMap<PathBuf, Vec<&ScanResult>> = HashMap::new();
        for result in results {
            by_file
                .entry(result.location.file.clone())
                .or_default()
                .push(result);
        }

        println!();
        println!(
            "{}",
            format!("Found {} unused declarations:", results.len())
                .yellow()
                .bold()
        );
        println!();

        let mut files: Vec<_> = by_file.keys().cloned().collect();
        files.sort();

        for file in files {
            println!("{}", file.display().to_string().cyan().bold());
            for result in &by_file[&file] {
                self.print_result(result);
            }
            println!();
        }

        self.print_summary(results);
        Ok(())
    }

    fn print_result(&self, result: &ScanResult) {
        let location = format!("{}:{}", result.location.line, result.location.column);
        println!(
            "  {} [{}] {}",
            location.dimmed(),
            result.category.code().dimmed(),
            result.message
        );
    }

    fn print_summary(&self, results: &[ScanResult]) {
        let mut counts: HashMap<ResultCategory, usize> = HashMap::new();
        for result in results {
            *counts.entry(result.category).or_default() += 1;
        }

        println!("{}", "─".repeat(60).dimmed());
        let mut parts: Vec<(ResultCategory, usize)> = counts.into_iter().collect();
        parts.sort_by_key(|(category, _)| category.code());
        let summary = parts
            .iter()
            .map(|(category, count)| format!("{} {}", count, category))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Summary: {}", summary);
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
