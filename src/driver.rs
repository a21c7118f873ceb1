//! Scan driver.
//!
//! Owns the full pipeline: validate the bundle, ingest index records in
//! parallel, commit them into the graph, enrich from syntax, reconcile
//! references, run the ordered mutation passes, compute reachability, and
//! collect results. The graph is created, populated, mutated, then frozen
//! and read; a caller never observes it partially built.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::analysis::mutators::{post_reachability_passes, pre_reachability_passes};
use crate::analysis::{ReachabilityAnalyzer, ResultCollector, ScanResult};
use crate::config::Config;
use crate::error::ScanError;
use crate::graph::{GraphCommitter, ReferenceReconciler, SourceGraph};
use crate::index::{IndexBundle, Ingestor};
use crate::syntax::{
    unused_parameters_by_function, FileSyntaxReport, SyntaxEnricher, SyntaxProvider,
};

pub struct Driver {
    config: Config,
    /// Syntax reports keyed by path, reused across scans of one driver.
    report_cache: HashMap<PathBuf, FileSyntaxReport>,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            report_cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one full analysis and return the ordered result records.
    pub fn scan(
        &mut self,
        bundle: &IndexBundle,
        syntax: &dyn SyntaxProvider,
    ) -> Result<Vec<ScanResult>, ScanError> {
        bundle.validate()?;

        let mut graph = SourceGraph::new();

        // Phase one: parallel ingest, single-threaded commit.
        let states = Ingestor::new(&self.config).ingest(bundle)?;
        GraphCommitter::new().commit(states, &mut graph);

        // Phase two: syntax enrichment, then reference reconciliation.
        let reports = self.syntax_reports(&graph, syntax)?;
        let enricher = SyntaxEnricher::new();
        {
            let table = CachedReports(&reports);
            enricher.enrich(&mut graph, &table)?;
        }
        ReferenceReconciler::new().reconcile(&mut graph);
        enricher.assign_roles(&mut graph);

        // Mutation passes, in their authoritative order.
        let unused_parameters = unused_parameters_by_function(&reports);
        for pass in pre_reachability_passes(&self.config, unused_parameters) {
            info!("Running pass: {}", pass.name());
            pass.mutate(&mut graph)?;
        }

        ReachabilityAnalyzer::new().mark_live(&mut graph);

        for pass in post_reachability_passes(&self.config) {
            info!("Running pass: {}", pass.name());
            pass.mutate(&mut graph)?;
        }

        Ok(ResultCollector::new().collect(&graph))
    }

    /// Fetch per-file syntax reports through the driver-scoped cache.
    fn syntax_reports(
        &mut self,
        graph: &SourceGraph,
        syntax: &dyn SyntaxProvider,
    ) -> Result<Vec<FileSyntaxReport>, ScanError> {
        let mut paths: Vec<PathBuf> = graph.files().map(|f| f.path.clone()).collect();
        paths.sort();

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(cached) = self.report_cache.get(&path) {
                reports.push(cached.clone());
                continue;
            }
            let report = syntax.file_report(&path)?;
            self.report_cache.insert(path, report.clone());
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Adapter presenting already-fetched reports as a provider, so the
/// enricher does not hit the real provider twice.
struct CachedReports<'a>(&'a [FileSyntaxReport]);

impl SyntaxProvider for CachedReports<'_> {
    fn file_report(&self, path: &std::path::Path) -> Result<FileSyntaxReport, ScanError> {
        Ok(self
            .0
            .iter()
            .find(|r| r.file == path)
            .cloned()
            .unwrap_or_else(|| FileSyntaxReport::new(path)))
    }
}
