//! Validation engine: runs the enabled analyzers over one graph snapshot

use std::time::Instant;

use tracing::{debug, info};

use crate::config::ValidatorConfig;
use crate::graph::{RoadGraph, Snapshot};
use crate::report::Report;
use crate::validate::{Analyzer, AnalyzerKind};
use roadcheck_common::Result;

pub struct Engine {
    config: ValidatorConfig,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Engine {
    /// Instantiate the analyzers enabled in `config`
    ///
    /// Analyzers run in a fixed order regardless of how `enabled` lists them.
    pub fn new(config: ValidatorConfig) -> Self {
        let analyzers = AnalyzerKind::ALL
            .into_iter()
            .filter(|&kind| config.is_enabled(kind))
            .map(|kind| kind.build(&config))
            .collect();
        Self { config, analyzers }
    }

    /// Append a custom analyzer, run after the built-in ones
    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn analyzer_kinds(&self) -> Vec<AnalyzerKind> {
        self.analyzers.iter().map(|a| a.kind()).collect()
    }

    /// Run every analyzer's two phases and concatenate their findings
    pub fn run(&self, graph: &RoadGraph) -> Report {
        let start = Instant::now();
        let mut report = Report::new();

        for analyzer in &self.analyzers {
            let phase = Instant::now();
            let candidates = analyzer.collect(graph);
            let findings = analyzer.analyze(graph, &candidates);
            debug!(
                analyzer = analyzer.kind().name(),
                candidates = candidates.len(),
                findings = findings.len(),
                elapsed_ms = phase.elapsed().as_millis() as u64,
                "analyzer finished"
            );
            report.extend(findings);
        }

        info!(
            analyzers = self.analyzers.len(),
            ways = graph.n_ways(),
            findings = report.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "validation complete"
        );
        report
    }

    /// Build the graph from a snapshot and run over it
    pub fn run_snapshot(&self, snapshot: Snapshot) -> Result<Report> {
        let graph = RoadGraph::from_snapshot(snapshot)?;
        Ok(self.run(&graph))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}
