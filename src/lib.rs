//! Roadcheck - topology and lane-semantics checks for OSM road graphs
//!
//! The host hands over a [`Snapshot`] of nodes, ways and relations; the
//! [`Engine`] runs the enabled analyzers over it and returns a [`Report`] of
//! findings, each optionally carrying a [`Fix`] for the host to apply.
//!
//! ```no_run
//! use roadcheck::{Engine, Snapshot, ValidatorConfig};
//!
//! # fn main() -> roadcheck::Result<()> {
//! let snapshot = Snapshot::from_json(&std::fs::read_to_string("area.json")?)?;
//! let config = ValidatorConfig::load("roadcheck.toml")?;
//! let report = Engine::new(config).run_snapshot(snapshot)?;
//! for finding in report.into_sorted() {
//!     println!("{} {}", finding.code, finding.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bearing;
pub mod config;
pub mod engine;
pub mod geo;
pub mod graph;
pub mod lanes;
pub mod report;
pub mod tags;
pub mod validate;

pub use bearing::TurnDirection;
pub use config::{DrivingSide, ValidatorConfig};
pub use engine::Engine;
pub use graph::{RoadGraph, RoadGraphBuilder, Snapshot};
pub use lanes::LaneSignature;
pub use report::{ElementId, Finding, Fix, Report, Severity};
pub use validate::{Analyzer, AnalyzerKind};

pub use roadcheck_common::{Error, Result};

/// Parse a JSON snapshot and validate it in one go
pub fn validate_json(json: &str, config: &ValidatorConfig) -> Result<Report> {
    let snapshot = Snapshot::from_json(json)?;
    Engine::new(config.clone()).run_snapshot(snapshot)
}
