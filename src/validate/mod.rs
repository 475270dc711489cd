//! Analyzers
//!
//! Every analyzer runs in two explicit phases: `collect` picks the ways it
//! cares about, `analyze` turns (any prefix of) those candidates into
//! findings. Nothing is carried between runs.

mod abbreviations;
mod link_chain;
mod link_turn;
mod maxspeed;
mod name_ref;
mod turn_lanes;
mod y_junction;

pub use abbreviations::{Abbreviation, AbbreviationAnalyzer, Position};
pub use link_chain::{ChainResolution, LinkChain, LinkChainAnalyzer, MAX_CHAIN_DEPTH};
pub use link_turn::check_link_turn;
pub use maxspeed::MaxspeedAnalyzer;
pub use name_ref::NameRefAnalyzer;
pub use turn_lanes::TurnLanesAnalyzer;
pub use y_junction::{YJunctionAnalyzer, MAX_LINK_LENGTH};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ValidatorConfig;
use crate::graph::{RoadGraph, WayId};
use crate::report::Finding;
use roadcheck_common::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    TurnLanes,
    LinkChain,
    YJunction,
    Maxspeed,
    NameRef,
    Abbreviations,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 6] = [
        AnalyzerKind::TurnLanes,
        AnalyzerKind::LinkChain,
        AnalyzerKind::YJunction,
        AnalyzerKind::Maxspeed,
        AnalyzerKind::NameRef,
        AnalyzerKind::Abbreviations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalyzerKind::TurnLanes => "turn_lanes",
            AnalyzerKind::LinkChain => "link_chain",
            AnalyzerKind::YJunction => "y_junction",
            AnalyzerKind::Maxspeed => "maxspeed",
            AnalyzerKind::NameRef => "name_ref",
            AnalyzerKind::Abbreviations => "abbreviations",
        }
    }

    /// Instantiate the analyzer for this kind
    pub fn build(self, config: &ValidatorConfig) -> Box<dyn Analyzer> {
        match self {
            AnalyzerKind::TurnLanes => Box::new(TurnLanesAnalyzer::new(
                config.check_turn_lanes_at_intersections,
            )),
            AnalyzerKind::LinkChain => Box::new(LinkChainAnalyzer),
            AnalyzerKind::YJunction => Box::new(YJunctionAnalyzer::new(config.driving_side)),
            AnalyzerKind::Maxspeed => Box::new(MaxspeedAnalyzer),
            AnalyzerKind::NameRef => Box::new(NameRefAnalyzer),
            AnalyzerKind::Abbreviations => Box::new(AbbreviationAnalyzer::new()),
        }
    }
}

/// One validation pass over the road graph
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;

    /// Candidate ways, ascending id
    fn collect(&self, graph: &RoadGraph) -> Vec<WayId>;

    /// Findings for the given candidates
    ///
    /// Valid for any prefix of what `collect` returned, so the host can
    /// stop between calls.
    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding>;
}

/// Run `check` for every candidate on the rayon pool
///
/// Results keep candidate order. A failing way is logged and dropped; it
/// never affects the other candidates.
pub(crate) fn per_way<T, F>(kind: AnalyzerKind, candidates: &[WayId], check: F) -> Vec<(WayId, T)>
where
    T: Send,
    F: Fn(WayId) -> Result<T> + Sync + Send,
{
    candidates
        .par_iter()
        .filter_map(|&id| match check(id) {
            Ok(value) => Some((id, value)),
            Err(e) => {
                tracing::warn!(
                    analyzer = kind.name(),
                    way = id,
                    lookup = e.is_lookup_failure(),
                    error = %e,
                    "way skipped"
                );
                None
            }
        })
        .collect()
}

/// `per_way` for analyzers without ordering-dependent state
pub(crate) fn findings_per_way<F>(kind: AnalyzerKind, candidates: &[WayId], check: F) -> Vec<Finding>
where
    F: Fn(WayId) -> Result<Vec<Finding>> + Sync + Send,
{
    per_way(kind, candidates, check)
        .into_iter()
        .flat_map(|(_, findings)| findings)
        .collect()
}

/// Ids of the ways matching `keep`, ascending
pub(crate) fn ways_where(graph: &RoadGraph, keep: impl Fn(&crate::graph::Way) -> bool) -> Vec<WayId> {
    graph
        .ways()
        .into_iter()
        .filter(|w| keep(w))
        .map(|w| w.id)
        .collect()
}
