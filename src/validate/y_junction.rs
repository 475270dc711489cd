//! Roads ending in a Y of link ways
//!
//! At each end of a through road the incident link ways are classified.
//! Links passing over the end node are always suspicious; two short links
//! forking there, or three and more links fanning out, suggest the junction
//! was drawn as a Y instead of a proper intersection. Link ways themselves
//! are checked for a missing turn restriction (see [`check_link_turn`]).

use super::link_turn::check_link_turn;
use super::{findings_per_way, ways_where, Analyzer, AnalyzerKind};
use crate::config::DrivingSide;
use crate::graph::{NodeId, RoadGraph, Way, WayId};
use crate::report::{codes, Finding};
use roadcheck_common::Result;

/// Links shorter than this (meters) count as a short fork
pub const MAX_LINK_LENGTH: f64 = 30.0;

pub struct YJunctionAnalyzer {
    driving_side: DrivingSide,
}

impl YJunctionAnalyzer {
    pub fn new(driving_side: DrivingSide) -> Self {
        Self { driving_side }
    }

    fn check_way(&self, graph: &RoadGraph, id: WayId) -> Result<Vec<Finding>> {
        let way = graph.try_way(id)?;
        let mut findings = Vec::new();
        if way.is_degenerate() {
            return Ok(findings);
        }

        if way.tags.is_link() {
            let inside = match way.endpoints() {
                Some((first, last)) => {
                    !graph.is_outside_snapshot(first)? && !graph.is_outside_snapshot(last)?
                }
                None => false,
            };
            if inside {
                findings.extend(check_link_turn(graph, way, self.driving_side)?);
            }
            return Ok(findings);
        }

        if let Some((first, last)) = way.endpoints() {
            check_end(graph, way, first, &mut findings)?;
            if last != first {
                check_end(graph, way, last, &mut findings)?;
            }
        }
        Ok(findings)
    }
}

fn check_end(graph: &RoadGraph, road: &Way, end: NodeId, findings: &mut Vec<Finding>) -> Result<()> {
    if graph.is_outside_snapshot(end)? {
        tracing::trace!(way = road.id, node = end, "road end outside snapshot");
        return Ok(());
    }
    let others = graph.other_ways_at(end, road.id)?;
    // the road carries on under the same name or ref
    if others.iter().any(|o| o.tags.shares_name_or_ref(&road.tags)) {
        return Ok(());
    }

    let mut ending: Vec<&Way> = Vec::new();
    for link in others.iter().filter(|o| o.tags.is_link()) {
        if link.is_endpoint(end) {
            ending.push(link);
        } else {
            findings.push(
                Finding::warning(
                    codes::LINK_PASSES_THROUGH_ROAD_END,
                    "Check for Y junction links (link passes through road)",
                )
                .with_ways([road.id, link.id]),
            );
        }
    }

    match ending.as_slice() {
        [a, b] => {
            if a.length() < MAX_LINK_LENGTH && b.length() < MAX_LINK_LENGTH {
                findings.push(
                    Finding::warning(
                        codes::ROAD_ENDS_WITH_LINKS,
                        "Check for Y junction links (road has two links at the end)",
                    )
                    .with_ways([road.id, a.id, b.id]),
                );
            }
        }
        links if links.len() >= 3 => {
            findings.push(
                Finding::warning(
                    codes::ROAD_ENDS_WITH_LINKS,
                    "Check for Y junction links (road has multiple links leaving from the end)",
                )
                .with_ways(links.iter().map(|l| l.id).chain([road.id])),
            );
        }
        _ => {}
    }
    Ok(())
}

impl Analyzer for YJunctionAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::YJunction
    }

    /// Through roads (end checks) and link ways (turn restriction checks)
    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        ways_where(graph, |w| w.tags.is_through_road() || w.tags.is_link())
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        findings_per_way(self.kind(), candidates, |id| self.check_way(graph, id))
    }
}
