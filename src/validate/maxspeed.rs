//! Short ways missing the maxspeed their neighbours agree on

use super::{findings_per_way, Analyzer, AnalyzerKind};
use crate::graph::{NodeId, RoadGraph, Way, WayId};
use crate::report::{codes, Finding, Fix};
use crate::tags::connecting_road_re;
use roadcheck_common::Result;

/// Only ways shorter than this (meters) get a fix
pub const MAX_FIX_LENGTH: f64 = 30.0;

/// Number of node positions where another road joins, `None` when an
/// endpoint lies outside the snapshot
fn connections(graph: &RoadGraph, way: &Way) -> Result<Option<usize>> {
    let Some((first, last)) = way.endpoints() else {
        return Ok(None);
    };
    if graph.is_outside_snapshot(first)? || graph.is_outside_snapshot(last)? {
        return Ok(None);
    }
    let class = connecting_road_re();
    let mut count = 0;
    for &node in &way.nodes {
        if graph
            .other_ways_at(node, way.id)?
            .iter()
            .any(|o| o.tags.highway_matches(class))
        {
            count += 1;
        }
    }
    Ok(Some(count))
}

/// `maxspeed` of the first way at `node` continuing the same name or ref
fn neighbour_maxspeed<'g>(graph: &'g RoadGraph, way: &Way, node: NodeId) -> Result<Option<&'g str>> {
    let continuation = graph
        .other_ways_at(node, way.id)?
        .into_iter()
        .find(|o| o.tags.shares_name_or_ref(&way.tags));
    Ok(continuation.and_then(|o| o.tags.get("maxspeed")))
}

fn check_way(graph: &RoadGraph, id: WayId) -> Result<Vec<Finding>> {
    let way = graph.try_way(id)?;
    if way.tags.has("maxspeed") {
        return Ok(Vec::new());
    }
    let Some((first, last)) = way.endpoints() else {
        return Ok(Vec::new());
    };
    let before = neighbour_maxspeed(graph, way, first)?;
    let after = neighbour_maxspeed(graph, way, last)?;
    let (Some(before), Some(after)) = (before, after) else {
        return Ok(Vec::new());
    };
    if before != after {
        return Ok(Vec::new());
    }

    let mut finding = Finding::warning(
        codes::MAXSPEED_BLANK_SPOT,
        "Maxspeed has a blank spot with equal maxspeeds on either side",
    )
    .with_ways([way.id]);
    if way.length() < MAX_FIX_LENGTH {
        finding = finding.with_fix(Fix::SetTag {
            targets: vec![way.id],
            key: "maxspeed".to_string(),
            value: before.to_string(),
        });
    }
    Ok(vec![finding])
}

pub struct MaxspeedAnalyzer;

impl Analyzer for MaxspeedAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Maxspeed
    }

    /// Highways joined by other roads at exactly two of their nodes
    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        graph
            .ways()
            .into_iter()
            .filter(|w| w.tags.highway().is_some())
            .filter(|w| matches!(connections(graph, w), Ok(Some(2))))
            .map(|w| w.id)
            .collect()
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        findings_per_way(self.kind(), candidates, |id| check_way(graph, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoadGraphBuilder;

    // 10 (1 -> 2) | 11 (2 -> 3) | 12 (3 -> 4), all "Main Street"
    fn street(gap_end_lon: f64, middle: &[(&str, &str)]) -> RoadGraph {
        RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, gap_end_lon)
            .node(4, 0.0, gap_end_lon + 0.001)
            .way(
                10,
                &[1, 2],
                &[("highway", "residential"), ("name", "Main Street"), ("maxspeed", "30")],
            )
            .way(11, &[2, 3], middle)
            .way(
                12,
                &[3, 4],
                &[("highway", "residential"), ("name", "Main Street"), ("maxspeed", "30")],
            )
            .build()
            .unwrap()
    }

    fn run(graph: &RoadGraph) -> Vec<Finding> {
        let analyzer = MaxspeedAnalyzer;
        let candidates = analyzer.collect(graph);
        analyzer.analyze(graph, &candidates)
    }

    #[test]
    fn test_short_gap_gets_fix() {
        let g = street(0.0012, &[("highway", "residential"), ("name", "Main Street")]);
        let findings = run(&g);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].fix,
            Some(Fix::SetTag {
                targets: vec![11],
                key: "maxspeed".into(),
                value: "30".into(),
            })
        );
    }

    #[test]
    fn test_long_gap_reported_without_fix() {
        let g = street(0.002, &[("highway", "residential"), ("name", "Main Street")]);
        let findings = run(&g);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].fix.is_none());
    }

    #[test]
    fn test_tagged_way_is_fine() {
        let g = street(
            0.0012,
            &[("highway", "residential"), ("name", "Main Street"), ("maxspeed", "50")],
        );
        assert!(run(&g).is_empty());
    }

    #[test]
    fn test_end_ways_are_not_candidates() {
        let g = street(0.0012, &[("highway", "residential"), ("name", "Main Street")]);
        assert_eq!(MaxspeedAnalyzer.collect(&g), vec![11]);
    }
}
