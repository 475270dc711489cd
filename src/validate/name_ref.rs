//! Places where a road's name or ref silently changes
//!
//! At each end of a named road the ways carrying the same value on are
//! weighed: a one-way way counts 1, a two-way way 2. A two-way road expects
//! weight 2 to continue, a one-way road 1. A mismatch is reported unless the
//! two weights add up to 4, the signature of a dual carriageway split.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use super::{per_way, Analyzer, AnalyzerKind};
use crate::graph::{NodeId, RoadGraph, Way, WayId};
use crate::report::{codes, ElementId, Finding};
use roadcheck_common::Result;

const KEYS: [(&str, u32, &str); 2] = [
    ("ref", codes::REF_CHANGES, "The ref changes"),
    ("name", codes::NAME_CHANGES, "The name changes"),
];

fn weight(way: &Way) -> u32 {
    if way.tags.oneway().is_oneway() {
        1
    } else {
        2
    }
}

fn check_end(
    graph: &RoadGraph,
    way: &Way,
    key: &str,
    node: NodeId,
) -> Result<Option<Vec<WayId>>> {
    let Some(value) = way.tags.get(key) else {
        return Ok(None);
    };
    if graph.is_outside_snapshot(node)? {
        return Ok(None);
    }
    let others = graph.other_ways_at(node, way.id)?;
    if others.is_empty() {
        return Ok(None);
    }

    // only ways that start or end here continue the road
    let mut ending: Vec<&Way> = others.into_iter().filter(|o| o.is_endpoint(node)).collect();

    // a differing value seen twice is a crossing road, not a continuation
    let mut differing: BTreeMap<&str, usize> = BTreeMap::new();
    for other in &ending {
        if let Some(v) = other.tags.get(key).filter(|v| *v != value) {
            *differing.entry(v).or_default() += 1;
        }
    }
    if differing.values().any(|&n| n > 1) {
        ending.retain(|o| !matches!(o.tags.get(key), Some(v) if differing.contains_key(v)));
    }
    if ending.is_empty() {
        return Ok(None);
    }

    let expected = weight(way);
    let actual: u32 = ending
        .iter()
        .filter(|o| o.tags.highway().is_some() && o.tags.is(key, value))
        .map(|o| weight(o))
        .sum();
    if expected == actual || expected + actual == 4 {
        return Ok(None);
    }
    Ok(Some(ending.iter().map(|o| o.id).chain([way.id]).collect()))
}

fn check_way(graph: &RoadGraph, id: WayId) -> Result<Vec<Finding>> {
    let way = graph.try_way(id)?;
    let Some((first, last)) = way.endpoints() else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();
    for (key, code, message) in KEYS {
        for node in [first, last] {
            if let Some(ways) = check_end(graph, way, key, node)? {
                findings.push(Finding::warning(code, message).with_ways(ways));
            }
        }
    }
    Ok(findings)
}

pub struct NameRefAnalyzer;

impl Analyzer for NameRefAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::NameRef
    }

    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        super::ways_where(graph, |w| w.tags.highway().is_some() && !w.is_degenerate())
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        let results = per_way(self.kind(), candidates, |id| check_way(graph, id));

        // every way named in a finding is settled for the rest of the pass
        let mut visited: FxHashSet<WayId> = FxHashSet::default();
        let mut findings = Vec::new();
        for (id, way_findings) in results {
            if visited.contains(&id) {
                continue;
            }
            for finding in way_findings {
                visited.extend(finding.elements.iter().filter_map(|e| match e {
                    ElementId::Way(w) => Some(*w),
                    _ => None,
                }));
                findings.push(finding);
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoadGraphBuilder;

    fn run(graph: &RoadGraph) -> Vec<Finding> {
        let analyzer = NameRefAnalyzer;
        let candidates = analyzer.collect(graph);
        analyzer.analyze(graph, &candidates)
    }

    #[test]
    fn test_name_change_reported_once() {
        let g = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .way(10, &[1, 2], &[("highway", "residential"), ("name", "Oak Road")])
            .way(11, &[2, 3], &[("highway", "residential"), ("name", "Elm Road")])
            .build()
            .unwrap();
        let findings = run(&g);
        // way 11 is settled by the finding on way 10
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, codes::NAME_CHANGES);
        assert_eq!(findings[0].elements, vec![ElementId::Way(11), ElementId::Way(10)]);
    }

    #[test]
    fn test_same_name_continues() {
        let g = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .way(10, &[1, 2], &[("highway", "primary"), ("ref", "B7")])
            .way(11, &[2, 3], &[("highway", "primary"), ("ref", "B7")])
            .build()
            .unwrap();
        assert!(run(&g).is_empty());
    }

    #[test]
    fn test_dual_carriageway_split() {
        // two-way 10 splits into one-way 11 (out) and 12 (in)
        let g = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0001, 0.002)
            .node(4, -0.0001, 0.002)
            .way(10, &[1, 2], &[("highway", "primary"), ("name", "Ring")])
            .way(
                11,
                &[2, 3],
                &[("highway", "primary"), ("name", "Ring"), ("oneway", "yes")],
            )
            .way(
                12,
                &[4, 2],
                &[("highway", "primary"), ("name", "Ring"), ("oneway", "yes")],
            )
            .build()
            .unwrap();
        assert!(run(&g).is_empty());
    }

    #[test]
    fn test_crossing_side_road_is_ignored() {
        // 10 ends where side road "Elm" (20, 21) crosses; 11 continues "Oak"
        let g = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .node(4, 0.001, 0.001)
            .node(5, -0.001, 0.001)
            .way(10, &[1, 2], &[("highway", "residential"), ("name", "Oak")])
            .way(11, &[2, 3], &[("highway", "residential"), ("name", "Oak")])
            .way(20, &[2, 4], &[("highway", "residential"), ("name", "Elm")])
            .way(21, &[5, 2], &[("highway", "residential"), ("name", "Elm")])
            .build()
            .unwrap();
        assert!(run(&g).is_empty());
    }
}
