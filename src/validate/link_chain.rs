//! Destination tags on chains of slip roads
//!
//! A link way that runs into a through road should say where it leads
//! (`destination:ref` / `destination:street`), and that value should be
//! visible on the road it joins. Links feeding into each other end to end
//! form a chain; a proposed fix applies to the whole chain.

use rustc_hash::FxHashSet;

use super::{per_way, Analyzer, AnalyzerKind};
use crate::graph::{NodeId, RoadGraph, Way, WayId};
use crate::report::{codes, Finding, Fix};
use crate::tags::Oneway;
use roadcheck_common::Result;

/// Upper bound on predecessor steps walked from a seed link
pub const MAX_CHAIN_DEPTH: usize = 100;

const DESTINATION_KEYS: [&str; 2] = ["destination:ref", "destination:street"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainResolution {
    /// A way at the seed's end carries the destination value
    Resolved { via: WayId },
    Unresolved,
}

/// Seed link plus the link predecessors feeding into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChain {
    /// Seed first, then predecessors walking upstream
    pub ways: Vec<WayId>,
    pub resolution: ChainResolution,
}

impl LinkChain {
    pub fn seed(&self) -> Option<WayId> {
        self.ways.first().copied()
    }

    /// Predecessor steps taken from the seed
    pub fn depth(&self) -> usize {
        self.ways.len().saturating_sub(1)
    }
}

/// Walk upstream from `seed` while exactly one link feeds into the
/// current way's start
///
/// Stops at forks, at non-links, at ways already in the chain, at the
/// snapshot edge and after [`MAX_CHAIN_DEPTH`] steps.
pub fn extend_chain(graph: &RoadGraph, seed: &Way) -> Result<Vec<WayId>> {
    let mut chain = vec![seed.id];
    let mut visited: FxHashSet<WayId> = FxHashSet::default();
    visited.insert(seed.id);

    let mut current = seed;
    while chain.len() <= MAX_CHAIN_DEPTH {
        let Some(start) = current.first_node() else {
            break;
        };
        let siblings = graph.other_ways_at(start, current.id)?;
        let &[sibling] = siblings.as_slice() else {
            break;
        };
        if sibling.last_node() != Some(start)
            || !sibling.tags.is_link()
            || graph.is_outside_snapshot(start)?
        {
            break;
        }
        if !visited.insert(sibling.id) {
            tracing::trace!(seed = seed.id, way = sibling.id, "link chain closes a cycle");
            break;
        }
        chain.push(sibling.id);
        current = sibling;
    }
    if chain.len() > MAX_CHAIN_DEPTH {
        tracing::trace!(seed = seed.id, "link chain depth bound reached");
    }
    Ok(chain)
}

/// Look for the seed's destination value on the ways at its end node
pub fn resolve(graph: &RoadGraph, seed: &Way) -> Result<ChainResolution> {
    let Some(end) = seed.last_node() else {
        return Ok(ChainResolution::Unresolved);
    };
    for key in DESTINATION_KEYS {
        let Some(value) = seed.tags.get(key) else {
            continue;
        };
        for other in graph.other_ways_at(end, seed.id)? {
            if other.tags.is(key, value) || other.tags.is("ref", value) || other.tags.is("name", value)
            {
                return Ok(ChainResolution::Resolved { via: other.id });
            }
        }
    }
    Ok(ChainResolution::Unresolved)
}

/// Ways at `node` that traffic from the seed can continue onto
fn onward_ways<'g>(graph: &'g RoadGraph, seed: &Way, node: NodeId) -> Result<Vec<&'g Way>> {
    let mut ways = graph.other_ways_at(node, seed.id)?;
    ways.retain(|w| match w.tags.oneway() {
        Oneway::Forward => w.last_node() != Some(node),
        Oneway::Reverse => w.first_node() != Some(node),
        Oneway::No => true,
    });
    Ok(ways)
}

/// Destination tag to copy from `road` onto the chain, in priority order
fn proposed_destination(road: &Way) -> Option<(&'static str, String)> {
    let tags = &road.tags;
    let pick = if tags.has("destination:ref") && !tags.has("ref") {
        ("destination:ref", tags.get("destination:ref"))
    } else if tags.has("ref") && !tags.has("destination:ref") {
        ("destination:ref", tags.get("ref"))
    } else if tags.has("destination:street") && !tags.has("name") {
        ("destination:street", tags.get("destination:street"))
    } else if tags.has("name") && !tags.has("destination:street") {
        ("destination:street", tags.get("name"))
    } else {
        return None;
    };
    pick.1.map(|value| (pick.0, value.to_string()))
}

/// Outcome for one seed: the chain and the finding it produced, if any
#[derive(Debug)]
struct SeedOutcome {
    chain: LinkChain,
    finding: Option<Finding>,
}

fn check_seed(graph: &RoadGraph, id: WayId) -> Result<Option<SeedOutcome>> {
    let seed = graph.try_way(id)?;
    let Some(end) = seed.last_node() else {
        return Ok(None);
    };
    if graph.is_outside_snapshot(end)? {
        tracing::trace!(way = id, node = end, "link end outside snapshot");
        return Ok(None);
    }

    let ways = extend_chain(graph, seed)?;
    let upstream_end = ways
        .last()
        .and_then(|&w| graph.try_way(w).ok())
        .and_then(Way::first_node);
    if let Some(node) = upstream_end {
        if graph.is_outside_snapshot(node)? {
            tracing::trace!(way = id, node, "link chain starts outside snapshot");
            return Ok(None);
        }
    }

    let resolution = resolve(graph, seed)?;
    let finding = match resolution {
        ChainResolution::Resolved { .. } => None,
        ChainResolution::Unresolved => {
            let mut finding = Finding::warning(
                codes::DESTINATION_TAG_DOES_NOT_MATCH,
                "The destination tag does not match or does not exist",
            )
            .with_ways(ways.iter().copied());

            // never overwrite a destination already set anywhere on the chain
            let mut has_destination = false;
            for &w in &ways {
                let tags = &graph.try_way(w)?.tags;
                if DESTINATION_KEYS.iter().any(|k| tags.has(k)) {
                    has_destination = true;
                    break;
                }
            }
            let onward = onward_ways(graph, seed, end)?;
            if let [road] = onward.as_slice() {
                if !has_destination
                    && road.tags.highway().is_some()
                    && !road.tags.is_link()
                    && road.last_node() != Some(end)
                {
                    if let Some((key, value)) = proposed_destination(road) {
                        finding = finding.with_fix(Fix::SetTag {
                            targets: ways.clone(),
                            key: key.to_string(),
                            value,
                        });
                    }
                }
            }
            Some(finding)
        }
    };

    Ok(Some(SeedOutcome {
        chain: LinkChain { ways, resolution },
        finding,
    }))
}

pub struct LinkChainAnalyzer;

impl Analyzer for LinkChainAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::LinkChain
    }

    /// Link ways whose end touches a non-link road
    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        graph
            .ways()
            .into_iter()
            .filter(|w| w.tags.is_link())
            .filter(|w| {
                w.last_node()
                    .and_then(|end| graph.ways_at(end).ok())
                    .is_some_and(|at_end| {
                        at_end
                            .iter()
                            .any(|o| o.tags.highway().is_some() && !o.tags.is_link())
                    })
            })
            .map(|w| w.id)
            .collect()
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        let outcomes = per_way(self.kind(), candidates, |id| check_seed(graph, id));

        // a chain reported from one seed absorbs its upstream links
        let mut absorbed: FxHashSet<WayId> = FxHashSet::default();
        let mut findings = Vec::new();
        for (id, outcome) in outcomes {
            if absorbed.contains(&id) {
                continue;
            }
            let Some(outcome) = outcome else {
                continue;
            };
            if let Some(finding) = outcome.finding {
                absorbed.extend(outcome.chain.ways.iter().skip(1).copied());
                findings.push(finding);
            }
        }
        tracing::debug!(
            seeds = candidates.len(),
            absorbed = absorbed.len(),
            findings = findings.len(),
            "link chains analyzed"
        );
        findings
    }
}
