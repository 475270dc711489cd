//! Turn-lane consistency at the junction a lane set leads to
//!
//! For each tagged direction of a way the pivot is the node traffic reaches
//! last (the last node going forward, the first going backward). The
//! departures at the pivot are compared with what the lanes promise.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use super::{findings_per_way, ways_where, Analyzer, AnalyzerKind};
use crate::bearing::{self, TurnDirection};
use crate::graph::{NodeId, RoadGraph, Way, WayId};
use crate::lanes::{continuity_matches, Direction, LaneError, LaneSignature, TurnToken};
use crate::report::{codes, ElementId, Finding};
use crate::tags::{MalformedTag, Oneway, Tags};
use roadcheck_common::Result;

/// Half-width of the sector around straight ahead that counts as through
pub const THROUGH_SECTOR: f64 = PI / 6.0;

/// More junction nodes than this along a way make its lanes ambiguous
const MAX_JUNCTION_NODES: usize = 2;
const MAX_CONNECTED_ONEWAYS: usize = 2;

const TURNING: [Direction; 2] = [Direction::Left, Direction::Right];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Travel {
    Forward,
    Backward,
}

impl Travel {
    fn label(self) -> &'static str {
        match self {
            Travel::Forward => "forward",
            Travel::Backward => "backward",
        }
    }

    fn turn_lanes_key(self) -> &'static str {
        match self {
            Travel::Forward => "turn:lanes:forward",
            Travel::Backward => "turn:lanes:backward",
        }
    }

    fn lanes_key(self) -> &'static str {
        match self {
            Travel::Forward => "lanes:forward",
            Travel::Backward => "lanes:backward",
        }
    }
}

/// Direction plain `turn:lanes` describes
fn plain_travel(tags: &Tags) -> Travel {
    if tags.oneway() == Oneway::Reverse {
        Travel::Backward
    } else {
        Travel::Forward
    }
}

/// Raw turn-lane value for one travel direction
fn turn_lanes_for(tags: &Tags, travel: Travel) -> Option<&str> {
    tags.get(travel.turn_lanes_key()).or_else(|| {
        if plain_travel(tags) == travel {
            tags.get("turn:lanes")
        } else {
            None
        }
    })
}

/// Lane count for one travel direction: `lanes` on one-way roads,
/// `lanes:forward` / `lanes:backward` otherwise
fn lane_count_for(tags: &Tags, travel: Travel) -> std::result::Result<Option<u32>, MalformedTag> {
    if tags.oneway().is_oneway() {
        tags.lane_count("lanes")
    } else {
        tags.lane_count(travel.lanes_key())
    }
}

/// A permitted way out of the pivot
#[derive(Debug, Clone, Copy)]
struct Departure {
    way: WayId,
    travel: Travel,
    direction: Direction,
    /// Angle off straight ahead, radians
    deviation: f64,
}

fn departure_direction(delta: f64) -> Direction {
    // straight back along the approach is a reverse lane's job
    if delta.abs() <= bearing::STRAIGHT_TOLERANCE {
        return Direction::Left;
    }
    if PI - delta.abs() <= THROUGH_SECTOR {
        return Direction::Through;
    }
    match bearing::direction_for_delta(delta) {
        TurnDirection::Left => Direction::Left,
        TurnDirection::Right => Direction::Right,
        _ => Direction::Through,
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Left => "left",
        Direction::Through => "through",
        Direction::Right => "right",
    }
}

pub struct TurnLanesAnalyzer {
    check_intersections: bool,
}

impl TurnLanesAnalyzer {
    pub fn new(check_intersections: bool) -> Self {
        Self {
            check_intersections,
        }
    }

    fn check_way(&self, graph: &RoadGraph, id: WayId) -> Result<Vec<Finding>> {
        let way = graph.try_way(id)?;
        let mut findings = Vec::new();
        if way.is_degenerate() {
            tracing::trace!(way = id, "turn lanes on degenerate way");
            return Ok(findings);
        }

        if let Some(finding) = unclear_turning(graph, way)? {
            findings.push(finding);
        }
        for travel in [Travel::Forward, Travel::Backward] {
            if let Some(raw) = turn_lanes_for(&way.tags, travel) {
                self.check_direction(graph, way, travel, raw, &mut findings)?;
            }
        }
        Ok(findings)
    }

    fn check_direction(
        &self,
        graph: &RoadGraph,
        way: &Way,
        travel: Travel,
        raw: &str,
        findings: &mut Vec<Finding>,
    ) -> Result<()> {
        let expected = match lane_count_for(&way.tags, travel) {
            Ok(count) => count,
            Err(bad) => {
                findings.push(
                    Finding::warning(
                        codes::MALFORMED_LANE_DATA,
                        format!("{}={} is not a lane count", bad.key, bad.value),
                    )
                    .with_ways([way.id]),
                );
                None
            }
        };

        let signature = match LaneSignature::parse(raw, expected) {
            Ok(signature) => signature,
            Err(e) => {
                let code = match e {
                    LaneError::CountMismatch { .. } => codes::TURN_LANE_COUNT_MISMATCH,
                    LaneError::UnknownToken(_) => codes::MALFORMED_LANE_DATA,
                };
                findings.push(
                    Finding::warning(code, format!("{} turn lanes: {e}", travel.label()))
                        .with_ways([way.id]),
                );
                return Ok(());
            }
        };

        let pivot = match travel {
            Travel::Forward => way.last_node(),
            Travel::Backward => way.first_node(),
        };
        let Some(pivot) = pivot else {
            return Ok(());
        };
        if graph.is_outside_snapshot(pivot)? {
            tracing::trace!(way = way.id, node = pivot, "turn lane pivot outside snapshot");
            return Ok(());
        }

        let departures = departures(graph, way, pivot)?;
        if departures.is_empty() {
            findings.push(
                Finding::warning(
                    codes::UNCONNECTED_TURN_LANES,
                    "Road with turn lanes not connected to anything",
                )
                .with_ways([way.id])
                .with_element(ElementId::Node(pivot)),
            );
            return Ok(());
        }
        if !self.check_intersections {
            return Ok(());
        }

        let available: BTreeSet<Direction> = departures.iter().map(|d| d.direction).collect();
        for direction in signature.directions() {
            if direction != Direction::Through && !available.contains(&direction) {
                findings.push(
                    Finding::warning(
                        codes::TURN_LANES_DO_NOT_END_ON_CONNECTED_WAY,
                        format!(
                            "Turn lanes do not end on a connected way (no {} turn)",
                            direction_label(direction)
                        ),
                    )
                    .with_ways([way.id])
                    .with_element(ElementId::Node(pivot)),
                );
            }
        }

        let continuation = departures
            .iter()
            .filter(|d| d.direction == Direction::Through)
            .min_by(|a, b| a.deviation.total_cmp(&b.deviation));
        let Some(continuation) = continuation else {
            return Ok(());
        };
        let next = graph.try_way(continuation.way)?;
        let downstream = turn_lanes_for(&next.tags, continuation.travel)
            .and_then(|raw| LaneSignature::parse(raw, None).ok());
        let next_lanes = match lane_count_for(&next.tags, continuation.travel) {
            Ok(Some(count)) => Some(count as usize),
            _ => downstream.as_ref().map(LaneSignature::len),
        };
        let Some(next_lanes) = next_lanes else {
            tracing::trace!(way = way.id, next = next.id, "continuation has no lane count");
            return Ok(());
        };

        let turning_departures = departures.iter().any(|d| d.direction != Direction::Through);
        if turning_departures {
            let remaining = signature.subtract(&TURNING);
            if remaining != next_lanes {
                findings.push(
                    Finding::warning(
                        codes::TURN_LANES_DO_NOT_CONTINUE,
                        format!(
                            "Turn lanes do not continue ({remaining} lanes go straight on, {next_lanes} continue)"
                        ),
                    )
                    .with_ways([way.id, next.id]),
                );
            }
        } else if departures.len() == 1 {
            let downstream = downstream.unwrap_or_else(|| through_only(next_lanes));
            if !continuity_matches(&signature, &downstream, &TURNING)
                && signature.len() != downstream.len()
                && !signature.has_merge()
            {
                findings.push(
                    Finding::warning(
                        codes::LANES_CHANGE_WITHOUT_INDICATION,
                        format!(
                            "Lanes change without indication ({} to {})",
                            signature.len(),
                            downstream.len()
                        ),
                    )
                    .with_ways([way.id, next.id]),
                );
            }
        }
        Ok(())
    }
}

impl Analyzer for TurnLanesAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::TurnLanes
    }

    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        ways_where(graph, |w| {
            w.tags.has("turn:lanes")
                || w.tags.has("turn:lanes:forward")
                || w.tags.has("turn:lanes:backward")
        })
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        findings_per_way(self.kind(), candidates, |id| self.check_way(graph, id))
    }
}

fn through_only(lanes: usize) -> LaneSignature {
    LaneSignature::from_lanes(vec![BTreeSet::from([TurnToken::Through]); lanes])
}

/// Permitted departures from `pivot` for traffic arriving along `way`
fn departures(graph: &RoadGraph, way: &Way, pivot: NodeId) -> Result<Vec<Departure>> {
    let Some(from) = bearing::incoming_neighbor(way, pivot) else {
        return Ok(Vec::new());
    };
    let from = graph.coord(from)?;
    let at = graph.coord(pivot)?;

    let mut out = Vec::new();
    for other in graph.other_ways_at(pivot, way.id)? {
        if other.tags.highway().is_none() {
            continue;
        }
        let oneway = other.tags.oneway();
        for (i, _) in other.nodes.iter().enumerate().filter(|&(_, &n)| n == pivot) {
            let mut targets = Vec::with_capacity(2);
            if oneway.allows_forward() {
                if let Some(&next) = other.nodes.get(i + 1) {
                    targets.push((next, Travel::Forward));
                }
            }
            if oneway.allows_backward() && i > 0 {
                targets.push((other.nodes[i - 1], Travel::Backward));
            }
            for (target, travel) in targets {
                if target == pivot {
                    continue;
                }
                let delta = bearing::bearing_delta(from, at, graph.coord(target)?);
                out.push(Departure {
                    way: other.id,
                    travel,
                    direction: departure_direction(delta),
                    deviation: PI - delta.abs(),
                });
            }
        }
    }
    Ok(out)
}

/// Too many junctions or one-way connections to tell where the lanes lead
fn unclear_turning(graph: &RoadGraph, way: &Way) -> Result<Option<Finding>> {
    let mut junction_nodes = 0;
    let mut oneways: BTreeSet<WayId> = BTreeSet::new();
    let nodes: BTreeSet<NodeId> = way.nodes.iter().copied().collect();
    for node in nodes {
        let mut connected = false;
        for other in graph.other_ways_at(node, way.id)? {
            if other.tags.highway().is_none() {
                continue;
            }
            connected = true;
            if other.tags.oneway().is_oneway() {
                oneways.insert(other.id);
            }
        }
        if connected {
            junction_nodes += 1;
        }
    }

    if junction_nodes > MAX_JUNCTION_NODES || oneways.len() > MAX_CONNECTED_ONEWAYS {
        return Ok(Some(
            Finding::warning(
                codes::UNCLEAR_TURN_LANES,
                "Road has multiple possibilities for turning",
            )
            .with_ways([way.id]),
        ));
    }
    Ok(None)
}
