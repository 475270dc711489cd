//! Bearing-based turn classification
//!
//! A turn is described by a traversal triple: the pivot node P, the node F
//! just before P on the incoming way, and the node T just after P on the
//! outgoing way. With
//!
//! ```text
//! delta = bearing(P -> F) - bearing(P -> T)   wrapped into (-π, π]
//! ```
//!
//! a positive delta is a right turn (see [`POSITIVE_DELTA_TURN`]), a negative
//! delta a left turn. Straight-on continuation puts F and T on opposite sides
//! of P (|delta| = π); delta = 0 (F and T in the same direction) is treated
//! the same way, since neither side is favoured.

use std::f64::consts::PI;

use crate::geo::{self, Coord};
use crate::graph::{NodeId, RoadGraph, Way};
use roadcheck_common::Result;

/// Turn category at a pivot node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    Through,
    Left,
    Right,
    /// Target way is two-way: both sides reachable
    Both,
    /// An adjacent node could not be resolved
    Undetermined,
}

/// Label given to a positive bearing delta
pub const POSITIVE_DELTA_TURN: TurnDirection = TurnDirection::Right;

/// Label given to a negative bearing delta
pub const NEGATIVE_DELTA_TURN: TurnDirection = TurnDirection::Left;

/// Angular slack (radians) under which a delta counts as straight
pub const STRAIGHT_TOLERANCE: f64 = 1e-9;

/// Signed bearing delta of the triple F, P, T in (-π, π]
pub fn bearing_delta(from: Coord, pivot: Coord, to: Coord) -> f64 {
    geo::normalize_signed(geo::bearing(pivot, from) - geo::bearing(pivot, to))
}

/// Pure geometric classification: `Through`, `Left` or `Right`
pub fn turn_direction(from: Coord, pivot: Coord, to: Coord) -> TurnDirection {
    direction_for_delta(bearing_delta(from, pivot, to))
}

pub fn direction_for_delta(delta: f64) -> TurnDirection {
    if delta.abs() <= STRAIGHT_TOLERANCE || (PI - delta.abs()).abs() <= STRAIGHT_TOLERANCE {
        TurnDirection::Through
    } else if delta > 0.0 {
        POSITIVE_DELTA_TURN
    } else {
        NEGATIVE_DELTA_TURN
    }
}

/// Node just before `pivot` on the incoming way
///
/// When the pivot is the way's first node the way is entered against its
/// node order, so the neighbour is the second node instead.
pub fn incoming_neighbor(way: &Way, pivot: NodeId) -> Option<NodeId> {
    let pos = way.nodes.iter().position(|&n| n == pivot)?;
    if pos > 0 {
        way.nodes.get(pos - 1).copied()
    } else {
        way.nodes.get(1).copied()
    }
}

/// Node just after `pivot` on the outgoing way
///
/// When the pivot is the way's last node the way is left against its node
/// order, so the neighbour is the next-to-last node.
pub fn outgoing_neighbor(way: &Way, pivot: NodeId) -> Option<NodeId> {
    let pos = way.nodes.iter().position(|&n| n == pivot)?;
    if pos + 1 < way.nodes.len() {
        way.nodes.get(pos + 1).copied()
    } else if pos > 0 {
        way.nodes.get(pos - 1).copied()
    } else {
        None
    }
}

/// Classify the turn from `from_way` onto `to_way` at `pivot`
///
/// A two-way target yields `Both`. Degenerate ways (no neighbour of the
/// pivot) yield `Undetermined`. Errors only for ids missing from the graph.
pub fn classify(
    graph: &RoadGraph,
    from_way: &Way,
    pivot: NodeId,
    to_way: &Way,
) -> Result<TurnDirection> {
    let (Some(f), Some(t)) = (
        incoming_neighbor(from_way, pivot),
        outgoing_neighbor(to_way, pivot),
    ) else {
        return Ok(TurnDirection::Undetermined);
    };
    if f == pivot || t == pivot {
        return Ok(TurnDirection::Undetermined);
    }

    let delta = bearing_delta(graph.coord(f)?, graph.coord(pivot)?, graph.coord(t)?);
    let geometric = direction_for_delta(delta);
    if geometric == TurnDirection::Through {
        return Ok(TurnDirection::Through);
    }
    if !to_way.tags.oneway().is_oneway() {
        return Ok(TurnDirection::Both);
    }
    Ok(geometric)
}
