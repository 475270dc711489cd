//! Link roads bypassing a junction without a turn restriction
//!
//! A link that leaves road R0 and joins road R1 next to the node where R0
//! and R1 meet usually replaces that turn, which then needs a restriction.

use crate::bearing::{self, TurnDirection};
use crate::config::DrivingSide;
use crate::graph::{NodeId, RoadGraph, Way};
use crate::report::{codes, Finding, Fix};
use crate::tags::Oneway;
use roadcheck_common::Result;

/// The two through roads a link connects: `(R0, R1)`
///
/// R0 contains the link's first node. R1 meets R0 at another node of R0 and
/// shares a node with the link there too.
fn bypassed_roads<'g>(graph: &'g RoadGraph, link: &Way) -> Result<Option<(&'g Way, &'g Way)>> {
    let Some(start) = link.first_node() else {
        return Ok(None);
    };
    for r0 in graph.other_ways_at(start, link.id)? {
        if !r0.tags.is_through_road() {
            continue;
        }
        for &node in r0.nodes.iter().filter(|&&n| n != start) {
            for r1 in graph.other_ways_at(node, r0.id)? {
                if !r1.tags.is_through_road() {
                    continue;
                }
                if r1.nodes.iter().any(|&n| n != node && link.contains(n)) {
                    return Ok(Some((r0, r1)));
                }
            }
        }
    }
    Ok(None)
}

/// Restriction value for the turn from `from` onto `to` at `via`
fn restriction_value(
    graph: &RoadGraph,
    from: &Way,
    via: NodeId,
    to: &Way,
    side: DrivingSide,
) -> Result<&'static str> {
    Ok(match bearing::classify(graph, from, via, to)? {
        TurnDirection::Left => "no_left_turn",
        TurnDirection::Right => "no_right_turn",
        _ => side.crossing_restriction(),
    })
}

/// Check one link way; `None` when nothing needs reporting
pub fn check_link_turn(graph: &RoadGraph, link: &Way, side: DrivingSide) -> Result<Option<Finding>> {
    let Some((r0, r1)) = bypassed_roads(graph, link)? else {
        return Ok(None);
    };

    let settling = side.settling_restrictions();
    let restricted = graph
        .relations_of(r0.id)
        .chain(graph.relations_of(r1.id))
        .filter(|rel| rel.is_restriction())
        .filter_map(|rel| rel.tags.get("restriction"))
        .any(|value| settling.iter().any(|s| *s == value));
    if restricted {
        return Ok(None);
    }

    let mut finding = Finding::warning(
        codes::LINK_WITHOUT_TURN_RESTRICTION,
        "Link connects two roads without a turn restriction",
    )
    .with_ways([r0.id, r1.id, link.id]);

    let via = [r1.last_node(), r1.first_node()]
        .into_iter()
        .flatten()
        .find(|&n| r0.is_endpoint(n));
    if let Some(via) = via {
        // R1 only leads into the junction: the turn cannot be made anyway
        let r1_ends_here = match r1.tags.oneway() {
            Oneway::Forward => r1.last_node() == Some(via),
            Oneway::Reverse => r1.first_node() == Some(via),
            Oneway::No => false,
        };
        if r1_ends_here {
            return Ok(None);
        }
        let restriction = restriction_value(graph, r0, via, r1, side)?;
        finding = finding.with_fix(Fix::AddTurnRestriction {
            from: r0.id,
            via,
            to: r1.id,
            restriction: restriction.to_string(),
        });
    }
    Ok(Some(finding))
}
