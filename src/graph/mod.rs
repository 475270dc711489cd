//! Road graph model
//!
//! Immutable, per-run view of the snapshot: nodes with their incident-way
//! index, ways with cached lengths, and relations with the reverse
//! way -> relation index used by the turn-restriction check.
//!
//! All lookups are O(1) through the precomputed indices. Asking for an id
//! that is not in the graph is a caller bug: the panicking accessors
//! (`node`, `way`) fail fast, the `try_*` accessors return
//! `Error::UnknownNode` / `Error::UnknownWay` so analyzers can isolate the
//! failure to one element.

mod snapshot;

pub use snapshot::{MemberRecord, NodeRecord, RelationRecord, RoadGraphBuilder, Snapshot, WayRecord};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::geo::{self, Coord};
use crate::tags::Tags;
use roadcheck_common::{Error, Result};

pub type NodeId = i64;
pub type WayId = i64;
pub type RelationId = i64;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub coord: Coord,
    /// Node lies on or beyond the edge of the loaded area
    pub outside: bool,
    /// Ways containing this node, ascending id, no duplicates
    ways: Vec<WayId>,
}

impl Node {
    pub fn way_ids(&self) -> &[WayId] {
        &self.ways
    }
}

#[derive(Debug, Clone)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    pub tags: Tags,
    length_m: f64,
}

impl Way {
    pub fn first_node(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// `(first, last)`; identical for a closed way
    pub fn endpoints(&self) -> Option<(NodeId, NodeId)> {
        Some((self.first_node()?, self.last_node()?))
    }

    pub fn is_endpoint(&self, node: NodeId) -> bool {
        self.first_node() == Some(node) || self.last_node() == Some(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Cached length in meters
    pub fn length(&self) -> f64 {
        self.length_m
    }

    /// Fewer than two nodes: no direction, no endpoints worth analysing
    pub fn is_degenerate(&self) -> bool {
        self.nodes.len() < 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    pub role: String,
    pub kind: MemberKind,
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub id: RelationId,
    pub tags: Tags,
    pub members: Vec<RelationMember>,
}

impl Relation {
    /// Value of the `type` tag
    pub fn relation_type(&self) -> Option<&str> {
        self.tags.get("type")
    }

    pub fn is_restriction(&self) -> bool {
        self.relation_type() == Some("restriction")
    }
}

/// Read-only road graph for one analysis run
#[derive(Debug, Default)]
pub struct RoadGraph {
    nodes: FxHashMap<NodeId, Node>,
    ways: FxHashMap<WayId, Way>,
    relations: FxHashMap<RelationId, Relation>,
    /// way id -> ids of relations listing it as a member, ascending
    way_relations: FxHashMap<WayId, Vec<RelationId>>,
}

impl RoadGraph {
    /// Build the graph and its indices, validating referential integrity
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut nodes: FxHashMap<NodeId, Node> = FxHashMap::default();
        nodes.reserve(snapshot.nodes.len());
        for record in snapshot.nodes {
            let node = Node {
                id: record.id,
                coord: Coord::new(record.lat, record.lon),
                outside: record.outside,
                ways: Vec::new(),
            };
            if nodes.insert(record.id, node).is_some() {
                return Err(Error::InvalidSnapshot(format!("duplicate node {}", record.id)));
            }
        }

        let mut ways: FxHashMap<WayId, Way> = FxHashMap::default();
        ways.reserve(snapshot.ways.len());
        for record in snapshot.ways {
            let mut coords = Vec::with_capacity(record.nodes.len());
            for node_id in &record.nodes {
                let node = nodes.get_mut(node_id).ok_or_else(|| {
                    Error::InvalidSnapshot(format!(
                        "way {} references missing node {}",
                        record.id, node_id
                    ))
                })?;
                coords.push(node.coord);
                // closed ways list their first node twice
                if !node.ways.contains(&record.id) {
                    node.ways.push(record.id);
                }
            }
            let way = Way {
                id: record.id,
                length_m: geo::polyline_length(&coords),
                nodes: record.nodes,
                tags: record.tags,
            };
            if ways.insert(record.id, way).is_some() {
                return Err(Error::InvalidSnapshot(format!("duplicate way {}", record.id)));
            }
        }
        for node in nodes.values_mut() {
            node.ways.sort_unstable();
        }

        let mut relations: FxHashMap<RelationId, Relation> = FxHashMap::default();
        let mut way_relations: FxHashMap<WayId, Vec<RelationId>> = FxHashMap::default();
        for record in snapshot.relations {
            let mut seen_ways: FxHashSet<WayId> = FxHashSet::default();
            let members: Vec<RelationMember> = record
                .members
                .into_iter()
                .map(|m| RelationMember {
                    role: m.role,
                    kind: m.kind,
                    id: m.id,
                })
                .collect();
            for member in &members {
                if member.kind == MemberKind::Way && seen_ways.insert(member.id) {
                    way_relations.entry(member.id).or_default().push(record.id);
                }
            }
            let relation = Relation {
                id: record.id,
                tags: record.tags,
                members,
            };
            if relations.insert(record.id, relation).is_some() {
                return Err(Error::InvalidSnapshot(format!(
                    "duplicate relation {}",
                    record.id
                )));
            }
        }
        for parents in way_relations.values_mut() {
            parents.sort_unstable();
        }

        tracing::debug!(
            nodes = nodes.len(),
            ways = ways.len(),
            relations = relations.len(),
            "road graph built"
        );

        Ok(Self {
            nodes,
            ways,
            relations,
            way_relations,
        })
    }

    /// # Panics
    /// If the node is not part of the graph.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(&id) {
            Some(node) => node,
            None => panic!("node {id} is not part of the road graph"),
        }
    }

    /// # Panics
    /// If the way is not part of the graph.
    pub fn way(&self, id: WayId) -> &Way {
        match self.ways.get(&id) {
            Some(way) => way,
            None => panic!("way {id} is not part of the road graph"),
        }
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::UnknownNode(id))
    }

    pub fn try_way(&self, id: WayId) -> Result<&Way> {
        self.ways.get(&id).ok_or(Error::UnknownWay(id))
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub fn coord(&self, id: NodeId) -> Result<Coord> {
        Ok(self.try_node(id)?.coord)
    }

    /// Ways containing the node, ascending id
    pub fn ways_at(&self, node: NodeId) -> Result<Vec<&Way>> {
        let node = self.try_node(node)?;
        node.ways.iter().map(|id| self.try_way(*id)).collect()
    }

    /// Ways containing the node, minus `exclude`
    pub fn other_ways_at(&self, node: NodeId, exclude: WayId) -> Result<Vec<&Way>> {
        let mut ways = self.ways_at(node)?;
        ways.retain(|w| w.id != exclude);
        Ok(ways)
    }

    /// Endpoint nodes of a way; `None` for a way without nodes
    pub fn endpoints(&self, way: WayId) -> Result<Option<(&Node, &Node)>> {
        match self.try_way(way)?.endpoints() {
            Some((first, last)) => Ok(Some((self.try_node(first)?, self.try_node(last)?))),
            None => Ok(None),
        }
    }

    pub fn is_outside_snapshot(&self, node: NodeId) -> Result<bool> {
        Ok(self.try_node(node)?.outside)
    }

    /// Relations that list the way as a member, ascending id
    pub fn relations_of(&self, way: WayId) -> impl Iterator<Item = &Relation> + '_ {
        self.way_relations
            .get(&way)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relations.get(id))
    }

    /// All ways, ascending id
    pub fn ways(&self) -> Vec<&Way> {
        let mut ways: Vec<&Way> = self.ways.values().collect();
        ways.sort_unstable_by_key(|w| w.id);
        ways
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_ways(&self) -> usize {
        self.ways.len()
    }

    pub fn n_relations(&self) -> usize {
        self.relations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> RoadGraph {
        RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .outside_node(4, 0.001, 0.001)
            .way(10, &[1, 2, 3], &[("highway", "primary")])
            .way(11, &[2, 4], &[("highway", "primary_link")])
            .way(12, &[3, 1, 3], &[("highway", "service")])
            .relation(
                100,
                &[("type", "restriction"), ("restriction", "no_left_turn")],
                &[
                    ("from", MemberKind::Way, 10),
                    ("via", MemberKind::Node, 2),
                    ("to", MemberKind::Way, 11),
                    ("to", MemberKind::Way, 999),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_ways_at_index() {
        let g = small_graph();
        let ids: Vec<WayId> = g.ways_at(2).unwrap().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![10, 11]);
        let others: Vec<WayId> = g.other_ways_at(2, 10).unwrap().iter().map(|w| w.id).collect();
        assert_eq!(others, vec![11]);
        // closed way listed once
        assert_eq!(g.node(3).way_ids(), &[10, 12]);
    }

    #[test]
    fn test_endpoints_and_outside_flag() {
        let g = small_graph();
        let (first, last) = g.endpoints(11).unwrap().unwrap();
        assert_eq!((first.id, last.id), (2, 4));
        assert!(g.is_outside_snapshot(4).unwrap());
        assert!(!g.is_outside_snapshot(1).unwrap());
        assert!(g.way(12).is_endpoint(3));
        assert!(!g.way(12).is_endpoint(1));
    }

    #[test]
    fn test_cached_length() {
        let g = small_graph();
        let expected = geo::haversine_distance(Coord::new(0.0, 0.0), Coord::new(0.0, 0.002));
        assert!((g.way(10).length() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_relations_of_way() {
        let g = small_graph();
        let rels: Vec<RelationId> = g.relations_of(11).map(|r| r.id).collect();
        assert_eq!(rels, vec![100]);
        assert!(g.relation(100).unwrap().is_restriction());
        assert_eq!(g.relations_of(12).count(), 0);
    }

    #[test]
    fn test_lookup_failures() {
        let g = small_graph();
        assert!(matches!(g.try_node(77), Err(Error::UnknownNode(77))));
        assert!(matches!(g.try_way(77), Err(Error::UnknownWay(77))));
        assert!(g.ways_at(77).is_err());
    }

    #[test]
    #[should_panic(expected = "node 77 is not part of the road graph")]
    fn test_node_fails_fast() {
        small_graph().node(77);
    }

    #[test]
    fn test_missing_node_reference_rejected() {
        let err = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .way(10, &[1, 2], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(msg) if msg.contains("missing node 2")));
    }

    #[test]
    fn test_duplicate_way_rejected() {
        let err = RoadGraphBuilder::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .way(10, &[1, 2], &[])
            .way(10, &[2, 1], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
    }
}
