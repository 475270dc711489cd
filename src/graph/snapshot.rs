//! Snapshot records handed over by the host
//!
//! The host is responsible for reading whatever map format it uses; it hands
//! the engine a flat list of node, way and relation records (JSON works out of
//! the box through serde). `RoadGraphBuilder` offers the same thing
//! programmatically.

use serde::{Deserialize, Serialize};

use super::{MemberKind, NodeId, RelationId, RoadGraph, WayId};
use crate::tags::Tags;
use roadcheck_common::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
    /// Node lies on or beyond the edge of the loaded area
    #[serde(default)]
    pub outside: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WayRecord {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub role: String,
    pub kind: MemberKind,
    #[serde(rename = "ref")]
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
    pub id: RelationId,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

/// Full input of one analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub ways: Vec<WayRecord>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl Snapshot {
    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| roadcheck_common::Error::InvalidSnapshot(format!("JSON: {e}")))
    }
}

/// Incremental graph construction for hosts and tests
#[derive(Debug, Default)]
pub struct RoadGraphBuilder {
    snapshot: Snapshot,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: NodeId, lat: f64, lon: f64) -> Self {
        self.snapshot.nodes.push(NodeRecord {
            id,
            lat,
            lon,
            outside: false,
        });
        self
    }

    /// Add a node that lies outside the loaded area
    pub fn outside_node(mut self, id: NodeId, lat: f64, lon: f64) -> Self {
        self.snapshot.nodes.push(NodeRecord {
            id,
            lat,
            lon,
            outside: true,
        });
        self
    }

    pub fn way(mut self, id: WayId, nodes: &[NodeId], tags: &[(&str, &str)]) -> Self {
        self.snapshot.ways.push(WayRecord {
            id,
            nodes: nodes.to_vec(),
            tags: tags.iter().copied().collect(),
        });
        self
    }

    /// Add a relation; members are `(role, kind, ref)`
    pub fn relation(
        mut self,
        id: RelationId,
        tags: &[(&str, &str)],
        members: &[(&str, MemberKind, i64)],
    ) -> Self {
        self.snapshot.relations.push(RelationRecord {
            id,
            tags: tags.iter().copied().collect(),
            members: members
                .iter()
                .map(|(role, kind, id)| MemberRecord {
                    role: role.to_string(),
                    kind: *kind,
                    id: *id,
                })
                .collect(),
        });
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn build(self) -> Result<RoadGraph> {
        RoadGraph::from_snapshot(self.snapshot)
    }
}
