//! Findings and proposed fixes
//!
//! The engine never edits the graph. A [`Fix`] is a passive descriptor the
//! host turns into an edit through its own undo system.

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, RelationId, WayId};

/// Stable finding codes
pub mod codes {
    pub const UNCONNECTED_TURN_LANES: u32 = 3800;
    pub const TURN_LANES_DO_NOT_CONTINUE: u32 = 3801;
    pub const TURN_LANES_DO_NOT_END_ON_CONNECTED_WAY: u32 = 3802;
    pub const UNCLEAR_TURN_LANES: u32 = 3803;
    pub const TURN_LANE_COUNT_MISMATCH: u32 = 3804;
    pub const MALFORMED_LANE_DATA: u32 = 3805;
    pub const LANES_CHANGE_WITHOUT_INDICATION: u32 = 3806;

    pub const ROAD_ENDS_WITH_LINKS: u32 = 3900;
    pub const LINK_PASSES_THROUGH_ROAD_END: u32 = 3901;

    pub const DESTINATION_TAG_DOES_NOT_MATCH: u32 = 4000;

    pub const MAXSPEED_BLANK_SPOT: u32 = 4101;

    pub const NAME_CHANGES: u32 = 4200;
    pub const REF_CHANGES: u32 = 4201;

    pub const LINK_WITHOUT_TURN_RESTRICTION: u32 = 5000;

    pub const CONTAINS_ABBREVIATION: u32 = 5100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ElementId {
    Node(NodeId),
    Way(WayId),
    Relation(RelationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Proposed correction, applied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Fix {
    /// Set `key=value` on every target way
    SetTag {
        targets: Vec<WayId>,
        key: String,
        value: String,
    },
    /// Create a `type=restriction` relation from/via/to
    AddTurnRestriction {
        from: WayId,
        via: NodeId,
        to: WayId,
        restriction: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: u32,
    /// Involved elements; the first is the primary one
    pub elements: Vec<ElementId>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Finding {
    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            elements: Vec::new(),
            message: message.into(),
            fix: None,
        }
    }

    pub fn info(code: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(code, message)
        }
    }

    pub fn with_ways(mut self, ways: impl IntoIterator<Item = WayId>) -> Self {
        self.elements.extend(ways.into_iter().map(ElementId::Way));
        self
    }

    pub fn with_element(mut self, element: ElementId) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn primary(&self) -> Option<ElementId> {
        self.elements.first().copied()
    }

    /// True when the finding names this way
    pub fn involves_way(&self, way: WayId) -> bool {
        self.elements.contains(&ElementId::Way(way))
    }
}

/// Append-only finding collection
///
/// No deduplication: the same finding from two analyzers is kept twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn with_code(&self, code: u32) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.code == code)
    }

    /// Findings ordered by `(code, primary element)`, otherwise stable
    pub fn into_sorted(mut self) -> Vec<Finding> {
        self.findings.sort_by_key(|f| (f.code, f.primary()));
        self.findings
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_sorted_orders_by_code_then_primary() {
        let mut report = Report::new();
        report.push(Finding::warning(4000, "b").with_ways([7]));
        report.push(Finding::warning(3900, "a").with_ways([9, 1]));
        report.push(Finding::warning(3900, "c").with_ways([2]));
        report.push(Finding::warning(3900, "d").with_ways([2]));
        let sorted = report.into_sorted();
        let order: Vec<&str> = sorted.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_no_deduplication() {
        let mut report = Report::new();
        let f = Finding::warning(3901, "same").with_ways([1, 2]);
        report.push(f.clone());
        report.push(f);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_fix_serialization() {
        let finding = Finding::warning(codes::LINK_WITHOUT_TURN_RESTRICTION, "link")
            .with_ways([1, 2, 3])
            .with_fix(Fix::AddTurnRestriction {
                from: 1,
                via: 10,
                to: 2,
                restriction: "no_right_turn".into(),
            });
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["fix"]["action"], "add_turn_restriction");
        assert_eq!(json["elements"][0]["type"], "way");
        assert_eq!(json["severity"], "warning");
        let back: Finding = serde_json::from_value(json).unwrap();
        assert_eq!(back, finding);
    }
}
