//! Turn-lane string algebra
//!
//! A `turn:lanes` value such as `left|through;right|` is parsed into a
//! [`LaneSignature`]: one token set per physical lane, left to right. An
//! empty lane segment means through-only.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single `turn:lanes` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TurnToken {
    Left,
    SlightLeft,
    SharpLeft,
    Through,
    Right,
    SlightRight,
    SharpRight,
    MergeToLeft,
    MergeToRight,
    Reverse,
    None,
}

impl TurnToken {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnToken::Left => "left",
            TurnToken::SlightLeft => "slight_left",
            TurnToken::SharpLeft => "sharp_left",
            TurnToken::Through => "through",
            TurnToken::Right => "right",
            TurnToken::SlightRight => "slight_right",
            TurnToken::SharpRight => "sharp_right",
            TurnToken::MergeToLeft => "merge_to_left",
            TurnToken::MergeToRight => "merge_to_right",
            TurnToken::Reverse => "reverse",
            TurnToken::None => "none",
        }
    }

    /// Direction family the token belongs to
    pub fn direction(self) -> Direction {
        match self {
            TurnToken::Left | TurnToken::SlightLeft | TurnToken::SharpLeft | TurnToken::Reverse => {
                Direction::Left
            }
            TurnToken::Right | TurnToken::SlightRight | TurnToken::SharpRight => Direction::Right,
            TurnToken::Through
            | TurnToken::None
            | TurnToken::MergeToLeft
            | TurnToken::MergeToRight => Direction::Through,
        }
    }

    pub fn is_merge(self) -> bool {
        matches!(self, TurnToken::MergeToLeft | TurnToken::MergeToRight)
    }
}

impl FromStr for TurnToken {
    type Err = LaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "left" => TurnToken::Left,
            "slight_left" => TurnToken::SlightLeft,
            "sharp_left" => TurnToken::SharpLeft,
            "through" => TurnToken::Through,
            "right" => TurnToken::Right,
            "slight_right" => TurnToken::SlightRight,
            "sharp_right" => TurnToken::SharpRight,
            "merge_to_left" => TurnToken::MergeToLeft,
            "merge_to_right" => TurnToken::MergeToRight,
            "reverse" => TurnToken::Reverse,
            "none" => TurnToken::None,
            other => return Err(LaneError::UnknownToken(other.to_string())),
        })
    }
}

/// Coarse direction used for counting and subtraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Left,
    Through,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("unknown turn token '{0}'")]
    UnknownToken(String),

    #[error("{actual} turn lanes but {expected} lanes tagged")]
    CountMismatch { expected: u32, actual: usize },
}

/// Per-lane turn token sets, index = physical lane from the left
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaneSignature(Vec<BTreeSet<TurnToken>>);

impl LaneSignature {
    /// Parse a raw `turn:lanes` value
    ///
    /// With `expected` set (the `lanes` count of the same direction), any
    /// difference in lane count is an error.
    pub fn parse(raw: &str, expected: Option<u32>) -> Result<Self, LaneError> {
        let lanes = raw
            .split('|')
            .map(parse_lane)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(expected) = expected {
            if lanes.len() != expected as usize {
                return Err(LaneError::CountMismatch {
                    expected,
                    actual: lanes.len(),
                });
            }
        }
        Ok(Self(lanes))
    }

    pub fn from_lanes(lanes: Vec<BTreeSet<TurnToken>>) -> Self {
        Self(lanes)
    }

    pub fn lanes(&self) -> &[BTreeSet<TurnToken>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Directions served by a lane
    pub fn lane_directions(lane: &BTreeSet<TurnToken>) -> BTreeSet<Direction> {
        lane.iter().map(|t| t.direction()).collect()
    }

    /// Every direction some lane serves
    pub fn directions(&self) -> BTreeSet<Direction> {
        self.0.iter().flat_map(Self::lane_directions).collect()
    }

    pub fn has_merge(&self) -> bool {
        self.0.iter().flatten().any(|t| t.is_merge())
    }

    /// Histogram of lanes by the direction combination they serve
    pub fn count_by_category(&self) -> LaneCounts {
        let mut counts = LaneCounts::default();
        for lane in &self.0 {
            let dirs = Self::lane_directions(lane);
            let left = dirs.contains(&Direction::Left);
            let through = dirs.contains(&Direction::Through);
            let right = dirs.contains(&Direction::Right);
            let bucket = match (left, through, right) {
                (true, false, false) => &mut counts.left,
                (false, false, true) => &mut counts.right,
                (true, true, false) => &mut counts.left_through,
                (false, true, true) => &mut counts.right_through,
                (true, false, true) => &mut counts.left_right,
                (true, true, true) => &mut counts.left_through_right,
                // every token maps to a direction, so an empty set cannot
                // come out of the parser; count it as through
                (false, _, false) => &mut counts.through,
            };
            *bucket += 1;
        }
        counts
    }

    /// Number of lanes left after dropping those serving only `excluded`
    pub fn subtract(&self, excluded: &[Direction]) -> usize {
        self.0
            .iter()
            .filter(|lane| !serves_only(lane, excluded))
            .count()
    }

    /// Remaining lanes (token sets) after dropping those serving only `removed`
    pub fn without(&self, removed: &[Direction]) -> LaneSignature {
        LaneSignature(
            self.0
                .iter()
                .filter(|lane| !serves_only(lane, removed))
                .cloned()
                .collect(),
        )
    }
}

fn serves_only(lane: &BTreeSet<TurnToken>, excluded: &[Direction]) -> bool {
    lane.iter().all(|t| excluded.contains(&t.direction()))
}

fn parse_lane(segment: &str) -> Result<BTreeSet<TurnToken>, LaneError> {
    let mut tokens = BTreeSet::new();
    for raw in segment.split(';') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        tokens.insert(raw.parse::<TurnToken>()?);
    }
    if tokens.is_empty() {
        tokens.insert(TurnToken::Through);
    }
    Ok(tokens)
}

/// Same per-lane token sets downstream as upstream once the lanes that
/// turned off (`removed`) are dropped
pub fn continuity_matches(
    upstream: &LaneSignature,
    downstream: &LaneSignature,
    removed: &[Direction],
) -> bool {
    upstream.without(removed) == *downstream
}

impl fmt::Display for LaneSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, lane) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            for (j, token) in lane.iter().enumerate() {
                if j > 0 {
                    f.write_str(";")?;
                }
                f.write_str(token.as_str())?;
            }
        }
        Ok(())
    }
}

impl FromStr for LaneSignature {
    type Err = LaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}

/// Seven-bucket lane histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneCounts {
    pub left: usize,
    pub right: usize,
    pub through: usize,
    pub left_through: usize,
    pub right_through: usize,
    pub left_right: usize,
    pub left_through_right: usize,
}

impl LaneCounts {
    pub fn total(&self) -> usize {
        self.left
            + self.right
            + self.through
            + self.left_through
            + self.right_through
            + self.left_right
            + self.left_through_right
    }

    /// Lanes that allow going straight on
    pub fn continuing(&self) -> usize {
        self.through + self.left_through + self.right_through + self.left_through_right
    }
}
