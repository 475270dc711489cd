//! Tag map and highway predicates
//!
//! Provides convenient access to OSM tags and the small classification
//! helpers every analyzer builds on (link / through road / oneway / lane
//! counts).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Highway classes treated as through roads
pub const THROUGH_ROAD_PATTERN: &str =
    r"^(motorway|trunk|primary|secondary|tertiary|unclassified|residential)$";

/// Highway classes that count as a road connection for maxspeed checks
pub const CONNECTING_ROAD_PATTERN: &str =
    r".*(motorway|trunk|primary|secondary|tertiary|unclassified|residential|service|_link).*";

static THROUGH_ROAD_RE: OnceLock<Regex> = OnceLock::new();
static CONNECTING_ROAD_RE: OnceLock<Regex> = OnceLock::new();

fn through_road_re() -> &'static Regex {
    THROUGH_ROAD_RE.get_or_init(|| Regex::new(THROUGH_ROAD_PATTERN).expect("static pattern"))
}

pub(crate) fn connecting_road_re() -> &'static Regex {
    CONNECTING_ROAD_RE.get_or_init(|| Regex::new(CONNECTING_ROAD_PATTERN).expect("static pattern"))
}

/// Ordered key/value tag map with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a tag value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True when the key is present with exactly this value
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `highway` value, if any
    pub fn highway(&self) -> Option<&str> {
        self.get("highway")
    }

    /// Slip road / ramp (`highway=*_link`)
    pub fn is_link(&self) -> bool {
        self.highway().is_some_and(|h| h.ends_with("_link"))
    }

    /// Non-link road of a functional class (motorway .. residential)
    pub fn is_through_road(&self) -> bool {
        self.highway_matches(through_road_re())
    }

    /// Check the `highway` value against a traffic class pattern
    pub fn highway_matches(&self, class: &Regex) -> bool {
        self.highway().is_some_and(|h| class.is_match(h))
    }

    /// Direction restriction from the `oneway` tag
    ///
    /// Motorways and motorway links are oneway unless tagged otherwise, the
    /// same default the car profile applies.
    pub fn oneway(&self) -> Oneway {
        match self.get("oneway") {
            Some("yes" | "1" | "true") => Oneway::Forward,
            Some("-1" | "reverse") => Oneway::Reverse,
            Some(_) => Oneway::No,
            None => match self.highway() {
                Some("motorway" | "motorway_link") => Oneway::Forward,
                _ => Oneway::No,
            },
        }
    }

    /// Same non-empty `name`, or same non-empty `ref`, as `other`
    pub fn shares_name_or_ref(&self, other: &Tags) -> bool {
        ["name", "ref"]
            .iter()
            .any(|key| matches!((self.get(key), other.get(key)), (Some(a), Some(b)) if a == b))
    }

    /// Parse a lane count tag (`lanes`, `lanes:forward`, ...)
    ///
    /// `Ok(None)` when absent, `Err` with the raw value when it is not a
    /// non-negative integer.
    pub fn lane_count(&self, key: &str) -> Result<Option<u32>, MalformedTag> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| MalformedTag {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Travel direction allowed along a way's node order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oneway {
    No,
    /// Only first -> last
    Forward,
    /// Only last -> first
    Reverse,
}

impl Oneway {
    pub fn is_oneway(self) -> bool {
        self != Oneway::No
    }

    pub fn allows_forward(self) -> bool {
        self != Oneway::Reverse
    }

    pub fn allows_backward(self) -> bool {
        self != Oneway::Forward
    }
}

/// A tag whose value could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTag {
    pub key: String,
    pub value: String,
}
