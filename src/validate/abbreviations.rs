//! Abbreviated words in road names
//!
//! Every `*name*` tag except `int_name` is matched against a table of known
//! abbreviations (English street types, Greek prefixes). When the
//! abbreviation has a single expansion and occurs once, the expanded name
//! is proposed.

use std::collections::BTreeSet;

use regex::Regex;

use super::{findings_per_way, ways_where, Analyzer, AnalyzerKind};
use crate::graph::{RoadGraph, Way, WayId};
use crate::report::{codes, Finding, Fix};
use roadcheck_common::Result;

/// Where in the name an abbreviation may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Prefix,
    Suffix,
    Anywhere,
}

/// One abbreviation table entry with its compiled matcher
#[derive(Debug, Clone)]
pub struct Abbreviation {
    pub short: &'static str,
    pub position: Position,
    pub expansions: Vec<&'static str>,
    matcher: Regex,
}

impl Abbreviation {
    pub fn new(short: &'static str, position: Position, expansions: &[&'static str]) -> Self {
        let exact = regex::escape(short);
        let bare = regex::escape(&short.replace('.', ""));
        // a trailing dot already ends the word
        let tail = if short.ends_with('.') { "" } else { r"\b" };
        let pattern = match position {
            Position::Prefix => format!(r"^(?:{exact}{tail}|{bare}\s)"),
            Position::Suffix => format!(r"(?:\b{exact}|\s{bare})$"),
            Position::Anywhere => format!(r"\b(?:{exact}{tail}|{bare}\b)"),
        };
        let matcher = Regex::new(&pattern).expect("escaped literal pattern");
        Self {
            short,
            position,
            expansions: expansions.to_vec(),
            matcher,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }
}

/// `(abbreviation, position, expansions)`
const GREEK: &[(&str, Position, &[&str])] = &[
    ("Αγ.", Position::Prefix, &["Αγίας", "Αγίου", "Αγίων"]),
    ("Αφοί", Position::Prefix, &["Αδελφοί"]),
    ("Αφών", Position::Prefix, &["Αδελφών"]),
    ("Αλ.", Position::Anywhere, &["Αλέξανδρου"]),
    ("ΑΤΕΙ", Position::Prefix, &["Ανώτατο Τεχνολογικό Εκπαιδευτικό Ίδρυμα"]),
    ("ΑΤ", Position::Prefix, &["Αστυνομικό Τμήμα"]),
    ("Β.", Position::Prefix, &["Βασιλέως", "Βασιλίσσης"]),
    ("Βασ.", Position::Prefix, &["Βασιλέως", "Βασιλίσσης"]),
    ("Γρ.", Position::Anywhere, &["Γρηγορίου"]),
    ("Δ.", Position::Prefix, &["Δήμος"]),
    ("ΔΣ", Position::Prefix, &["Δημοτικό Σχολείο"]),
    ("Δημ. Σχ.", Position::Prefix, &["Δημοτικό Σχολείο"]),
    ("Εθν.", Position::Anywhere, &["Εθνάρχου", "Εθνική", "Εθνικής"]),
    ("Ελ.", Position::Anywhere, &["Ελευθέριος", "Ελευθερίου"]),
    ("ΕΛΤΑ", Position::Prefix, &["Ελληνικά Ταχυδρομεία", "Ταχυδρομείο"]),
    ("Θεσ/νίκης", Position::Anywhere, &["Θεσσαλονίκης"]),
    ("Ι.Μ.", Position::Prefix, &["Ιερά Μονή"]),
    ("Ι.Ν.", Position::Prefix, &["Ιερός Ναός"]),
    ("Κτ.", Position::Prefix, &["Κτίριο"]),
    ("Κων/νου", Position::Anywhere, &["Κωνσταντίνου"]),
    ("Λ.", Position::Prefix, &["Λεωφόρος", "Λίμνη"]),
    ("Λεωφ.", Position::Prefix, &["Λεωφόρος"]),
    ("Ν.", Position::Prefix, &["Νέα", "Νέες", "Νέο", "Νέοι", "Νέος", "Νησί", "Νομός"]),
    ("Όρ.", Position::Prefix, &["Όρος"]),
    ("Π.", Position::Prefix, &["Παλαιά", "Παλαιές", "Παλαιό", "Παλαιοί", "Παλαιός"]),
    ("Π.", Position::Anywhere, &["Ποταμός"]),
    ("ΑΕΙ", Position::Prefix, &["Πανεπιστήμιο"]),
    ("Παν.", Position::Prefix, &["Πανεπιστήμιο"]),
    ("Πλ.", Position::Prefix, &["Πλατεία"]),
    ("Ποτ.", Position::Anywhere, &["Ποταμός"]),
    ("Στρ.", Position::Prefix, &["Στρατηγού"]),
    ("ΤΕΙ", Position::Prefix, &["Τεχνολογικό Εκπαιδευτικό Ίδρυμα"]),
];

/// English street-type abbreviations, matched anywhere in the name
const ENGLISH: &[(&str, &[&str])] = &[
    ("Accs", &["Access"]),
    ("AFB", &["Air Force Base"]),
    ("ANGB", &["Air National Guard Base"]),
    ("Aprt", &["Airport"]),
    ("Al", &["Alley"]),
    ("All", &["Alley"]),
    ("Ally", &["Alley"]),
    ("Aly", &["Alley"]),
    ("Alwy", &["Alleyway"]),
    ("Ambl", &["Amble"]),
    ("Apts", &["Apartments"]),
    ("Apch", &["Approach"]),
    ("Arc", &["Arcade"]),
    ("Artl", &["Arterial"]),
    ("Arty", &["Artery"]),
    ("Av", &["Avenue"]),
    ("Ave", &["Avenue"]),
    ("Bk", &["Back"]),
    ("Ba", &["Banan"]),
    ("Basn", &["Basin"]),
    ("Bsn", &["Basin"]),
    ("Bch", &["Beach"]),
    ("Bnd", &["Bend"]),
    ("Blk", &["Block"]),
    ("Bwlk", &["Boardwalk"]),
    ("Blvd", &["Boulevard"]),
    ("Bvd", &["Boulevard"]),
    ("Bdy", &["Boundary"]),
    ("Bl", &["Bowl"]),
    ("Br", &["Brace", "Brae", "Bridge"]),
    ("Brk", &["Break", "Brook"]),
    ("Bdge", &["Bridge"]),
    ("Bri", &["Bridge"]),
    ("Bdwy", &["Broadway"]),
    ("Bway", &["Broadway"]),
    ("Bwy", &["Broadway"]),
    ("Brw", &["Brow"]),
    ("Bldgs", &["Buildings"]),
    ("Bldngs", &["Buildings"]),
    ("Bps", &["Bypass"]),
    ("Byp", &["Bypass"]),
    ("Bypa", &["Bypass"]),
    ("Bywy", &["Byway"]),
    ("Cvn", &["Caravan"]),
    ("Cswy", &["Causeway"]),
    ("Cway", &["Causeway"]),
    ("Cen", &["Center", "Centre"]),
    ("Ctr", &["Center", "Centre"]),
    ("Ctrl", &["Central"]),
    ("Cnwy", &["Centreway"]),
    ("Ch", &["Chase", "Church"]),
    ("Cir", &["Circle"]),
    ("Cct", &["Circuit"]),
    ("Ci", &["Circuit"]),
    ("Crc", &["Circus"]),
    ("Crcs", &["Circus"]),
    ("Cty", &["City"]),
    ("Cl", &["Close"]),
    ("Cmn", &["Common"]),
    ("Comm", &["Common", "Community"]),
    ("Cnc", &["Concourse"]),
    ("Cps", &["Copse"]),
    ("Cnr", &["Corner"]),
    ("Crn", &["Corner"]),
    ("Cso", &["Corso"]),
    ("Cotts", &["Cottages"]),
    ("CR", &["County Road", "County Route"]),
    ("Crt", &["Court"]),
    ("Ct", &["Court"]),
    ("Cyd", &["Courtyard"]),
    ("Ctyd", &["Courtyard"]),
    ("Ce", &["Cove"]),
    ("Cov", &["Cove"]),
];

fn default_table() -> Vec<Abbreviation> {
    GREEK
        .iter()
        .map(|&(short, position, expansions)| Abbreviation::new(short, position, expansions))
        .chain(
            ENGLISH
                .iter()
                .map(|&(short, expansions)| Abbreviation::new(short, Position::Anywhere, expansions)),
        )
        .collect()
}

/// Number of non-overlapping occurrences of `needle`
fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.match_indices(needle).count()
}

fn is_name_key(key: &str) -> bool {
    key.contains("name") && key != "int_name"
}

pub struct AbbreviationAnalyzer {
    table: Vec<Abbreviation>,
}

impl Default for AbbreviationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl AbbreviationAnalyzer {
    pub fn new() -> Self {
        Self {
            table: default_table(),
        }
    }

    pub fn with_table(table: Vec<Abbreviation>) -> Self {
        Self { table }
    }

    /// Every expansion known for `short`, across positions
    fn expansions_of(&self, short: &str) -> BTreeSet<&'static str> {
        self.table
            .iter()
            .filter(|a| a.short == short)
            .flat_map(|a| a.expansions.iter().copied())
            .collect()
    }

    fn check_tag(&self, way: &Way, key: &str, name: &str) -> Option<Finding> {
        let found = self.table.iter().find(|a| a.matches(name))?;
        let expansions = self.expansions_of(found.short);
        let listed: Vec<&str> = expansions.iter().copied().collect();
        let mut finding = Finding::warning(
            codes::CONTAINS_ABBREVIATION,
            format!(
                "{} is an abbreviation in \"{}\", try expanding to one of the following: [{}]",
                found.short,
                key,
                listed.join(", ")
            ),
        )
        .with_ways([way.id]);

        if let [expansion] = listed.as_slice() {
            if occurrences(name, found.short) == 1 {
                let expanded = name
                    .replace(found.short, expansion)
                    .replace(&format!("{expansion}."), expansion);
                finding = finding.with_fix(Fix::SetTag {
                    targets: vec![way.id],
                    key: key.to_string(),
                    value: expanded,
                });
            }
        }
        Some(finding)
    }

    fn check_way(&self, graph: &RoadGraph, id: WayId) -> Result<Vec<Finding>> {
        let way = graph.try_way(id)?;
        Ok(way
            .tags
            .iter()
            .filter(|(key, _)| is_name_key(key))
            .filter_map(|(key, name)| self.check_tag(way, key, name))
            .collect())
    }
}

impl Analyzer for AbbreviationAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Abbreviations
    }

    fn collect(&self, graph: &RoadGraph) -> Vec<WayId> {
        ways_where(graph, |w| {
            w.tags.highway().is_some() && w.tags.iter().any(|(key, _)| is_name_key(key))
        })
    }

    fn analyze(&self, graph: &RoadGraph, candidates: &[WayId]) -> Vec<Finding> {
        findings_per_way(self.kind(), candidates, |id| self.check_way(graph, id))
    }
}
