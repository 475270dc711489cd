//! End-to-end runs of the engine over JSON snapshots
//!
//! Each scenario is written the way a host would hand it over: a flat JSON
//! document of nodes, ways and relations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use roadcheck::report::codes;
use roadcheck::validate::{AnalyzerKind, MAX_CHAIN_DEPTH};
use roadcheck::{validate_json, DrivingSide, ElementId, Engine, Fix, Report, Snapshot, ValidatorConfig};

fn only(kinds: &[AnalyzerKind]) -> ValidatorConfig {
    ValidatorConfig {
        enabled: kinds.to_vec(),
        ..Default::default()
    }
}

fn run(snapshot: Value, config: &ValidatorConfig) -> Report {
    validate_json(&snapshot.to_string(), config).unwrap()
}

fn codes_of(report: &Report) -> Vec<u32> {
    report.findings().iter().map(|f| f.code).collect()
}

/// Eastbound one-way approach 10 with four lanes ending at node 2; 11
/// continues east, 12 leaves north (left), 13 leaves south (right).
fn four_lane_approach(continuing_lanes: &str) -> Value {
    json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.0, "lon": 0.001},
            {"id": 3, "lat": 0.0, "lon": 0.002},
            {"id": 4, "lat": 0.001, "lon": 0.001},
            {"id": 5, "lat": -0.001, "lon": 0.001}
        ],
        "ways": [
            {"id": 10, "nodes": [1, 2], "tags": {
                "highway": "primary", "oneway": "yes", "lanes": "4",
                "turn:lanes": "left|through|through|right"
            }},
            {"id": 11, "nodes": [2, 3], "tags": {
                "highway": "primary", "oneway": "yes", "lanes": continuing_lanes
            }},
            {"id": 12, "nodes": [2, 4], "tags": {"highway": "residential"}},
            {"id": 13, "nodes": [2, 5], "tags": {"highway": "residential"}}
        ]
    })
}

#[test]
fn test_turn_lanes_leave_two_through_lanes() {
    let config = ValidatorConfig {
        check_turn_lanes_at_intersections: true,
        ..only(&[AnalyzerKind::TurnLanes])
    };
    assert!(run(four_lane_approach("2"), &config).is_empty());

    let report = run(four_lane_approach("3"), &config);
    assert_eq!(codes_of(&report), vec![codes::TURN_LANES_DO_NOT_CONTINUE]);
    assert_eq!(
        report.findings()[0].elements,
        vec![ElementId::Way(10), ElementId::Way(11)]
    );
}

/// Two-way approach 10 east to node 2 with forward turn lanes; two-way 11
/// continues east, 12 leaves north (left).
fn two_way_approach(continuing_lanes: &str) -> Value {
    json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.0, "lon": 0.001},
            {"id": 3, "lat": 0.0, "lon": 0.002},
            {"id": 4, "lat": 0.001, "lon": 0.001}
        ],
        "ways": [
            {"id": 10, "nodes": [1, 2], "tags": {
                "highway": "primary", "lanes:forward": "3",
                "turn:lanes:forward": "left|through|through"
            }},
            {"id": 11, "nodes": [2, 3], "tags": {
                "highway": "primary", "lanes:forward": continuing_lanes
            }},
            {"id": 12, "nodes": [2, 4], "tags": {"highway": "residential"}}
        ]
    })
}

#[test]
fn test_forward_turn_lanes_on_two_way_road() {
    let config = ValidatorConfig {
        check_turn_lanes_at_intersections: true,
        ..only(&[AnalyzerKind::TurnLanes])
    };
    assert!(run(two_way_approach("2"), &config).is_empty());

    let report = run(two_way_approach("3"), &config);
    assert_eq!(codes_of(&report), vec![codes::TURN_LANES_DO_NOT_CONTINUE]);
    assert_eq!(
        report.findings()[0].elements,
        vec![ElementId::Way(10), ElementId::Way(11)]
    );
}

#[test]
fn test_intersection_checks_are_opt_in() {
    let report = run(four_lane_approach("3"), &only(&[AnalyzerKind::TurnLanes]));
    assert!(report.is_empty());
}

#[test]
fn test_malformed_turn_lanes() {
    let mut snapshot = four_lane_approach("2");
    snapshot["ways"][0]["tags"]["turn:lanes"] = json!("left|through|sideways|right");
    let report = run(snapshot, &only(&[AnalyzerKind::TurnLanes]));
    assert_eq!(codes_of(&report), vec![codes::MALFORMED_LANE_DATA]);
}

/// Link 20 (1 -> 2) ends on motorway 10 (3 -> 2 -> 4) carrying ref A1
fn ramp(destination: &str) -> Value {
    json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.001, "lon": 0.001},
            {"id": 3, "lat": 0.0, "lon": 0.001},
            {"id": 4, "lat": 0.002, "lon": 0.001}
        ],
        "ways": [
            {"id": 10, "nodes": [3, 2, 4], "tags": {"highway": "motorway", "ref": "A1"}},
            {"id": 20, "nodes": [1, 2], "tags": {
                "highway": "motorway_link", "destination:ref": destination
            }}
        ]
    })
}

#[test]
fn test_motorway_link_destination_resolves() {
    let config = only(&[AnalyzerKind::LinkChain]);
    assert!(run(ramp("A1"), &config).is_empty());

    let report = run(ramp("A7"), &config);
    assert_eq!(codes_of(&report), vec![codes::DESTINATION_TAG_DOES_NOT_MATCH]);
    // a destination is present, just wrong: nothing to propose
    assert!(report.findings()[0].fix.is_none());
}

/// Primary 10 runs north and ends at node 2, where the given links start
fn road_end(links: &[(i64, [i64; 2])]) -> Value {
    let ways: Vec<Value> = std::iter::once(json!({
        "id": 10, "nodes": [1, 2], "tags": {"highway": "primary", "name": "High Street"}
    }))
    .chain(links.iter().map(|(id, nodes)| {
        json!({"id": id, "nodes": nodes, "tags": {"highway": "primary_link"}})
    }))
    .collect();
    json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.001, "lon": 0.0},
            {"id": 3, "lat": 0.00115, "lon": -0.00015},
            {"id": 4, "lat": 0.00115, "lon": 0.00015},
            {"id": 5, "lat": 0.0012, "lon": 0.0}
        ],
        "ways": ways
    })
}

#[test]
fn test_two_short_links_fork() {
    let report = run(
        road_end(&[(20, [2, 3]), (21, [4, 2])]),
        &only(&[AnalyzerKind::YJunction]),
    );
    assert_eq!(codes_of(&report), vec![codes::ROAD_ENDS_WITH_LINKS]);
    assert_eq!(
        report.findings()[0].elements,
        vec![ElementId::Way(10), ElementId::Way(20), ElementId::Way(21)]
    );
}

#[test]
fn test_three_links_fan_out() {
    let report = run(
        road_end(&[(20, [2, 3]), (21, [2, 4]), (22, [2, 5])]),
        &only(&[AnalyzerKind::YJunction]),
    );
    assert_eq!(codes_of(&report), vec![codes::ROAD_ENDS_WITH_LINKS]);
    assert_eq!(report.findings()[0].primary(), Some(ElementId::Way(20)));
    assert!(report.findings()[0].involves_way(10));
}

#[test]
fn test_link_turn_restriction_fix() {
    // R0 10 runs north 1 -> 2 -> 3, R1 11 leaves east from 3, link 20 cuts
    // the corner from 2 to 4
    let snapshot = json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.001, "lon": 0.0},
            {"id": 3, "lat": 0.002, "lon": 0.0},
            {"id": 4, "lat": 0.002, "lon": 0.001},
            {"id": 5, "lat": 0.002, "lon": 0.002}
        ],
        "ways": [
            {"id": 10, "nodes": [1, 2, 3], "tags": {"highway": "primary", "oneway": "yes"}},
            {"id": 11, "nodes": [3, 4, 5], "tags": {"highway": "secondary", "oneway": "yes"}},
            {"id": 20, "nodes": [2, 4], "tags": {"highway": "primary_link"}}
        ]
    });
    let report = run(snapshot.clone(), &only(&[AnalyzerKind::YJunction]));
    let finding = report
        .with_code(codes::LINK_WITHOUT_TURN_RESTRICTION)
        .next()
        .unwrap();
    assert_eq!(
        finding.fix,
        Some(Fix::AddTurnRestriction {
            from: 10,
            via: 3,
            to: 11,
            restriction: "no_right_turn".into(),
        })
    );

    let mut restricted = snapshot;
    restricted["relations"] = json!([{
        "id": 100,
        "tags": {"type": "restriction", "restriction": "no_right_turn"},
        "members": [
            {"role": "from", "kind": "way", "ref": 10},
            {"role": "via", "kind": "node", "ref": 3},
            {"role": "to", "kind": "way", "ref": 11}
        ]
    }]);
    let report = run(restricted.clone(), &only(&[AnalyzerKind::YJunction]));
    assert_eq!(report.with_code(codes::LINK_WITHOUT_TURN_RESTRICTION).count(), 0);

    // left-hand traffic does not accept no_right_turn as settling the turn
    let config = ValidatorConfig {
        driving_side: DrivingSide::Left,
        ..only(&[AnalyzerKind::YJunction])
    };
    let report = run(restricted, &config);
    assert_eq!(report.with_code(codes::LINK_WITHOUT_TURN_RESTRICTION).count(), 1);
}

#[test]
fn test_link_chains_terminate_on_random_graphs() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let config = only(&[AnalyzerKind::LinkChain]);
    for _ in 0..50 {
        let n_nodes = rng.random_range(3..40i64);
        let nodes: Vec<Value> = (0..n_nodes)
            .map(|id| {
                json!({
                    "id": id,
                    "lat": rng.random_range(-0.01f64..0.01),
                    "lon": rng.random_range(-0.01f64..0.01)
                })
            })
            .collect();
        let mut ways = vec![json!({
            "id": 1, "nodes": [0, 1], "tags": {"highway": "trunk", "ref": "N1"}
        })];
        for id in 0..rng.random_range(1..60i64) {
            let from = rng.random_range(0..n_nodes);
            let mut to = rng.random_range(0..n_nodes);
            if to == from {
                to = (from + 1) % n_nodes;
            }
            ways.push(json!({
                "id": 100 + id, "nodes": [from, to], "tags": {"highway": "trunk_link"}
            }));
        }
        let report = run(json!({"nodes": nodes, "ways": ways}), &config);
        for finding in report.findings() {
            assert!(finding.elements.len() <= MAX_CHAIN_DEPTH + 1);
            let mut seen = finding.elements.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), finding.elements.len(), "chain visits a way twice");
        }
    }
}

#[test]
fn test_report_is_sorted_and_serializable() {
    let snapshot = json!({
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.0, "lon": 0.001},
            {"id": 3, "lat": 0.0, "lon": 0.002}
        ],
        "ways": [
            {"id": 11, "nodes": [2, 3], "tags": {"highway": "residential", "name": "Elm Ave"}},
            {"id": 10, "nodes": [1, 2], "tags": {"highway": "residential", "name": "Oak Road"}}
        ]
    });
    let report = run(snapshot, &ValidatorConfig::default());
    let json = report.to_json().unwrap();
    assert!(json.contains("\"type\": \"way\""));

    let sorted = report.into_sorted();
    let keys: Vec<(u32, Option<ElementId>)> = sorted.iter().map(|f| (f.code, f.primary())).collect();
    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(keys, expected);
    assert!(sorted.iter().any(|f| f.code == codes::NAME_CHANGES));
    assert!(sorted.iter().any(|f| f.code == codes::CONTAINS_ABBREVIATION));
}

#[test]
fn test_config_file_drives_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadcheck.toml");
    std::fs::write(&path, "enabled = [\"maxspeed\"]\n").unwrap();
    let config = ValidatorConfig::load(&path).unwrap();

    let engine = Engine::new(config);
    assert_eq!(engine.analyzer_kinds(), vec![AnalyzerKind::Maxspeed]);
    let snapshot = Snapshot::from_json(&ramp("A7").to_string()).unwrap();
    assert!(engine.run_snapshot(snapshot).unwrap().is_empty());
}

#[test]
fn test_inconsistent_snapshot_is_an_error() {
    let err = validate_json(
        r#"{"nodes": [], "ways": [{"id": 1, "nodes": [7, 8]}]}"#,
        &ValidatorConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, roadcheck::Error::InvalidSnapshot(_)));
}
