//! Integration tests for the scenario runner.
//!
//! These tests go from a TOML file on disk to a JSON history and back.

use belief_events::HistoryExport;
use belief_runner::{run_scenario, succeeded, ConfigError, Scenario, ScenarioError};
use std::fs;
use tempfile::tempdir;

const RELAY: &str = r#"
[simulation]
seed = 5
steps = 4

[[beliefs]]
name = "x"

[[behaviours]]
name = "speak"
threshold = 0.5
effects = { x = 1.0 }

[[agents]]
name = "source"
stubbornness = 1.0
deviation = 0.0
activations = { x = 1.0 }

[[agents]]
name = "relay"
stubbornness = 0.0
deviation = 0.0
activations = { x = -1.0 }

[[agents]]
name = "sink"
stubbornness = 0.0
deviation = 0.0
activations = { x = -1.0 }

[[friendships]]
source = "source"
target = "relay"
weight = 1.0

[[friendships]]
source = "relay"
target = "sink"
weight = 1.0
"#;

fn id_of(export: &HistoryExport, name: &str) -> belief_events::AgentId {
    export
        .agents
        .iter()
        .find(|l| l.name == name)
        .map(|l| l.id)
        .expect("agent label")
}

/// Test that a scenario file runs and its JSON export reads back
#[test]
fn test_toml_to_json_round_trip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("relay.toml");
    fs::write(&path, RELAY).expect("Failed to write scenario");

    let scenario = Scenario::load(&path).expect("Failed to load scenario");
    let export = run_scenario(&scenario).expect("Failed to run scenario");

    let out = dir.path().join("history.json");
    fs::write(&out, export.to_json_pretty().unwrap()).expect("Failed to write history");
    let read_back =
        HistoryExport::from_json(&fs::read_to_string(&out).unwrap()).expect("Failed to parse");

    assert_eq!(read_back, export);
    assert_eq!(read_back.seed, 5);
    assert_eq!(read_back.steps.len(), 5);
    assert!(read_back.is_contiguous());
}

/// Test that a belief travels one hop per step along a chain
#[test]
fn test_relay_propagation() {
    let export = run_scenario(&Scenario::from_str(RELAY).unwrap()).unwrap();
    let x = export.beliefs[0].id;
    let relay = id_of(&export, "relay");
    let sink = id_of(&export, "sink");

    let relay_series: Vec<f64> = export
        .activation_series(relay, x)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    let sink_series: Vec<f64> = export
        .activation_series(sink, x)
        .into_iter()
        .map(|(_, v)| v)
        .collect();

    assert_eq!(relay_series, vec![-1.0, 1.0, 1.0, 1.0, 1.0]);
    assert_eq!(sink_series, vec![-1.0, -1.0, 1.0, 1.0, 1.0]);

    // Performance follows activation at each step
    let speak = export.behaviours[0].id;
    let sink_spoke: Vec<bool> = export
        .steps
        .iter()
        .map(|s| {
            s.performances
                .iter()
                .find(|p| p.agent == sink && p.behaviour == speak)
                .map(|p| p.performed)
                .unwrap()
        })
        .collect();
    assert_eq!(sink_spoke, vec![false, false, true, true, true]);
}

/// Test that the same file and seed give byte-identical JSON
#[test]
fn test_repeat_runs_identical_json() {
    let mut scenario = Scenario::from_str(RELAY).unwrap();
    for agent in &mut scenario.agents {
        agent.deviation = Some(0.3);
    }
    scenario.simulation.steps = 20;

    let first = run_scenario(&scenario).unwrap().to_json_pretty().unwrap();
    scenario.simulation.worker_threads = 4;
    let second = run_scenario(&scenario).unwrap().to_json_pretty().unwrap();

    assert_eq!(first, second);
}

/// Test that a scheduled weight change takes effect at its step
#[test]
fn test_weight_change_applied() {
    let mut scenario = Scenario::from_str(RELAY).unwrap();
    scenario.friendships.retain(|f| f.target == "relay");
    scenario.weight_changes.push(belief_runner::config::WeightChangeConfig {
        at_step: 3,
        source: "relay".to_string(),
        target: "sink".to_string(),
        weight: 1.0,
    });

    let export = run_scenario(&scenario).unwrap();
    let x = export.beliefs[0].id;
    let sink = id_of(&export, "sink");
    let values: Vec<f64> = export
        .activation_series(sink, x)
        .into_iter()
        .map(|(_, v)| v)
        .collect();

    // Isolated with stubbornness 0 until step 3: peer term 0
    assert_eq!(values, vec![-1.0, 0.0, 0.0, 1.0, 1.0]);
    assert!(succeeded(&export));
}

/// Test that malformed TOML is reported as a parse error
#[test]
fn test_bad_toml_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[simulation\nseed = 1").unwrap();

    let err = Scenario::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

/// Test that effects must name declared beliefs
#[test]
fn test_unknown_belief_in_effects() {
    let mut scenario = Scenario::from_str(RELAY).unwrap();
    scenario.behaviours[0]
        .effects
        .insert("missing".to_string(), 0.5);

    let err = run_scenario(&scenario).unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownName { kind: "belief", .. }));
}

/// Test that the bundled village scenario parses and runs
#[test]
fn test_bundled_scenario_runs() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenario.toml");
    let scenario = Scenario::load(path).expect("Failed to load bundled scenario");
    let export = run_scenario(&scenario).unwrap();

    assert!(succeeded(&export));
    assert_eq!(export.steps.len() as u64, scenario.simulation.steps + 1);
    for step in &export.steps {
        assert!(step
            .activations
            .iter()
            .all(|r| (-1.0..=1.0).contains(&r.activation)));
    }
}
