// tests/profile_document_tests.rs
//
// Loading profile documents from disk (YAML and JSON) and running them.

use std::fs;
use std::path::PathBuf;

use tanzo_sim::io::load_profile_document;
use tanzo_sim::{AttributeValue, Distribution, Scalar, SimConfig, Simulator};
use tempfile::tempdir;

fn sample_profile_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("profiles/kai.yaml")
}

#[test]
fn bundled_profile_loads_and_runs() {
    let doc = load_profile_document(&sample_profile_path()).unwrap();
    assert_eq!(doc.profile.name(), "Kai");
    assert_eq!(doc.profile.archetypes().len(), 2);
    assert_eq!(doc.profile.attribute_count(), 6);
    assert_eq!(doc.profile.distributed_count(), 4);

    let params = doc.parameters();
    assert_eq!(params.iterations, Some(1000));
    assert_eq!(params.seed, Some(42));

    let config = SimConfig::new(params.iterations.unwrap()).with_seed(params.seed.unwrap());
    let report = Simulator::new(config).run(&doc.profile).unwrap();
    let summary = &report.summary;

    let username = summary.categorical("Online Avatar", "username").unwrap();
    assert_eq!(username.frequency("kai_digital"), 1.0);

    let height = summary.numeric("Physical Self", "height").unwrap();
    assert_eq!(height.mean, 175.0);
    assert_eq!(height.std_dev, 0.0);

    let screen = summary.numeric("Online Avatar", "screen_time").unwrap();
    assert!(screen.min >= 0.0 && screen.max <= 24.0);

    let activity = summary.categorical("Physical Self", "activity_level").unwrap();
    for label in activity.relative_frequencies.keys() {
        assert!(["low", "medium", "high"].contains(&label.as_str()));
    }
}

#[test]
fn json_documents_use_the_same_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.json");
    fs::write(
        &path,
        r#"{
  "profile": {
    "name": "Mira",
    "archetypes": [
      {
        "type": "analog",
        "attributes": [
          { "name": "focus", "value": { "distribution": "uniform", "min": 0, "max": 1 } },
          { "name": "calm", "value": { "distribution": "normal", "mean": 3, "std_dev": 0.5 } },
          { "name": "tag", "value": true }
        ]
      }
    ]
  }
}"#,
    )
    .unwrap();

    let doc = load_profile_document(&path).unwrap();
    assert!(doc.simulation_parameters.is_none());
    let attrs = doc.profile.archetypes()[0].attributes();
    assert!(matches!(
        attrs[1].value(),
        AttributeValue::Distributed(Distribution::Normal(n)) if n.std_dev() == 0.5
    ));
    assert_eq!(attrs[2].value(), &AttributeValue::Fixed(Scalar::Bool(true)));
}

#[test]
fn invalid_documents_name_the_file_and_the_problem() {
    let dir = tempdir().unwrap();

    let path = dir.path().join("bad_uniform.yaml");
    fs::write(
        &path,
        "profile:\n  name: Kai\n  archetypes:\n    - type: digital\n      attributes:\n        - name: x\n          value: { distribution: uniform, min: 3, max: 3 }\n",
    )
    .unwrap();
    let msg = format!("{:#}", load_profile_document(&path).unwrap_err());
    assert!(msg.contains("bad_uniform.yaml"), "{msg}");
    assert!(msg.contains("uniform"), "{msg}");

    let path = dir.path().join("empty.yaml");
    fs::write(&path, "profile:\n  name: Kai\n  archetypes: []\n").unwrap();
    let msg = format!("{:#}", load_profile_document(&path).unwrap_err());
    assert!(msg.contains("at least one archetype"), "{msg}");

    let missing = dir.path().join("missing.yaml");
    let msg = format!("{:#}", load_profile_document(&missing).unwrap_err());
    assert!(msg.contains("Failed to read profile"), "{msg}");
}

#[test]
fn zero_weight_document_loads_but_cannot_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zero.yaml");
    fs::write(
        &path,
        "profile:\n  name: Kai\n  archetypes:\n    - type: digital\n      attributes:\n        - name: mood\n          value: { distribution: discrete, values: [a, b], weights: [0, 0] }\n",
    )
    .unwrap();
    let doc = load_profile_document(&path).unwrap();
    let err = Simulator::new(SimConfig::new(10).with_seed(1))
        .run(&doc.profile)
        .unwrap_err();
    assert!(err.to_string().contains("'mood'"));
}
