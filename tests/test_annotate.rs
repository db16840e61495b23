use std::path::Path;

use fmi_gen::{
    annotate::{self, FMI_VARIABLE_CAUSALITY, FMI_VARIABLE_NAME, FMI_VARIABLE_TYPE, FMI_VARIABLE_VREF},
    index::DocumentIndex,
    kind::{signal_group::Signal, Document, Kind},
    options::AnnotateOptions,
    stack::{MODEL_INST_ANNOTATION, YAML_FILES_ANNOTATION},
    Error,
};
use rstest::rstest;
use serde_yaml::Value;

mod common;

fn load(path: impl AsRef<Path>, name: &str) -> Document {
    fmi_gen::kind::load_file(path)
        .unwrap()
        .into_iter()
        .find(|doc| doc.name() == name)
        .unwrap()
}

fn signal<'a>(doc: &'a Document, name: &str) -> &'a Signal {
    doc.as_signal_group()
        .unwrap()
        .signals
        .iter()
        .find(|s| s.signal == name)
        .unwrap()
}

fn assert_unchanged(sim: &Path, fixture: &str, file: &str) {
    assert_eq!(
        std::fs::read_to_string(sim.join(file)).unwrap(),
        std::fs::read_to_string(common::fixture(fixture).join("sim").join(file)).unwrap(),
        "{file} was rewritten"
    );
}

fn yaml_files(values: &[&str]) -> Value {
    Value::Sequence(values.iter().map(|v| Value::from(*v)).collect())
}

#[test_log::test]
fn test_annotate_signal_group() {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    let options = AnnotateOptions {
        sim: sim.clone(),
        signal_groups: vec!["signal".to_string()],
        ruleset: Some("signal-direction".to_string()),
        ..Default::default()
    };
    let summary = annotate::run(&options).unwrap();
    assert_eq!(summary.annotated, vec!["signal"]);
    assert!(summary.skipped.is_empty());
    assert!(summary.direct_index.is_none());

    let doc = load(sim.join("data/signalgroup-signal.yaml"), "signal");
    for (name, causality, vref) in [
        ("reset_counters", "input", 1),
        ("task_init_done", "output", 2),
        ("task_5_active", "output", 3),
    ] {
        let s = signal(&doc, name);
        assert_eq!(s.annotation_str(FMI_VARIABLE_CAUSALITY), Some(causality));
        assert_eq!(s.annotations[FMI_VARIABLE_VREF], Value::from(vref));
        assert_eq!(s.annotation_str(FMI_VARIABLE_TYPE), Some("Real"));
        assert_eq!(s.annotation_str(FMI_VARIABLE_NAME), Some(name));
        assert_eq!(s.annotation_str("direction"), Some(causality));
    }
    let s = signal(&doc, "internal_state");
    assert_eq!(s.annotations.len(), 1);
    assert_eq!(doc.metadata.labels.get("model").map(String::as_str), Some("Target"));

    let stack = load(sim.join("data/simulation.yaml"), "stack");
    assert_eq!(
        stack.metadata.annotation_str(MODEL_INST_ANNOTATION),
        Some("target_inst")
    );
    assert_eq!(
        stack.metadata.annotations[YAML_FILES_ANNOTATION],
        yaml_files(&[
            "data/model.yaml",
            "data/runnable.yaml",
            "data/signalgroup-network.yaml",
            "data/signalgroup-signal.yaml",
            "data/simulation.yaml",
        ])
    );
    let spec = stack.as_stack().unwrap();
    assert!(spec.extra.contains_key("connection"));
    assert_eq!(spec.models()[1].extra.get("uid"), Some(&Value::from(42)));

    assert_unchanged(&sim, "modelcfmu", "data/model.yaml");
    assert_unchanged(&sim, "modelcfmu", "data/runnable.yaml");
    assert_unchanged(&sim, "modelcfmu", "data/signalgroup-network.yaml");
}

#[test]
fn test_annotate_skips_binary() {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    let options = AnnotateOptions {
        sim: sim.clone(),
        ruleset: Some("signal-direction".to_string()),
        ..Default::default()
    };
    let summary = annotate::run(&options).unwrap();
    assert_eq!(summary.annotated, vec!["signal"]);
    assert_eq!(summary.skipped, vec!["network"]);

    assert_unchanged(&sim, "modelcfmu", "data/signalgroup-network.yaml");
    let doc = load(sim.join("data/signalgroup-signal.yaml"), "signal");
    assert_eq!(
        signal(&doc, "task_5_active").annotations[FMI_VARIABLE_VREF],
        Value::from(3)
    );
}

#[test]
fn test_annotate_without_ruleset() {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    let options = AnnotateOptions {
        sim: sim.clone(),
        ..Default::default()
    };
    let summary = annotate::run(&options).unwrap();
    assert!(summary.annotated.is_empty());

    assert_unchanged(&sim, "modelcfmu", "data/signalgroup-signal.yaml");
    let stack = load(sim.join("data/simulation.yaml"), "stack");
    assert_eq!(
        stack.metadata.annotation_str(MODEL_INST_ANNOTATION),
        Some("target_inst")
    );
}

#[test]
fn test_annotate_rule_file() {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    let options = AnnotateOptions {
        sim: sim.clone(),
        signal_groups: vec!["signal".to_string()],
        rule: Some(common::fixture("modelcfmu").join("rule.csv")),
        ruleset: Some("no-such-ruleset".to_string()),
        ..Default::default()
    };
    annotate::run(&options).unwrap();

    let doc = load(sim.join("data/signalgroup-signal.yaml"), "signal");
    let s = signal(&doc, "internal_state");
    assert_eq!(s.annotation_str(FMI_VARIABLE_CAUSALITY), Some("local"));
    assert!(!s.annotations.contains_key(FMI_VARIABLE_VREF));
    let s = signal(&doc, "reset_counters");
    assert_eq!(s.annotations[FMI_VARIABLE_VREF], Value::from(1));
}

#[rstest]
#[case::rule_file(Some("bad_rule.csv"), None)]
#[case::unknown_ruleset(None, Some("signal-magic"))]
fn test_annotate_load_error(#[case] rule: Option<&str>, #[case] ruleset: Option<&str>) {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    let options = AnnotateOptions {
        sim: sim.clone(),
        rule: rule.map(|rule| common::fixture("modelcfmu").join(rule)),
        ruleset: ruleset.map(str::to_string),
        index: true,
        ..Default::default()
    };
    assert!(matches!(annotate::run(&options), Err(Error::Load(_))));

    // Nothing is written when the rules can not be loaded.
    assert!(!sim.join("data/direct_index.yaml").exists());
    assert_unchanged(&sim, "modelcfmu", "data/signalgroup-signal.yaml");
    assert_unchanged(&sim, "modelcfmu", "data/simulation.yaml");
}

#[test]
fn test_annotate_requires_single_stack() {
    let (_dir, sim) = common::copy_sim("modelcfmu");
    std::fs::copy(
        sim.join("data/simulation.yaml"),
        sim.join("data/simulation-copy.yaml"),
    )
    .unwrap();
    let options = AnnotateOptions {
        sim: sim.clone(),
        ruleset: Some("signal-direction".to_string()),
        ..Default::default()
    };
    assert!(matches!(annotate::run(&options), Err(Error::Config(_))));
    assert_unchanged(&sim, "modelcfmu", "data/signalgroup-signal.yaml");

    let (_dir, sim) = common::copy_sim("modelcfmu");
    std::fs::remove_file(sim.join("data/simulation.yaml")).unwrap();
    let options = AnnotateOptions { sim, ..options };
    assert!(matches!(annotate::run(&options), Err(Error::Config(_))));
}

#[test_log::test]
fn test_annotate_direct_index() {
    let (_dir, sim) = common::copy_sim("directindex");
    let options = AnnotateOptions {
        sim: sim.clone(),
        ruleset: Some("signal-direction".to_string()),
        index: true,
        ..Default::default()
    };
    let summary = annotate::run(&options).unwrap();
    let index_path = sim.join("data/direct_index.yaml");
    assert_eq!(summary.direct_index.as_deref(), Some(index_path.as_path()));
    assert_eq!(summary.annotated, vec!["unwired", "in_vector", "out_vector"]);

    let checks = [
        ("in_a", "in", "in_vector", 0, 0),
        ("in_b", "in", "in_vector", 1, 8),
        ("in_c", "in", "in_vector", 2, 16),
        ("out_a", "out", "out_vector", 0, 24 * 3),
        ("out_b", "out", "out_vector", 1, 24 * 3 + 8),
        ("out_c", "out", "out_vector", 2, 24 * 3 + 16),
    ];

    // The direct index.
    let mut index = DocumentIndex::new();
    index.scan(sim.join("data"));
    let groups = index.documents(&Kind::SignalGroup);
    assert_eq!(groups.len(), 2);
    for group in groups {
        assert_eq!(
            group.metadata.labels.get("index").map(String::as_str),
            Some("direct")
        );
    }
    for (name, group, _, position, offset) in checks {
        let doc = load(&index_path, group);
        let s = signal(&doc, name);
        assert_eq!(s.annotations["index"], Value::from(position));
        assert_eq!(s.annotations["offset"], Value::from(offset));
    }
    let out = load(&index_path, "out");
    let direct_index = &out.metadata.annotations["direct_index"];
    assert_eq!(direct_index.get("offset"), Some(&Value::from(3)));
    assert_eq!(direct_index.get("length"), Some(&Value::from(3)));

    // The SignalGroups reference their offsets.
    let model_data = sim.join("model/direct/data");
    for (name, _, group, _, offset) in checks {
        let doc = load(model_data.join("signalgroup.yaml"), group);
        let s = signal(&doc, name);
        assert_eq!(s.annotation_str(FMI_VARIABLE_NAME), Some(name));
        assert_eq!(s.annotations[FMI_VARIABLE_VREF], Value::from(offset));
    }

    // Unwired SignalGroups get their rules applied, without references.
    let doc = load(model_data.join("signalgroup-unwired.yaml"), "unwired");
    let s = signal(&doc, "spare");
    assert_eq!(s.annotation_str(FMI_VARIABLE_CAUSALITY), Some("input"));
    assert!(!s.annotations.contains_key(FMI_VARIABLE_VREF));

    let stack = load(sim.join("data/simulation.yaml"), "stack");
    assert_eq!(
        stack.metadata.annotation_str(MODEL_INST_ANNOTATION),
        Some("direct_inst")
    );
    assert_eq!(
        stack.metadata.annotations[YAML_FILES_ANNOTATION],
        yaml_files(&[
            "data/simulation.yaml",
            "model/direct/data/model.yaml",
            "model/direct/data/signalgroup-unwired.yaml",
            "model/direct/data/signalgroup.yaml",
            "data/direct_index.yaml",
        ])
    );
    assert_unchanged(&sim, "directindex", "model/direct/data/model.yaml");
}

#[test]
fn test_annotate_direct_index_rerun() {
    let (_dir, sim) = common::copy_sim("directindex");
    let options = AnnotateOptions {
        sim: sim.clone(),
        ruleset: Some("signal-direction".to_string()),
        index: true,
        ..Default::default()
    };
    let index_path = sim.join("data/direct_index.yaml");

    annotate::run(&options).unwrap();
    let first_index = std::fs::read_to_string(&index_path).unwrap();
    let first_signals = std::fs::read_to_string(sim.join("model/direct/data/signalgroup.yaml"));

    let summary = annotate::run(&options).unwrap();
    assert_eq!(summary.annotated, vec!["unwired", "in_vector", "out_vector"]);
    assert_eq!(std::fs::read_to_string(&index_path).unwrap(), first_index);
    assert_eq!(
        std::fs::read_to_string(sim.join("model/direct/data/signalgroup.yaml")).unwrap(),
        first_signals.unwrap()
    );
}

#[rstest]
#[case::unknown_ruleset(Some("signal-typo"), false)]
#[case::second_stack(Some("signal-direction"), true)]
fn test_annotate_direct_index_failed_rerun(
    #[case] ruleset: Option<&str>,
    #[case] second_stack: bool,
) {
    let (_dir, sim) = common::copy_sim("directindex");
    let options = AnnotateOptions {
        sim: sim.clone(),
        ruleset: Some("signal-direction".to_string()),
        index: true,
        ..Default::default()
    };
    let index_path = sim.join("data/direct_index.yaml");
    let signals_path = sim.join("model/direct/data/signalgroup.yaml");

    annotate::run(&options).unwrap();
    let first_index = std::fs::read_to_string(&index_path).unwrap();
    let first_signals = std::fs::read_to_string(&signals_path).unwrap();

    if second_stack {
        std::fs::copy(
            sim.join("data/simulation.yaml"),
            sim.join("data/simulation-copy.yaml"),
        )
        .unwrap();
    }
    let options = AnnotateOptions {
        ruleset: ruleset.map(str::to_string),
        ..options
    };
    assert!(annotate::run(&options).is_err());

    // The index referenced by the annotated SignalGroups is still in place.
    assert_eq!(std::fs::read_to_string(&index_path).unwrap(), first_index);
    assert_eq!(std::fs::read_to_string(&signals_path).unwrap(), first_signals);
}

#[test]
fn test_annotate_direct_index_filter() {
    let (_dir, sim) = common::copy_sim("directindex");
    let options = AnnotateOptions {
        sim: sim.clone(),
        signal_groups: vec!["out_vector".to_string()],
        ruleset: Some("signal-direction".to_string()),
        index: true,
        ..Default::default()
    };
    let summary = annotate::run(&options).unwrap();
    assert_eq!(summary.annotated, vec!["out_vector"]);

    let index_path = sim.join("data/direct_index.yaml");
    let docs = fmi_gen::kind::load_file(&index_path).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name(), "out");

    let doc = load(sim.join("model/direct/data/signalgroup.yaml"), "out_vector");
    assert_eq!(
        signal(&doc, "out_b").annotations[FMI_VARIABLE_VREF],
        Value::from(8)
    );
    let doc = load(sim.join("model/direct/data/signalgroup.yaml"), "in_vector");
    assert!(!signal(&doc, "in_a").annotations.contains_key(FMI_VARIABLE_VREF));
}
