use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;
use widok_regulator::{Command, Regulator, RegulatorConfig, Snapshot};
use widok_test_fixtures::regulators;

#[derive(Debug, Deserialize)]
struct Scenario {
    config: RegulatorConfig,
    commands: Vec<Command>,
    expect: Expect,
}

#[derive(Debug, Deserialize)]
struct Expect {
    first_frame: IndexMap<String, f64>,
    max_frames: usize,
    rest: IndexMap<String, f64>,
    tolerance: f64,
}

fn assert_snapshot(label: &str, got: &Snapshot, want: &IndexMap<String, f64>, eps: f64) {
    assert_eq!(got.len(), want.len(), "{label}: property count");
    for ((name, value), (want_name, want_value)) in got.iter().zip(want.iter()) {
        assert_eq!(name, want_name, "{label}: declaration order");
        assert!(
            (value - want_value).abs() <= eps.max(1e-12),
            "{label}: {name} left={value} right={want_value} eps={eps}"
        );
    }
}

fn run(name: &str) {
    let scenario: Scenario = regulators::load(name).expect("fixture loads");
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = frames.clone();
    let mut reg = Regulator::new(scenario.config, move |snap, _| {
        sink.borrow_mut().push(snap.clone())
    })
    .expect("fixture config is valid");

    for cmd in &scenario.commands {
        reg.apply(cmd).expect("fixture command applies");
    }
    {
        let frames = frames.borrow();
        let first = frames.first().expect("commands produced a frame");
        assert_snapshot(
            &format!("{name} first frame"),
            first,
            &scenario.expect.first_frame,
            1e-9,
        );
    }

    let delivered = reg
        .run_to_rest(scenario.expect.max_frames)
        .unwrap_or_else(|e| panic!("{name}: {e}"));
    assert!(delivered <= scenario.expect.max_frames);
    assert!(!reg.is_animating(), "{name}: loop still active");
    assert_snapshot(
        &format!("{name} rest"),
        &reg.snapshot(),
        &scenario.expect.rest,
        scenario.expect.tolerance,
    );
}

#[test]
fn ramp() {
    run("ramp");
}

#[test]
fn jump() {
    run("jump");
}

#[test]
fn saturated() {
    run("saturated");
}

#[test]
fn multi_property() {
    run("multi-property");
}

#[test]
fn velocity_handoff() {
    run("velocity-handoff");
}

#[test]
fn every_fixture_has_a_test() {
    let mut covered = vec![
        "jump",
        "multi-property",
        "ramp",
        "saturated",
        "velocity-handoff",
    ];
    covered.sort();
    assert_eq!(regulators::keys(), covered);
}
