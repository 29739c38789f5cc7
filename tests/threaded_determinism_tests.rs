// tests/threaded_determinism_tests.rs
//
// Multi-threaded runs must be bit-identical to a single-threaded run with
// per-trial streams, whatever the thread count.

use tanzo_sim::{
    Archetype, Attribute, CancelToken, Distribution, Profile, SimConfig, Simulator, StreamMode,
};

fn profile() -> Profile {
    let digital = Archetype::new(
        "digital",
        vec![
            Attribute::distributed("energy", Distribution::normal(50.0, 5.0).unwrap()).unwrap(),
            Attribute::distributed("focus", Distribution::uniform(0.0, 10.0).unwrap()).unwrap(),
            Attribute::fixed("label", "stable").unwrap(),
        ],
    )
    .unwrap()
    .with_name("Explorer");
    let physical = Archetype::new(
        "physical",
        vec![Attribute::distributed(
            "activity",
            Distribution::discrete(
                vec!["low".into(), "medium".into(), "high".into()],
                vec![0.2, 0.5, 0.3],
            )
            .unwrap(),
        )
        .unwrap()],
    )
    .unwrap();
    Profile::new("Kai", vec![digital, physical]).unwrap()
}

fn per_trial(trials: u64, seed: u64) -> SimConfig {
    SimConfig::new(trials)
        .with_seed(seed)
        .with_streams(StreamMode::PerTrial)
}

#[test]
fn thread_count_does_not_change_results() {
    let p = profile();
    let baseline = Simulator::new(per_trial(2_345, 42)).run(&p).unwrap();

    for threads in [2, 3, 4, 8, 64] {
        let report = Simulator::new(per_trial(2_345, 42).with_threads(threads))
            .run(&p)
            .unwrap();
        assert_eq!(report.threads, threads);
        assert_eq!(report.summary, baseline.summary, "threads = {threads}");
        assert_eq!(report.checksum, baseline.checksum, "threads = {threads}");
    }
}

#[test]
fn more_threads_than_trials_still_runs_every_trial() {
    let p = profile();
    let report = Simulator::new(per_trial(3, 1).with_threads(16))
        .run(&p)
        .unwrap();
    assert_eq!(report.completed_trials, 3);
    assert!(!report.cancelled);
}

#[test]
fn threaded_runs_reproduce() {
    let p = profile();
    let cfg = SimConfig::new(5_000).with_seed(7).with_threads(4);
    let a = Simulator::new(cfg.clone()).run(&p).unwrap();
    let b = Simulator::new(cfg).run(&p).unwrap();
    assert_eq!(a.checksum, b.checksum);
    assert_eq!(a.stream_mode, StreamMode::PerTrial);
}

#[test]
fn shared_and_per_trial_streams_differ() {
    let p = profile();
    let shared = Simulator::new(SimConfig::new(500).with_seed(42))
        .run(&p)
        .unwrap();
    let split = Simulator::new(per_trial(500, 42)).run(&p).unwrap();
    assert_eq!(shared.stream_mode, StreamMode::Shared);
    assert_ne!(shared.checksum, split.checksum);
}

#[test]
fn cancelled_threaded_run_reports_partial_work() {
    let p = profile();
    let token = CancelToken::new();
    token.cancel();
    let report = Simulator::new(per_trial(1_000, 3).with_threads(4))
        .run_with_cancel(&p, &token)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.completed_trials, 0);
    assert_eq!(report.summary.len(), 4);
}
