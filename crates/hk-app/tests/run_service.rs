//! Integration tests for the run service: demos, caching, progress and
//! supervision.

use std::path::PathBuf;

use hk_app::{
    AppContext, AppError, RunOptions, RunRequest, RunStage, ensure_run, ensure_run_with_progress,
    list_runs, load_config, load_run, query, validate_config,
};
use hk_project::{DispatchDef, FailSafeDef, SimulationConfig};
use hk_results::RunStore;

fn demo(name: &str) -> SimulationConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name);
    load_config(&path).expect("demo config should load")
}

fn uncached() -> RunOptions {
    RunOptions {
        use_cache: false,
        ..RunOptions::default()
    }
}

#[test]
fn constant_gain_demo_runs() {
    let ctx = AppContext::new();
    let config = demo("constant_gain.yaml");

    let response = ensure_run(&ctx, &RunRequest::new(&config)).expect("run should succeed");

    assert!(!response.loaded_from_cache);
    assert!(response.faults.is_empty());
    assert_eq!(response.log.rows.len(), 3);
    for row in &response.log.rows {
        assert_eq!(row.values["A.output"], Some(5.0));
        assert_eq!(row.values["B.output"], Some(10.0));
    }
    assert!(response.manifest.is_complete());
}

#[test]
fn fault_demo_isolates_the_failing_agent() {
    let ctx = AppContext::new();
    let config = demo("fault_isolation.yaml");

    let response = ensure_run(&ctx, &RunRequest::new(&config)).unwrap();

    assert_eq!(response.log.rows.len(), 10);
    assert_eq!(response.faults.len(), 1);
    assert_eq!(response.faults[0].agent_id.as_str(), "flaky");
    assert_eq!(response.faults[0].tick, 2);
    assert_eq!(response.manifest.failed_agents, vec!["flaky"]);

    let counter = query::extract_series(&response.log, "counter.count").unwrap();
    assert!(counter.iter().all(|(_, v)| v.is_some()));
    let flaky = query::extract_series(&response.log, "flaky.value").unwrap();
    assert!(flaky[2..].iter().all(|(_, v)| v.is_none()));
    // Hold-last keeps the downstream gain fed with the last good value.
    let scaled = query::extract_series(&response.log, "scaled.output").unwrap();
    assert_eq!(scaled[9].1, Some(1.0));
}

#[test]
fn clock_overrides_apply() {
    let ctx = AppContext::new();
    let config = demo("constant_gain.yaml");

    let mut request = RunRequest::new(&config);
    request.dt = Some(0.5);
    let response = ensure_run(&ctx, &request).unwrap();
    assert_eq!(response.log.rows.len(), 6);
    assert_eq!(response.log.rows[5].time, 2.5);

    let mut request = RunRequest::new(&config);
    request.ticks = Some(2);
    let response = ensure_run(&ctx, &request).unwrap();
    assert_eq!(response.log.rows.len(), 2);
}

#[test]
fn second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::new().with_store(RunStore::new(dir.path()).unwrap());
    let config = demo("fault_isolation.yaml");

    let first = ensure_run(&ctx, &RunRequest::new(&config)).unwrap();
    let second = ensure_run(&ctx, &RunRequest::new(&config)).unwrap();

    assert!(!first.loaded_from_cache);
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.log, second.log);
    assert_eq!(first.faults, second.faults);

    let mut request = RunRequest::new(&config);
    request.options = uncached();
    let third = ensure_run(&ctx, &request).unwrap();
    assert!(!third.loaded_from_cache);
    assert_eq!(third.log, first.log);

    let runs = list_runs(&ctx).unwrap();
    assert_eq!(runs.len(), 1);
    let (manifest, log, faults) = load_run(&ctx, &first.run_id).unwrap();
    assert_eq!(manifest.run_id, first.run_id);
    assert_eq!(log, first.log);
    assert_eq!(faults.len(), 1);
}

#[test]
fn store_queries_need_a_store() {
    let ctx = AppContext::new();
    assert!(matches!(list_runs(&ctx), Err(AppError::NoStore)));
}

#[test]
fn progress_stages_are_reported() {
    let ctx = AppContext::new();
    let config = demo("constant_gain.yaml");

    let mut events = Vec::new();
    let response =
        ensure_run_with_progress(&ctx, &RunRequest::new(&config), Some(&mut |e| events.push(e)))
            .unwrap();

    assert!(response.timing.total_time_s >= response.timing.run_time_s);
    assert_eq!(events.first().map(|e| e.stage), Some(RunStage::CompilingTopology));
    assert_eq!(events.last().map(|e| e.stage), Some(RunStage::Completed));
    let ticks: Vec<u64> = events
        .iter()
        .filter_map(|e| e.sim.as_ref().map(|p| p.tick))
        .collect();
    assert_eq!(ticks, vec![0, 1, 2]);
}

#[test]
fn cycle_is_a_config_failure() {
    let ctx = AppContext::new();
    let config = hk_project::from_yaml_str(
        "
simulationParams: { totalTime: 2.0, dt: 1.0 }
components:
  A: { type: gain, properties: { gain: 1.0 } }
  B: { type: gain, properties: { gain: 1.0 } }
connections:
  - { source: A.output, target: B.input }
  - { source: B.output, target: A.input }
",
    )
    .unwrap();

    let err = ensure_run(&ctx, &RunRequest::new(&config)).unwrap_err();
    assert!(err.is_cyclic(), "{err}");
    assert!(err.is_config_error());
    assert!(validate_config(&ctx, &config).unwrap_err().is_cyclic());
}

#[test]
fn unknown_type_tag_fails_validation() {
    let ctx = AppContext::new();
    let config = hk_project::from_yaml_str(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: warp_drive }
",
    )
    .unwrap();
    let err = validate_config(&ctx, &config).unwrap_err();
    assert!(err.is_config_error());
    assert!(!err.is_cyclic());
}

#[test]
fn reservoir_demo_validates_with_supplied_order() {
    let ctx = AppContext::new();
    let summary = validate_config(&ctx, &demo("reservoir_loop.yaml")).unwrap();
    assert_eq!(summary.component_count, 6);
    assert_eq!(summary.total_ticks, 12);
    assert_eq!(summary.stages[0], vec!["rain", "outflow"]);
    assert_eq!(summary.stages.len(), 5);
    assert_eq!(summary.type_counts["gain"], 1);
}

fn pump_commands(ctx: &AppContext, config: &SimulationConfig, supervised: bool) -> Vec<f64> {
    let mut request = RunRequest::new(config);
    request.options = RunOptions {
        supervised,
        ..uncached()
    };
    let response = ensure_run(ctx, &request).unwrap();
    query::extract_series(&response.log, "pump.command")
        .unwrap()
        .into_iter()
        .map(|(_, v)| v.unwrap())
        .collect()
}

#[test]
fn unanswered_supervision_falls_back_to_fail_safe() {
    let ctx = AppContext::new();
    let mut config = demo("reservoir_loop.yaml");

    let automatic = pump_commands(&ctx, &config, false);
    assert!(automatic.contains(&1.0), "{automatic:?}");

    config.dispatch = Some(DispatchDef {
        decision_timeout: Some(0.01),
        fail_safe: Some(FailSafeDef::Reject),
    });
    let rejected = pump_commands(&ctx, &config, true);
    assert!(rejected.iter().all(|&c| c == 0.0), "{rejected:?}");

    config.dispatch = Some(DispatchDef {
        decision_timeout: Some(0.01),
        fail_safe: Some(FailSafeDef::Approve),
    });
    let approved = pump_commands(&ctx, &config, true);
    assert_eq!(approved, automatic);

    assert!(ctx.dispatcher().pending_decisions().is_empty());
}

#[test]
fn supervised_runs_bypass_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::new().with_store(RunStore::new(dir.path()).unwrap());
    let mut config = demo("reservoir_loop.yaml");
    config.dispatch = Some(DispatchDef {
        decision_timeout: Some(0.01),
        fail_safe: Some(FailSafeDef::Reject),
    });

    let run = |supervised: bool| {
        let mut request = RunRequest::new(&config);
        request.options = RunOptions {
            supervised,
            ..RunOptions::default()
        };
        ensure_run(&ctx, &request).unwrap()
    };
    let commands = |response: &hk_app::RunResponse| -> Vec<f64> {
        query::extract_series(&response.log, "pump.command")
            .unwrap()
            .into_iter()
            .map(|(_, v)| v.unwrap())
            .collect()
    };

    let supervised = run(true);
    assert!(!supervised.loaded_from_cache);
    assert!(commands(&supervised).iter().all(|&c| c == 0.0));
    assert!(list_runs(&ctx).unwrap().is_empty());

    let automatic = run(false);
    assert!(!automatic.loaded_from_cache);
    assert!(commands(&automatic).contains(&1.0));
    assert_eq!(list_runs(&ctx).unwrap().len(), 1);

    let again = run(true);
    assert!(!again.loaded_from_cache);
    assert!(commands(&again).iter().all(|&c| c == 0.0));

    let cached = run(false);
    assert!(cached.loaded_from_cache);
    assert_eq!(cached.log, automatic.log);
}
