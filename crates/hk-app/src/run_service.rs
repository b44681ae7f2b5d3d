//! Run execution and caching service.

use std::sync::Arc;
use std::time::Instant;

use hk_project::SimulationConfig;
use hk_results::{RunManifest, RunStore};
use hk_sim::{CancelToken, EventError, FaultEvent, LogTable, SimProgress};

use crate::KERNEL_VERSION;
use crate::compile::{RunGate, compile_config};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub kernel_version: String,
    /// Route supervised decisions through the context's dispatcher. Without
    /// it, supervised components act on their own proposals.
    pub supervised: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            kernel_version: KERNEL_VERSION.to_string(),
            supervised: false,
        }
    }
}

/// Request to execute a run.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub config: &'a SimulationConfig,
    /// Overrides the tick count derived from `totalTime`.
    pub ticks: Option<u64>,
    /// Overrides `simulationParams.dt`.
    pub dt: Option<f64>,
    pub options: RunOptions,
    pub cancel: CancelToken,
}

impl<'a> RunRequest<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self {
            config,
            ticks: None,
            dt: None,
            options: RunOptions::default(),
            cancel: CancelToken::new(),
        }
    }
}

/// Concise timing summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub run_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub log: LogTable,
    pub faults: Vec<FaultEvent>,
    /// Scheduled events that could not be applied. Empty for cached runs.
    pub event_errors: Vec<EventError>,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(ctx: &AppContext, request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(ctx, request, None)
}

/// Execute or load a run and stream progress events.
///
/// Build-phase failures are returned before anything runs. A completed run
/// is saved when the context has a store; cancelled runs are not. Supervised
/// runs depend on operator answers, so they never read or write the cache.
pub fn ensure_run_with_progress(
    ctx: &AppContext,
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(&mut progress_cb, RunStage::CompilingTopology, started, "Compiling topology");

    let compile_started = Instant::now();
    let compiled = compile_config(request.config, ctx.registry())?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    let dt = request.dt.unwrap_or(compiled.dt);
    let total_ticks = match (request.ticks, request.dt) {
        (Some(ticks), _) => ticks,
        (None, Some(dt)) => {
            hk_core::SimClock::ticks_for(request.config.simulation_params.total_time, dt)?
        }
        (None, None) => compiled.total_ticks,
    };
    if !dt.is_finite() || dt <= 0.0 {
        return Err(AppError::InvalidInput(format!("dt must be positive, got {dt}")));
    }

    let run_id = hk_results::compute_run_id(
        request.config,
        total_ticks,
        dt,
        &request.options.kernel_version,
    );

    let cacheable = !request.options.supervised;

    if let Some(store) = ctx.store()
        && cacheable
        && request.options.use_cache
    {
        emit_progress(&mut progress_cb, RunStage::CheckingCache, started, "Checking run cache");
        if let Some(response) = load_cached(store, &run_id, &mut progress_cb, started, &mut timing)? {
            return Ok(response);
        }
    }

    let mut scheduler = compiled.scheduler;
    if request.options.supervised {
        scheduler = scheduler.with_gate(Arc::new(RunGate::new(
            Arc::clone(ctx.dispatcher()),
            request.config.dispatch.as_ref(),
        )));
    }

    emit_progress(&mut progress_cb, RunStage::Running, started, "Running simulation");

    let run_started = Instant::now();
    let report = scheduler.run_with_progress(total_ticks, dt, &request.cancel, |p: &SimProgress| {
        if let Some(cb) = progress_cb.as_deref_mut() {
            cb(RunProgressEvent {
                stage: RunStage::Running,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
                message: None,
                sim: Some(p.clone()),
            });
        }
    })?;
    timing.run_time_s = run_started.elapsed().as_secs_f64();

    let manifest = RunManifest::from_report(&run_id, &request.options.kernel_version, &report);
    let log = report.logger.export();

    if let Some(store) = ctx.store()
        && cacheable
        && manifest.is_complete()
    {
        emit_progress(&mut progress_cb, RunStage::SavingResults, started, "Saving results");
        let save_started = Instant::now();
        store.save_run(&manifest, &log, &report.faults)?;
        timing.save_time_s = save_started.elapsed().as_secs_f64();
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(&mut progress_cb, RunStage::Completed, started, "Run completed");

    tracing::info!(
        %run_id,
        ticks = report.ticks_completed,
        faults = report.faults.len(),
        cancelled = report.cancelled,
        "run finished"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        log,
        faults: report.faults,
        event_errors: report.event_errors,
        loaded_from_cache: false,
        timing,
    })
}

fn load_cached(
    store: &RunStore,
    run_id: &str,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    timing: &mut RunTimingSummary,
) -> AppResult<Option<RunResponse>> {
    if !store.has_run(run_id) {
        return Ok(None);
    }
    let manifest = store.load_manifest(run_id)?;
    if !manifest.is_complete() {
        return Ok(None);
    }

    emit_progress(progress_cb, RunStage::LoadingCachedResult, started, "Loading cached run");

    let load_started = Instant::now();
    let log = store.load_log(run_id)?;
    let faults = store.load_faults(run_id)?;
    timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(progress_cb, RunStage::Completed, started, "Loaded cached run");
    tracing::info!(%run_id, "run loaded from cache");

    Ok(Some(RunResponse {
        run_id: run_id.to_string(),
        manifest,
        log,
        faults,
        event_errors: Vec::new(),
        loaded_from_cache: true,
        timing: timing.clone(),
    }))
}

fn require_store(ctx: &AppContext) -> AppResult<&RunStore> {
    ctx.store().ok_or(AppError::NoStore)
}

/// List stored runs, most recent first.
pub fn list_runs(ctx: &AppContext) -> AppResult<Vec<RunManifest>> {
    Ok(require_store(ctx)?.list_runs()?)
}

/// Load a specific run.
pub fn load_run(ctx: &AppContext, run_id: &str) -> AppResult<(RunManifest, LogTable, Vec<FaultEvent>)> {
    let store = require_store(ctx)?;

    let manifest = store.load_manifest(run_id)?;
    let log = store.load_log(run_id)?;
    let faults = store.load_faults(run_id)?;

    Ok((manifest, log, faults))
}
