use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use hk_app::{
    AppContext, AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage,
    config_service, query, run_service,
};
use hk_results::RunStore;
use hk_sim::FaultEvent;

#[derive(Parser)]
#[command(name = "hk")]
#[command(about = "hydrokernel CLI - component-graph water system simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config: schema, component types, connections and ordering
    Validate {
        /// Path to the config file (.yaml/.yml/.json)
        config_path: PathBuf,
    },
    /// Print the execution order, one stage per line
    Order {
        /// Path to the config file
        config_path: PathBuf,
    },
    /// Run a simulation
    Run {
        /// Path to the config file
        config_path: PathBuf,
        /// Number of ticks (overrides totalTime)
        #[arg(long)]
        ticks: Option<u64>,
        /// Tick length in seconds (overrides simulationParams.dt)
        #[arg(long)]
        dt: Option<f64>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Run store directory (defaults to .hydrokernel/runs beside the config)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Write the log as CSV to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored runs
    Runs {
        /// Run store directory
        store: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run store directory
        store: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export the log of a stored run as CSV
    Export {
        /// Run store directory
        store: PathBuf,
        /// Run ID
        run_id: String,
        /// Only export this "agent.attr" column
        #[arg(long)]
        column: Option<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if err.is_config_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn dispatch(command: Commands) -> AppResult<()> {
    match command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Order { config_path } => cmd_order(&config_path),
        Commands::Run {
            config_path,
            ticks,
            dt,
            no_cache,
            store,
            output,
        } => cmd_run(
            &config_path,
            ticks,
            dt,
            !no_cache,
            store.as_deref(),
            output.as_deref(),
        ),
        Commands::Runs { store } => cmd_runs(&store),
        Commands::ShowRun { store, run_id } => cmd_show_run(&store, &run_id),
        Commands::Export {
            store,
            run_id,
            column,
            output,
        } => cmd_export(&store, &run_id, column.as_deref(), output.as_deref()),
    }
}

fn store_context(store: &Path) -> AppResult<AppContext> {
    Ok(AppContext::new().with_store(RunStore::new(store)?))
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let ctx = AppContext::new();
    let config = config_service::load_config(config_path)?;
    let summary = config_service::validate_config(&ctx, &config)?;
    println!("✓ Config is valid");
    println!(
        "  {} components, {} connections, {} events",
        summary.component_count, summary.connection_count, summary.event_count
    );
    println!(
        "  {} ticks of {} s in {} stages",
        summary.total_ticks,
        summary.dt,
        summary.stages.len()
    );
    for (tag, count) in &summary.type_counts {
        println!("  {tag}: {count}");
    }
    Ok(())
}

fn cmd_order(config_path: &Path) -> AppResult<()> {
    let ctx = AppContext::new();
    let config = config_service::load_config(config_path)?;
    let summary = config_service::validate_config(&ctx, &config)?;
    for (idx, stage) in summary.stages.iter().enumerate() {
        println!("{idx}: {}", stage.join(", "));
    }
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    ticks: Option<u64>,
    dt: Option<f64>,
    use_cache: bool,
    store: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    println!("Running simulation: {}", config_path.display());

    let config = config_service::load_config(config_path)?;
    let store = match store {
        Some(dir) => RunStore::new(dir)?,
        None => RunStore::for_config(config_path)?,
    };
    tracing::debug!(store = %store.root().display(), "using run store");
    let ctx = AppContext::new().with_store(store);

    let mut request = RunRequest::new(&config);
    request.ticks = ticks;
    request.dt = dt;
    request.options = RunOptions {
        use_cache,
        ..RunOptions::default()
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = run_service::ensure_run_with_progress(
        &ctx,
        &request,
        Some(&mut |event| {
            let fraction = event
                .sim
                .as_ref()
                .map(|p| p.fraction_complete())
                .unwrap_or(-1.0);
            let emit_now = fraction < 0.0
                || (fraction - last_fraction).abs() >= 0.005
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);

    let summary = query::get_run_summary(&response.log, &response.faults);
    match summary {
        Ok(summary) => {
            println!("  Ticks logged: {}", summary.record_count);
            println!("  Agents: {}", summary.agent_count);
        }
        Err(_) => println!("  No ticks logged"),
    }
    print_faults(&response.faults);
    for err in &response.event_errors {
        println!("  ! event on {} at tick {}: {}", err.target, err.tick, err.message);
    }

    if let Some(path) = output {
        std::fs::write(path, response.log.to_csv()?)?;
        println!("✓ Wrote {} rows to {}", response.log.rows.len(), path.display());
    }

    Ok(())
}

fn print_faults(faults: &[FaultEvent]) {
    if faults.is_empty() {
        return;
    }
    println!("  Faults: {}", faults.len());
    for fault in faults {
        println!(
            "    tick {}: {} {:?} - {}",
            fault.tick, fault.agent_id, fault.kind, fault.message
        );
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.sim) {
        (RunStage::Running, Some(p)) => {
            let fraction = p.fraction_complete();
            let width = 28usize;
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  tick={}/{}  t={:.3}s  faults={}  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                p.tick + 1,
                p.total_ticks,
                p.time,
                p.faults,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_timing_summary(timing: &hk_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);

    println!("\nTiming summary:");
    println!(
        "  Compile: {:.3}s ({:.1}%)",
        timing.compile_time_s,
        100.0 * timing.compile_time_s / total
    );
    println!(
        "  Run:     {:.3}s ({:.1}%)",
        timing.run_time_s,
        100.0 * timing.run_time_s / total
    );
    println!(
        "  Save:    {:.3}s ({:.1}%)",
        timing.save_time_s,
        100.0 * timing.save_time_s / total
    );
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);
}

fn cmd_runs(store: &Path) -> AppResult<()> {
    let ctx = store_context(store)?;
    let runs = run_service::list_runs(&ctx)?;

    if runs.is_empty() {
        println!("No stored runs in {}", store.display());
    } else {
        println!("Stored runs in {}:", store.display());
        for manifest in runs {
            println!(
                "  {} ({}, {} ticks, {} failed agents)",
                manifest.run_id,
                manifest.created_at.to_rfc3339(),
                manifest.ticks_completed,
                manifest.failed_agents.len()
            );
        }
    }
    Ok(())
}

fn cmd_show_run(store: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let ctx = store_context(store)?;
    let (manifest, log, faults) = run_service::load_run(&ctx, run_id)?;

    println!("\nRun Summary:");
    println!("  Created: {}", manifest.created_at.to_rfc3339());
    println!("  Kernel: {}", manifest.kernel_version);
    println!(
        "  Ticks: {}/{} (dt = {} s)",
        manifest.ticks_completed, manifest.total_ticks, manifest.dt
    );
    if let Ok(summary) = query::get_run_summary(&log, &faults) {
        println!(
            "  Time range: {:.3} - {:.3} s",
            summary.time_range.0, summary.time_range.1
        );
        println!("  Rows: {}", summary.record_count);
    }

    println!("\nAgents:");
    for id in query::list_agent_ids(&log) {
        let failed = manifest.failed_agents.contains(&id);
        println!("  {}{}", id, if failed { " (failed)" } else { "" });
    }

    println!("\nColumns:");
    for column in &log.columns {
        println!("  {}", column);
    }
    print_faults(&faults);

    Ok(())
}

fn cmd_export(
    store: &Path,
    run_id: &str,
    column: Option<&str>,
    output: Option<&Path>,
) -> AppResult<()> {
    let ctx = store_context(store)?;
    let (_manifest, log, _faults) = run_service::load_run(&ctx, run_id)?;

    let (csv, rows) = match column {
        Some(column) => {
            let rows = query::extract_series(&log, column)?.len();
            let csv = log.column_csv(column)?.ok_or_else(|| {
                AppError::InvalidInput(format!("Column '{column}' not found in run {run_id}"))
            })?;
            (csv, rows)
        }
        None => (log.to_csv()?, log.rows.len()),
    };

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, csv).map_err(AppError::from)?;
        println!("✓ Exported {} rows to {}", rows, path.display());
    } else {
        print!("{}", csv);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "hk", "run", "plant.yaml", "--ticks", "5", "--dt", "0.5", "--no-cache", "-o", "out.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                ticks,
                dt,
                no_cache,
                output,
                store,
                ..
            } => {
                assert_eq!(ticks, Some(5));
                assert_eq!(dt, Some(0.5));
                assert!(no_cache);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(store.is_none());
            }
            _ => panic!("expected run"),
        }
    }
}
