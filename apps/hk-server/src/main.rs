use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hk_components::Decision;
use hk_dispatch::DispatchConfig;
use hk_server::{ServerState, create_router, run_decision_cleanup};
use tracing::info;

#[derive(Parser)]
#[command(name = "hk-server")]
#[command(about = "Hosted hydrokernel: simulate endpoint, device telemetry and operator decisions")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// Seconds an agent waits for an operator decision
    #[arg(long, default_value_t = 30.0)]
    decision_timeout: f64,
    /// Approve instead of reject when a decision times out
    #[arg(long)]
    fail_safe_approve: bool,
    /// Seconds answered or expired decisions are kept before being forgotten
    #[arg(long, default_value_t = 600)]
    decision_retention: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hk_server=info,hk_sim=info,hk_dispatch=info".into()),
        )
        .init();

    let args = Args::parse();
    let decision_timeout = Duration::try_from_secs_f64(args.decision_timeout)
        .context("--decision-timeout must be a non-negative number of seconds")?;
    let config = DispatchConfig {
        decision_timeout,
        fail_safe: if args.fail_safe_approve {
            Decision::Approve
        } else {
            Decision::Reject
        },
        resolved_retention: Duration::from_secs(args.decision_retention),
    };

    info!("hydrokernel server starting...");

    let state = ServerState::new(config);
    let cleanup_period = Duration::from_secs(args.decision_retention.clamp(1, 60));
    tokio::spawn(run_decision_cleanup(
        std::sync::Arc::clone(state.dispatcher()),
        cleanup_period,
    ));

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
