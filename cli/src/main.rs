//! Server entrypoint for Compass
//!
//! Wires every layer together: environment configuration, layered
//! logging, the Model Router gateway, Station telemetry, the memory
//! service, the jury use case, and the HTTP façade. Lifecycle walks
//! NEW → PROVISIONED → ACTIVE on startup and ACTIVE → DRAINING →
//! TERMINATED on shutdown.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use compass_application::{MemoryService, MetricsSink, ModelGateway, QueryLogger, RunJuryUseCase};
use compass_infrastructure::{
    CompassConfig, Heartbeater, JsonlQueryLog, LifecycleManager, LifecycleState, MetricsCollector,
    MetricsReporter, RouterClient, RouterGateway, StationClient,
};
use compass_presentation::{build_app, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Session reaper cadence.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// AI jury service: parallel model fan-out with consensus scoring
#[derive(Parser, Debug)]
#[command(name = "compass", version, about)]
struct Cli {
    /// Listen port (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Disable file logging entirely
    #[arg(long)]
    no_log_file: bool,
}

/// Format timestamps using local time (via chrono).
struct LocalTimer;

impl fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Resolve the log directory path.
///
/// Priority: CLI `--log-dir` → `dirs::data_dir()/compass/logs/` → `.compass/logs/`
fn resolve_log_dir(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("compass").join("logs");
    }
    PathBuf::from(".compass").join("logs")
}

/// Logging initialization result.
struct LoggingOutput {
    /// Guard that must be held to ensure file log flushing.
    _guard: Option<WorkerGuard>,
    /// Path for the JSONL query log (if file logging is enabled).
    query_log_path: Option<PathBuf>,
}

/// Initialize multi-layer logging (console + optional file).
fn init_logging(verbose: u8, log_dir_override: Option<&Path>, no_log_file: bool) -> LoggingOutput {
    let console_filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let console_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    if no_log_file {
        tracing_subscriber::registry().with(console_layer).init();
        return LoggingOutput {
            _guard: None,
            query_log_path: None,
        };
    }

    let log_dir = resolve_log_dir(log_dir_override);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "Warning: could not create log directory {}: {}",
            log_dir.display(),
            e
        );
        tracing_subscriber::registry().with(console_layer).init();
        return LoggingOutput {
            _guard: None,
            query_log_path: None,
        };
    }

    let prefix = format!(
        "compass-{}-{}",
        chrono::Local::now().format("%Y-%m-%dT%H-%M-%S"),
        std::process::id()
    );

    let file_appender = tracing_appender::rolling::never(&log_dir, format!("{prefix}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    LoggingOutput {
        _guard: Some(guard),
        query_log_path: Some(log_dir.join(format!("{prefix}.queries.jsonl"))),
    }
}

/// Block until SIGINT/SIGTERM, then move the lifecycle to DRAINING.
async fn shutdown_signal(lifecycle: Arc<LifecycleManager>, heartbeat: Arc<Heartbeater>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install ctrl-c handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining in-flight requests");
    if let Err(e) = lifecycle
        .transition(LifecycleState::Draining, "shutdown signal")
        .await
    {
        warn!("could not enter DRAINING: {e}");
    }
    heartbeat.set_sleep().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logging = init_logging(cli.verbose, cli.log_dir.as_deref(), cli.no_log_file);

    let config = CompassConfig::load().map_err(|e| anyhow!("invalid configuration: {e}"))?;
    let port = cli.port.unwrap_or(config.port);

    // Shared telemetry.
    let metrics = Arc::new(MetricsCollector::new());

    // Upstream Model Router.
    let router_client = Arc::new(
        RouterClient::new(
            &config.model_router_url,
            &config.model_router_token,
            &config.pap_agent_id,
        )
        .context("failed to build the model router client")?,
    );
    let gateway: Arc<dyn ModelGateway> = Arc::new(
        RouterGateway::new(Arc::clone(&router_client)).with_collector(Arc::clone(&metrics)),
    );

    // Station control plane.
    let mut station = StationClient::new(&config.pap_station_url, &config.pap_agent_id)
        .context("failed to build the station client")?
        .with_agent_name("compass");
    if let Some(key) = &config.pap_agent_key {
        station = station.with_agent_key(key);
    }
    if let Some(collector_url) = &config.pap_collector_url {
        station = station.with_collector(collector_url);
    }
    let station = Arc::new(station);
    let lifecycle = Arc::new(LifecycleManager::new(Arc::clone(&station)));
    let heartbeat = Arc::new(Heartbeater::new(Arc::clone(&station)));
    let reporter = Arc::new(MetricsReporter::new(
        Arc::clone(&station),
        Arc::clone(&metrics),
    ));

    // Pipeline.
    let memory = Arc::new(MemoryService::with_ttl(config.session_ttl_seconds));
    let mut jury = RunJuryUseCase::new(
        Arc::clone(&gateway),
        Arc::clone(&memory),
        config.jury_params(),
    )
    .with_metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>);
    if let Some(query_log) = logging.query_log_path.as_ref().and_then(|p| JsonlQueryLog::new(p)) {
        info!("query log: {}", query_log.path().display());
        jury = jury.with_logger(Arc::new(query_log) as Arc<dyn QueryLogger>);
    }
    let jury = Arc::new(jury);

    lifecycle
        .transition(LifecycleState::Provisioned, "configuration loaded")
        .await
        .map_err(|e| anyhow!("lifecycle error: {e}"))?;

    // Background loops.
    let cancel = CancellationToken::new();
    tokio::spawn(Arc::clone(&heartbeat).run(cancel.clone()));
    tokio::spawn(Arc::clone(&reporter).run(cancel.clone()));
    {
        let memory = Arc::clone(&memory);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(SESSION_CLEANUP_INTERVAL) => {}
                }
                memory.reap_expired().await;
            }
        });
    }

    let state = AppState {
        jury,
        memory,
        metrics,
        lifecycle: Arc::clone(&lifecycle),
        heartbeat: Arc::clone(&heartbeat),
        gateway,
        configured_models: config.models(),
        started_at: Instant::now(),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    lifecycle
        .transition(LifecycleState::Active, "listening")
        .await
        .map_err(|e| anyhow!("lifecycle error: {e}"))?;
    info!("compass listening on 0.0.0.0:{port} (base url: {})", config.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            Arc::clone(&lifecycle),
            Arc::clone(&heartbeat),
        ))
        .await
        .context("server error")?;

    cancel.cancel();
    if let Err(e) = lifecycle
        .transition(LifecycleState::Terminated, "shutdown complete")
        .await
    {
        warn!("could not report TERMINATED: {e}");
    }
    info!("compass stopped");

    Ok(())
}
