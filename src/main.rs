// src/main.rs

//! Daemon entry-point.
//!
//! 1. Parse configuration & set up structured logging
//! 2. Load mission definitions and build the registry
//! 3. Connect to MySQL and synchronize every mission table
//! 4. Spawn one flusher per synced mission and the UDP listener
//! 5. Wait for Ctrl-C, then flush what is buffered and exit cleanly

// ───── std / 3rd-party imports ──────────────────────────────────────────────
use anyhow::{Context, Result};
use chrono::Local;
use fern::Dispatch;
use log::{Level, LevelFilter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{path::PathBuf, process, sync::Arc, thread};
use tokio::sync::watch;

// ───── local imports ────────────────────────────────────────────────────────
use okra_log::comms::{Listener, UdpListener};
use okra_log::config::{self, Config, LoggingConfig};
use okra_log::db::{Database, MySqlDatabase};
use okra_log::mission::{BatchFlusher, MissionRegistry};
use okra_log::okra_log;

const CONFIG_ENV: &str = "OKRA_CONFIG";
const DEFAULT_CONFIG: &str = "./config/okra.toml";

// ───── helpers ──────────────────────────────────────────────────────────────

/// First CLI argument, else `$OKRA_CONFIG`, else the default path.
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

/// Configure global logging as requested in `[logging]`.
fn setup_logging(logging: &LoggingConfig) -> Result<(), fern::InitError> {
    let level = match logging.level.to_uppercase().as_str() {
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let log_path = logging
        .enable
        .then(|| PathBuf::from(logging.file.as_deref().unwrap_or("okra-log.log")));

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn setup_metrics(cfg: &Config) -> Result<()> {
    if let Some(addr) = cfg.metrics.prometheus_listen {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing the Prometheus exporter")?;
        okra_log!(Level::Info, "main", "Prometheus exporter listening on {}", addr);
    }
    Ok(())
}

// ───── daemon ───────────────────────────────────────────────────────────────

async fn run(cfg: Config) -> Result<()> {
    // 1 ─ Missions
    let specs = config::load_missions(&cfg.missions.path)
        .with_context(|| format!("loading missions from {:?}", cfg.missions.path))?;
    let registry = Arc::new(MissionRegistry::load(specs, &cfg.pipeline).context("building the mission registry")?);

    // 2 ─ Database + schema synchronization
    let mysql = Arc::new(MySqlDatabase::connect(&cfg.database).context("configuring the MySQL pool")?);
    let db: Arc<dyn Database> = mysql.clone();
    let synced = registry.synchronize(db.as_ref()).await;
    okra_log!(Level::Info, "main", "{} of {} mission(s) enabled", synced, registry.missions().len());

    // 3 ─ Flushers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flushers: Vec<_> = registry
        .enabled()
        .map(|mission| BatchFlusher::new(mission.clone(), db.clone(), cfg.pipeline.insert_mode).spawn(shutdown_rx.clone()))
        .collect();

    // 4 ─ Listener
    let listener = Arc::new(
        UdpListener::bind(&cfg.listener)
            .await
            .with_context(|| format!("binding UDP {}", cfg.listener.addr()))?,
    );
    let listener_task = listener.spawn(registry.clone(), shutdown_rx);

    // 5 ─ Wait for shutdown
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    okra_log!(Level::Warn, "main", "Shutdown initiated");
    let _ = shutdown_tx.send(true);

    if let Err(e) = listener_task.await {
        okra_log!(Level::Error, "main", "listener task failed: {}", e);
    }
    for result in futures::future::join_all(flushers).await {
        if let Err(e) = result {
            okra_log!(Level::Error, "main", "flusher task failed: {}", e);
        }
    }

    mysql.disconnect().await.context("closing the MySQL pool")?;
    okra_log!(Level::Info, "main", "Stopped cleanly");
    Ok(())
}

#[tokio::main]
async fn main() {
    let path = config_path();
    let cfg = match config::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[{}][ERROR][config] {}: {}", Local::now().to_rfc3339(), path.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging(&cfg.logging) {
        eprintln!("[{}][ERROR][logging] {}", Local::now().to_rfc3339(), e);
        process::exit(1);
    }
    okra_log!(Level::Info, "main", "okra-log starting with {}", path.display());

    if let Err(e) = setup_metrics(&cfg) {
        okra_log!(Level::Error, "main", "{:#}", e);
        process::exit(1);
    }

    if let Err(e) = run(cfg).await {
        okra_log!(Level::Error, "main", "{:#}", e);
        process::exit(1);
    }
}
