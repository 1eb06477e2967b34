#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! `glove`: calibrate a bend sensor and stream control values.

mod bus;
mod cli;
mod error_fmt;
mod run;
mod sink;

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use glove_config::Config;
use glove_core::error::{GloveError, Report, Result};
use serde_json::json;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            tracing::error!(error = %err, "fatal");
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn config_error(e: &Report) -> Report {
    Report::new(GloveError::Config(e.to_string()))
}

/// Load `path`, or the defaults when it does not exist.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    let cfg = glove_config::load_path(path).map_err(|e| config_error(&e))?;
    Ok((cfg, true))
}

fn init_tracing(json: bool, level: &str, logging: &glove_config::Logging) {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "glove.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::new(logging.level.as_deref().unwrap_or("info"));
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn unix_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

fn real_main(cli: Cli) -> Result<()> {
    let (mut cfg, from_file) = load_config(&cli.config)?;

    if let Commands::Run {
        host,
        port,
        endpoint,
        ceiling,
        comfort_floor,
        ..
    } = &cli.cmd
    {
        if let Some(h) = host {
            cfg.sink.host.clone_from(h);
        }
        if let Some(p) = port {
            cfg.sink.port = *p;
        }
        if let Some(ep) = endpoint {
            cfg.sink.endpoint.clone_from(ep);
        }
        if let Some(c) = ceiling {
            cfg.control.ceiling = *c;
        }
        if let Some(f) = comfort_floor {
            cfg.control.comfort_floor = *f;
        }
    }
    cfg.validate().map_err(|e| config_error(&e))?;

    init_tracing(cli.json, &cli.log_level, &cfg.logging);
    if from_file {
        tracing::debug!(path = %cli.config.display(), "config loaded");
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found; using defaults");
    }

    match cli.cmd {
        Commands::Run {
            sink, max_ticks, ..
        } => {
            let started = Instant::now();
            let summary = run::run(&cfg, sink, max_ticks)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "timestamp": unix_ts(),
                        "reason": format!("{:?}", summary.reason),
                        "ticks": summary.ticks,
                        "overruns": summary.overruns,
                        "last_value": summary.last_value.map(|v| v.value()),
                        "duration_ms": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    })
                );
            }
        }
        Commands::SelfCheck => {
            let check = run::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "backend": check.bus.backend,
                        "path": check.bus.path,
                        "mode": check.bus.mode,
                        "max_speed_hz": check.bus.max_speed_hz,
                        "bits_per_word": check.bus.bits_per_word,
                        "sample": check.sample,
                    })
                );
            } else {
                println!(
                    "bus: {} {}",
                    check.bus.backend,
                    check.bus.path.as_deref().unwrap_or("-")
                );
                println!(
                    "mode: {} max_speed_hz: {} bits_per_word: {}",
                    check.bus.mode, check.bus.max_speed_hz, check.bus.bits_per_word
                );
                println!("sample: {}", check.sample);
                println!("OK");
            }
        }
        Commands::Calibrate => {
            let (mut bus, _) = bus::open(&cfg)?;
            let cal = run::calibrate(&cfg, bus.as_mut())?;
            let (open, closed) = (cal.open().value(), cal.closed().value());
            if cli.json {
                println!(
                    "{}",
                    json!({ "open": open, "closed": closed, "distinct": open != closed })
                );
            } else {
                println!("open: {open} closed: {closed}");
            }
            cal.ensure_distinct().map_err(Report::new)?;
        }
    }
    Ok(())
}
