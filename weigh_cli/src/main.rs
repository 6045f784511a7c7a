//! Entry point: config loading, tracing setup, command dispatch.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing::warn;

mod cli;
mod demo;
mod error_fmt;
mod run;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use run::WatchOpts;
use weigh_core::stores::MemoryCatalog;

fn main() {
    let code = match try_main() {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn try_main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging)?;

    // Product catalog: CSV when provided, else empty (callers fall back to
    // the density table).
    let (catalog, first_product) = match &cli.products {
        Some(path) => {
            let rows = weigh_config::load_products_csv(path)?;
            let first = rows.first().map(|r| r.product_id.clone());
            (MemoryCatalog::from_rows(&rows), first)
        }
        None => (MemoryCatalog::new(), None),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    match cli.cmd {
        Commands::Watch {
            line,
            low_kg,
            target_kg,
            high_kg,
            ticks,
            sampled,
        } => {
            let opts = WatchOpts {
                line,
                low_kg,
                target_kg,
                high_kg,
                ticks,
                sampled,
                json: cli.json,
            };
            run::run_watch(&cfg, &catalog, first_product.as_deref(), &opts, &shutdown)
        }
        Commands::Demo { blocks, line } => demo::run_demo(&cfg, &line, blocks, cli.json),
        Commands::SelfCheck => run::run_self_check(&cfg, cli.json),
        Commands::Health => run::run_health(&cfg, cli.json),
    }
}

fn load_config(path: &Path) -> eyre::Result<weigh_config::Config> {
    let cfg = if path.exists() {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("read config file {}", path.display()))?;
        weigh_config::load_toml(&text)
            .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?
    } else {
        warn!(path = %path.display(), "config file not found, using defaults");
        weigh_config::Config::default()
    };
    cfg.validate()
        .map_err(|e| eyre::Report::new(weigh_core::WeighError::Config(e.to_string())))?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &weigh_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = logging.level.clone().unwrap_or_else(|| cli.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "weigh.log".to_string(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .init();
    } else if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
