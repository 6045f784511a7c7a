//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "weigh", version, about = "Production-line weighing station CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/weigh.toml")]
    pub config: PathBuf,

    /// Optional product catalog CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub products: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll one line's scale and print hold/classification state
    Watch {
        /// Production line to monitor
        #[arg(long, default_value = "Line 1")]
        line: String,
        /// Override the product's lower tolerance (kg)
        #[arg(long, value_name = "KG")]
        low_kg: Option<f64>,
        /// Override the product's target weight (kg)
        #[arg(long, value_name = "KG")]
        target_kg: Option<f64>,
        /// Override the product's upper tolerance (kg)
        #[arg(long, value_name = "KG")]
        high_kg: Option<f64>,
        /// Stop after N polls (runs until Ctrl-C when omitted)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Read through the background sampler instead of in-loop
        #[arg(long, action = ArgAction::SetTrue)]
        sampled: bool,
    },
    /// Run a scripted shift on a deterministic clock and print the settlement
    Demo {
        /// How many blocks to weigh and record
        #[arg(long, default_value_t = 3, value_name = "N")]
        blocks: u32,
        /// Line name used for the demo session
        #[arg(long, default_value = "Line 1")]
        line: String,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
