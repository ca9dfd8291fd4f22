//! EyeMouse CLI: configure, calibrate, and replay landmark streams.
//!
//! Usage:
//!   eyemouse init [--force]            Write a default config file
//!   eyemouse info                      Show the effective configuration
//!   eyemouse calibrate [OPTIONS]       Store gaze calibration values
//!   eyemouse validate <LANDMARKS>      Check a landmark stream
//!   eyemouse run <LANDMARKS> [OPTIONS] Replay a stream into pointer intents

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use eyemouse_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "eyemouse",
    about = "Hands-free pointer control from eye blinks and gaze",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/eyemouse/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Info,

    /// Store gaze calibration values
    Calibrate {
        /// Averaged gaze that maps to the screen center (x)
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        center_x: f64,

        /// Averaged gaze that maps to the screen center (y)
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        center_y: f64,

        /// Gaze span mapped to one normalized unit (x)
        #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
        range_x: f64,

        /// Gaze span mapped to one normalized unit (y)
        #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
        range_y: f64,

        /// Cursor sensitivity
        #[arg(long)]
        sensitivity: Option<f64>,

        /// Smoothing weight of the previous sample [0.0, 1.0]
        #[arg(long)]
        smoothing: Option<f64>,
    },

    /// Check a landmark stream against the configured layout
    Validate {
        /// Path to the landmark JSONL file
        path: PathBuf,
    },

    /// Replay a landmark stream through the tracking pipeline
    ///
    /// Replayed streams carry no camera images, so gaze needs iris
    /// landmarks (478-point meshes). Blinks and winks work either way.
    Run {
        /// Path to the landmark JSONL file
        path: PathBuf,

        /// Also write intents to this JSONL file
        #[arg(short, long)]
        intents: Option<PathBuf>,

        /// Start inactive, waiting for the wake phrase
        #[arg(long)]
        inactive: bool,

        /// Read activation phrases from stdin, one per line
        #[arg(long)]
        listen: bool,

        /// Drop frames above this rate (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_fps: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the config file when it is readable.
    let mut logging = match &cli.config {
        Some(path) => AppConfig::load_from(path).unwrap_or_default().logging,
        None => AppConfig::load().logging,
    };
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    eyemouse_common::logging::init_logging(&logging);

    let config_path = cli.config;
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Info => commands::info::run(config_path),
        Commands::Calibrate {
            center_x,
            center_y,
            range_x,
            range_y,
            sensitivity,
            smoothing,
        } => commands::calibrate::run(
            config_path,
            center_x,
            center_y,
            range_x,
            range_y,
            sensitivity,
            smoothing,
        ),
        Commands::Validate { path } => commands::validate::run(config_path, path),
        Commands::Run {
            path,
            intents,
            inactive,
            listen,
            max_fps,
        } => commands::run::run(config_path, path, intents, inactive, listen, max_fps).await,
    }
}
