//! # DART-Planner CLI
//!
//! `dart run` loads configuration, wires the autonomy core for the
//! configured world frame, and runs until a shutdown signal or a fatal
//! safety condition. Grounded on `evo`'s `#[tokio::main]` + structured
//! `tracing-subscriber` startup, generalized to `dart`'s config-driven
//! frame selection and four-way exit code contract.

mod cli;
mod exit;
mod mission_file;
mod runtime;
mod status;

use clap::Parser;
use dart_common::config::{Config, WorldFrame};
use dart_units::{Enu, Ned};
use tracing::error;

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let Command::Run { mode, config, log_level, mission } = cli.command;

    let loaded = match Config::load_and_validate(&config) {
        Ok(c) => c,
        Err(e) => {
            init_tracing(tracing::Level::INFO);
            error!(%e, path = %config.display(), "configuration error");
            std::process::exit(exit::CONFIG_ERROR);
        }
    };

    init_tracing(resolve_log_level(log_level.as_deref().unwrap_or(""), loaded.shared.log_level));

    let code = match loaded.frames.world_frame {
        WorldFrame::Enu => run_for_frame::<Enu>(loaded, mode, mission).await,
        WorldFrame::Ned => run_for_frame::<Ned>(loaded, mode, mission).await,
    };
    std::process::exit(code);
}

async fn run_for_frame<F: dart_units::Frame>(config: Config, mode: cli::Mode, mission: Option<std::path::PathBuf>) -> i32 {
    let waypoints = match mission {
        Some(path) => match mission_file::load_waypoints::<F>(&path) {
            Ok(w) => w,
            Err(e) => {
                error!(%e, "failed to load mission file");
                return exit::CONFIG_ERROR;
            }
        },
        None => Vec::new(),
    };
    runtime::run::<F>(config, mode, waypoints).await
}

fn resolve_log_level(cli_override: &str, configured: dart_common::config::LogLevel) -> tracing::Level {
    match cli_override {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => match configured {
            dart_common::config::LogLevel::Trace => tracing::Level::TRACE,
            dart_common::config::LogLevel::Debug => tracing::Level::DEBUG,
            dart_common::config::LogLevel::Info => tracing::Level::INFO,
            dart_common::config::LogLevel::Warn => tracing::Level::WARN,
            dart_common::config::LogLevel::Error => tracing::Level::ERROR,
        },
    }
}

fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt().with_target(false).with_max_level(level).init();
}
