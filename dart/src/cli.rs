//! Command-line surface. `clap`-derive, the same shape every teacher
//! binary in the pack uses for its args struct.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "dart")]
#[command(author, version)]
#[command(about = "Autonomous quadrotor navigation core: SE(3) planner, geometric controller, real-time scheduler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load configuration, wire the autonomy core, and run until shutdown.
    Run {
        /// Deployment target: `edge` pins scheduler tasks to CPU cores and
        /// requests `SCHED_FIFO` (only effective when built with the `rt`
        /// feature); `cloud` runs the same tasks without placement hints.
        #[arg(long, value_enum, default_value_t = Mode::Edge)]
        mode: Mode,

        /// Path to the TOML configuration file.
        #[arg(short, long, default_value = dart_common::consts::DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override `shared.log_level` from the configuration file.
        #[arg(long)]
        log_level: Option<String>,

        /// Optional waypoint mission to upload at startup (TOML, `[[waypoint]]`
        /// tables of `position = [x, y, z]` / `tolerance`). Without one, the
        /// vehicle holds its starting position.
        #[arg(long)]
        mission: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Cloud,
    Edge,
}
