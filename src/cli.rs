use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "procscan")]
#[command(version, about = "Process and TCP connection discovery for monitoring probes")]
pub struct Cli {
    /// Root of the proc filesystem (e.g. /host/proc inside a container)
    #[arg(long, default_value = "/proc", global = true)]
    pub proc_root: PathBuf,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Watch mode: rescan continuously
    #[arg(short, long, global = true)]
    pub watch: bool,

    /// Scan interval in seconds (default: 15)
    #[arg(short = 'n', long, default_value = "15", global = true)]
    pub interval: f64,

    /// Do not attribute connections to processes
    #[arg(long, global = true)]
    pub no_procs: bool,

    /// Skip processes whose command name matches this regex (repeatable)
    #[arg(long = "skip-comm", value_name = "REGEX", global = true)]
    pub skip_comms: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// List established TCP connections and their owners (default)
    Connections,
    /// List running processes
    Processes,
    /// Show the parent chain of a process
    Tree {
        /// Process ID to start from
        pid: i32,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            proc_root: self.proc_root.clone(),
            include_procs: !self.no_procs,
            skip_comms: self.skip_comms.clone(),
            interval: Duration::from_secs_f64(self.interval.max(0.1)),
        }
    }
}
