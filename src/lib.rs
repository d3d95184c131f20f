pub mod buffer_pool;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod correlate;
pub mod error;
pub mod output;
pub mod platform;
pub mod procdir;
pub mod reader;
pub mod tree;
pub mod types;
pub mod watch;

pub use cache::{CachingReader, Snapshot};
pub use cli::Cli;
pub use config::Config;
pub use error::ScanError;
pub use reader::Reader;
pub use tree::Tree;
pub use types::{Connection, Process, Transport};
pub use watch::ScanLoop;

use anyhow::Result;

use cli::Commands;

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    let command = cli.command.clone().unwrap_or(Commands::Connections);

    if cli.watch {
        let view = match command {
            Commands::Connections => watch::View::Connections,
            Commands::Processes => watch::View::Processes,
            Commands::Tree { .. } => {
                anyhow::bail!("Cannot use --watch with tree command");
            }
        };

        return watch::run(watch::WatchOptions {
            config,
            json: cli.json,
            view,
        });
    }

    match command {
        Commands::Connections => commands::connections::execute(&config, cli.json),
        Commands::Processes => commands::processes::execute(&config, cli.json),
        Commands::Tree { pid } => commands::tree::execute(&config, pid, cli.json),
    }
}
