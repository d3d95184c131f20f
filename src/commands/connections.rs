use anyhow::{Context, Result};

use crate::config::Config;
use crate::output::{json, table};
use crate::platform;
use crate::reader::{collect_connections, Reader};
use crate::types::Connection;

pub fn execute(config: &Config, output_json: bool) -> Result<()> {
    let reader = platform::new_reader(config).context("Failed to set up reader")?;
    let mut connections = collect_connections(&reader, config.include_procs)
        .context("Failed to read connections")?;
    reader.close()?;

    sort(&mut connections);
    if output_json {
        json::print_connections(&connections)?;
    } else {
        table::print_connections(&connections);
    }

    Ok(())
}

pub(crate) fn sort(connections: &mut [Connection]) {
    connections.sort_by_key(|c| (c.local(), c.remote()));
}
