use anyhow::{Context, Result};

use crate::config::Config;
use crate::output::{json, table};
use crate::platform;
use crate::reader::{collect_processes, Reader};

pub fn execute(config: &Config, output_json: bool) -> Result<()> {
    let reader = platform::new_reader(config).context("Failed to set up reader")?;
    let mut processes = collect_processes(&reader).context("Failed to read processes")?;
    reader.close()?;

    processes.sort_by_key(|p| p.pid);
    if output_json {
        json::print_processes(&processes)?;
    } else {
        table::print_processes(&processes);
    }

    Ok(())
}
