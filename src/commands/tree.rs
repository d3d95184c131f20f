use anyhow::{Context, Result};

use crate::config::Config;
use crate::output::{json, table};
use crate::platform;
use crate::reader::Reader;
use crate::tree::Tree;
use crate::types::Process;

pub fn execute(config: &Config, pid: i32, output_json: bool) -> Result<()> {
    let reader = platform::new_reader(config).context("Failed to set up reader")?;
    let tree = Tree::new(&reader).context("Failed to read processes")?;
    reader.close()?;

    let chain = tree.ancestors(pid)?;
    let chain: Vec<&Process> = chain.iter().filter_map(|pid| tree.get(*pid)).collect();

    if output_json {
        let owned: Vec<Process> = chain.into_iter().cloned().collect();
        json::print_processes(&owned)?;
    } else {
        table::print_chain(&chain);
    }

    Ok(())
}
