use anyhow::{Context, Result};
use serde::Serialize;

use crate::cache::Snapshot;
use crate::types::{Connection, Process};

pub fn print_connections(connections: &[Connection]) -> Result<()> {
    print(&connections)
}

pub fn print_processes(processes: &[Process]) -> Result<()> {
    print(&processes)
}

pub fn print_snapshot(snapshot: &Snapshot) -> Result<()> {
    print(snapshot)
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", render(value)?);
    Ok(())
}

fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
}
