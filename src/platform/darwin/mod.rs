//! `lsof`/`netstat` backed reader for hosts without `/proc`.

pub mod lsof;
pub mod netstat;

use std::process::Command;

use tracing::debug;

use crate::error::{Result, ScanError};
use crate::reader::Reader;
use crate::types::{Connection, Process};
use lsof::{parse_lsof, LsofOutput, LSOF_ARGS};
use netstat::{parse_netstat, NETSTAT_ARGS};

const LSOF_BINARY: &str = "lsof";
const NETSTAT_BINARY: &str = "netstat";

#[derive(Debug, Default, Clone)]
pub struct DarwinReader;

impl DarwinReader {
    pub fn new() -> Self {
        Self
    }

    fn lsof(&self) -> Result<LsofOutput> {
        parse_lsof(&run(LSOF_BINARY, LSOF_ARGS)?)
    }
}

fn run(command: &'static str, args: &[&str]) -> Result<String> {
    let output = Command::new(command)
        .args(args)
        .output()
        .map_err(|source| ScanError::CommandSpawn { command, source })?;

    if !output.status.success() {
        return Err(ScanError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Join connections to lsof owners on the local `host:port` string.
pub fn attach_by_local_address(connections: &mut [Connection], owners: &LsofOutput) {
    for conn in connections.iter_mut() {
        conn.process = owners.by_local.get(&conn.local().to_string()).cloned();
    }
}

impl Reader for DarwinReader {
    fn processes(&self, visit: &mut dyn FnMut(Process)) -> Result<()> {
        let parsed = self.lsof()?;
        debug!(count = parsed.processes.len(), "lsof processes");
        for process in parsed.processes {
            visit(process);
        }
        Ok(())
    }

    fn connections(&self, with_procs: bool, visit: &mut dyn FnMut(Connection)) -> Result<()> {
        let mut connections = parse_netstat(&run(NETSTAT_BINARY, NETSTAT_ARGS)?)?;

        if with_procs {
            let owners = self.lsof()?;
            attach_by_local_address(&mut connections, &owners);
        }

        debug!(count = connections.len(), with_procs, "netstat connections");
        for conn in connections {
            visit(conn);
        }
        Ok(())
    }
}
