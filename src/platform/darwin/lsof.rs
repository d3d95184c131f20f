//! Parser for `lsof -F cn` field output.

use std::collections::HashMap;

use crate::error::{Result, ScanError};
use crate::types::Process;

/// `lsof -i -n -P -w -F cn`: Internet files only, numeric hosts and ports,
/// no warnings, one tagged field per line.
pub const LSOF_ARGS: &[&str] = &["-i", "-n", "-P", "-w", "-F", "cn"];

#[derive(Debug, Default)]
pub struct LsofOutput {
    /// One entry per PID, in the order lsof reported them.
    pub processes: Vec<Process>,
    /// Local `host:port` of each connected socket to its owner.
    pub by_local: HashMap<String, Process>,
}

pub fn parse_lsof(output: &str) -> Result<LsofOutput> {
    let mut parsed = LsofOutput::default();
    let mut current: Option<Process> = None;

    for line in output.lines() {
        if line.len() <= 1 {
            continue;
        }
        let mut chars = line.chars();
        let tag = chars.next();
        let value = chars.as_str();

        match tag {
            Some('p') => {
                let pid = value
                    .parse()
                    .map_err(|_| ScanError::parse("lsof", line, "invalid pid"))?;
                if let Some(done) = current.take() {
                    parsed.processes.push(done);
                }
                current = Some(Process {
                    pid,
                    ..Process::default()
                });
            }
            Some('c') => {
                let process = current
                    .as_mut()
                    .ok_or_else(|| ScanError::parse("lsof", line, "command before pid"))?;
                process.comm = value.to_string();
            }
            // lsof always emits the fd field, even when not asked for.
            Some('f') => {}
            Some('n') => {
                let Some((local, _remote)) = value.split_once("->") else {
                    // Listening socket.
                    continue;
                };
                let process = current
                    .as_ref()
                    .ok_or_else(|| ScanError::parse("lsof", line, "address before pid"))?;
                parsed.by_local.insert(strip_zone(local), process.clone());
            }
            _ => return Err(ScanError::parse("lsof", line, "unexpected field")),
        }
    }

    if let Some(done) = current.take() {
        parsed.processes.push(done);
    }
    Ok(parsed)
}

/// Drop the `%zone` of a link-local IPv6 host (`[fe80::1%lo0]:631` becomes
/// `[fe80::1]:631`) so keys match `SocketAddr`'s formatting.
fn strip_zone(addr: &str) -> String {
    match (addr.find('%'), addr.find(']')) {
        (Some(pct), Some(close)) if pct < close => format!("{}{}", &addr[..pct], &addr[close..]),
        _ => addr.to_string(),
    }
}
