//! Parser for `netstat -n -W -p tcp` on Darwin.
//!
//! ```text
//! Active Internet connections
//! Proto Recv-Q Send-Q  Local Address          Foreign Address        (state)
//! tcp4       0      0  192.168.1.5.54321      17.57.144.10.443       ESTABLISHED
//! tcp46      0      0  *.8080                 *.*                    LISTEN
//! ```

use std::net::{IpAddr, SocketAddr};

use crate::error::{Result, ScanError};
use crate::types::Connection;

pub const NETSTAT_ARGS: &[&str] = &["-n", "-W", "-p", "tcp"];

const ESTABLISHED: &str = "ESTABLISHED";

/// Established TCP rows. Darwin's netstat has no inode column, so the
/// returned connections carry inode 0 and are joined by address instead.
pub fn parse_netstat(output: &str) -> Result<Vec<Connection>> {
    let mut connections = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first() {
            Some(proto) if proto.starts_with("tcp") => {}
            _ => continue,
        }
        if fields.len() < 6 {
            return Err(ScanError::parse("netstat", line, "too few columns"));
        }
        if fields[5] != ESTABLISHED {
            continue;
        }

        let local = parse_endpoint(fields[3])
            .ok_or_else(|| ScanError::parse("netstat", line, "invalid local address"))?;
        let remote = parse_endpoint(fields[4])
            .ok_or_else(|| ScanError::parse("netstat", line, "invalid foreign address"))?;

        connections.push(Connection::tcp(local, remote, 0));
    }

    Ok(connections)
}

/// `host.port`, where the host may itself contain dots (v4) or a `%scope`
/// suffix (v6 link-local).
fn parse_endpoint(field: &str) -> Option<SocketAddr> {
    let (host, port) = field.rsplit_once('.')?;
    let host = host.split_once('%').map_or(host, |(h, _)| h);
    let ip: IpAddr = host.parse().ok()?;
    Some(SocketAddr::new(ip, port.parse().ok()?))
}
