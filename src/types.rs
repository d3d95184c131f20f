//! Core data types for processes and connections.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::Serialize;

/// Name given to a process whose `comm` could not be read.
pub const UNKNOWN_COMM: &str = "(unknown)";

/// One observed OS process.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Process {
    pub pid: i32,
    pub ppid: i32,
    pub comm: String,
    pub cmdline: String,
    pub threads: i32,
    /// Socket inodes owned by the process at scan time, in fd order.
    pub inodes: Vec<u64>,
    pub open_files_count: usize,
}

impl Default for Process {
    fn default() -> Self {
        Self {
            pid: 0,
            ppid: 0,
            comm: UNKNOWN_COMM.to_string(),
            cmdline: String::new(),
            threads: 0,
            inodes: Vec::new(),
            open_files_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
        }
    }
}

/// One established TCP connection.
///
/// `process` is only ever filled in by inode correlation against processes
/// read in the same scan.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Connection {
    pub transport: Transport,
    pub local_address: IpAddr,
    pub local_port: u16,
    pub remote_address: IpAddr,
    pub remote_port: u16,
    #[serde(skip)]
    pub(crate) inode: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<Process>,
}

impl Connection {
    /// Build a TCP connection keyed by its socket inode.
    ///
    /// Alternate sources (tracers, conntrack clients) use this to feed
    /// connections through the same inode correlation.
    pub fn tcp(local: SocketAddr, remote: SocketAddr, inode: u64) -> Self {
        Self {
            transport: Transport::Tcp,
            local_address: local.ip(),
            local_port: local.port(),
            remote_address: remote.ip(),
            remote_port: remote.port(),
            inode,
            process: None,
        }
    }

    /// Deep copy, detached from whatever scan produced it.
    pub fn copy(&self) -> Connection {
        Connection {
            transport: self.transport,
            local_address: self.local_address,
            local_port: self.local_port,
            remote_address: self.remote_address,
            remote_port: self.remote_port,
            inode: self.inode,
            process: self.process.clone(),
        }
    }

    pub fn local(&self) -> SocketAddr {
        SocketAddr::new(self.local_address, self.local_port)
    }

    pub fn remote(&self) -> SocketAddr {
        SocketAddr::new(self.remote_address, self.remote_port)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.transport, self.local(), self.remote())?;
        if let Some(process) = &self.process {
            write!(f, " ({}/{})", process.pid, process.comm)?;
        }
        Ok(())
    }
}
