//! Socket inode to owning-process join.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Connection, Process};

/// Index of socket inode to the process holding it, built from one scan.
pub struct InodeIndex<'a> {
    owners: HashMap<u64, &'a Process>,
}

impl<'a> InodeIndex<'a> {
    /// Flatten every process's inode set. Should two processes claim the
    /// same inode, the one visited last wins.
    pub fn build(processes: &'a [Process]) -> Self {
        let mut owners = HashMap::new();
        for process in processes {
            for &inode in &process.inodes {
                if let Some(previous) = owners.insert(inode, process) {
                    debug!(
                        inode,
                        previous = previous.pid,
                        current = process.pid,
                        "socket inode claimed by two processes"
                    );
                }
            }
        }
        Self { owners }
    }

    pub fn owner(&self, inode: u64) -> Option<&'a Process> {
        self.owners.get(&inode).copied()
    }

    /// Set `conn.process` to its owner, or leave it `None` when no visible
    /// process holds the socket.
    pub fn attach(&self, conn: &mut Connection) {
        conn.process = self.owner(conn.inode).cloned();
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Attach owners to every connection.
pub fn correlate(processes: &[Process], connections: &mut [Connection]) {
    let index = InodeIndex::build(processes);
    for conn in connections.iter_mut() {
        index.attach(conn);
    }
}
