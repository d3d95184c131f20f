//! Snapshot cache in front of a slow reader.
//!
//! [`CachingReader::tick`] does the expensive pull and swaps in a new
//! [`Snapshot`]; every other call iterates the last committed one.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::reader::Reader;
use crate::types::{Connection, Process};

/// Processes and connections taken by the same tick.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub processes: Vec<Process>,
    pub connections: Vec<Connection>,
}

pub struct CachingReader {
    source: Box<dyn Reader>,
    include_procs: bool,
    current: RwLock<Arc<Snapshot>>,
}

impl CachingReader {
    pub fn new(source: Box<dyn Reader>, include_procs: bool) -> Self {
        Self {
            source,
            include_procs,
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Pull a full scan from the source and make it current.
    ///
    /// On error the previous snapshot stays in place.
    pub fn tick(&self) -> Result<()> {
        let mut processes = Vec::new();
        self.source.processes(&mut |p| processes.push(p))?;

        let mut connections = Vec::new();
        self.source
            .connections(self.include_procs, &mut |c| connections.push(c.copy()))?;

        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let generation = current.generation + 1;
        debug!(
            generation,
            processes = processes.len(),
            connections = connections.len(),
            "committed snapshot"
        );
        *current = Arc::new(Snapshot {
            generation,
            processes,
            connections,
        });
        Ok(())
    }

    /// The last committed snapshot. Holding it does not block later ticks.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&current)
    }

    /// Number of committed ticks.
    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }
}

impl Reader for CachingReader {
    fn processes(&self, visit: &mut dyn FnMut(Process)) -> Result<()> {
        for process in &self.snapshot().processes {
            visit(process.clone());
        }
        Ok(())
    }

    /// `with_procs` is fixed when the cache is built; the cached connections
    /// are returned as they were pulled.
    fn connections(&self, _with_procs: bool, visit: &mut dyn FnMut(Connection)) -> Result<()> {
        for conn in &self.snapshot().connections {
            visit(conn.copy());
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.source.close()
    }
}
