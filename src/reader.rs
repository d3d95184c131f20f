use crate::error::Result;
use crate::types::{Connection, Process};

/// A source of process and connection observations.
///
/// Implemented by the per-OS readers and by [`CachingReader`], and open to
/// alternate connection sources as long as they hand out the same shapes.
///
/// [`CachingReader`]: crate::cache::CachingReader
pub trait Reader: Send + Sync {
    fn processes(&self, visit: &mut dyn FnMut(Process)) -> Result<()>;

    /// Visit established connections. With `with_procs` set, each connection
    /// whose socket is owned by a visible process carries that process.
    fn connections(&self, with_procs: bool, visit: &mut dyn FnMut(Connection)) -> Result<()>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn processes(&self, visit: &mut dyn FnMut(Process)) -> Result<()> {
        (**self).processes(visit)
    }

    fn connections(&self, with_procs: bool, visit: &mut dyn FnMut(Connection)) -> Result<()> {
        (**self).connections(with_procs, visit)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Drain a reader's processes into a vector.
pub fn collect_processes(reader: &dyn Reader) -> Result<Vec<Process>> {
    let mut out = Vec::new();
    reader.processes(&mut |p| out.push(p))?;
    Ok(out)
}

/// Drain a reader's connections into a vector.
pub fn collect_connections(reader: &dyn Reader, with_procs: bool) -> Result<Vec<Connection>> {
    let mut out = Vec::new();
    reader.connections(with_procs, &mut |c| out.push(c))?;
    Ok(out)
}
