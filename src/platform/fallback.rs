use crate::error::{Result, ScanError};
use crate::reader::Reader;
use crate::types::{Connection, Process};

/// Stand-in for targets with neither `/proc` nor the Darwin tools.
#[derive(Debug, Clone)]
pub struct UnsupportedReader {
    os: &'static str,
}

impl UnsupportedReader {
    pub fn new() -> Self {
        Self {
            os: std::env::consts::OS,
        }
    }
}

impl Default for UnsupportedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for UnsupportedReader {
    fn processes(&self, _visit: &mut dyn FnMut(Process)) -> Result<()> {
        Err(ScanError::Unsupported(self.os))
    }

    fn connections(&self, _with_procs: bool, _visit: &mut dyn FnMut(Connection)) -> Result<()> {
        Err(ScanError::Unsupported(self.os))
    }
}
