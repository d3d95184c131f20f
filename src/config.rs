//! Scanner settings shared by the library and the `procscan` binary.

use std::path::PathBuf;
use std::time::Duration;

use regex::RegexSet;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the proc filesystem; `/host/proc` when running in a container.
    pub proc_root: PathBuf,
    /// Attribute connections to processes on every tick.
    pub include_procs: bool,
    /// Regexes matched against `comm`; matching processes are not reported.
    pub skip_comms: Vec<String>,
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            include_procs: true,
            skip_comms: Vec::new(),
            interval: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn comm_filter(&self) -> Result<CommFilter> {
        CommFilter::new(&self.skip_comms)
    }
}

/// Compiled `skip_comms`. Patterns are anchored to the whole name.
#[derive(Debug, Clone, Default)]
pub struct CommFilter {
    set: Option<RegexSet>,
}

impl CommFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let anchored = patterns.iter().map(|p| format!("^(?:{})$", p.as_ref()));
        Ok(Self {
            set: Some(RegexSet::new(anchored)?),
        })
    }

    pub fn is_skipped(&self, comm: &str) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(comm))
    }
}
