//! Parsers for `/proc/<pid>/{stat,cmdline,comm}`.

use crate::error::{Result, ScanError};
use crate::types::UNKNOWN_COMM;

// Field positions counting from zero, see proc(5).
const STAT_FIELD_PPID: usize = 3;
const STAT_FIELD_THREADS: usize = 19;
const STAT_FIELD_STATE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub ppid: i32,
    pub threads: i32,
}

/// Pull PPID and thread count out of a `stat` line.
///
/// Format: `pid (comm) state ppid ...`. comm may contain spaces,
/// parentheses and arbitrary bytes, so fields are counted from the last `)`
/// when there is one and only the part after it is decoded.
pub fn parse_stat(pid: i32, raw: &[u8]) -> Result<Stat> {
    let (rest, first_index) = match raw.iter().rposition(|&b| b == b')') {
        Some(end) => (&raw[end + 1..], STAT_FIELD_STATE),
        None => (raw, 0),
    };
    let rest = String::from_utf8_lossy(rest);
    let fields: Vec<&str> = rest.split_whitespace().collect();

    let field = |index: usize, name: &str| -> Result<i32> {
        let value = index
            .checked_sub(first_index)
            .and_then(|i| fields.get(i))
            .ok_or_else(|| malformed(pid, format!("missing {name} field")))?;
        value
            .parse()
            .map_err(|_| malformed(pid, format!("invalid {name} {value:?}")))
    };

    Ok(Stat {
        ppid: field(STAT_FIELD_PPID, "ppid")?,
        threads: field(STAT_FIELD_THREADS, "threads")?,
    })
}

fn malformed(pid: i32, reason: impl Into<String>) -> ScanError {
    ScanError::MalformedStat {
        pid,
        reason: reason.into(),
    }
}

/// Turn the NUL-separated argv into a printable, space-separated string.
pub fn decode_cmdline(raw: &[u8]) -> String {
    let joined: Vec<u8> = raw
        .iter()
        .map(|&b| if b == 0 { b' ' } else { b })
        .collect();
    String::from_utf8_lossy(&joined).into_owned()
}

pub fn parse_comm(raw: Option<&[u8]>) -> String {
    match raw {
        Some(raw) => String::from_utf8_lossy(raw).trim_end().to_string(),
        None => UNKNOWN_COMM.to_string(),
    }
}
