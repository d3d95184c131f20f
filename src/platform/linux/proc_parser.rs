//! Decoder for the kernel TCP tables (`net/tcp`, `net/tcp6`).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace};

use crate::types::{Connection, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown(u8),
}

impl TcpState {
    /// Values from the kernel's `tcp_states.h`.
    pub fn from_code(num: u8) -> Self {
        match num {
            1 => TcpState::Established,
            2 => TcpState::SynSent,
            3 => TcpState::SynRecv,
            4 => TcpState::FinWait1,
            5 => TcpState::FinWait2,
            6 => TcpState::TimeWait,
            7 => TcpState::Close,
            8 => TcpState::CloseWait,
            9 => TcpState::LastAck,
            10 => TcpState::Listen,
            11 => TcpState::Closing,
            n => TcpState::Unknown(n),
        }
    }

    fn from_hex(hex: &str) -> Option<Self> {
        u8::from_str_radix(hex, 16).ok().map(Self::from_code)
    }
}

/// IPv4 addresses are a single host-order word.
pub fn parse_hex_addr(hex: &str) -> Option<Ipv4Addr> {
    let num = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(num.to_le_bytes()))
}

pub fn parse_hex_port(hex: &str) -> Option<u16> {
    u16::from_str_radix(hex, 16).ok()
}

/// IPv6 addresses are four host-order words, each flipped back into
/// network order in place.
pub fn parse_hex_addr_v6(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != 32 {
        return None;
    }

    let mut octets = [0u8; 16];
    for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
        let word = u32::from_str_radix(hex.get(i * 8..(i + 1) * 8)?, 16).ok()?;
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    Some(Ipv6Addr::from(octets))
}

pub fn parse_hex_addr_any(hex: &str) -> Option<IpAddr> {
    match hex.len() {
        8 => parse_hex_addr(hex).map(IpAddr::V4),
        32 => parse_hex_addr_v6(hex).map(IpAddr::V6),
        _ => None,
    }
}

fn parse_endpoint(field: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = field.split_once(':')?;
    Some((parse_hex_addr_any(addr)?, parse_hex_port(port)?))
}

/// One decoded table row, still tied to the scan buffer it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpEntry<'a> {
    pub raw: &'a str,
    pub local_addr: IpAddr,
    pub local_port: u16,
    pub remote_addr: IpAddr,
    pub remote_port: u16,
    pub state: TcpState,
    pub inode: u64,
}

impl TcpEntry<'_> {
    /// Detach the row from the scan buffer.
    pub fn to_connection(&self) -> Connection {
        Connection {
            transport: Transport::Tcp,
            local_address: self.local_addr,
            local_port: self.local_port,
            remote_address: self.remote_addr,
            remote_port: self.remote_port,
            inode: self.inode,
            process: None,
        }
    }

    fn same_socket(&self, other: &TcpEntry<'_>) -> bool {
        self.inode == other.inode
            && self.local_addr == other.local_addr
            && self.local_port == other.local_port
            && self.remote_addr == other.remote_addr
            && self.remote_port == other.remote_port
    }
}

enum Row<'a> {
    Header,
    Entry(TcpEntry<'a>),
    Broken,
}

fn parse_row(line: &str) -> Row<'_> {
    let mut fields = line.split_whitespace();
    let slot = match fields.next() {
        Some(s) => s,
        None => return Row::Header,
    };
    // Rows start with "<slot>:"; anything else ("sl ...") is a header.
    if !slot.ends_with(':') {
        return Row::Header;
    }

    // sl local rem st tx:rx tr:when retrnsmt uid timeout inode
    let parsed = (|| {
        let (local_addr, local_port) = parse_endpoint(fields.next()?)?;
        let (remote_addr, remote_port) = parse_endpoint(fields.next()?)?;
        let state = TcpState::from_hex(fields.next()?)?;
        let inode = fields.nth(5)?.parse().ok()?;
        Some(TcpEntry {
            raw: line,
            local_addr,
            local_port,
            remote_addr,
            remote_port,
            state,
            inode,
        })
    })();

    match parsed {
        Some(entry) => Row::Entry(entry),
        None => Row::Broken,
    }
}

/// Lazy iterator over the rows of one or more concatenated TCP tables that
/// are in `wanted` state.
///
/// Lines not starting with a `<slot>:` token are headers and are skipped
/// wherever they appear. A slot row that does not parse ends the iteration,
/// since everything after it is suspect.
pub struct ProcNet<'a> {
    lines: std::str::Lines<'a>,
    wanted: TcpState,
    last: Option<TcpEntry<'a>>,
    done: bool,
}

impl<'a> ProcNet<'a> {
    pub fn new(buf: &'a [u8], wanted: TcpState) -> Self {
        let text = match std::str::from_utf8(buf) {
            Ok(text) => text,
            Err(e) => {
                debug!(valid_up_to = e.valid_up_to(), "non-UTF-8 bytes in TCP table");
                std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or_default()
            }
        };
        Self {
            lines: text.lines(),
            wanted,
            last: None,
            done: false,
        }
    }

    pub fn established(buf: &'a [u8]) -> Self {
        Self::new(buf, TcpState::Established)
    }
}

impl<'a> Iterator for ProcNet<'a> {
    type Item = TcpEntry<'a>;

    fn next(&mut self) -> Option<TcpEntry<'a>> {
        if self.done {
            return None;
        }
        for line in self.lines.by_ref() {
            let entry = match parse_row(line) {
                Row::Header => continue,
                Row::Entry(entry) => entry,
                Row::Broken => {
                    debug!(line, "stopping at unparseable TCP table row");
                    self.done = true;
                    return None;
                }
            };
            if entry.state != self.wanted {
                continue;
            }
            if self.last.is_some_and(|last| last.same_socket(&entry)) {
                trace!(row = entry.raw, "dropping duplicate TCP table row");
                continue;
            }
            self.last = Some(entry);
            return Some(entry);
        }
        self.done = true;
        None
    }
}
