//! `/proc`-backed reader.

pub mod proc_fd;
pub mod proc_parser;
pub mod proc_stat;

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::buffer_pool::BufferPool;
use crate::config::{CommFilter, Config};
use crate::correlate::correlate;
use crate::error::{Result, ScanError};
use crate::procdir::{OsProcDir, ProcDir};
use crate::reader::{collect_processes, Reader};
use crate::types::{Connection, Process};
use proc_fd::read_socket_inodes;
use proc_parser::ProcNet;
use proc_stat::{decode_cmdline, parse_comm, parse_stat};

const TCP_TABLES: [&str; 2] = ["net/tcp", "net/tcp6"];

pub struct LinuxReader {
    dir: Box<dyn ProcDir>,
    pool: BufferPool,
    skip: CommFilter,
}

impl LinuxReader {
    pub fn new(dir: Box<dyn ProcDir>) -> Self {
        Self {
            dir,
            pool: BufferPool::default(),
            skip: CommFilter::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut reader = Self::new(Box::new(OsProcDir::new(&config.proc_root)));
        reader.skip = config.comm_filter()?;
        Ok(reader)
    }

    pub fn with_comm_filter(mut self, skip: CommFilter) -> Self {
        self.skip = skip;
        self
    }

    fn root_path(&self, rel: &Path) -> PathBuf {
        self.dir.root().join(rel)
    }

    /// Assemble one process. `Ok(None)` means the process went away or is
    /// filtered out; errors abort the whole scan.
    fn read_process(&self, pid: i32, name: &str, buf: &mut Vec<u8>) -> Result<Option<Process>> {
        let base = Path::new(name);

        if let Err(e) = self.dir.read_file(&base.join("stat"), buf) {
            trace!(pid, error = %e, "process exited before stat could be read");
            return Ok(None);
        }
        let stat = parse_stat(pid, buf)?;

        let cmdline = match self.dir.read_file(&base.join("cmdline"), buf) {
            Ok(()) => decode_cmdline(buf),
            Err(_) => String::new(),
        };

        let comm = parse_comm(
            self.dir
                .read_file(&base.join("comm"), buf)
                .ok()
                .map(|()| buf.as_slice()),
        );
        if self.skip.is_skipped(&comm) {
            return Ok(None);
        }

        let fd_dir = base.join("fd");
        let fds = match read_socket_inodes(self.dir.as_ref(), &fd_dir) {
            Ok(fds) => fds,
            Err(e) if process_vanished(&e) => {
                trace!(pid, error = %e, "process exited before fd could be listed");
                return Ok(None);
            }
            Err(e) => return Err(ScanError::io(self.root_path(&fd_dir), e)),
        };

        Ok(Some(Process {
            pid,
            ppid: stat.ppid,
            comm,
            cmdline,
            threads: stat.threads,
            inodes: fds.inodes,
            open_files_count: fds.open_files,
        }))
    }

    /// Concatenate the v4 and v6 TCP tables into `buf`. A missing `tcp6`
    /// means IPv6 is disabled.
    fn read_tcp_tables(&self, buf: &mut Vec<u8>) -> Result<()> {
        for table in TCP_TABLES {
            let path = Path::new(table);
            let read = self.dir.open(path).and_then(|mut f| f.read_into(buf));
            match read {
                Ok(()) => {}
                Err(e) if table == "net/tcp6" && e.kind() == io::ErrorKind::NotFound => {
                    trace!("no tcp6 table, IPv6 disabled");
                }
                Err(e) => return Err(ScanError::io(self.root_path(path), e)),
            }
        }
        Ok(())
    }
}

/// The `<pid>` directory went away between the root listing and the fd
/// listing. Any other failure on an existing fd directory is structural.
fn process_vanished(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(nix::libc::ESRCH)
}

fn is_pid(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

impl Reader for LinuxReader {
    fn processes(&self, visit: &mut dyn FnMut(Process)) -> Result<()> {
        let names = self
            .dir
            .read_dir_names(Path::new(""))
            .map_err(|e| ScanError::io(self.dir.root(), e))?;

        let mut buf = Vec::with_capacity(512);
        let mut count = 0usize;
        for name in names.iter().filter(|n| is_pid(n)) {
            let Ok(pid) = name.parse::<i32>() else {
                continue;
            };
            if let Some(process) = self.read_process(pid, name, &mut buf)? {
                count += 1;
                visit(process);
            }
        }

        debug!(count, "walked processes");
        Ok(())
    }

    fn connections(&self, with_procs: bool, visit: &mut dyn FnMut(Connection)) -> Result<()> {
        let processes = if with_procs {
            collect_processes(self)?
        } else {
            Vec::new()
        };

        let mut connections = {
            let mut buf = self.pool.checkout();
            self.read_tcp_tables(&mut buf)?;
            let detached: Vec<Connection> = ProcNet::established(&buf)
                .map(|entry| entry.to_connection())
                .collect();
            detached
        };

        if with_procs {
            correlate(&processes, &mut connections);
        }

        debug!(count = connections.len(), with_procs, "read established connections");
        for conn in connections {
            visit(conn);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procdir::testing::MemProcDir;
    use crate::reader::collect_connections;

    fn stat_line(pid: i32, comm: &str, ppid: i32, threads: i32) -> String {
        format!(
            "{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 {threads} 0 100 0 0"
        )
    }

    fn add_process(dir: &MemProcDir, pid: i32, comm: &str, ppid: i32, cmdline: &str) {
        dir.file(&format!("{pid}/stat"), stat_line(pid, comm, ppid, 1))
            .file(&format!("{pid}/comm"), format!("{comm}\n"))
            .file(&format!("{pid}/cmdline"), cmdline)
            .dir(&format!("{pid}/fd"));
    }

    fn scenario_dir() -> MemProcDir {
        let dir = MemProcDir::new();
        add_process(&dir, 1, "init", 0, "/sbin/init");
        add_process(&dir, 2, "bash", 1, "bash");
        add_process(&dir, 3, "curl", 2, "curl\0google.com");
        dir.file("notapid/stat", "garbage");
        dir
    }

    fn reader(dir: MemProcDir) -> LinuxReader {
        LinuxReader::new(Box::new(dir))
    }

    #[test]
    fn test_walks_numeric_entries_only() {
        let procs = collect_processes(&reader(scenario_dir())).unwrap();

        let pids: Vec<i32> = procs.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 2, 3]);
        for p in &procs {
            assert_eq!(p.threads, 1);
            assert!(p.inodes.is_empty());
        }
        assert_eq!(procs[1].ppid, 1);
        assert_eq!(procs[2].ppid, 2);
        assert_eq!(procs[2].comm, "curl");
        assert_eq!(procs[2].cmdline, "curl google.com");
    }

    #[test]
    fn test_collects_socket_inodes() {
        let dir = scenario_dir();
        dir.socket_fd("3/fd/3", 4001)
            .other_fd("3/fd/0", 1)
            .socket_fd("3/fd/5", 4002);

        let procs = collect_processes(&reader(dir)).unwrap();

        let curl = procs.iter().find(|p| p.pid == 3).unwrap();
        assert_eq!(curl.inodes, vec![4001, 4002]);
        assert_eq!(curl.open_files_count, 3);
    }

    #[test]
    fn test_missing_stat_skips_process() {
        let dir = scenario_dir();
        dir.remove("2/stat");

        let procs = collect_processes(&reader(dir)).unwrap();

        assert_eq!(procs.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_malformed_stat_aborts_scan() {
        let dir = scenario_dir();
        dir.file("2/stat", "2 (bash) S");

        let err = collect_processes(&reader(dir)).unwrap_err();

        assert!(matches!(err, ScanError::MalformedStat { pid: 2, .. }));
    }

    #[test]
    fn test_missing_cmdline_and_comm_use_defaults() {
        let dir = scenario_dir();
        dir.remove("3/cmdline").remove("3/comm");

        let procs = collect_processes(&reader(dir)).unwrap();

        let curl = procs.iter().find(|p| p.pid == 3).unwrap();
        assert_eq!(curl.cmdline, "");
        assert_eq!(curl.comm, "(unknown)");
    }

    #[test]
    fn test_vanished_fd_dir_skips_process() {
        let dir = scenario_dir();
        dir.remove("3/fd");

        let procs = collect_processes(&reader(dir)).unwrap();

        assert_eq!(procs.len(), 2);
    }

    #[test]
    fn test_unlistable_fd_dir_aborts_scan() {
        let dir = scenario_dir();
        dir.unreadable_dir("3/fd");

        let err = collect_processes(&reader(dir)).unwrap_err();

        assert!(matches!(err, ScanError::Io { .. }));
        assert!(err.to_string().contains("/proc/3/fd"));
    }

    #[test]
    fn test_fd_dir_of_exited_process_skips_it() {
        let dir = scenario_dir();
        dir.failing_dir("2/fd", || io::Error::from_raw_os_error(nix::libc::ESRCH));

        let procs = collect_processes(&reader(dir)).unwrap();

        assert_eq!(procs.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_permission_denied_fd_dir_aborts_scan() {
        let dir = scenario_dir();
        dir.failing_dir("2/fd", || io::Error::from(io::ErrorKind::PermissionDenied));

        let err = collect_processes(&reader(dir)).unwrap_err();

        match err {
            ScanError::Io { path, source } => {
                assert_eq!(path, Path::new("/proc/2/fd"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_comm_does_not_abort_scan() {
        let dir = scenario_dir();
        dir.file(
            "5/stat",
            b"5 (caf\xe9) S 1 5 5 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 100".as_slice(),
        )
        .file("5/comm", b"caf\xe9\n".as_slice())
        .dir("5/fd");

        let procs = collect_processes(&reader(dir)).unwrap();

        assert_eq!(procs.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 2, 3, 5]);
        let cafe = &procs[3];
        assert_eq!(cafe.ppid, 1);
        assert_eq!(cafe.comm, "caf\u{fffd}");
    }

    #[test]
    fn test_unlistable_root_aborts_scan() {
        let dir = MemProcDir::new();
        dir.unreadable_dir("");

        assert!(collect_processes(&reader(dir)).is_err());
    }

    #[test]
    fn test_comm_filter_skips_matching_processes() {
        let filter = CommFilter::new(&["bash"]).unwrap();
        let reader = reader(scenario_dir()).with_comm_filter(filter);

        let procs = collect_processes(&reader).unwrap();

        assert_eq!(procs.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 3]);
    }

    const TCP: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:0050 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 4000 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:C350 22D8B85D:01BB 01 00000000:00000000 00:00000000 00000000  1000        0 4001 1 0000000000000000 100 0 0 10 0
   2: 0F02000A:C351 22D8B85D:01BB 01 00000000:00000000 00:00000000 00000000  1000        0 5555 1 0000000000000000 100 0 0 10 0
";

    #[test]
    fn test_connections_attributed_within_same_scan() {
        let dir = scenario_dir();
        dir.socket_fd("3/fd/3", 4001).file("net/tcp", TCP);

        let conns = collect_connections(&reader(dir), true).unwrap();

        assert_eq!(conns.len(), 2);
        assert_eq!(conns[0].local_port, 50000);
        assert_eq!(conns[0].remote_port, 443);
        assert_eq!(conns[0].process.as_ref().map(|p| p.pid), Some(3));
        assert!(conns[1].process.is_none());
    }

    #[test]
    fn test_connections_without_attribution() {
        let dir = scenario_dir();
        dir.socket_fd("3/fd/3", 4001).file("net/tcp", TCP);

        let conns = collect_connections(&reader(dir), false).unwrap();

        assert_eq!(conns.len(), 2);
        assert!(conns.iter().all(|c| c.process.is_none()));
    }

    #[test]
    fn test_missing_tcp_table_is_an_error() {
        let err = collect_connections(&reader(scenario_dir()), false).unwrap_err();
        assert!(err.to_string().contains("net/tcp"));
    }

    #[test]
    fn test_pool_buffer_returned_after_scan() {
        let dir = scenario_dir();
        dir.file("net/tcp", TCP);
        let reader = reader(dir);

        collect_connections(&reader, false).unwrap();
        collect_connections(&reader, false).unwrap();

        assert_eq!(reader.pool.idle_count(), 1);
    }
}
