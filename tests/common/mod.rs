//! Fake proc tree on disk, shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::{symlink, MetadataExt};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

pub struct FakeProc {
    pub dir: TempDir,
    // Kept open so the socket files stay bound.
    listeners: Vec<UnixListener>,
}

impl FakeProc {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("net")).unwrap();
        Self {
            dir,
            listeners: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn process(&self, pid: i32, comm: &str, ppid: i32, threads: i32, cmdline: &str) -> &Self {
        let base = self.root().join(pid.to_string());
        fs::create_dir_all(base.join("fd")).unwrap();
        fs::write(
            base.join("stat"),
            format!(
                "{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 {threads} 0 100 0 0\n"
            ),
        )
        .unwrap();
        fs::write(base.join("comm"), format!("{comm}\n")).unwrap();
        fs::write(base.join("cmdline"), cmdline).unwrap();
        self
    }

    /// Bind a unix socket and point `pid`'s fd `fd` at it. Returns the inode.
    pub fn socket_fd(&mut self, pid: i32, fd: u32) -> u64 {
        let sock = self.root().join(format!("sock-{pid}-{fd}"));
        let listener = UnixListener::bind(&sock).expect("Failed to bind socket");
        self.listeners.push(listener);
        symlink(&sock, self.fd_path(pid, fd)).unwrap();
        fs::metadata(&sock).unwrap().ino()
    }

    /// Point `pid`'s fd `fd` at a plain file.
    pub fn file_fd(&self, pid: i32, fd: u32) {
        let file = self.root().join(format!("file-{pid}-{fd}"));
        fs::write(&file, b"").unwrap();
        symlink(&file, self.fd_path(pid, fd)).unwrap();
    }

    pub fn tcp(&self, rows: &[String]) {
        let mut table = String::from(TCP_HEADER);
        table.push('\n');
        for row in rows {
            table.push_str(row);
            table.push('\n');
        }
        fs::write(self.root().join("net/tcp"), table).unwrap();
    }

    pub fn remove(&self, pid: i32) {
        fs::remove_dir_all(self.root().join(pid.to_string())).unwrap();
    }

    fn fd_path(&self, pid: i32, fd: u32) -> PathBuf {
        self.root().join(format!("{pid}/fd/{fd}"))
    }
}

/// One `/proc/net/tcp` row. Addresses are little-endian hex as the kernel
/// prints them.
pub fn tcp_row(sl: usize, local: &str, remote: &str, state: &str, inode: u64) -> String {
    format!(
        "{sl:4}: {local} {remote} {state} 00000000:00000000 00:00000000 00000000  1000        0 {inode} 1 0000000000000000 20 4 30 10 -1"
    )
}

/// init(1) → bash(2) → curl(3), curl holding one established connection
/// 127.0.0.1:50000 → 127.0.0.2:443, plus a non-numeric entry.
pub fn standard_tree() -> (FakeProc, u64) {
    let mut fake = FakeProc::new();
    fake.process(1, "init", 0, 1, "/sbin/init\0")
        .process(2, "bash", 1, 1, "-bash\0")
        .process(3, "curl", 2, 2, "curl\0https://example.com\0");
    fs::create_dir_all(fake.root().join("notapid")).unwrap();

    fake.file_fd(3, 0);
    let inode = fake.socket_fd(3, 3);
    fake.file_fd(3, 4);

    fake.tcp(&[
        tcp_row(0, "0100007F:C350", "0200007F:01BB", "01", inode),
        tcp_row(1, "00000000:1F90", "00000000:0000", "0A", 4242),
    ]);
    (fake, inode)
}
