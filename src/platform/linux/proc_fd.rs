use std::io;
use std::path::Path;

use tracing::trace;

use crate::procdir::ProcDir;

/// Socket inodes and total fd count for one process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FdScan {
    pub inodes: Vec<u64>,
    pub open_files: usize,
}

/// Stat every entry of `fd_dir` and keep the inodes of sockets.
///
/// Listing errors are returned to the caller; an fd that closes between the
/// listing and its stat is simply skipped.
pub fn read_socket_inodes(dir: &dyn ProcDir, fd_dir: &Path) -> io::Result<FdScan> {
    let names = dir.read_dir_names(fd_dir)?;

    let mut scan = FdScan {
        inodes: Vec::new(),
        open_files: names.len(),
    };

    for name in &names {
        let fd_path = fd_dir.join(name);
        match dir.stat(&fd_path) {
            Ok(stat) if stat.is_socket() => scan.inodes.push(stat.inode),
            Ok(_) => {}
            Err(e) => trace!(path = %fd_path.display(), error = %e, "fd vanished during scan"),
        }
    }

    Ok(scan)
}
