//! Narrow view over a "/proc"-like directory tree.
//!
//! Readers receive a [`ProcDir`] at construction, so tests can swap in an
//! in-memory tree and the host can point the probe at a mounted `/host/proc`.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use nix::sys::stat::{self, SFlag};

/// Type and inode of a stat'ed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub inode: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Socket,
    Other,
}

impl FileStat {
    pub fn is_socket(&self) -> bool {
        self.kind == FileKind::Socket
    }
}

pub trait ProcFile {
    /// Append the whole file, read from offset 0, to `buf`.
    fn read_into(&mut self, buf: &mut Vec<u8>) -> io::Result<()>;
}

/// All paths are relative to [`ProcDir::root`]; an empty path is the root.
pub trait ProcDir: Send + Sync {
    fn root(&self) -> &Path;

    fn open(&self, path: &Path) -> io::Result<Box<dyn ProcFile>>;

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Stat `path`, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Clear `buf` and fill it with the contents of `path`.
    fn read_file(&self, path: &Path, buf: &mut Vec<u8>) -> io::Result<()> {
        buf.clear();
        self.open(path)?.read_into(buf)
    }
}

/// The real filesystem, rooted at `/proc` or wherever the host proc is mounted.
#[derive(Debug, Clone)]
pub struct OsProcDir {
    root: PathBuf,
}

impl OsProcDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for OsProcDir {
    fn default() -> Self {
        Self::new("/proc")
    }
}

struct OsFile(File);

impl ProcFile for OsFile {
    fn read_into(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        self.0.seek(SeekFrom::Start(0))?;
        self.0.read_to_end(buf)?;
        Ok(())
    }
}

impl ProcDir for OsProcDir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ProcFile>> {
        let file = File::open(self.root.join(path))?;
        Ok(Box::new(OsFile(file)))
    }

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join(path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let st = stat::stat(&self.root.join(path)).map_err(io::Error::from)?;
        let kind = if st.st_mode & SFlag::S_IFMT.bits() == SFlag::S_IFSOCK.bits() {
            FileKind::Socket
        } else {
            FileKind::Other
        };
        Ok(FileStat {
            kind,
            inode: st.st_ino as u64,
        })
    }
}
