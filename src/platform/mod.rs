//! Per-OS readers and the default selection for the build target.

pub mod darwin;
pub mod fallback;
pub mod linux;

use crate::config::Config;
use crate::error::Result;
use crate::reader::Reader;

pub use darwin::DarwinReader;
pub use fallback::UnsupportedReader;
pub use linux::LinuxReader;

#[cfg(target_os = "linux")]
pub fn new_reader(config: &Config) -> Result<Box<dyn Reader>> {
    Ok(Box::new(LinuxReader::from_config(config)?))
}

#[cfg(target_os = "macos")]
pub fn new_reader(_config: &Config) -> Result<Box<dyn Reader>> {
    Ok(Box::new(DarwinReader::new()))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn new_reader(_config: &Config) -> Result<Box<dyn Reader>> {
    Ok(Box::new(UnsupportedReader::new()))
}
