//! I/O helpers: staged files, codecs, process execution, configuration.

pub mod codec;
pub mod config;
pub mod process;
pub mod staged;
