use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a usable port sequence from being established.
///
/// All of these are fatal: no probe is attempted once one is raised.
#[derive(Debug, Error)]
pub enum PortSpecError {
    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid port range: {range} ({reason})")]
    InvalidRange { range: String, reason: &'static str },

    #[error("port {0} out of range (1-65535)")]
    PortOutOfRange(i64),

    #[error("no ports found in file: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("failed to read ports file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("at least one port is required")]
    MissingPorts,

    #[error("no valid ports specified")]
    NoPorts,
}
