use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Where bulk scans record open ports unless told otherwise.
pub const DEFAULT_RESULT_FILE: &str = "result.txt";

/// Append-only store of open ports found during bulk scans.
///
/// The file carries a single `# Open ports for {ip}` header for its whole
/// lifetime, followed by one port per line in discovery order. Every append
/// is synced to disk before returning so an interrupted scan keeps what it
/// found.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    ip: IpAddr,
    file: File,
    header_written: bool,
    ports_written: u64,
}

impl ResultSink {
    /// Open (or create) the sink file in append mode.
    pub fn open(path: impl AsRef<Path>, ip: IpAddr) -> Result<Self> {
        let path = path.as_ref();
        // A non-empty file already carries its header from an earlier run.
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open result file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            ip,
            file,
            header_written: !is_new,
            ports_written: 0,
        })
    }

    /// Record one open port, writing the header first if the file has none.
    pub fn append(&mut self, port: u16) -> Result<()> {
        // Header and port go out in one write so a failed write leaves the
        // header pending for the next append.
        let mut line = String::new();
        if !self.header_written {
            let _ = writeln!(line, "# Open ports for {}", self.ip);
        }
        let _ = writeln!(line, "{port}");

        self.file
            .write_all(line.as_bytes())
            .with_context(|| format!("failed to write port {port} to {}", self.path.display()))?;
        self.header_written = true;
        self.file
            .sync_all()
            .with_context(|| format!("failed to sync {}", self.path.display()))?;
        self.ports_written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ports successfully appended during this run.
    pub fn ports_written(&self) -> u64 {
        self.ports_written
    }

    pub fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("failed to close {}", self.path.display()))
    }
}
