use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;

/// How a single connect attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open,
    /// Connection failed; `detail` is the underlying reason, for display only.
    Closed { detail: String },
}

/// One probe of an IP:port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub ip: IpAddr,
    pub port: u16,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn is_open(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Open)
    }

    pub fn detail(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Open => None,
            ProbeOutcome::Closed { detail } => Some(detail),
        }
    }
}

/// Aggregate statistics for one scan.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub ip: IpAddr,
    pub started_at: String,
    pub scanned: u64,
    pub open: u64,
    pub closed: u64,
    /// Mean connect time over open ports only; absent when nothing was open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_elapsed: Option<Duration>,
    /// Open ports in probe order.
    pub open_ports: Vec<u16>,
    /// Set when the scan was cancelled before the port list was exhausted.
    pub interrupted: bool,
}
