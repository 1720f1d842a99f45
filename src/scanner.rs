use std::io::Write;
use std::net::IpAddr;
use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::prober::probe;
use crate::sink::ResultSink;
use crate::timing::{format_duration, mean_duration};
use crate::types::{ProbeResult, ScanReport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Connect timeout per probe.
    pub timeout: Duration,
    /// Include the failure reason on closed-port lines.
    pub verbose: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
        }
    }
}

/// Probe `ports` on `ip` one at a time, in the given order.
///
/// - Each probe's line is written to `out` as soon as it resolves.
/// - Open ports are handed to `sink` (when present) before the next probe starts.
/// - Sink failures are logged and never stop the scan.
/// - A summary block is written to `out` after the last probe.
///
/// Only writes to `out` can fail.
pub async fn scan_ports<W: Write>(
    ip: IpAddr,
    ports: &[u16],
    opts: &ScanOptions,
    sink: Option<&mut ResultSink>,
    out: &mut W,
) -> Result<ScanReport> {
    scan_ports_internal(ip, ports, opts, sink, out, None).await
}

/// Variant that stops early once `cancel` fires. The report then covers the
/// ports probed so far and is marked `interrupted`.
pub async fn scan_ports_with_cancel<W: Write>(
    ip: IpAddr,
    ports: &[u16],
    opts: &ScanOptions,
    sink: Option<&mut ResultSink>,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<ScanReport> {
    scan_ports_internal(ip, ports, opts, sink, out, Some(cancel)).await
}

async fn scan_ports_internal<W: Write>(
    ip: IpAddr,
    ports: &[u16],
    opts: &ScanOptions,
    mut sink: Option<&mut ResultSink>,
    out: &mut W,
    cancel_opt: Option<CancellationToken>,
) -> Result<ScanReport> {
    let cancel = cancel_opt.unwrap_or_default();
    let started_at = now_rfc3339();
    info!(%ip, ports = ports.len(), timeout = ?opts.timeout, "starting scan");
    writeln!(out, "Scanning {ip}...\n")?;

    let mut scanned: u64 = 0;
    let mut open: u64 = 0;
    let mut closed: u64 = 0;
    let mut total_open_elapsed = Duration::ZERO;
    let mut open_ports: Vec<u16> = Vec::new();
    let mut interrupted = false;

    for &port in ports {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = probe(ip, port, opts.timeout) => Some(res),
        };
        let Some(result) = result else {
            interrupted = true;
            break;
        };
        scanned += 1;
        debug!(port, open = result.is_open(), elapsed = ?result.elapsed, "probe finished");
        write_probe_line(out, &result, opts.verbose)?;

        if result.is_open() {
            open += 1;
            total_open_elapsed += result.elapsed;
            open_ports.push(port);
            if let Some(sink) = sink.as_deref_mut() {
                if let Err(e) = sink.append(port) {
                    warn!("failed to save open port {port}: {e:#}");
                }
            }
        } else {
            closed += 1;
        }
    }

    let report = ScanReport {
        ip,
        started_at,
        scanned,
        open,
        closed,
        mean_elapsed: mean_duration(total_open_elapsed, open),
        open_ports,
        interrupted,
    };
    write_summary(out, &report)?;
    info!(%ip, scanned, open, closed, interrupted, "scan finished");
    Ok(report)
}

fn write_probe_line<W: Write>(out: &mut W, result: &ProbeResult, verbose: bool) -> Result<()> {
    let target = format!("{}:{}/tcp", result.ip, result.port);
    match result.detail() {
        None => writeln!(
            out,
            "Probing {target} - Port is open - time={}",
            format_duration(result.elapsed)
        )?,
        Some(detail) if verbose => writeln!(out, "Probing {target} - Port is closed - {detail}")?,
        Some(_) => writeln!(out, "Probing {target} - Port is closed")?,
    }
    Ok(())
}

/// Write the statistics block that closes every scan.
pub fn write_summary<W: Write>(out: &mut W, report: &ScanReport) -> Result<()> {
    writeln!(out, "\n--- {} tcping statistics ---", report.ip)?;
    writeln!(
        out,
        "{} ports scanned, {} open, {} closed",
        report.scanned, report.open, report.closed
    )?;
    if let Some(mean) = report.mean_elapsed {
        writeln!(out, "Average response time: {}", format_duration(mean))?;
    }
    out.flush()?;
    Ok(())
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn report(open: u64, mean_elapsed: Option<Duration>) -> ScanReport {
        ScanReport {
            ip: IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
            started_at: now_rfc3339(),
            scanned: 3,
            open,
            closed: 3 - open,
            mean_elapsed,
            open_ports: Vec::new(),
            interrupted: false,
        }
    }

    #[test]
    fn summary_includes_average_when_ports_open() {
        let mut out = Vec::new();
        write_summary(&mut out, &report(1, Some(Duration::from_millis(5)))).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- 1.1.1.1 tcping statistics ---"));
        assert!(text.contains("3 ports scanned, 1 open, 2 closed"));
        assert!(text.contains("Average response time: 5.00ms"));
    }

    #[test]
    fn summary_omits_average_without_open_ports() {
        let mut out = Vec::new();
        write_summary(&mut out, &report(0, None)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("3 ports scanned, 0 open, 3 closed"));
        assert!(!text.contains("Average response time"));
    }

    #[test]
    fn closed_line_shows_detail_only_when_verbose() {
        let result = ProbeResult {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 81,
            outcome: crate::types::ProbeOutcome::Closed {
                detail: "connection refused".into(),
            },
            elapsed: Duration::from_millis(1),
        };

        let mut quiet = Vec::new();
        write_probe_line(&mut quiet, &result, false).unwrap();
        assert_eq!(
            String::from_utf8(quiet).unwrap(),
            "Probing 127.0.0.1:81/tcp - Port is closed\n"
        );

        let mut loud = Vec::new();
        write_probe_line(&mut loud, &result, true).unwrap();
        assert_eq!(
            String::from_utf8(loud).unwrap(),
            "Probing 127.0.0.1:81/tcp - Port is closed - connection refused\n"
        );
    }
}
