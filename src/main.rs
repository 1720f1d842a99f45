use std::fs::File;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use tcping_rs::logging;
use tcping_rs::portset::{MissingPortsPolicy, PortSetBuilder, ScanMode};
use tcping_rs::scanner::{self, ScanOptions};
use tcping_rs::sink::{ResultSink, DEFAULT_RESULT_FILE};
use tcping_rs::types::ScanReport;

/// Sequential TCP connect prober.
///
/// If no ports are given, all ports (1-65535) are probed unless
/// `--require-ports` is set.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tcping-rs",
    version,
    about = "Sequential TCP connect prober with crash-safe result persistence.",
    after_help = "Examples:\n  tcping-rs 1.1.1.1\n  tcping-rs 1.1.1.1 all\n  tcping-rs 1.1.1.1 8081 8082 8083\n  tcping-rs 1.1.1.1 8080-8090\n  tcping-rs 1.1.1.1 8081,8082,8083\n  tcping-rs -f port.txt 1.1.1.1 8081 8082"
)]
struct Cli {
    /// Target IPv4 or IPv6 address.
    #[arg(value_name = "IP")]
    ip: String,

    /// Ports: single ports, comma lists, ranges like 8080-8090, or `all`.
    #[arg(value_name = "PORT")]
    ports: Vec<String>,

    /// Read ports from file (one spec per line, `#` comments allowed).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    port_file: Option<PathBuf>,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 3000)]
    timeout_ms: u64,

    /// Show the failure reason for closed ports.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Fail instead of scanning every port when no ports are given.
    #[arg(long = "require-ports", default_value_t = false)]
    require_ports: bool,

    /// File that range and `all` scans append open ports to.
    #[arg(long = "result-file", default_value = DEFAULT_RESULT_FILE)]
    result_file: PathBuf,

    /// Write the scan report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let ip: IpAddr = cli
        .ip
        .parse()
        .with_context(|| format!("Invalid IP address: {}", cli.ip))?;

    let policy = if cli.require_ports {
        MissingPortsPolicy::Require
    } else {
        MissingPortsPolicy::ScanAll
    };
    let mut builder = PortSetBuilder::new(policy).args(cli.ports.iter().cloned());
    if let Some(path) = &cli.port_file {
        builder = builder.port_file(path.clone());
    }
    let port_set = builder.build().context("Error parsing ports")?;

    let mut sink = match port_set.mode {
        ScanMode::Bulk => open_sink(&cli.result_file, ip),
        ScanMode::Targeted => None,
    };

    // Ctrl-C stops the scan early; the summary still covers what was probed.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let opts = ScanOptions {
        timeout: Duration::from_millis(cli.timeout_ms),
        verbose: cli.verbose,
    };
    let mut stdout = io::stdout().lock();
    let report = scanner::scan_ports_with_cancel(
        ip,
        &port_set.ports,
        &opts,
        sink.as_mut(),
        &mut stdout,
        cancel,
    )
    .await?;
    drop(stdout);

    let saved = match sink {
        Some(sink) => {
            let saved = sink.ports_written();
            if let Err(e) = sink.close() {
                warn!("{e:#}");
            }
            Some(saved)
        }
        None => None,
    };
    print_outcome(&cli.result_file, port_set.mode, saved, &report);

    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_report_json(path, &report) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON report to {}", path.display());
        }
    }

    Ok(())
}

fn open_sink(path: &Path, ip: IpAddr) -> Option<ResultSink> {
    match ResultSink::open(path, ip) {
        Ok(sink) => {
            println!(
                "[Notice] Open ports will be appended to {} as they are found\n",
                path.display()
            );
            Some(sink)
        }
        Err(e) => {
            warn!("{e:#}");
            warn!("Results will not be saved to file");
            None
        }
    }
}

fn print_outcome(result_file: &Path, mode: ScanMode, saved: Option<u64>, report: &ScanReport) {
    match mode {
        ScanMode::Bulk if report.open_ports.is_empty() => println!("\nNo open ports found."),
        ScanMode::Bulk => match saved {
            Some(n) => println!("\n{n} open port(s) saved to {}", result_file.display()),
            None => println!(
                "\n{} open port(s) found, not saved to file",
                report.open_ports.len()
            ),
        },
        ScanMode::Targeted if !report.open_ports.is_empty() => println!(
            "\n[Notice] Results not saved to file (only saved for range or 'all' scans)"
        ),
        ScanMode::Targeted => {}
    }
}

fn write_report_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
