use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::types::{ProbeOutcome, ProbeResult};

/// Attempt one TCP handshake against `ip:port`, bounded by `timeout`.
///
/// Never fails: a refused, unroutable or timed-out connect is reported as
/// [`ProbeOutcome::Closed`]. The elapsed time covers the whole attempt,
/// including the timeout wait. No data is exchanged on success.
pub async fn probe(ip: IpAddr, port: u16, timeout: Duration) -> ProbeResult {
    let addr = SocketAddr::new(ip, port);
    let start = Instant::now();
    let connect_res = time::timeout(timeout, TcpStream::connect(addr)).await;
    let elapsed = start.elapsed();

    let outcome = match connect_res {
        Ok(Ok(stream)) => {
            drop(stream);
            ProbeOutcome::Open
        }
        Ok(Err(e)) => ProbeOutcome::Closed {
            detail: format!("dial tcp {addr}: {e}"),
        },
        Err(_) => ProbeOutcome::Closed {
            detail: format!("dial tcp {addr}: i/o timeout"),
        },
    };

    ProbeResult {
        ip,
        port,
        outcome,
        elapsed,
    }
}
