use std::time::Duration;

/// Render a duration the way probe lines and summaries show it.
///
/// Sub-millisecond values keep three decimals, sub-second values two
/// decimals of milliseconds, everything else is shown in seconds.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_nanos() as f64 / 1_000_000.0;
    if d < Duration::from_millis(1) {
        format!("{millis:.3}ms")
    } else if d < Duration::from_secs(1) {
        format!("{millis:.2}ms")
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

/// Mean of `total` over `count` samples, `None` when there are none.
pub fn mean_duration(total: Duration, count: u64) -> Option<Duration> {
    if count == 0 {
        return None;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Some(Duration::from_nanos(nanos as u64))
}
