use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::PortSpecError;

pub const MIN_PORT: u16 = 1;
pub const MAX_PORT: u16 = 65535;

/// Every TCP port, ascending.
pub fn full_port_range() -> Vec<u16> {
    (MIN_PORT..=MAX_PORT).collect()
}

/// Parse a textual port specification into an ordered list of TCP ports.
///
/// Supported forms:
/// - the keyword `all` (any case, surrounding whitespace ignored): `1..=65535`
/// - single port: `80`
/// - inclusive range: `8000-8010`
/// - any mix of the above separated by commas and/or whitespace
///
/// Duplicates are kept; ordering follows the input. An empty or
/// whitespace-only spec yields an empty list.
pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>, PortSpecError> {
    let spec = spec.trim();
    if spec.eq_ignore_ascii_case("all") {
        return Ok(full_port_range());
    }

    let normalized = spec.replace(',', " ");
    let mut out: Vec<u16> = Vec::new();
    for token in normalized.split_whitespace() {
        if token.contains('-') {
            out.extend(parse_range(token)?);
        } else {
            out.push(parse_single(token)?);
        }
    }
    Ok(out)
}

fn parse_range(token: &str) -> Result<std::ops::RangeInclusive<u16>, PortSpecError> {
    let invalid = |reason| PortSpecError::InvalidRange {
        range: token.to_string(),
        reason,
    };

    let bounds: Vec<&str> = token.split('-').collect();
    let [start, end] = bounds.as_slice() else {
        return Err(invalid("expected start-end"));
    };
    let start: i64 = start
        .trim()
        .parse()
        .map_err(|_| invalid("invalid start port"))?;
    let end: i64 = end.trim().parse().map_err(|_| invalid("invalid end port"))?;
    if start > end {
        return Err(invalid("start port must be <= end port"));
    }

    // Report the first generated port that falls outside the valid range.
    if start < i64::from(MIN_PORT) {
        return Err(PortSpecError::PortOutOfRange(start));
    }
    if end > i64::from(MAX_PORT) {
        return Err(PortSpecError::PortOutOfRange(
            start.max(i64::from(MAX_PORT) + 1),
        ));
    }
    Ok(start as u16..=end as u16)
}

fn parse_single(token: &str) -> Result<u16, PortSpecError> {
    let val: i64 = token
        .trim()
        .parse()
        .map_err(|_| PortSpecError::InvalidPort(token.to_string()))?;
    if val < i64::from(MIN_PORT) || val > i64::from(MAX_PORT) {
        return Err(PortSpecError::PortOutOfRange(val));
    }
    Ok(val as u16)
}

/// Read the meaningful lines of a ports file.
///
/// Lines are trimmed; blank lines and lines starting with `#` are dropped.
/// Fails with [`PortSpecError::EmptyFile`] when nothing remains.
pub fn read_port_lines(path: impl AsRef<Path>) -> Result<Vec<String>, PortSpecError> {
    let path = path.as_ref();
    let io_err = |source| PortSpecError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(io_err)?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line.to_string());
    }

    if lines.is_empty() {
        return Err(PortSpecError::EmptyFile(path.to_path_buf()));
    }
    Ok(lines)
}

/// Load a ports list from a file path. Errors if the file cannot be read or parsed.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<Vec<u16>, PortSpecError> {
    let lines = read_port_lines(path)?;
    parse_port_spec(&lines.join(" "))
}
