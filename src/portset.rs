use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::PortSpecError;
use crate::ports::{full_port_range, parse_port_spec, read_port_lines};

/// Whether open ports found by a scan should be persisted.
///
/// Decided from the raw port specification text, not from the number of
/// ports it resolves to: `80-80` is still a bulk scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Targeted,
    Bulk,
}

/// What to do when neither a port file nor port arguments were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPortsPolicy {
    /// Fall back to every port, `1..=65535`.
    #[default]
    ScanAll,
    /// Refuse with [`PortSpecError::MissingPorts`].
    Require,
}

/// The resolved, deduplicated probe order plus its scan mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSet {
    pub ports: Vec<u16>,
    pub mode: ScanMode,
}

/// True when a raw spec names `all` or contains a range.
pub fn is_bulk_spec(spec: &str) -> bool {
    spec.trim().eq_ignore_ascii_case("all") || spec.contains('-')
}

/// Merges file-sourced and argument-sourced port specs into a [`PortSet`].
#[derive(Debug, Clone, Default)]
pub struct PortSetBuilder {
    policy: MissingPortsPolicy,
    port_file: Option<PathBuf>,
    args: Vec<String>,
}

impl PortSetBuilder {
    pub fn new(policy: MissingPortsPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn port_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.port_file = Some(path.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Resolve the final port order. File ports precede argument ports and
    /// the first occurrence of each port wins.
    pub fn build(&self) -> Result<PortSet, PortSpecError> {
        let mut bulk = false;
        let mut all_ports: Vec<u16> = Vec::new();

        if let Some(path) = &self.port_file {
            let lines = read_port_lines(path)?;
            bulk |= lines.iter().any(|line| is_bulk_spec(line));
            all_ports.extend(parse_port_spec(&lines.join(" "))?);
        }

        if !self.args.is_empty() {
            let spec = self.args.join(" ");
            bulk |= is_bulk_spec(&spec);
            all_ports.extend(parse_port_spec(&spec)?);
        }

        if all_ports.is_empty() {
            match self.policy {
                MissingPortsPolicy::ScanAll => {
                    tracing::debug!("no ports specified, defaulting to the full range");
                    all_ports = full_port_range();
                    bulk = true;
                }
                MissingPortsPolicy::Require
                    if self.port_file.is_none() && self.args.is_empty() =>
                {
                    return Err(PortSpecError::MissingPorts);
                }
                MissingPortsPolicy::Require => return Err(PortSpecError::NoPorts),
            }
        }

        let mut seen = HashSet::with_capacity(all_ports.len());
        let ports: Vec<u16> = all_ports.into_iter().filter(|p| seen.insert(*p)).collect();
        if ports.is_empty() {
            return Err(PortSpecError::NoPorts);
        }

        let mode = if bulk {
            ScanMode::Bulk
        } else {
            ScanMode::Targeted
        };
        Ok(PortSet { ports, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_detection_uses_raw_text() {
        assert!(is_bulk_spec("all"));
        assert!(is_bulk_spec(" ALL "));
        assert!(is_bulk_spec("80-80"));
        assert!(is_bulk_spec("22 8000-8001"));
        assert!(!is_bulk_spec("22 80"));
        assert!(!is_bulk_spec("22 all"));
    }

    #[test]
    fn single_port_range_is_bulk() {
        let set = PortSetBuilder::default().args(["80-80"]).build().unwrap();
        assert_eq!(set.ports, vec![80]);
        assert_eq!(set.mode, ScanMode::Bulk);
    }

    #[test]
    fn explicit_ports_are_targeted_and_deduplicated() {
        let set = PortSetBuilder::default()
            .args(["443", "22,443", "80"])
            .build()
            .unwrap();
        assert_eq!(set.ports, vec![443, 22, 80]);
        assert_eq!(set.mode, ScanMode::Targeted);
    }

    #[test]
    fn no_ports_defaults_to_full_range() {
        let set = PortSetBuilder::new(MissingPortsPolicy::ScanAll)
            .build()
            .unwrap();
        assert_eq!(set.ports.len(), 65535);
        assert_eq!(set.mode, ScanMode::Bulk);
    }

    #[test]
    fn require_policy_rejects_missing_ports() {
        let err = PortSetBuilder::new(MissingPortsPolicy::Require)
            .build()
            .unwrap_err();
        assert!(matches!(err, PortSpecError::MissingPorts));
    }

    #[test]
    fn require_policy_rejects_empty_ports() {
        let err = PortSetBuilder::new(MissingPortsPolicy::Require)
            .args([" , "])
            .build()
            .unwrap_err();
        assert!(matches!(err, PortSpecError::NoPorts));
    }

    #[test]
    fn argument_parse_errors_propagate() {
        let err = PortSetBuilder::default()
            .args(["8082-8080"])
            .build()
            .unwrap_err();
        assert!(matches!(err, PortSpecError::InvalidRange { .. }));
    }
}
