use crate::{PanBridgeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sorted set of interface names. Ordering only matters for logging.
pub type InterfaceSet = BTreeSet<String>;

/// Regex restricting which interfaces and radios are manageable, matched
/// against their hardware address.
#[derive(Debug, Clone)]
pub struct MacFilter {
    pattern: Regex,
}

impl MacFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| PanBridgeError::ConfigError(format!("invalid MAC filter: {e}")))?;
        Ok(Self { pattern })
    }

    /// Interfaces without a hardware address never match.
    pub fn matches(&self, mac: Option<&str>) -> bool {
        match mac {
            Some(mac) if !mac.is_empty() => self.pattern.is_match(mac),
            _ => false,
        }
    }
}

impl Default for MacFilter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(".*").expect("static pattern"),
        }
    }
}

/// Kind of a bridge candidate, deciding how it gets brought up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceKind {
    Wired,
    Bluetooth,
}

impl InterfaceKind {
    /// Classifies by the name with its trailing unit number removed,
    /// so `hci0` and `hci12` are Bluetooth adapters.
    pub fn classify(name: &str) -> Self {
        match name.trim_end_matches(|c: char| c.is_ascii_digit()) {
            "hci" => InterfaceKind::Bluetooth,
            _ => InterfaceKind::Wired,
        }
    }
}

impl std::fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceKind::Wired => write!(f, "wired"),
            InterfaceKind::Bluetooth => write!(f, "bluetooth"),
        }
    }
}

/// What a single reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub detached: InterfaceSet,
    pub attached: InterfaceSet,
    pub pan_started: InterfaceSet,
    pub failed: InterfaceSet,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.detached.is_empty()
            && self.attached.is_empty()
            && self.pan_started.is_empty()
            && self.failed.is_empty()
    }
}
