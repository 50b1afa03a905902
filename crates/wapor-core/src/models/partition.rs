use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, WaporError};

/// A (version, level) pair selecting one WaPOR catalog workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    version: u8,
    level: Option<u8>,
}

impl Partition {
    /// Order in which partitions are searched when no hint is given.
    pub const PROBE_ORDER: [Partition; 6] = [
        Partition::fixed(2, 3),
        Partition::fixed(2, 2),
        Partition::fixed(2, 1),
        Partition::fixed(1, 3),
        Partition::fixed(1, 2),
        Partition::fixed(1, 1),
    ];

    const fn fixed(version: u8, level: u8) -> Self {
        Self { version, level: Some(level) }
    }

    /// Create a partition, rejecting versions outside 1..=2 and levels outside 1..=3
    pub fn new(version: u8, level: Option<u8>) -> Result<Self> {
        let version_ok = (1..=2).contains(&version);
        let level_ok = level.map_or(true, |l| (1..=3).contains(&l));
        if version_ok && level_ok {
            Ok(Self { version, level })
        } else {
            Err(WaporError::InvalidPartition { version, level })
        }
    }

    /// Build a partition from caller hints.
    ///
    /// Only a complete, in-range pair counts as a hint; anything else means
    /// the caller wants the catalog searched.
    pub fn from_hints(version: Option<u8>, level: Option<u8>) -> Option<Self> {
        match (version, level) {
            (Some(v), Some(l)) => Self::new(v, Some(l)).ok(),
            _ => None,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn level(&self) -> Option<u8> {
        self.level
    }

    /// Workspace code used in catalog and query URLs
    pub fn workspace_code(&self) -> &'static str {
        match self.version {
            1 => "WAPOR",
            _ => "WAPOR_2",
        }
    }

    /// Catalog tag selecting the resolution level, e.g. `L2`
    pub fn level_tag(&self) -> Option<String> {
        self.level.map(|l| format!("L{}", l))
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self { version: 2, level: None }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{}.L{}", self.workspace_code(), level),
            None => write!(f, "{}", self.workspace_code()),
        }
    }
}
