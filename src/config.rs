//! # Engine configuration
//!
//! Read from TOML, with every field defaulted so that an empty document
//! is a valid configuration:
//!
//! ```toml
//! [clock]
//! default_time_limit = 600
//! allowed_time_limits = [180, 300, 600, 900, 1800]
//! tick_interval_ms = 1000
//!
//! [rules]
//! forbid_self_check = false
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub rules: Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Seconds on each player's clock when none is requested.
    pub default_time_limit: u32,
    /// Time limits a room may be created with. Empty allows any
    /// non-zero value.
    pub allowed_time_limits: Vec<u32>,
    /// Period of the clock driver, in milliseconds. One tick removes one
    /// second from the running clock.
    pub tick_interval_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            default_time_limit: 600,
            allowed_time_limits: vec![180, 300, 600, 900, 1800],
            tick_interval_ms: 1000,
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Accept a requested limit, falling back to the default.
    pub fn time_limit(&self, requested: Option<u32>) -> Result<u32> {
        let secs = requested.unwrap_or(self.default_time_limit);
        if secs == 0
            || !(self.allowed_time_limits.is_empty() || self.allowed_time_limits.contains(&secs))
        {
            return Err(ChessError::InvalidTimeLimit(secs));
        }
        Ok(secs)
    }
}

/// Rule variations a session is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Reject moves that leave the mover's own king attacked. Off by
    /// default, in which case only the opponent's position is evaluated.
    pub forbid_self_check: bool,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let res: Self = toml::from_str(s)?;
        // The default itself must be playable.
        res.clock.time_limit(None)?;
        Ok(res)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[test]
fn empty_document_is_default() {
    let cfg = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.clock.time_limit(None).unwrap(), 600);
    assert_eq!(cfg.clock.tick_interval(), Duration::from_secs(1));
    assert!(!cfg.rules.forbid_self_check);
}

#[test]
fn partial_document() {
    let cfg = EngineConfig::from_toml_str(
        r#"
        [clock]
        default_time_limit = 5
        allowed_time_limits = []

        [rules]
        forbid_self_check = true
        "#,
    )
    .unwrap();
    assert_eq!(cfg.clock.tick_interval_ms, 1000);
    assert_eq!(cfg.clock.time_limit(Some(7)).unwrap(), 7);
    assert!(cfg.rules.forbid_self_check);
}

#[test]
fn rejected_time_limits() {
    let clock = ClockConfig::default();
    assert!(matches!(
        clock.time_limit(Some(0)),
        Err(ChessError::InvalidTimeLimit(0))
    ));
    assert!(matches!(
        clock.time_limit(Some(61)),
        Err(ChessError::InvalidTimeLimit(61))
    ));
    assert_eq!(clock.time_limit(Some(180)).unwrap(), 180);

    assert!(matches!(
        EngineConfig::from_toml_str("[clock]\ndefault_time_limit = 42"),
        Err(ChessError::InvalidTimeLimit(42))
    ));
    assert!(matches!(
        EngineConfig::from_toml_str("[clock]\nbogus = 1"),
        Err(ChessError::Config(_))
    ));
}
