use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CellError;
use crate::types::{ForkSide, Row};

/// Cell configuration. Durations are milliseconds on the wire, like every
/// other timing field in this codebase.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Lowest addressable shaft row (row 0 is the park bay, never addressable).
    pub row_min: Row,
    /// Highest addressable shaft row.
    pub row_max: Row,
    /// Nominal engine move duration. The fault deadline is twice this.
    pub engine_move_ms: u64,
    /// Nominal fork move duration. The fault deadline is twice this.
    pub fork_move_ms: u64,
    /// Supervisor must toggle `xWatchDog` at least once per window.
    pub watchdog_window_ms: u64,
    /// Cell supervisor tick cadence.
    pub tick_period_ms: u64,
    /// Side the tray racks are mounted on.
    pub tray_side: ForkSide,
    /// Leave Idle for Ready automatically after init.
    pub auto_start: bool,
    /// Bounded runtime event log capacity.
    pub event_log_capacity: usize,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            row_min: 1,
            row_max: 20,
            engine_move_ms: 2_000,
            fork_move_ms: 1_000,
            watchdog_window_ms: 5_000,
            tick_period_ms: 50,
            tray_side: ForkSide::Left,
            auto_start: true,
            event_log_capacity: 1_024,
        }
    }
}

impl CellConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, CellError> {
        let cfg: CellConfig =
            serde_yaml::from_str(raw).map_err(|e| CellError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CellError> {
        if self.row_min < 1 {
            return Err(CellError::InvalidConfig(
                "row_min must be at least 1 (row 0 is the park bay)".into(),
            ));
        }
        if self.row_max < self.row_min {
            return Err(CellError::InvalidConfig(format!(
                "row_max {} below row_min {}",
                self.row_max, self.row_min
            )));
        }
        if self.engine_move_ms == 0 || self.fork_move_ms == 0 {
            return Err(CellError::InvalidConfig(
                "motion durations must be nonzero".into(),
            ));
        }
        if self.tick_period_ms == 0 {
            return Err(CellError::InvalidConfig("tick period must be nonzero".into()));
        }
        if self.tray_side == ForkSide::Middle {
            return Err(CellError::InvalidConfig(
                "tray_side must be Left or Right".into(),
            ));
        }
        Ok(())
    }

    pub fn row_range(&self) -> RangeInclusive<Row> {
        self.row_min..=self.row_max
    }

    pub fn engine_move_duration(&self) -> Duration {
        Duration::from_millis(self.engine_move_ms)
    }

    pub fn fork_move_duration(&self) -> Duration {
        Duration::from_millis(self.fork_move_ms)
    }

    pub fn watchdog_window(&self) -> Duration {
        Duration::from_millis(self.watchdog_window_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CellConfig::default().validate().unwrap();
    }

    #[test]
    fn yaml_overrides_merge_onto_defaults() {
        let cfg = CellConfig::from_yaml_str("row_max: 42\ntray_side: Right\n").unwrap();
        assert_eq!(cfg.row_max, 42);
        assert_eq!(cfg.tray_side, ForkSide::Right);
        assert_eq!(cfg.engine_move_ms, 2_000);
    }

    #[test]
    fn park_row_is_not_configurable() {
        let err = CellConfig::from_yaml_str("row_min: 0\n").unwrap_err();
        assert!(err.to_string().contains("park"));
    }
}
