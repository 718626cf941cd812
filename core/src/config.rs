//! Typed engine configuration (§6): loaded from a JSON file plus environment
//! overrides, validated at the boundary. No nested untyped maps reach
//! business logic past this module (§9 design note on dynamic config).

use chrono::NaiveTime;
use engine_markets::{InstrumentSpec, SessionWindow, Symbol};
use engine_trader::Mode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, path::Path};

use crate::error::FatalConfigError;

/// Per-index (P1/P2/P3) stop/target/trail policy, mirroring the spec's
/// position policy table (§4.5). `entry_condition` is informational here;
/// the scanner's ladder gate (`engine_strategies::policy`) encodes the same
/// defaults and is the source of truth for the running engine, matching the
/// spec's configuration option `position[i].*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionConfig {
    pub stop_loss_pct: Decimal,
    pub target_pct: Option<Decimal>,
    pub trail_pct: Decimal,
    pub entry_condition_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub mode: Mode,
    /// Explicit universe; in a deployed config this is typically resolved
    /// from an external instruments manifest file, loaded separately and
    /// passed to [`EngineConfig::validate`] as `instruments`.
    pub universe: Vec<Symbol>,
    pub total_capital: Decimal,
    pub capital_per_position: Decimal,
    pub max_positions: usize,
    pub scan_interval_seconds: u64,
    pub min_rank_final_threshold: Decimal,
    pub accel_weight: Decimal,
    pub positions: [PositionConfig; 3],
    pub cooldown_seconds: i64,
    pub anti_flip_pct: Decimal,
    pub debounce_seconds: i64,
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
    pub broker_timeout_seconds: u64,
    /// `[AMBIENT]` human|json, outside the spec's named feature list.
    pub log_format: LogFormat,
    /// `[AMBIENT]` base directory for the sqlite/candle persistence path.
    pub data_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Human,
    Json,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Paper,
            universe: Vec::new(),
            total_capital: dec!(150000),
            capital_per_position: dec!(3000),
            max_positions: 50,
            scan_interval_seconds: 60,
            min_rank_final_threshold: dec!(2.5),
            accel_weight: dec!(0.3),
            positions: [
                PositionConfig {
                    stop_loss_pct: dec!(-0.025),
                    target_pct: Some(dec!(0.05)),
                    trail_pct: dec!(0.025),
                    entry_condition_pct: None,
                },
                PositionConfig {
                    stop_loss_pct: dec!(-0.025),
                    target_pct: None,
                    trail_pct: dec!(0.001),
                    entry_condition_pct: Some(dec!(0.25)),
                },
                PositionConfig {
                    stop_loss_pct: dec!(-0.05),
                    target_pct: None,
                    trail_pct: dec!(0.001),
                    entry_condition_pct: Some(dec!(1.0)),
                },
            ],
            cooldown_seconds: 180,
            anti_flip_pct: dec!(0.0025),
            debounce_seconds: 5,
            session_start: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            session_end: NaiveTime::from_hms_opt(15, 30, 0).expect("valid time"),
            broker_timeout_seconds: 5,
            log_format: LogFormat::Human,
            data_dir: "./data".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads from a JSON file at `path`, then applies environment overrides
    /// via [`EngineConfig::apply_env_overrides`]. Refuses to start
    /// (`FatalConfigError`) on a missing/malformed file or a failed
    /// [`EngineConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FatalConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|error| {
            FatalConfigError::new(format!(
                "cannot read config file {}: {error}",
                path.as_ref().display()
            ))
        })?;
        let mut config: EngineConfig = serde_json::from_str(&raw)
            .map_err(|error| FatalConfigError::new(format!("invalid config JSON: {error}")))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `ENGINE_MODE=paper|live` is the only override recognized from the
    /// environment; every other option is deliberately file-only so a
    /// misremembered env var can't silently flip engine behavior.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(mode) = env::var("ENGINE_MODE") {
            match mode.to_lowercase().as_str() {
                "paper" => self.mode = Mode::Paper,
                "live" => self.mode = Mode::Live,
                _ => {}
            }
        }
    }

    /// Boundary validation (§7 `FatalConfigError`): catches the
    /// configuration mistakes that would otherwise surface as confusing
    /// runtime errors deep in the scanner or trailing worker.
    pub fn validate(&self) -> Result<(), FatalConfigError> {
        if self.universe.is_empty() {
            return Err(FatalConfigError::new("universe must not be empty"));
        }
        if self.capital_per_position <= Decimal::ZERO {
            return Err(FatalConfigError::new("capital_per_position must be positive"));
        }
        if self.total_capital < self.capital_per_position {
            return Err(FatalConfigError::new(
                "total_capital must be at least capital_per_position",
            ));
        }
        if self.max_positions == 0 {
            return Err(FatalConfigError::new("max_positions must be positive"));
        }
        if self.scan_interval_seconds == 0 {
            return Err(FatalConfigError::new("scan_interval_seconds must be positive"));
        }
        if self.cooldown_seconds < 0 {
            return Err(FatalConfigError::new("cooldown_seconds must not be negative"));
        }
        if self.session_start >= self.session_end {
            return Err(FatalConfigError::new("session_start must precede session_end"));
        }
        Ok(())
    }

    pub fn session(&self) -> SessionWindow {
        SessionWindow::new(self.session_start, self.session_end)
    }
}

/// Loads the fixed Symbol/InstrumentToken universe (§3) from a JSON manifest
/// file: a list of [`InstrumentSpec`] values.
pub fn load_instrument_specs(
    path: impl AsRef<Path>,
) -> Result<HashMap<Symbol, InstrumentSpec>, FatalConfigError> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|error| {
        FatalConfigError::new(format!(
            "cannot read instrument manifest {}: {error}",
            path.as_ref().display()
        ))
    })?;
    let specs: Vec<InstrumentSpec> = serde_json::from_str(&raw)
        .map_err(|error| FatalConfigError::new(format!("invalid instrument manifest JSON: {error}")))?;
    Ok(specs.into_iter().map(|spec| (spec.symbol.clone(), spec)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_invalid_without_a_universe() {
        let config = EngineConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_total_capital_below_per_position() {
        let mut config = EngineConfig::default();
        config.universe.push(Symbol::new("X"));
        config.total_capital = dec!(100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_a_reasonable_config() {
        let mut config = EngineConfig::default();
        config.universe.push(Symbol::new("X"));
        assert!(config.validate().is_ok());
    }
}
