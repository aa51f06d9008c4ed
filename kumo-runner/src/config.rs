//! Serializable pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kumo_core::domain::CalendarUnit;
use kumo_core::indicators::IchimokuParams;
use kumo_core::synthetic::WalkParams;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce a synthetic run.
///
/// ```toml
/// unit = "minute"
/// bar_count = 480
///
/// [walk]
/// start = "2010-01-01T09:00:00"
/// initial_price = 100.0
/// annual_drift_pct = 0.0
/// annual_volatility_pct = 20.0
/// interval_ms = 20
/// seed = 42
///
/// [ichimoku]
/// tenkan = 9
/// kijun = 26
/// senkou_b = 52
/// displacement = 26
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Unit of the bars handed to the indicator engine.
    pub unit: CalendarUnit,
    /// Number of closed unit bars to pull from the chain.
    pub bar_count: usize,
    /// Tick source parameters.
    pub walk: WalkParams,
    pub ichimoku: IchimokuParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit: CalendarUnit::Minute,
            bar_count: 8 * 60,
            walk: WalkParams::default(),
            ichimoku: IchimokuParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject parameters the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bar_count == 0 {
            return Err(ConfigError::Invalid("bar_count must be positive".into()));
        }
        let IchimokuParams {
            tenkan,
            kijun,
            senkou_b,
            ..
        } = self.ichimoku;
        if tenkan == 0 || kijun == 0 || senkou_b == 0 {
            return Err(ConfigError::Invalid(format!(
                "ichimoku windows must be positive \
                 (tenkan={tenkan}, kijun={kijun}, senkou_b={senkou_b})"
            )));
        }
        if self.walk.interval_ms == 0 {
            return Err(ConfigError::Invalid("walk.interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs have the same id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
