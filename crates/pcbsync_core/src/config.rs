//! Applier configuration.
//!
//! # Responsibility
//! - Hold host constants used when creating shapes and mapping layers.
//! - Load overrides from TOML files.
//!
//! # Invariants
//! - `stroke_width` is positive.
//! - Front and back copper layers are distinct; index `0` is a valid layer.

use crate::board::LayerId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Host `Edge_Cuts` layer index.
pub const DEFAULT_EDGE_LAYER: LayerId = 44;
/// Stroke width for new drawings, in board units (0.1 mm).
pub const DEFAULT_STROKE_WIDTH: i64 = 100_000;
/// Host `F_Cu` layer index.
pub const DEFAULT_FRONT_LAYER: LayerId = 0;
/// Host `B_Cu` layer index.
pub const DEFAULT_BACK_LAYER: LayerId = 31;

/// Symbolic footprint side stored in the shadow model for the front layer.
pub const SIDE_TOP: &str = "Top";
/// Symbolic footprint side stored in the shadow model for the back layer.
pub const SIDE_BOTTOM: &str = "Bot";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Host constants used by the diff applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplierConfig {
    /// Layer that receives newly added drawings.
    pub edge_layer: LayerId,
    /// Stroke width of newly added drawings.
    pub stroke_width: i64,
    /// Layer index for footprint side `Top`.
    pub front_layer: LayerId,
    /// Layer index for footprint side `Bot`.
    pub back_layer: LayerId,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            edge_layer: DEFAULT_EDGE_LAYER,
            stroke_width: DEFAULT_STROKE_WIDTH,
            front_layer: DEFAULT_FRONT_LAYER,
            back_layer: DEFAULT_BACK_LAYER,
        }
    }
}

impl ApplierConfig {
    /// Parses TOML; missing keys fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stroke_width <= 0 {
            return Err(ConfigError::Invalid(format!(
                "stroke_width must be positive, got {}",
                self.stroke_width
            )));
        }
        if self.front_layer == self.back_layer {
            return Err(ConfigError::Invalid(format!(
                "front_layer and back_layer must differ, both are {}",
                self.front_layer
            )));
        }
        Ok(())
    }

    /// Maps a symbolic side (`Top` / `Bot`) to a layer index.
    pub fn layer_for_side(&self, side: &str) -> Option<LayerId> {
        match side {
            SIDE_TOP => Some(self.front_layer),
            SIDE_BOTTOM => Some(self.back_layer),
            _ => None,
        }
    }

    /// Symbolic side of a layer: `Bot` for the back layer, `Top` otherwise.
    pub fn side_for_layer(&self, layer: LayerId) -> &'static str {
        if layer == self.back_layer {
            SIDE_BOTTOM
        } else {
            SIDE_TOP
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplierConfig, ConfigError};

    #[test]
    fn layer_zero_is_a_valid_side_mapping() {
        let config = ApplierConfig::default();
        assert_eq!(config.layer_for_side("Top"), Some(0));
        assert_eq!(config.layer_for_side("Bot"), Some(31));
        assert_eq!(config.layer_for_side("Inner1"), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ApplierConfig::from_toml_str("stroke_width = 50000\n").expect("valid toml");
        assert_eq!(config.stroke_width, 50_000);
        assert_eq!(config.edge_layer, 44);
    }

    #[test]
    fn rejects_identical_sides() {
        let err = ApplierConfig::from_toml_str("front_layer = 3\nback_layer = 3\n")
            .expect_err("same layers must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
