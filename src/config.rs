//! Tree construction settings.

use serde::{Deserialize, Serialize};

use crate::{Result, TreeError};

/// Parameters for building a [`Quadtree`](crate::Quadtree).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TreeConfig {
    /// Width of the root region, starting at x = 0.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Height of the root region, starting at y = 0.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Leaf capacity before a split.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
    /// Deepest level a split may create. Zero keeps the root a leaf.
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    600.0
}

fn default_max_entities() -> usize {
    10
}

fn default_max_depth() -> u16 {
    4
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_entities: default_max_entities(),
            max_depth: default_max_depth(),
        }
    }
}

impl TreeConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TreeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(TreeError::InvalidConfig(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(TreeError::InvalidConfig(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let config = TreeConfig::from_toml_str("max_entities = 2").unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.max_entities, 2);
        assert_eq!(config.max_depth, 4);
    }

    #[test]
    fn full_document() {
        let config = TreeConfig::from_toml_str(
            "width = 1024.0\nheight = 512.0\nmax_entities = 16\nmax_depth = 6\n",
        )
        .unwrap();
        assert_eq!(
            config,
            TreeConfig {
                width: 1024.0,
                height: 512.0,
                max_entities: 16,
                max_depth: 6,
            }
        );
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            TreeConfig::from_toml_str("width = -5.0"),
            Err(TreeError::InvalidConfig(_))
        ));
        assert!(matches!(
            TreeConfig::from_toml_str("height = 0.0"),
            Err(TreeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TreeConfig::from_toml_str("width = \"wide\""),
            Err(TreeError::ConfigParse(_))
        ));
    }
}
