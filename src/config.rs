//! Settings for new canvases, stored as JSON or in the eframe app storage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::brush::{Brush, BrushShape};
use crate::color::Color;
use crate::command::DEFAULT_HISTORY_LIMIT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    /// Undo entries kept before the oldest is dropped
    pub history_limit: usize,
    pub brush_size: u32,
    pub brush_shape: BrushShape,
    /// Fill for the bottom layer of new documents; transparent if unset
    pub background: Option<Color>,
    /// Name given to the palette of new documents
    pub palette_name: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            frame_count: 1,
            history_limit: DEFAULT_HISTORY_LIMIT,
            brush_size: 1,
            brush_shape: BrushShape::Square,
            background: None,
            palette_name: "Default".to_owned(),
        }
    }
}

impl CanvasConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: CanvasConfig = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{}",
                self.width, self.height
            )));
        }
        if self.frame_count == 0 {
            return Err(ConfigError::Invalid("frame count 0".to_owned()));
        }
        Ok(())
    }

    /// The brush new sessions start with
    pub fn brush(&self) -> Brush {
        Brush::new(self.brush_shape.clone(), self.brush_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{ "width": 16 }"#).unwrap();
        assert_eq!(config.width, 16);
        assert_eq!(config.height, CanvasConfig::default().height);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_save_and_load() {
        let path = env::temp_dir().join(format!("canvas_config_{}.json", Uuid::new_v4()));
        let config = CanvasConfig {
            width: 32,
            brush_shape: BrushShape::Circle,
            brush_size: 5,
            background: Some(Color::WHITE),
            ..CanvasConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = CanvasConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.brush().size(), 5);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let config = CanvasConfig {
            height: 0,
            ..CanvasConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
