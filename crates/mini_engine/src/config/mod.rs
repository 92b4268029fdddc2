//! Configuration system
//!
//! Configuration files are TOML or RON, chosen by file extension.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Settings for [`SceneLoader`](crate::scene::SceneLoader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory that relative mesh filenames are resolved against.
    ///
    /// `None` resolves them against the directory of the scene file (or the
    /// working directory for scenes parsed from memory).
    pub asset_root: Option<PathBuf>,

    /// Run [`SceneGraph::initialize`](crate::scene::SceneGraph::initialize)
    /// before returning the loaded scene
    pub initialize_on_load: bool,

    /// Maximum element nesting depth below the root
    pub max_depth: usize,

    /// Reject unknown XML attributes on property entries instead of ignoring them
    pub strict_attributes: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            initialize_on_load: false,
            max_depth: 64,
            strict_attributes: false,
        }
    }
}

impl Config for LoaderConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_config_from_toml() {
        let config: LoaderConfig = toml::from_str(
            r#"
            asset_root = "assets/meshes"
            initialize_on_load = true
            "#,
        )
        .unwrap();

        assert_eq!(config.asset_root, Some(PathBuf::from("assets/meshes")));
        assert!(config.initialize_on_load);
        assert_eq!(config.max_depth, 64);
        assert!(!config.strict_attributes);
    }

    #[test]
    fn test_loader_config_from_ron() {
        let config: LoaderConfig = ron::from_str("(max_depth: 4, strict_attributes: true)").unwrap();
        assert_eq!(config.max_depth, 4);
        assert!(config.strict_attributes);
        assert_eq!(config.asset_root, None);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let path = std::env::temp_dir().join(format!("mini_engine_loader_{}.toml", std::process::id()));
        let config = LoaderConfig {
            asset_root: Some(PathBuf::from("meshes")),
            initialize_on_load: true,
            max_depth: 8,
            strict_attributes: true,
        };

        config.save_to_file(&path).unwrap();
        let loaded = LoaderConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = LoaderConfig::default().save_to_file("loader.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
