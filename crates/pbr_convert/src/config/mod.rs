//! Configuration system
//!
//! Converter settings can be loaded from TOML or RON files. Missing fields
//! fall back to [`ConverterConfig::default`].

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
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

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Converter Configuration
///
/// Controls the optional parts of a metallic/roughness conversion run. The
/// numeric mapping itself is fixed and not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Dispose textures left without any material reference after conversion
    pub dispose_orphans: bool,
    /// Store generated textures as PNG bytes instead of raw RGBA pixels
    pub encode_png: bool,
    /// Suffix appended to the source texture name for the specular texture
    pub specular_suffix: String,
    /// Suffix appended to the source texture name for the metal-rough texture
    pub metal_rough_suffix: String,
}

impl ConverterConfig {
    /// Enable or disable orphan texture disposal
    pub fn with_dispose_orphans(mut self, enabled: bool) -> Self {
        self.dispose_orphans = enabled;
        self
    }

    /// Enable or disable PNG encoding of generated textures
    pub fn with_encode_png(mut self, enabled: bool) -> Self {
        self.encode_png = enabled;
        self
    }

    /// Set the name suffixes used for generated textures
    pub fn with_suffixes(mut self, specular: impl Into<String>, metal_rough: impl Into<String>) -> Self {
        self.specular_suffix = specular.into();
        self.metal_rough_suffix = metal_rough.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.specular_suffix.is_empty() || self.metal_rough_suffix.is_empty() {
            return Err(ConfigError::Invalid("texture name suffixes cannot be empty".to_string()));
        }

        if self.specular_suffix == self.metal_rough_suffix {
            return Err(ConfigError::Invalid(format!(
                "specular and metal-rough suffixes must differ (both '{}')",
                self.specular_suffix
            )));
        }

        Ok(())
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            dispose_orphans: true,
            encode_png: false,
            specular_suffix: "_specular".to_string(),
            metal_rough_suffix: "_metallic_roughness".to_string(),
        }
    }
}

impl Config for ConverterConfig {}
