//! Backend configuration
//!
//! Loaded from TOML (every field optional), then adjusted by `LUMEN_*` environment
//! variables, then validated by the backend factory before anything is created.
//!
//! ```toml
//! handle_capacity = 128
//! dpi_override = 2.0
//!
//! [gpu]
//! max_draws_per_frame = 4096
//! power_preference = "high"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GfxError, Result};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Initial registry capacity
    pub handle_capacity: usize,
    /// Initial command buffer capacity for retained windows
    pub command_buffer_capacity: usize,
    /// Emit a debug event per backend operation
    pub enable_logging: bool,
    /// Replaces the host-reported DPI scale when set
    pub dpi_override: Option<f32>,
    /// Replay textures through cached native views instead of the raster fallback
    pub native_textures: bool,
    /// Default window mode for backends that support both
    pub retained: bool,
    pub gpu: GpuConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            handle_capacity: 64,
            command_buffer_capacity: 64,
            enable_logging: true,
            dpi_override: None,
            native_textures: true,
            retained: true,
            gpu: GpuConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GpuConfig {
    /// Initial per-frame draw slots; grows on demand
    pub max_draws_per_frame: usize,
    /// `"low"` or `"high"`
    pub power_preference: String,
    /// `"fifo"`, `"immediate"` or `"mailbox"`
    pub present_mode: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            max_draws_per_frame: 1024,
            power_preference: "high".to_string(),
            present_mode: "fifo".to_string(),
        }
    }
}

fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
}

impl BackendConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|err| GfxError::InvalidArgument(format!("backend config: {err}")))
    }

    /// Apply `LUMEN_DPI_OVERRIDE`, `LUMEN_ENABLE_LOGGING` and `LUMEN_GPU_MAX_DRAWS`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dpi) = env_value::<f32>("LUMEN_DPI_OVERRIDE") {
            self.dpi_override = Some(dpi);
        }
        if let Some(enabled) = env_value::<bool>("LUMEN_ENABLE_LOGGING") {
            self.enable_logging = enabled;
        }
        if let Some(draws) = env_value::<usize>("LUMEN_GPU_MAX_DRAWS") {
            self.gpu.max_draws_per_frame = draws;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.handle_capacity == 0 {
            return Err(GfxError::Range("handle_capacity must be >= 1".into()));
        }
        if self.command_buffer_capacity == 0 {
            return Err(GfxError::Range("command_buffer_capacity must be >= 1".into()));
        }
        if let Some(dpi) = self.dpi_override {
            if dpi.is_nan() || dpi <= 0.0 {
                return Err(GfxError::Range(format!("dpi_override {dpi} must be > 0")));
            }
        }
        self.gpu.validate()
    }
}

impl GpuConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_draws_per_frame == 0 {
            return Err(GfxError::Range("gpu.max_draws_per_frame must be >= 1".into()));
        }
        if !matches!(self.power_preference.as_str(), "low" | "high") {
            return Err(GfxError::InvalidArgument(format!(
                "unknown power preference {:?}",
                self.power_preference
            )));
        }
        if !matches!(self.present_mode.as_str(), "fifo" | "immediate" | "mailbox") {
            return Err(GfxError::InvalidArgument(format!(
                "unknown present mode {:?}",
                self.present_mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BackendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.handle_capacity, 64);
        assert!(config.native_textures);
    }

    #[test]
    fn test_partial_toml() {
        let config = BackendConfig::from_toml_str(
            r#"
            dpi_override = 2.0
            retained = false

            [gpu]
            power_preference = "low"
            "#,
        )
        .unwrap();
        assert_eq!(config.dpi_override, Some(2.0));
        assert!(!config.retained);
        assert_eq!(config.gpu.power_preference, "low");
        assert_eq!(config.gpu.max_draws_per_frame, 1024);
        assert_eq!(config.command_buffer_capacity, 64);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            BackendConfig::from_toml_str("handle_capacity = \"lots\""),
            Err(GfxError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let config = BackendConfig {
            handle_capacity: 0,
            ..BackendConfig::default()
        };
        assert!(matches!(config.validate(), Err(GfxError::Range(_))));

        let config = BackendConfig {
            dpi_override: Some(-1.0),
            ..BackendConfig::default()
        };
        assert!(matches!(config.validate(), Err(GfxError::Range(_))));

        let mut config = BackendConfig::default();
        config.gpu.present_mode = "vsync".into();
        assert!(matches!(
            config.validate(),
            Err(GfxError::InvalidArgument(_))
        ));
    }
}
