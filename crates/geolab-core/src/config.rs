//! Pipeline configuration, loaded from JSON.
//!
//! Every field has a default, so `{}` is a valid config file and callers
//! (the CLI) can override single values after loading.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::error::ConfigError;
use crate::export::ExportOptions;
use crate::render::RenderOptions;
use crate::schema::InputMode;
use crate::ternary::classify::DEFAULT_TOLERANCE;
use crate::ternary::fields::{FieldScheme, FieldTable, FieldTableSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Declared input schema. `None` infers it from the columns.
    pub mode: Option<InputMode>,
    /// Built-in field table.
    pub scheme: FieldScheme,
    /// Custom field table JSON; takes precedence over `scheme`.
    pub field_table: Option<PathBuf>,
    pub boundary_tolerance: f64,
    pub render: RenderOptions,
    pub export: ExportOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: None,
            scheme: FieldScheme::Dickinson1983,
            field_table: None,
            boundary_tolerance: DEFAULT_TOLERANCE,
            render: RenderOptions::default(),
            export: ExportOptions::default(),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidOption {
                name,
                reason: reason.to_string(),
            })
        };

        if !self.boundary_tolerance.is_finite() || self.boundary_tolerance < 0.0 {
            return invalid("boundary_tolerance", "must be a finite, non-negative distance");
        }
        let r = &self.render;
        if !(r.grid_interval > 0.0 && r.grid_interval <= 50.0) {
            return invalid("render.grid_interval", "must be in (0, 50] percent");
        }
        if r.width < 64 || r.height < 64 {
            return invalid("render.width/height", "must be at least 64 pixels");
        }
        if !(0.0..=1.0).contains(&r.field_alpha) {
            return invalid("render.field_alpha", "must be in [0, 1]");
        }
        if r.marker_radius.is_nan() || r.marker_radius <= 0.0 {
            return invalid("render.marker_radius", "must be positive");
        }
        if self.export.precision.is_some_and(|p| p > 15) {
            return invalid("export.precision", "at most 15 decimal places");
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            mode: self.mode,
            boundary_tolerance: self.boundary_tolerance,
        }
    }

    /// The active field table: the custom file when set, else the built-in scheme.
    pub fn field_table(&self) -> Result<Cow<'static, FieldTable>, ConfigError> {
        match &self.field_table {
            None => Ok(Cow::Borrowed(self.scheme.table())),
            Some(path) => {
                let text = read(path)?;
                let spec: FieldTableSpec = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Cow::Owned(FieldTable::from_spec(spec)?))
            }
        }
    }
}
