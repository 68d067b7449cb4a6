use drawing::ConverterConfig;
use rooms::ExtractionConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("rooms_output")
}

/// Everything a CLI run needs: engine thresholds, converter settings and
/// where to write results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            converter: ConverterConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub min_area_percent: Option<f64>,
    pub max_area_percent: Option<f64>,
    pub image_size: Option<u32>,
    pub oda_path: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save RunConfig to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save RunConfig to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        let raster = &mut self.extraction.raster;
        if let Some(percent) = overrides.min_area_percent {
            raster.min_area_percent = percent;
        }
        if let Some(percent) = overrides.max_area_percent {
            raster.max_area_percent = percent;
        }
        if let Some(size) = overrides.image_size {
            raster.image_size = size;
        }
        if let Some(dir) = overrides.debug_dir {
            raster.debug_dir = Some(dir);
        }
        if let Some(path) = overrides.oda_path {
            self.converter.oda_path = Some(path);
        }
    }

    /// JSON schema of the configuration file.
    pub fn schema() -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&schemars::schema_for!(RunConfig))?)
    }
}
