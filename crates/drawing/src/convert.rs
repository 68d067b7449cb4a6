use crate::error::ConvertError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Settings for the external DWG to DXF converters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ConverterConfig {
    /// ODA File Converter executable; skipped when unset.
    pub oda_path: Option<PathBuf>,
    /// DXF version passed to the ODA converter.
    pub oda_output_version: String,
    /// LibreDWG `dwg2dxf` command, looked up on PATH when not absolute.
    pub dwg2dxf_command: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            oda_path: None,
            oda_output_version: "ACAD2013".to_string(),
            dwg2dxf_command: Some("dwg2dxf".to_string()),
        }
    }
}

/// Converts DWG files to DXF by shelling out to ODA File Converter or LibreDWG.
#[derive(Debug, Clone, Default)]
pub struct DwgConverter {
    config: ConverterConfig,
}

impl DwgConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert `input` into `output`, trying each configured converter in turn.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ConvertError> {
        if !input.exists() {
            return Err(ConvertError::MissingInput(input.to_path_buf()));
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tried = Vec::new();
        let mut last_error = None;

        if let Some(oda) = &self.config.oda_path {
            tried.push("ODA File Converter");
            match self.convert_with_oda(oda, input, output) {
                Ok(()) => return Ok(output.to_path_buf()),
                Err(e) => {
                    warn!("ODA conversion of {} failed: {}", input.display(), e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(command) = &self.config.dwg2dxf_command {
            tried.push("dwg2dxf");
            match self.convert_with_dwg2dxf(command, input, output) {
                Ok(()) => return Ok(output.to_path_buf()),
                Err(e) => {
                    warn!("dwg2dxf conversion of {} failed: {}", input.display(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Err(ConvertError::NoConverter(tried.join(", "))),
        }
    }

    /// ODA converts whole directories, so the input is staged alone in a temp dir.
    fn convert_with_oda(&self, oda: &Path, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let file_name = input
            .file_name()
            .ok_or_else(|| ConvertError::Failed(format!("Invalid input path: {}", input.display())))?;

        let staging = tempfile::tempdir()?;
        let in_dir = staging.path().join("in");
        let out_dir = staging.path().join("out");
        fs::create_dir_all(&in_dir)?;
        fs::create_dir_all(&out_dir)?;
        fs::copy(input, in_dir.join(file_name))?;

        let mut cmd = Command::new(oda);
        cmd.arg(&in_dir)
            .arg(&out_dir)
            .arg(&self.config.oda_output_version)
            .args(["DXF", "0", "0", "*.DWG"]);
        debug!("Running {:?}", cmd);

        let status = cmd
            .output()
            .map_err(|e| ConvertError::Failed(format!("Cannot start {}: {}", oda.display(), e)))?;
        if !status.status.success() {
            return Err(ConvertError::Failed(format!(
                "ODA File Converter exited with {}: {}",
                status.status,
                String::from_utf8_lossy(&status.stderr).trim()
            )));
        }

        let produced = fs::read_dir(&out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| has_extension(path, "dxf"))
            .ok_or_else(|| ConvertError::Failed("ODA File Converter produced no DXF file".to_string()))?;

        fs::copy(&produced, output)?;
        info!("Converted {} with ODA File Converter", input.display());
        Ok(())
    }

    fn convert_with_dwg2dxf(&self, command: &str, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let mut cmd = Command::new(command);
        cmd.arg(input).arg("-o").arg(output);
        debug!("Running {:?}", cmd);

        let status = cmd
            .output()
            .map_err(|e| ConvertError::Failed(format!("Cannot start {}: {}", command, e)))?;
        if !status.status.success() {
            return Err(ConvertError::Failed(format!(
                "dwg2dxf exited with {}: {}",
                status.status,
                String::from_utf8_lossy(&status.stderr).trim()
            )));
        }
        if !output.exists() {
            return Err(ConvertError::Failed(format!(
                "dwg2dxf reported success but {} is missing",
                output.display()
            )));
        }

        info!("Converted {} with dwg2dxf", input.display());
        Ok(())
    }
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_reported() {
        let converter = DwgConverter::default();
        let result = converter.convert(Path::new("/nonexistent/plan.dwg"), Path::new("/tmp/plan.dxf"));
        assert!(matches!(result, Err(ConvertError::MissingInput(_))));
    }

    #[test]
    fn test_no_converter_configured() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let input = dir.path().join("plan.dwg");
        fs::write(&input, b"not really a dwg").expect("Should write input");

        let converter = DwgConverter::new(ConverterConfig {
            oda_path: None,
            dwg2dxf_command: None,
            ..ConverterConfig::default()
        });
        let result = converter.convert(&input, &dir.path().join("plan.dxf"));
        assert!(matches!(result, Err(ConvertError::NoConverter(_))));
    }

    #[test]
    fn test_failing_converter_surfaces_error() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let input = dir.path().join("plan.dwg");
        fs::write(&input, b"not really a dwg").expect("Should write input");

        let converter = DwgConverter::new(ConverterConfig {
            oda_path: None,
            dwg2dxf_command: Some("definitely-not-a-real-dwg2dxf".to_string()),
            ..ConverterConfig::default()
        });
        let result = converter.convert(&input, &dir.path().join("plan.dxf"));
        assert!(matches!(result, Err(ConvertError::Failed(_))));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(has_extension(Path::new("a/PLAN.DXF"), "dxf"));
        assert!(!has_extension(Path::new("a/plan.dwg"), "dxf"));
    }
}
