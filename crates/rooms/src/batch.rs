use crate::{error::Result, pipeline::Pipeline, types::ExtentsSource};
use drawing::DwgConverter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const GEOJSON_FILE: &str = "rooms.geojson";
pub const REPORT_FILE: &str = "report.json";

/// One successfully processed drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub room_count: usize,
    pub extents_source: ExtentsSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: Vec<DocumentOutcome>,
    pub failed: Vec<DocumentFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Runs the pipeline over many drawings, one after the other.
pub struct BatchRunner {
    pipeline: Pipeline,
    converter: DwgConverter,
    output_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(pipeline: Pipeline, converter: DwgConverter, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            converter,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Supported drawings directly inside `dir`, sorted by file name.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut inputs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && drawing::is_supported(&path) {
                inputs.push(path);
            }
        }
        inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(inputs)
    }

    pub fn run_directory<P: AsRef<Path>>(&self, dir: P) -> Result<BatchSummary> {
        let inputs = Self::discover(dir)?;
        Ok(self.run(&inputs))
    }

    /// Failures are recorded in the summary and never stop the batch.
    pub fn run(&self, inputs: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (i, input) in inputs.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, inputs.len(), input.display());
            match self.process_one(input) {
                Ok(outcome) => summary.succeeded.push(outcome),
                Err(e) => {
                    error!("Failed to process {}: {}", input.display(), e);
                    summary.failed.push(DocumentFailure {
                        input: input.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            "Batch finished: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
        summary
    }

    /// Writes `<output>/<stem>/rooms.geojson` and `report.json`.
    pub fn process_one(&self, input: &Path) -> Result<DocumentOutcome> {
        let result = self.pipeline.process_file(input, &self.converter)?;

        let stem = input.file_stem().unwrap_or_default();
        let output_dir = self.output_dir.join(stem);
        fs::create_dir_all(&output_dir)?;
        result.save_geojson(output_dir.join(GEOJSON_FILE))?;
        result.save_report(output_dir.join(REPORT_FILE))?;

        Ok(DocumentOutcome {
            input: input.to_path_buf(),
            output_dir,
            room_count: result.rooms.len(),
            extents_source: result.extents_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::{Document, Entity, LayerRecord};

    fn write_plan(dir: &Path, name: &str) {
        let document = Document::new(
            vec![LayerRecord::new("WALL")],
            vec![Entity::lw_polyline(
                "WALL",
                [(0.0, 0.0), (8.0, 0.0), (8.0, 6.0), (0.0, 6.0)],
                true,
            )],
        );
        fs::write(dir.join(name), document.to_json().expect("Should serialize")).expect("Should write");
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let input = tempfile::tempdir().expect("Should create temp dir");
        let output = tempfile::tempdir().expect("Should create temp dir");
        write_plan(input.path(), "b_plan.json");
        fs::write(input.path().join("a_broken.json"), "not json").expect("Should write");
        fs::write(input.path().join("notes.txt"), "ignored").expect("Should write");

        let runner = BatchRunner::new(Pipeline::default(), DwgConverter::default(), output.path());
        let summary = runner.run_directory(input.path()).expect("Should run");

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].input.ends_with("a_broken.json"));
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.succeeded[0].room_count, 1);

        let plan_dir = output.path().join("b_plan");
        assert!(plan_dir.join(GEOJSON_FILE).exists());
        assert!(plan_dir.join(REPORT_FILE).exists());
    }

    #[test]
    fn test_discover_sorts_by_name() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        for name in ["c.dxf", "a.json", "b.dwg", "d.pdf"] {
            fs::write(dir.path().join(name), "").expect("Should write");
        }
        let names: Vec<String> = BatchRunner::discover(dir.path())
            .expect("Should list")
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, ["a.json", "b.dwg", "c.dxf"]);
    }
}
