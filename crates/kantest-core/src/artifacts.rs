//! Files the tool leaves behind after a run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::error::{HarnessError, HarnessResult};

/// Read a JSON or YAML document; `.yaml`/`.yml` select YAML, anything
/// else is parsed as JSON.
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> HarnessResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| HarnessError::ReportRead {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let parsed: std::result::Result<T, String> = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| HarnessError::ReportParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Known locations inside an analysis output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutputs {
    pub root: PathBuf,
}

impl ReportOutputs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn static_report_index(&self) -> PathBuf {
        self.root.join("static-report").join("index.html")
    }

    pub fn output_yaml(&self) -> PathBuf {
        self.root.join("output.yaml")
    }

    pub fn analysis_log(&self) -> PathBuf {
        self.root.join("analysis.log")
    }

    pub fn has_static_report(&self) -> bool {
        self.static_report_index().is_file()
    }
}

/// Generated `*.yaml` manifests directly under `dir`, sorted by path.
/// A missing directory yields an empty list.
pub fn collect_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = dir.join("*.yaml");
    let pattern = pattern.to_string_lossy();
    let mut found: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid manifest pattern '{pattern}'"))?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .collect();
    found.sort();
    Ok(found)
}
