use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::ToolPaths;

pub const CONFIG_FILE: &str = ".kantest.toml";

pub const ENV_CLI_PATH: &str = "KANTRA_CLI_PATH";
pub const ENV_PROJECT_PATH: &str = "PROJECT_PATH";
pub const ENV_REPORT_OUTPUT_PATH: &str = "REPORT_OUTPUT_PATH";

/// Top-level configuration from `.kantest.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// The tool under test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub cli_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_project_path")]
    pub project_path: PathBuf,
    #[serde(default = "default_report_output_path")]
    pub report_output_path: PathBuf,
}

fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_report_output_path() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_path: default_project_path(),
            report_output_path: default_report_output_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Test-runner JSON report read by `kantest summary`.
    #[serde(default = "default_summary_report")]
    pub report: PathBuf,
}

fn default_summary_report() -> PathBuf {
    PathBuf::from("test-results/report.json")
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            report: default_summary_report(),
        }
    }
}

impl Config {
    /// Load configuration from a `.kantest.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `kantest init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.kantest.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(
                            "failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Apply `KANTRA_CLI_PATH`, `PROJECT_PATH` and `REPORT_OUTPUT_PATH`
    /// from `lookup`. Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_CLI_PATH) {
            self.tool.cli_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_PROJECT_PATH) {
            self.paths.project_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_REPORT_OUTPUT_PATH) {
            self.paths.report_output_path = PathBuf::from(v);
        }
        self
    }

    /// Overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Paths handed to the command builders. Relative report paths are
    /// resolved against the project path.
    pub fn tool_paths(&self) -> ToolPaths {
        let report = if self.paths.report_output_path.is_absolute() {
            self.paths.report_output_path.clone()
        } else {
            self.paths.project_path.join(&self.paths.report_output_path)
        };
        ToolPaths {
            cli_path: self.tool.cli_path.clone(),
            project_path: self.paths.project_path.clone(),
            report_output_path: report,
        }
    }

    /// Generate default TOML content for `kantest init`.
    pub fn default_toml() -> String {
        r#"# kantest - harness configuration

[tool]
# Binary of the tool under test (KANTRA_CLI_PATH overrides this)
# cli_path = "/usr/local/bin/kantra"

[paths]
# Applications given by bare name resolve under <project_path>/data/applications
project_path = "."
# Default --output directory for analysis runs
report_output_path = "output"

[summary]
# Test-runner JSON report read by `kantest summary`
report = "test-results/report.json"
"#
        .to_string()
    }
}
