//! Declarative test cases: one [`CommandSpec`] per invocation, loadable
//! from a TOML plan file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::command::{
    build_analysis_command, build_asset_generation_command, build_central_config_login_command,
    build_central_config_sync_command, build_config_list_command, build_discovery_command,
    build_listing_command, build_platform_discovery_command, build_profile_analysis_command,
    AnalysisRequest, AssetGenerationRequest, BuiltCommand, LoginRequest,
    PlatformDiscoveryRequest, SyncRequest, ToolPaths,
};
use crate::error::HarnessResult;
use crate::types::{ExtraOptions, Listing, Subcommand};

/// One invocation of the tool, described by intent rather than argv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subcommand", rename_all = "kebab-case")]
pub enum CommandSpec {
    Analyze(AnalysisRequest),
    ListLanguages {
        binary: String,
        #[serde(default)]
        options: ExtraOptions,
    },
    List {
        listing: Listing,
    },
    ProfileAnalysis {
        binary: String,
        #[serde(default)]
        profile_dir: Option<PathBuf>,
    },
    Discover(PlatformDiscoveryRequest),
    Generate(AssetGenerationRequest),
    ConfigLogin(LoginRequest),
    ConfigSync(SyncRequest),
    ConfigList {
        profile_dir: PathBuf,
    },
}

impl CommandSpec {
    pub fn subcommand(&self) -> Subcommand {
        match self {
            CommandSpec::Analyze(_)
            | CommandSpec::ListLanguages { .. }
            | CommandSpec::List { .. }
            | CommandSpec::ProfileAnalysis { .. } => Subcommand::Analyze,
            CommandSpec::Discover(_) => Subcommand::Discover,
            CommandSpec::Generate(_) => Subcommand::Generate,
            CommandSpec::ConfigLogin(_) => Subcommand::ConfigLogin,
            CommandSpec::ConfigSync(_) => Subcommand::ConfigSync,
            CommandSpec::ConfigList { .. } => Subcommand::ConfigList,
        }
    }

    /// Validate and build the argv for this spec.
    pub fn build(&self, paths: &ToolPaths) -> HarnessResult<BuiltCommand> {
        match self {
            CommandSpec::Analyze(req) => build_analysis_command(paths, req),
            CommandSpec::ListLanguages { binary, options } => {
                build_discovery_command(paths, binary, options)
            }
            CommandSpec::List { listing } => build_listing_command(paths, *listing),
            CommandSpec::ProfileAnalysis {
                binary,
                profile_dir,
            } => build_profile_analysis_command(paths, binary, profile_dir.as_deref()),
            CommandSpec::Discover(req) => build_platform_discovery_command(paths, req),
            CommandSpec::Generate(req) => build_asset_generation_command(paths, req),
            CommandSpec::ConfigLogin(req) => build_central_config_login_command(paths, req),
            CommandSpec::ConfigSync(req) => build_central_config_sync_command(paths, req),
            CommandSpec::ConfigList { profile_dir } => build_config_list_command(paths, profile_dir),
        }
    }
}

/// A named case in a plan file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCase {
    pub name: String,
    #[serde(flatten)]
    pub command: CommandSpec,
}

/// A list of cases read from TOML:
///
/// ```toml
/// [[case]]
/// name = "skip static report"
/// subcommand = "analyze"
/// binary = "jee-example-app-1.0.0.ear"
/// targets = ["eap8"]
/// options = [{ name = "skip-static-report" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    #[serde(default, rename = "case")]
    pub cases: Vec<PlanCase>,
}

impl TestPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file '{}'", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse '{}'", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
