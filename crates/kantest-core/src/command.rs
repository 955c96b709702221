//! Builders that turn test intent into argument vectors for the tool.
//!
//! Every builder validates its inputs before returning; nothing here spawns
//! a process. The result is a [`BuiltCommand`] whose arguments are passed
//! positionally, so paths and credentials containing spaces need no quoting.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::types::{DependencyScope, ExtraOptions, Listing, RunMode};

const REDACTED: &str = "********";

/// Already-resolved locations the builders depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPaths {
    /// The tool binary.
    pub cli_path: Option<PathBuf>,
    /// Root of the test project; bare application names resolve under
    /// `<project_path>/data/applications`.
    pub project_path: PathBuf,
    /// Default `--output` directory for analysis runs.
    pub report_output_path: PathBuf,
}

impl ToolPaths {
    pub fn new(
        cli_path: impl Into<PathBuf>,
        project_path: impl Into<PathBuf>,
        report_output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cli_path: Some(cli_path.into()),
            project_path: project_path.into(),
            report_output_path: report_output_path.into(),
        }
    }

    pub fn applications_dir(&self) -> PathBuf {
        self.project_path.join("data").join("applications")
    }

    fn cli(&self) -> HarnessResult<&Path> {
        match self.cli_path.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => Ok(p),
            _ => Err(HarnessError::invalid("tool path is not configured")),
        }
    }

    fn default_output(&self) -> HarnessResult<&Path> {
        if self.report_output_path.as_os_str().is_empty() {
            return Err(HarnessError::invalid(
                "report output path is not configured",
            ));
        }
        Ok(self.report_output_path.as_path())
    }
}

/// A validated, ready-to-run invocation of the tool.
#[derive(Clone, PartialEq, Eq)]
pub struct BuiltCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Non-fatal notices raised while building, e.g. insecure transport.
    pub warnings: Vec<String>,
    secret_positions: Vec<usize>,
}

impl BuiltCommand {
    fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
            warnings: Vec::new(),
            secret_positions: Vec::new(),
        }
    }

    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn path_arg(&mut self, path: &Path) -> &mut Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    fn secret_arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.secret_positions.push(self.args.len());
        self.arg(arg)
    }

    fn options(&mut self, options: &ExtraOptions) -> &mut Self {
        self.args.extend(options.render());
        self
    }

    fn insecure(&mut self) -> &mut Self {
        self.arg("--insecure");
        let msg = "insecure transport enabled: TLS certificate verification is skipped";
        warn!("{msg}");
        self.warnings.push(msg.to_string());
        self
    }

    fn finish(self) -> BuiltCommand {
        debug!(command = %self, "built tool command");
        self
    }

    /// Arguments with credential values replaced by a placeholder.
    pub fn redacted_args(&self) -> Vec<String> {
        self.args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if self.secret_positions.contains(&i) {
                    REDACTED.to_string()
                } else {
                    a.clone()
                }
            })
            .collect()
    }

    pub fn contains_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Convert into a process ready to spawn. Spawning and waiting are the
    /// caller's business.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Debug for BuiltCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltCommand")
            .field("program", &self.program)
            .field("args", &self.redacted_args())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

/// Renders a line that can be pasted into a POSIX shell.
impl fmt::Display for BuiltCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_positions.contains(&i) {
                write!(f, " {REDACTED}")?;
            } else {
                write!(f, " {}", quote(arg))?;
            }
        }
        Ok(())
    }
}

fn needs_quoting(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '\'' | '"' | '\\' | '$' | '`' | ';' | '&' | '|' | '<' | '>' | '(' | ')' | '*' | '?'
                | '[' | ']' | '{' | '}' | '#' | '~' | '!'
        )
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(needs_quoting) {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

fn require<'a>(value: &'a str, what: &str) -> HarnessResult<&'a str> {
    if value.trim().is_empty() {
        return Err(HarnessError::invalid(format!("{what} is required")));
    }
    Ok(value)
}

fn require_path(path: &Path, what: &str) -> HarnessResult<()> {
    if path.as_os_str().is_empty() {
        return Err(HarnessError::invalid(format!("{what} is required")));
    }
    if !path.exists() {
        return Err(HarnessError::invalid(format!(
            "{what} `{}` does not exist",
            path.display()
        )));
    }
    Ok(())
}

/// Resolve an application binary: absolute paths are used as given, bare
/// names are looked up under the fixtures directory.
pub fn resolve_binary(paths: &ToolPaths, binary: &str) -> HarnessResult<PathBuf> {
    let binary = require(binary, "binary path")?;
    let candidate = Path::new(binary);
    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        paths.applications_dir().join(candidate)
    };
    if !resolved.exists() {
        return Err(HarnessError::invalid(format!(
            "input application `{}` does not exist",
            resolved.display()
        )));
    }
    Ok(resolved)
}

fn default_true() -> bool {
    true
}

/// Parameters of an `analyze` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub binary: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub mode: RunMode,
    /// Overrides the configured report output directory.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub maven_settings: Option<PathBuf>,
    #[serde(default)]
    pub dependency_scope: DependencyScope,
    #[serde(default)]
    pub options: ExtraOptions,
}

impl AnalysisRequest {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }
}

pub fn build_analysis_command(
    paths: &ToolPaths,
    req: &AnalysisRequest,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    let binary = resolve_binary(paths, &req.binary)?;
    let output = match req.output.as_deref() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => paths.default_output()?,
    };

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("analyze")
        .arg(req.mode.flag())
        .arg("--input")
        .path_arg(&binary)
        .arg("--output")
        .path_arg(output);

    for source in &req.sources {
        cmd.arg("--source").arg(source.to_lowercase());
    }
    for target in &req.targets {
        cmd.arg("--target").arg(target.to_lowercase());
    }
    if let Some(settings) = req.maven_settings.as_deref() {
        cmd.arg("--maven-settings").path_arg(settings);
    }
    if req.dependency_scope == DependencyScope::SourceOnly {
        cmd.arg("-m").arg("source-only");
    }
    cmd.options(&req.options);
    Ok(cmd.finish())
}

/// `analyze --list-languages` against an application.
pub fn build_discovery_command(
    paths: &ToolPaths,
    binary: &str,
    options: &ExtraOptions,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    let binary = resolve_binary(paths, binary)?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("analyze")
        .arg("--list-languages")
        .arg("--input")
        .path_arg(&binary)
        .options(options);
    Ok(cmd.finish())
}

/// `analyze --list-targets|--list-sources|--list-providers`.
pub fn build_listing_command(paths: &ToolPaths, listing: Listing) -> HarnessResult<BuiltCommand> {
    let mut cmd = BuiltCommand::new(paths.cli()?);
    cmd.arg("analyze").arg(listing.flag());
    Ok(cmd.finish())
}

/// Analysis that relies on a profile found on disk instead of explicit
/// sources and targets.
pub fn build_profile_analysis_command(
    paths: &ToolPaths,
    binary: &str,
    profile_dir: Option<&Path>,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    let binary = resolve_binary(paths, binary)?;
    let output = paths.default_output()?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("analyze")
        .arg(RunMode::Overwrite.flag())
        .arg("--input")
        .path_arg(&binary)
        .arg("--output")
        .path_arg(output);
    if let Some(dir) = profile_dir {
        require_path(dir, "profile directory")?;
        cmd.arg("--profile-dir").path_arg(dir);
    }
    Ok(cmd.finish())
}

/// Parameters of a live Cloud Foundry discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDiscoveryRequest {
    pub organizations: Vec<String>,
    /// Directory holding `.cf/config.json`.
    pub config_dir: PathBuf,
    #[serde(default)]
    pub spaces: Vec<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub options: ExtraOptions,
}

pub fn build_platform_discovery_command(
    paths: &ToolPaths,
    req: &PlatformDiscoveryRequest,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    if req.organizations.iter().all(|o| o.trim().is_empty()) {
        return Err(HarnessError::invalid(
            "at least one organization is required",
        ));
    }
    require_path(&req.config_dir, "config directory")?;
    let cf_config = req.config_dir.join(".cf").join("config.json");
    if !cf_config.is_file() {
        return Err(HarnessError::invalid(format!(
            "config directory `{}` has no .cf/config.json",
            req.config_dir.display()
        )));
    }

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("discover")
        .arg("cloud-foundry")
        .arg("--use-live-connection");
    for org in req.organizations.iter().filter(|o| !o.trim().is_empty()) {
        cmd.arg(format!("--orgs={org}"));
    }
    cmd.arg(format!("--cf-config={}", req.config_dir.display()));
    for space in req.spaces.iter().filter(|s| !s.trim().is_empty()) {
        cmd.arg(format!("--spaces={space}"));
    }
    if let Some(app) = req.app_name.as_deref().filter(|a| !a.is_empty()) {
        cmd.arg(format!("--app-name={app}"));
    }
    if let Some(dir) = req.output_dir.as_deref() {
        cmd.arg(format!("--output-dir={}", dir.display()));
    }
    cmd.options(&req.options);
    Ok(cmd.finish())
}

/// Parameters of a `generate helm` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetGenerationRequest {
    pub input_file: PathBuf,
    pub chart_dir: PathBuf,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub options: ExtraOptions,
}

pub fn build_asset_generation_command(
    paths: &ToolPaths,
    req: &AssetGenerationRequest,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    require_path(&req.input_file, "input file")?;
    require_path(&req.chart_dir, "chart directory")?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("generate")
        .arg("helm")
        .arg(format!("--input={}", req.input_file.display()))
        .arg(format!("--chart-dir={}", req.chart_dir.display()));
    if let Some(dir) = req.output_dir.as_deref() {
        cmd.arg(format!("--output-dir={}", dir.display()));
    }
    cmd.options(&req.options);
    Ok(cmd.finish())
}

/// Credentials for logging into the hub's central configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub hub_url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("hub_url", &self.hub_url)
            .field("username", &REDACTED)
            .field("password", &REDACTED)
            .field("secure", &self.secure)
            .finish()
    }
}

pub fn build_central_config_login_command(
    paths: &ToolPaths,
    req: &LoginRequest,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    let hub_url = require(&req.hub_url, "hub url")?;
    let username = require(&req.username, "username")?;
    let password = require(&req.password, "password")?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("config")
        .arg("login")
        .arg(hub_url)
        .arg("--username")
        .secret_arg(username)
        .arg("--password")
        .secret_arg(password);
    if !req.secure {
        cmd.insecure();
    }
    Ok(cmd.finish())
}

/// Pull profile bundles for an application from the hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub app_url: String,
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub secure: bool,
}

pub fn build_central_config_sync_command(
    paths: &ToolPaths,
    req: &SyncRequest,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    let app_url = require(&req.app_url, "application url")?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("config").arg("sync").arg("--url").arg(app_url);
    if let Some(path) = req.profile_path.as_deref() {
        cmd.arg("--application-path").path_arg(path);
    }
    if !req.secure {
        cmd.insecure();
    }
    Ok(cmd.finish())
}

/// `config list --profile-dir <dir>`.
pub fn build_config_list_command(
    paths: &ToolPaths,
    profile_dir: &Path,
) -> HarnessResult<BuiltCommand> {
    let cli = paths.cli()?;
    require_path(profile_dir, "profile directory")?;

    let mut cmd = BuiltCommand::new(cli);
    cmd.arg("config")
        .arg("list")
        .arg("--profile-dir")
        .path_arg(profile_dir);
    Ok(cmd.finish())
}
