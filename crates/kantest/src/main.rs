use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use kantest_core::artifacts::{collect_manifests, ReportOutputs};
use kantest_core::config::{Config, CONFIG_FILE};
use kantest_core::outcome::{TestRunReport, TestSummary};
use kantest_core::plan::TestPlan;
use kantest_core::rules::{check_triggered_rules, AnalysisReport};

use kantest_report::{json, markdown, text, OutputFormat};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_HARNESS_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "kantest")]
#[command(about = "Build tool invocations, verify analysis reports, and summarize test runs")]
#[command(version)]
struct Cli {
    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log at debug level, including every built command (credentials redacted)
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a test-runner JSON report per spec file; exits 1 if any test failed
    Summary {
        /// JSON report (defaults to the configured report, test-results/report.json)
        report: Option<PathBuf>,
        /// Output format: text, json, or markdown
        #[arg(long, default_value = "text")]
        format: String,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check that expected rules fired in an analysis report; exits 1 otherwise
    VerifyRules {
        /// output.yaml / output.json, or the analysis output directory
        report: PathBuf,
        /// Rule id expected to have produced a violation (repeatable)
        #[arg(short, long = "rule", required = true)]
        rules: Vec<String>,
        /// Number of unmatched rules a ruleset may carry on purpose
        #[arg(long, default_value_t = 0)]
        expected_unmatched: usize,
        /// Output format: text, json, or markdown
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Build every case of a TOML test plan and print the commands
    Plan {
        /// Plan file
        plan: PathBuf,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Inspect what an analysis or discovery run left behind
    Artifacts {
        /// Output directory of the run
        dir: PathBuf,
        /// Exit 1 when no generated *.yaml manifest is present
        #[arg(long)]
        require_manifests: bool,
    },
    /// Create a default .kantest.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    init_color();

    let result = match cli.command {
        Commands::Summary {
            report,
            format,
            config,
        } => cmd_summary(report, &format, config.as_deref()),
        Commands::VerifyRules {
            report,
            rules,
            expected_unmatched,
            format,
        } => cmd_verify_rules(&report, &rules, expected_unmatched, &format),
        Commands::Plan {
            plan,
            format,
            config,
        } => cmd_plan(&plan, &format, config.as_deref()),
        Commands::Artifacts {
            dir,
            require_manifests,
        } => cmd_artifacts(&dir, require_manifests),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_HARNESS_ERROR);
        }
    }
}

/// Initialize tracing based on CLI flags; `RUST_LOG` takes precedence.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("logging initialized at level {level}");
}

fn init_color() {
    let term = std::env::var("TERM").ok();
    if !text::should_colorize(std::io::stdout().is_terminal(), term.as_deref()) {
        colored::control::set_override(false);
    }
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    s.parse::<OutputFormat>().map_err(anyhow::Error::msg)
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = match config_path {
        Some(p) => Config::load(p)?,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            Config::load_or_default(&cwd)
        }
    };
    Ok(config.with_process_env())
}

fn cmd_summary(report: Option<PathBuf>, format: &str, config_path: Option<&Path>) -> Result<i32> {
    let format = parse_format(format)?;
    let report_path = match report {
        Some(p) => p,
        None => load_config(config_path)?.summary.report,
    };
    info!("reading test report {}", report_path.display());

    let report = TestRunReport::load(&report_path)?;
    let summary = TestSummary::from_report(&report);

    let out = match format {
        OutputFormat::Text => text::format_summary(&summary),
        OutputFormat::Json => json::format_summary(&summary, false) + "\n",
        OutputFormat::Markdown => markdown::format_summary(&summary),
    };
    print!("{out}");

    Ok(summary.exit_code())
}

fn cmd_verify_rules(
    report: &Path,
    rules: &[String],
    expected_unmatched: usize,
    format: &str,
) -> Result<i32> {
    let format = parse_format(format)?;
    let report_path = if report.is_dir() {
        ReportOutputs::new(report).output_yaml()
    } else {
        report.to_path_buf()
    };
    info!("verifying {} rule(s) in {}", rules.len(), report_path.display());

    let analysis = AnalysisReport::load(&report_path)?;
    let validation = check_triggered_rules(&analysis, rules, expected_unmatched);

    let (out, passed) = match format {
        OutputFormat::Text => text::format_rule_validation(&validation),
        OutputFormat::Json => {
            let (s, passed) = json::format_rule_validation(&validation, false);
            (s + "\n", passed)
        }
        OutputFormat::Markdown => (
            markdown::format_rule_validation(&validation),
            validation.is_ok(),
        ),
    };
    print!("{out}");

    Ok(if passed { EXIT_SUCCESS } else { EXIT_FAILED })
}

fn cmd_plan(plan_path: &Path, format: &str, config_path: Option<&Path>) -> Result<i32> {
    let format = parse_format(format)?;
    let config = load_config(config_path)?;
    let paths = config.tool_paths();
    let plan = TestPlan::load(plan_path)?;

    let mut built = Vec::with_capacity(plan.cases.len());
    for case in &plan.cases {
        let cmd = case
            .command
            .build(&paths)
            .with_context(|| format!("case '{}' is invalid", case.name))?;
        built.push((case, cmd));
    }

    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = built
                .iter()
                .map(|(case, cmd)| {
                    serde_json::json!({
                        "name": case.name,
                        "subcommand": case.command.subcommand().to_string(),
                        "program": cmd.program.to_string_lossy(),
                        "args": cmd.redacted_args(),
                        "warnings": cmd.warnings,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            for (case, cmd) in &built {
                println!("{}: {cmd}", case.name);
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_artifacts(dir: &Path, require_manifests: bool) -> Result<i32> {
    let outputs = ReportOutputs::new(dir);
    let checks = [
        ("static report", outputs.static_report_index()),
        ("output", outputs.output_yaml()),
        ("analysis log", outputs.analysis_log()),
    ];
    for (label, path) in &checks {
        let state = if path.exists() { "present" } else { "missing" };
        println!("{label}: {state} ({})", path.display());
    }

    let manifests = collect_manifests(dir)?;
    println!("manifests: {}", manifests.len());
    for m in &manifests {
        println!("  {}", m.display());
    }

    if require_manifests && manifests.is_empty() {
        eprintln!("No generated manifest found in {}", dir.display());
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_init(force: bool) -> Result<i32> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(EXIT_SUCCESS)
}
