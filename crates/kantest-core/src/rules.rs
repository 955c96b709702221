//! Checks that the rules a test expected to fire actually fired.
//!
//! Every expected rule is evaluated independently and every problem is
//! collected; the combined result only turns into an error at the end, so
//! one broken rule never hides another.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::artifacts::read_structured;
use crate::error::{HarnessError, HarnessResult};

/// One ruleset record of an analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Rule id to violation detail. `None` when the key is absent.
    #[serde(default)]
    pub violations: Option<Map<String, Value>>,
    #[serde(default)]
    pub skipped: Vec<Value>,
    #[serde(default)]
    pub unmatched: Vec<Value>,
}

impl Ruleset {
    pub fn has_violation(&self, rule_id: &str) -> bool {
        self.violations
            .as_ref()
            .is_some_and(|v| v.contains_key(rule_id))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReportShape {
    Wrapped {
        #[serde(default)]
        rulesets: Vec<Ruleset>,
    },
    Bare(Vec<Ruleset>),
}

/// The tool's structured analysis output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReportShape")]
pub struct AnalysisReport {
    pub rulesets: Vec<Ruleset>,
}

impl From<ReportShape> for AnalysisReport {
    fn from(shape: ReportShape) -> Self {
        match shape {
            ReportShape::Wrapped { rulesets } | ReportShape::Bare(rulesets) => Self { rulesets },
        }
    }
}

impl AnalysisReport {
    /// Load `output.json` or `output.yaml`; the format follows the extension.
    /// Accepts both `{"rulesets": [...]}` and a bare list of rulesets.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        read_structured(path)
    }

    /// First ruleset whose violations include `rule_id`.
    pub fn ruleset_for_rule(&self, rule_id: &str) -> Option<&Ruleset> {
        self.rulesets.iter().find(|r| r.has_violation(rule_id))
    }

    pub fn ruleset_by_description(&self, description: &str) -> Option<&Ruleset> {
        self.rulesets
            .iter()
            .find(|r| r.description.as_deref() == Some(description))
    }
}

/// What went wrong for a single expected rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    RulesetNotFound,
    Skipped(Vec<String>),
    Unmatched { entries: Vec<String>, expected: usize },
    NoViolations,
    RuleNotTriggered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFinding {
    pub rule_id: String,
    pub kind: FindingKind,
}

impl fmt::Display for RuleFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error for rule ID '{}': ", self.rule_id)?;
        match &self.kind {
            FindingKind::RulesetNotFound => write!(f, "Ruleset not found in output."),
            FindingKind::Skipped(entries) => {
                write!(f, "Rule was skipped. Skipped rules: [{}]", entries.join(", "))
            }
            FindingKind::Unmatched { entries, expected } => write!(
                f,
                "Rule was unmatched. Unmatched rules: [{}]. Expected unmatched: {expected}",
                entries.join(", ")
            ),
            FindingKind::NoViolations => write!(f, "Ruleset didn't trigger any violation."),
            FindingKind::RuleNotTriggered => {
                write!(f, "Ruleset triggered no violations for this rule ID.")
            }
        }
    }
}

/// Accumulated outcome of checking a list of expected rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleValidation {
    pub checked: usize,
    pub findings: Vec<RuleFinding>,
}

impl RuleValidation {
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// Rule ids with at least one finding, in check order, without repeats.
    pub fn failed_rules(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for f in &self.findings {
            if !out.contains(&f.rule_id.as_str()) {
                out.push(&f.rule_id);
            }
        }
        out
    }

    pub fn message(&self) -> String {
        let mut out = String::from("The following rule validation errors occurred:");
        for f in &self.findings {
            out.push('\n');
            out.push_str(&f.to_string());
        }
        out
    }

    pub fn into_result(self) -> HarnessResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(HarnessError::Validation(self.message()))
        }
    }
}

fn render_entries(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

fn check_rule(report: &AnalysisReport, rule_id: &str, expected_unmatched: usize) -> Vec<FindingKind> {
    let Some(ruleset) = report.ruleset_for_rule(rule_id) else {
        return vec![FindingKind::RulesetNotFound];
    };

    let mut kinds = Vec::new();
    if !ruleset.skipped.is_empty() {
        kinds.push(FindingKind::Skipped(render_entries(&ruleset.skipped)));
    }
    if ruleset.unmatched.len() != expected_unmatched {
        kinds.push(FindingKind::Unmatched {
            entries: render_entries(&ruleset.unmatched),
            expected: expected_unmatched,
        });
    }
    match &ruleset.violations {
        None => kinds.push(FindingKind::NoViolations),
        Some(v) if !v.contains_key(rule_id) => kinds.push(FindingKind::RuleNotTriggered),
        Some(_) => {}
    }
    kinds
}

/// Check every expected rule and collect all findings.
pub fn check_triggered_rules<S: AsRef<str>>(
    report: &AnalysisReport,
    rule_ids: &[S],
    expected_unmatched: usize,
) -> RuleValidation {
    let mut validation = RuleValidation::default();
    for rule_id in rule_ids {
        let rule_id = rule_id.as_ref();
        let kinds = check_rule(report, rule_id, expected_unmatched);
        debug!(rule_id, findings = kinds.len(), "checked expected rule");
        validation
            .findings
            .extend(kinds.into_iter().map(|kind| RuleFinding {
                rule_id: rule_id.to_string(),
                kind,
            }));
        validation.checked += 1;
    }
    validation
}

/// Like [`check_triggered_rules`], but fails with one combined
/// [`HarnessError::Validation`] listing every finding.
pub fn verify_triggered_rules<S: AsRef<str>>(
    report: &AnalysisReport,
    rule_ids: &[S],
    expected_unmatched: usize,
) -> HarnessResult<()> {
    check_triggered_rules(report, rule_ids, expected_unmatched).into_result()
}
