use serde::Serialize;

use kantest_core::outcome::{GroupStats, TestSummary};
use kantest_core::rules::RuleValidation;

#[derive(Debug, Serialize)]
struct GroupOutput<'a> {
    spec: &'a str,
    #[serde(flatten)]
    stats: &'a GroupStats,
}

/// Machine-readable summary with pass/fail metadata.
#[derive(Debug, Serialize)]
pub struct SummaryOutput<'a> {
    groups: Vec<GroupOutput<'a>>,
    totals: &'a GroupStats,
    pub passed: bool,
    pub no_data: bool,
    pub exit_code: i32,
}

impl<'a> SummaryOutput<'a> {
    pub fn new(summary: &'a TestSummary) -> Self {
        Self {
            groups: summary
                .groups
                .iter()
                .map(|(spec, stats)| GroupOutput { spec, stats })
                .collect(),
            totals: &summary.totals,
            passed: summary.passed(),
            no_data: summary.is_empty(),
            exit_code: summary.exit_code(),
        }
    }
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(value).expect("summary output should be serializable")
    } else {
        serde_json::to_string_pretty(value).expect("summary output should be serializable")
    }
}

/// Format a test summary as JSON.
pub fn format_summary(summary: &TestSummary, compact: bool) -> String {
    to_json(&SummaryOutput::new(summary), compact)
}

#[derive(Debug, Serialize)]
struct FindingOutput<'a> {
    rule_id: &'a str,
    message: String,
}

#[derive(Debug, Serialize)]
struct RuleValidationOutput<'a> {
    passed: bool,
    checked: usize,
    failed_rules: Vec<&'a str>,
    findings: Vec<FindingOutput<'a>>,
}

/// Format a rule verification result as JSON. Returns (json_string, passed).
pub fn format_rule_validation(validation: &RuleValidation, compact: bool) -> (String, bool) {
    let passed = validation.is_ok();
    let output = RuleValidationOutput {
        passed,
        checked: validation.checked,
        failed_rules: validation.failed_rules(),
        findings: validation
            .findings
            .iter()
            .map(|f| FindingOutput {
                rule_id: &f.rule_id,
                message: f.to_string(),
            })
            .collect(),
    };
    (to_json(&output, compact), passed)
}
