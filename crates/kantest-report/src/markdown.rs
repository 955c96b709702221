use kantest_core::outcome::TestSummary;
use kantest_core::rules::RuleValidation;

use crate::text::NO_DATA;

/// Format the per-spec summary as Markdown, e.g. for a CI job summary.
pub fn format_summary(summary: &TestSummary) -> String {
    let mut out = String::new();

    out.push_str("# Test Summary by Spec\n\n");

    if summary.is_empty() {
        out.push_str(&format!("_{NO_DATA}_\n"));
        return out;
    }

    out.push_str("| Spec | Tests | Passing | Failing | Skipped | Other |\n");
    out.push_str("|------|------:|--------:|--------:|--------:|------:|\n");
    for (spec, stats) in &summary.groups {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} |\n",
            spec.replace('|', "\\|"),
            stats.total,
            stats.passed,
            stats.failed,
            stats.skipped,
            stats.other,
        ));
    }

    let t = &summary.totals;
    let icon = if summary.passed() { "✅" } else { "❌" };
    out.push_str(&format!(
        "| **{icon} {}** | **{}** | **{}** | **{}** | **{}** | **{}** |\n",
        summary.banner(),
        t.total,
        t.passed,
        t.failed,
        t.skipped,
        t.other,
    ));

    out
}

/// Format a rule verification result as Markdown.
pub fn format_rule_validation(validation: &RuleValidation) -> String {
    let mut out = String::from("## Rule Verification\n\n");
    if validation.is_ok() {
        out.push_str(&format!(
            "All {} expected rule(s) triggered cleanly.\n",
            validation.checked
        ));
        return out;
    }
    for finding in &validation.findings {
        out.push_str(&format!("- {finding}\n"));
    }
    out
}
