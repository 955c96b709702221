use colored::{ColoredString, Colorize};

use kantest_core::outcome::{GroupStats, TestSummary};
use kantest_core::rules::RuleValidation;

const HEADERS: [&str; 6] = ["Spec", "Tests", "Passing", "Failing", "Skipped", "Other"];

pub const NO_DATA: &str = "No test data found in JSON report.";

/// Colour only when writing to a terminal that is not `TERM=dumb`.
pub fn should_colorize(is_terminal: bool, term: Option<&str>) -> bool {
    is_terminal && term != Some("dumb")
}

#[derive(Clone, Copy)]
enum Style {
    Plain,
    Green,
    Red,
    BoldGreen,
    BoldRed,
}

struct Cell {
    text: String,
    style: Style,
    numeric: bool,
}

impl Cell {
    fn text(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            numeric: false,
        }
    }

    fn num(n: usize, style: Style) -> Self {
        Self {
            text: n.to_string(),
            style,
            numeric: true,
        }
    }

    /// Pad first so escape codes never count towards the width.
    fn render(&self, width: usize) -> String {
        let padded = if self.numeric {
            format!("{:>width$}", self.text)
        } else {
            format!("{:<width$}", self.text)
        };
        paint(&padded, self.style).to_string()
    }
}

fn paint(s: &str, style: Style) -> ColoredString {
    match style {
        Style::Plain => s.normal(),
        Style::Green => s.green(),
        Style::Red => s.red(),
        Style::BoldGreen => s.green().bold(),
        Style::BoldRed => s.red().bold(),
    }
}

fn group_row(spec: &str, stats: &GroupStats) -> Vec<Cell> {
    let passed_style = if stats.passed > 0 { Style::Green } else { Style::Plain };
    let failed_style = if stats.failed > 0 { Style::Red } else { Style::Plain };
    vec![
        Cell::text(spec, Style::Plain),
        Cell::num(stats.total, Style::Plain),
        Cell::num(stats.passed, passed_style),
        Cell::num(stats.failed, failed_style),
        Cell::num(stats.skipped, Style::Plain),
        Cell::num(stats.other, Style::Plain),
    ]
}

fn summary_row(summary: &TestSummary) -> Vec<Cell> {
    let totals = &summary.totals;
    let label = if summary.passed() {
        Cell::text(format!("✓ {}", summary.banner()), Style::BoldGreen)
    } else {
        Cell::text(format!("✗ {}", summary.banner()), Style::BoldRed)
    };
    vec![
        label,
        Cell::num(totals.total, Style::Plain),
        Cell::num(totals.passed, Style::Green),
        Cell::num(totals.failed, Style::Red),
        Cell::num(totals.skipped, Style::Plain),
        Cell::num(totals.other, Style::Plain),
    ]
}

fn rule(widths: &[usize], left: char, fill: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn row(cells: &[Cell], widths: &[usize]) -> String {
    let rendered: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!(" {} ", c.render(*w)))
        .collect();
    format!("│{}│\n", rendered.join("│"))
}

fn format_table(rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let headers: Vec<Cell> = HEADERS.iter().map(|h| Cell::text(*h, Style::Plain)).collect();

    let mut out = String::new();
    out.push_str(&rule(&widths, '╒', '═', '╤', '╕'));
    out.push_str(&row(&headers, &widths));
    out.push_str(&rule(&widths, '╞', '═', '╪', '╡'));
    for (i, r) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(&rule(&widths, '├', '─', '┼', '┤'));
        }
        out.push_str(&row(r, &widths));
    }
    out.push_str(&rule(&widths, '╘', '═', '╧', '╛'));
    out
}

/// Format the per-spec summary table for terminal output.
pub fn format_summary(summary: &TestSummary) -> String {
    if summary.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let mut rows: Vec<Vec<Cell>> = summary
        .groups
        .iter()
        .map(|(spec, stats)| group_row(spec, stats))
        .collect();
    rows.push(summary_row(summary));

    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(80)));
    out.push_str("TEST SUMMARY BY SPEC\n");
    out.push_str(&format!("{}\n\n", "=".repeat(80)));
    out.push_str(&format_table(&rows));
    out
}

/// Format a rule verification result. Returns (text, passed).
pub fn format_rule_validation(validation: &RuleValidation) -> (String, bool) {
    let passed = validation.is_ok();
    let mut out = String::new();
    if passed {
        out.push_str(&format!(
            "{}: {} rule(s) triggered as expected\n",
            "RULES VERIFIED".green().bold(),
            validation.checked
        ));
    } else {
        out.push_str(&format!(
            "{}: {} of {} rule(s) did not trigger cleanly\n",
            "RULES FAILED".red().bold(),
            validation.failed_rules().len(),
            validation.checked
        ));
        out.push_str(&validation.message());
        out.push('\n');
    }
    (out, passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kantest_core::outcome::OutcomeRecord;
    use kantest_core::rules::{check_triggered_rules, AnalysisReport};

    fn summary(pairs: &[(&str, &str)]) -> TestSummary {
        let records: Vec<OutcomeRecord> = pairs
            .iter()
            .map(|(n, o)| OutcomeRecord::new(*n, *o))
            .collect();
        TestSummary::from_records(&records)
    }

    fn no_color() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_should_colorize() {
        assert!(should_colorize(true, Some("xterm-256color")));
        assert!(should_colorize(true, None));
        assert!(!should_colorize(true, Some("dumb")));
        assert!(!should_colorize(false, Some("xterm")));
    }

    #[test]
    fn test_summary_table_layout() {
        no_color();
        let s = summary(&[
            ("b.py::t1", "skipped"),
            ("a.py::t1", "passed"),
            ("a.py::t2", "failed"),
        ]);
        let out = format_summary(&s);
        assert!(out.contains("TEST SUMMARY BY SPEC"));
        for h in HEADERS {
            assert!(out.contains(h), "missing header {h}: {out}");
        }
        let a = out.find("a.py").unwrap();
        let b = out.find("b.py").unwrap();
        let banner = out.find("1/3 tests failed").unwrap();
        assert!(a < b && b < banner, "groups must be sorted and precede the summary row");
        assert!(out.contains('✗'));
    }

    #[test]
    fn test_rows_have_equal_width() {
        no_color();
        let s = summary(&[("tests/a_long_spec_name.py::t1", "passed"), ("b.py::t", "passed")]);
        let out = format_summary(&s);
        let widths: Vec<usize> = out
            .lines()
            .filter(|l| l.starts_with('│') || l.starts_with('╒') || l.starts_with('├'))
            .map(|l| l.chars().count())
            .collect();
        assert!(!widths.is_empty());
        assert!(widths.iter().all(|w| *w == widths[0]), "{out}");
        assert!(out.contains("✓ 2/2 tests passed"));
    }

    #[test]
    fn test_empty_summary() {
        let out = format_summary(&TestSummary::default());
        assert_eq!(out.trim(), NO_DATA);
    }

    #[test]
    fn test_rule_validation_text() {
        no_color();
        let report: AnalysisReport = serde_json::from_str(
            r#"{"rulesets": [{"violations": {"rule-a": {}}}]}"#,
        )
        .unwrap();
        let (out, passed) = format_rule_validation(&check_triggered_rules(&report, &["rule-a"], 0));
        assert!(passed);
        assert!(out.contains("RULES VERIFIED"));

        let (out, passed) =
            format_rule_validation(&check_triggered_rules(&report, &["rule-a", "rule-b"], 0));
        assert!(!passed);
        assert!(out.contains("1 of 2"));
        assert!(out.contains("'rule-b'"));
    }
}
