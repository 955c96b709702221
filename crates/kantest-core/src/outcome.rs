//! Aggregation of raw test outcomes into per-file statistics.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifacts::read_structured;
use crate::error::HarnessResult;

/// Separator between the file part and the case part of a node id.
pub const CASE_SEPARATOR: &str = "::";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_TESTS_FAILED: i32 = 1;

/// Closed set of outcome categories. Unknown labels land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// Failed or errored.
    Failed,
    Skipped,
    Other,
}

impl Outcome {
    pub fn classify(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "passed" => Outcome::Passed,
            "failed" | "error" => Outcome::Failed,
            "skipped" => Outcome::Skipped,
            _ => Outcome::Other,
        }
    }
}

/// One executed test case as reported by the test runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    #[serde(default)]
    pub nodeid: String,
    #[serde(default)]
    pub outcome: String,
}

impl OutcomeRecord {
    pub fn new(nodeid: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            nodeid: nodeid.into(),
            outcome: outcome.into(),
        }
    }

    /// File portion of the node id, up to the first case separator.
    pub fn group_key(&self) -> &str {
        match self.nodeid.find(CASE_SEPARATOR) {
            Some(idx) => &self.nodeid[..idx],
            None => &self.nodeid,
        }
    }

    pub fn category(&self) -> Outcome {
        Outcome::classify(&self.outcome)
    }
}

/// A test-runner JSON report: `{"tests": [{"nodeid": ..., "outcome": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunReport {
    #[serde(default)]
    pub tests: Vec<OutcomeRecord>,
}

impl TestRunReport {
    pub fn load(path: &Path) -> HarnessResult<Self> {
        read_structured(path)
    }
}

/// Counts for one spec file, or for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub other: usize,
}

impl GroupStats {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Other => self.other += 1,
        }
    }

    fn absorb(&mut self, other: &GroupStats) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.other += other.other;
    }
}

/// Grouped statistics for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Keyed by spec file; iteration is in ascending key order.
    pub groups: BTreeMap<String, GroupStats>,
    pub totals: GroupStats,
}

impl TestSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a OutcomeRecord>,
    {
        let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.group_key().to_string())
                .or_default()
                .record(record.category());
        }

        let mut totals = GroupStats::default();
        for stats in groups.values() {
            totals.absorb(stats);
        }
        Self { groups, totals }
    }

    pub fn from_report(report: &TestRunReport) -> Self {
        Self::from_records(&report.tests)
    }

    /// No records at all. Distinct from "everything passed".
    pub fn is_empty(&self) -> bool {
        self.totals.total == 0
    }

    pub fn passed(&self) -> bool {
        self.totals.failed == 0
    }

    /// 0 when nothing failed (including the empty run), 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            EXIT_SUCCESS
        } else {
            EXIT_TESTS_FAILED
        }
    }

    /// `"3/3 tests passed"` or `"1/3 tests failed"`.
    pub fn banner(&self) -> String {
        if self.passed() {
            format!("{}/{} tests passed", self.totals.passed, self.totals.total)
        } else {
            format!("{}/{} tests failed", self.totals.failed, self.totals.total)
        }
    }
}
