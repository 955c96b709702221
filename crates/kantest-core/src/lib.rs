pub mod artifacts;
pub mod command;
pub mod config;
pub mod error;
pub mod outcome;
pub mod plan;
pub mod rules;
pub mod types;

pub use command::{BuiltCommand, ToolPaths};
pub use config::Config;
pub use error::{HarnessError, HarnessResult};
pub use outcome::{Outcome, OutcomeRecord, TestRunReport, TestSummary};
pub use plan::{CommandSpec, TestPlan};
pub use rules::{AnalysisReport, RuleValidation};
pub use types::*;
