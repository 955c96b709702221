use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the tool under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subcommand {
    Analyze,
    Discover,
    Generate,
    ConfigLogin,
    ConfigSync,
    ConfigList,
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcommand::Analyze => write!(f, "analyze"),
            Subcommand::Discover => write!(f, "discover"),
            Subcommand::Generate => write!(f, "generate"),
            Subcommand::ConfigLogin => write!(f, "config-login"),
            Subcommand::ConfigSync => write!(f, "config-sync"),
            Subcommand::ConfigList => write!(f, "config-list"),
        }
    }
}

/// Whether an analysis run merges into prior output or replaces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Bulk,
    #[default]
    Overwrite,
}

impl RunMode {
    pub fn flag(&self) -> &'static str {
        match self {
            RunMode::Bulk => "--bulk",
            RunMode::Overwrite => "--overwrite",
        }
    }
}

/// How far analysis reaches beyond the application's own code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyScope {
    #[default]
    Full,
    SourceOnly,
}

/// Catalog listings the tool can print without analyzing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    Targets,
    Sources,
    Providers,
}

impl Listing {
    pub fn flag(&self) -> &'static str {
        match self {
            Listing::Targets => "--list-targets",
            Listing::Sources => "--list-sources",
            Listing::Providers => "--list-providers",
        }
    }
}

/// A single pass-through flag with an optional value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl ExtraOption {
    /// Render as one argv element: `--name` or `--name=value`.
    pub fn render(&self) -> String {
        let flag = normalize_flag(&self.name);
        match self.value.as_deref() {
            Some(v) if !v.is_empty() => format!("{flag}={v}"),
            _ => flag,
        }
    }
}

/// Extra flags forwarded verbatim to the tool, kept in insertion order.
///
/// Some tool flags are order-sensitive, so this is a list of pairs rather
/// than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraOptions(Vec<ExtraOption>);

impl ExtraOptions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a bare flag.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.push(name, None::<String>);
        self
    }

    /// Append a flag with a value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, Some(value));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<impl Into<String>>) {
        self.0.push(ExtraOption {
            name: name.into(),
            value: value.map(Into::into),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtraOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rendered argv elements in insertion order.
    pub fn render(&self) -> Vec<String> {
        self.0.iter().map(ExtraOption::render).collect()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for ExtraOptions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut opts = ExtraOptions::new();
        for (k, v) in iter {
            opts.push(k, v);
        }
        opts
    }
}

/// Prefix a flag name with `--` unless it already carries a dash prefix.
pub fn normalize_flag(name: &str) -> String {
    if name.starts_with('-') {
        name.to_string()
    } else {
        format!("--{name}")
    }
}
