/// Data model shared by the analysis pipeline
///
/// This module defines macro modules, the findings produced by rules, and the
/// severity scale used by both rules and document scores.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::classifier;

/// Ordinal rating used for security severity, performance impact and the
/// document risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a macro module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    /// A standard code module (`Module1`)
    Standard,
    /// A class module
    Class,
    /// A user form module
    Form,
}

/// Rule category, which is also the report section a finding lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Performance,
    Quality,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Quality => "quality",
        };
        f.write_str(name)
    }
}

/// Kind of a code quality issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Complexity,
    Documentation,
    Naming,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Complexity => "complexity",
            IssueType::Documentation => "documentation",
            IssueType::Naming => "naming",
        }
    }
}

/// A `(name, source)` pair as yielded by an extractor, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModule {
    pub name: String,
    pub code: String,
}

impl RawModule {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// One extracted macro module
///
/// Owns the full source text for the duration of the analysis. Only a
/// bounded preview ever reaches a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub line_count: usize,
    source: String,
}

impl Module {
    /// Classify and measure a raw module
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        let source = source.into();
        let kind = classifier::classify(&name, &source);
        let line_count = count_lines(&source);

        Self {
            name,
            kind,
            line_count,
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source lines split on `\n`, in order (a trailing `\r` stays on the line)
    pub fn lines(&self) -> std::str::Split<'_, char> {
        self.source.split('\n')
    }

    /// Whether the module has no source text at all
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// First `max_chars` characters of the source, with `...` appended when cut
    pub fn preview(&self, max_chars: usize) -> String {
        match self.source.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.source[..cut]),
            None => self.source.clone(),
        }
    }

    pub fn summary(&self, preview_chars: usize) -> ModuleSummary {
        ModuleSummary {
            name: self.name.clone(),
            kind: self.kind,
            line_count: self.line_count,
            code: self.preview(preview_chars),
        }
    }
}

impl From<RawModule> for Module {
    fn from(raw: RawModule) -> Self {
        Module::new(raw.name, raw.code)
    }
}

/// Number of `\n`-separated lines; empty text has none
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

/// Per-module entry of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub line_count: usize,
    pub code: String,
}

/// A security rule match, located on one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRisk {
    pub pattern: String,
    pub description: String,
    pub severity: Severity,
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub suggestion: String,
}

/// A performance anti-pattern found in a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub module: String,
    pub description: String,
    pub impact: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub suggestion: String,
}

/// A code quality issue found in a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue: String,
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub suggestion: String,
}

/// One rule match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Security(SecurityRisk),
    Performance(PerformanceIssue),
    Quality(QualityIssue),
}

impl Finding {
    pub fn category(&self) -> Category {
        match self {
            Finding::Security(_) => Category::Security,
            Finding::Performance(_) => Category::Performance,
            Finding::Quality(_) => Category::Quality,
        }
    }

    /// Name of the module the finding belongs to
    pub fn module(&self) -> &str {
        match self {
            Finding::Security(risk) => &risk.module,
            Finding::Performance(issue) => &issue.module,
            Finding::Quality(issue) => &issue.module,
        }
    }
}
