/// Rule definitions for the macro analyzer
///
/// This module contains the registry of detection rules: the regex patterns
/// that flag dangerous calls, performance anti-patterns and code quality
/// issues in VBA source, together with their ratings and remediation text.
///
/// Rules are plain data. New detections are added as entries in one of the
/// `get_*_rules` tables; the scan logic in `engine` never changes for them.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::core::models::{Category, IssueType, Severity};

/// Error raised while compiling the rule registry
#[derive(Debug, Clone, Error)]
pub enum RuleError {
    #[error("Invalid pattern for rule '{rule}': {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate rule id '{0}'")]
    DuplicateId(&'static str),
}

/// Rating attached to a rule, which also fixes its category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// Security severity
    Severity(Severity),
    /// Performance impact
    Impact(Severity),
    /// Quality issue type
    Issue(IssueType),
}

impl Weight {
    pub fn category(&self) -> Category {
        match self {
            Weight::Severity(_) => Category::Security,
            Weight::Impact(_) => Category::Performance,
            Weight::Issue(_) => Category::Quality,
        }
    }
}

/// Where a rule looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Tested against each line; one finding per matching line
    PerLine,
    /// Evaluated once against the full module text
    WholeModule,
}

/// Uncompiled detection logic of a rule
#[derive(Debug, Clone, Copy)]
pub enum CheckDef {
    /// One finding per line matching the pattern
    Line(&'static str),
    /// One finding if the pattern matches anywhere in the module
    Anywhere(&'static str),
    /// One finding carrying the total match count, if non-zero
    Aggregate(&'static str),
    /// One finding when `marker` is absent from a module longer than `min_chars`
    Absent {
        marker: &'static str,
        min_chars: usize,
    },
    /// One finding per routine span longer than `max_lines`
    RoutineLength {
        pattern: &'static str,
        max_lines: usize,
    },
    /// One finding when fewer than `min_percent` of the lines of a module
    /// longer than `min_lines` are comments
    CommentRatio {
        pattern: &'static str,
        min_lines: usize,
        min_percent: usize,
    },
    /// One finding listing the distinct identifiers captured by the pattern
    Naming(&'static str),
}

/// A rule as written in the tables below
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    pub id: &'static str,
    pub weight: Weight,
    pub check: CheckDef,
    pub description: &'static str,
    pub suggestion: &'static str,
}

/// Compiled detection logic of a rule
#[derive(Debug, Clone)]
pub enum Check {
    Line(Regex),
    Anywhere(Regex),
    Aggregate(Regex),
    Absent {
        marker: &'static str,
        min_chars: usize,
    },
    RoutineLength {
        regex: Regex,
        max_lines: usize,
    },
    CommentRatio {
        regex: Regex,
        min_lines: usize,
        min_percent: usize,
    },
    Naming(Regex),
}

impl Check {
    pub fn scope(&self) -> Scope {
        match self {
            Check::Line(_) => Scope::PerLine,
            _ => Scope::WholeModule,
        }
    }
}

/// A compiled, ready-to-run rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    pub weight: Weight,
    pub check: Check,
    /// Pattern source (or literal marker) as written in the definition
    pub pattern: &'static str,
    pub description: &'static str,
    pub suggestion: &'static str,
}

impl Rule {
    pub fn category(&self) -> Category {
        self.weight.category()
    }

    pub fn scope(&self) -> Scope {
        self.check.scope()
    }
}

/// Immutable, ordered collection of compiled rules
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Compile rule definitions, rejecting the whole set on the first bad pattern
    pub fn compile(defs: &[RuleDef]) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(defs.len());

        for def in defs {
            if !seen.insert(def.id) {
                return Err(RuleError::DuplicateId(def.id));
            }
            rules.push(compile_rule(def)?);
        }

        log::debug!("Compiled {} rules", rules.len());
        Ok(Self { rules })
    }

    /// The built-in registry, compiled once per process
    pub fn builtin() -> Result<&'static RuleRegistry, RuleError> {
        BUILTIN_RULES.as_ref().map_err(Clone::clone)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.category() == category)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

lazy_static! {
    /// Built-in rules, compiled on first use
    static ref BUILTIN_RULES: Result<RuleRegistry, RuleError> = RuleRegistry::compile(&load_rules());
}

/// Load all rule definitions in registry order: security, performance, quality
pub fn load_rules() -> Vec<RuleDef> {
    let mut rules = get_security_rules();
    rules.extend(get_performance_rules());
    rules.extend(get_quality_rules());
    rules
}

/// Dangerous calls, matched line by line.
pub fn get_security_rules() -> Vec<RuleDef> {
    vec![
        RuleDef {
            id: "shell_exec",
            weight: Weight::Severity(Severity::High),
            check: CheckDef::Line(r"Shell\s*\("),
            description: "Can execute system commands",
            suggestion: "Running system commands is a security risk. If it is required, run them with restricted privileges.",
        },
        RuleDef {
            id: "wscript_shell",
            weight: Weight::Severity(Severity::High),
            check: CheckDef::Line(r#"CreateObject\s*\(\s*["']WScript\.Shell["']"#),
            description: "Can run Windows scripts",
            suggestion: "Using WScript.Shell is dangerous. Consider another approach.",
        },
        RuleDef {
            id: "file_delete",
            weight: Weight::Severity(Severity::Medium),
            check: CheckDef::Line(r"Kill\s+"),
            description: "Deletes files",
            suggestion: "Ask the user for confirmation before deleting and restrict the deletion targets explicitly.",
        },
        RuleDef {
            id: "file_write",
            weight: Weight::Severity(Severity::Medium),
            check: CheckDef::Line(r"Open\s+.*\s+For\s+Output"),
            description: "Writes to files",
            suggestion: "Restrict file writes to designated paths only.",
        },
        RuleDef {
            id: "send_keys",
            weight: Weight::Severity(Severity::Medium),
            check: CheckDef::Line(r"SendKeys"),
            description: "Simulates keyboard input",
            suggestion: "SendKeys is unpredictable. Use an API or another approach.",
        },
        RuleDef {
            id: "get_object",
            weight: Weight::Severity(Severity::Low),
            check: CheckDef::Line(r"GetObject\s*\("),
            description: "Accesses external objects",
            suggestion: "Add error handling around external object access.",
        },
    ]
}

/// Performance anti-patterns, evaluated once per module.
pub fn get_performance_rules() -> Vec<RuleDef> {
    vec![
        RuleDef {
            id: "cell_loop",
            weight: Weight::Impact(Severity::High),
            check: CheckDef::Anywhere(r"For\s+\w+\s*=.*\s+To\s+.*[\r\n]+.*Cells\s*\("),
            description: "Cell-by-cell loop",
            suggestion: "Reading the range into an array and processing it in memory is over 100 times faster.\nExample: Dim arr As Variant\narr = Range(\"A1:A1000\").Value",
        },
        RuleDef {
            id: "select_usage",
            weight: Weight::Impact(Severity::Medium),
            check: CheckDef::Aggregate(r"\.(Select|Activate)\b"),
            description: "Select/Activate used {count} times",
            suggestion: "Use direct references.\nBad: Range(\"A1\").Select\nSelection.Value = 10\nGood: Range(\"A1\").Value = 10",
        },
        RuleDef {
            id: "screen_updating",
            weight: Weight::Impact(Severity::Medium),
            check: CheckDef::Absent {
                marker: "ScreenUpdating",
                min_chars: 500,
            },
            description: "No screen update optimization",
            suggestion: "Add Application.ScreenUpdating = False at the start of the macro",
        },
        RuleDef {
            id: "option_explicit",
            weight: Weight::Impact(Severity::Low),
            check: CheckDef::Absent {
                marker: "Option Explicit",
                min_chars: 0,
            },
            description: "Option Explicit missing",
            suggestion: "Add Option Explicit at the top of the module to force variable declaration",
        },
    ]
}

/// Code quality checks, evaluated once per module.
pub fn get_quality_rules() -> Vec<RuleDef> {
    vec![
        RuleDef {
            id: "routine_length",
            weight: Weight::Issue(IssueType::Complexity),
            check: CheckDef::RoutineLength {
                pattern: r"(Sub|Function)\s+(\w+).*?End\s+(Sub|Function)",
                max_lines: 50,
            },
            description: "Routine {name} is too long ({lines} lines)",
            suggestion: "Split the routine into smaller units",
        },
        RuleDef {
            id: "comment_ratio",
            weight: Weight::Issue(IssueType::Documentation),
            check: CheckDef::CommentRatio {
                pattern: r"^[ \t]*('|Rem\b)",
                min_lines: 20,
                min_percent: 10,
            },
            description: "Insufficient comments",
            suggestion: "Document at least 10% of the code with comments",
        },
        RuleDef {
            id: "poor_naming",
            weight: Weight::Issue(IssueType::Naming),
            check: CheckDef::Naming(r"\b(a|b|c|x|y|z|temp|tmp)\b\s*(?:As|=)"),
            description: "Non-descriptive variable names used ({names})",
            suggestion: "Choose variable names that clearly express their meaning",
        },
    ]
}

/// Compile a rule pattern: case-insensitive, `^`/`$` anchored at line breaks
pub fn compile_pattern(pattern: &str, dot_matches_new_line: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(dot_matches_new_line)
        .build()
}

fn compile_rule(def: &RuleDef) -> Result<Rule, RuleError> {
    let compile = |pattern: &'static str, dotall: bool| {
        compile_pattern(pattern, dotall).map_err(|source| RuleError::InvalidPattern {
            rule: def.id,
            source,
        })
    };

    let (check, pattern) = match def.check {
        CheckDef::Line(pattern) => (Check::Line(compile(pattern, false)?), pattern),
        CheckDef::Anywhere(pattern) => (Check::Anywhere(compile(pattern, false)?), pattern),
        CheckDef::Aggregate(pattern) => (Check::Aggregate(compile(pattern, false)?), pattern),
        CheckDef::Absent { marker, min_chars } => (Check::Absent { marker, min_chars }, marker),
        CheckDef::RoutineLength { pattern, max_lines } => (
            Check::RoutineLength {
                regex: compile(pattern, true)?,
                max_lines,
            },
            pattern,
        ),
        CheckDef::CommentRatio {
            pattern,
            min_lines,
            min_percent,
        } => (
            Check::CommentRatio {
                regex: compile(pattern, false)?,
                min_lines,
                min_percent,
            },
            pattern,
        ),
        CheckDef::Naming(pattern) => (Check::Naming(compile(pattern, false)?), pattern),
    };

    Ok(Rule {
        id: def.id,
        weight: def.weight,
        check,
        pattern,
        description: def.description,
        suggestion: def.suggestion,
    })
}
