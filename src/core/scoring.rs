/// Document scoring
///
/// Fixed linear policy over the findings of one document. The weights are
/// consumed by existing report readers and must not drift.

use serde::{Deserialize, Serialize};

use crate::core::models::{Finding, Severity};

pub const MAX_SCORE: u32 = 100;

/// Medium-severity security findings tolerated before the risk level rises
pub const MEDIUM_RISK_THRESHOLD: usize = 2;

/// Per-finding deduction from the quality score
pub const QUALITY_PENALTY: u32 = 5;

/// Scores for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub risk_level: Severity,
    pub performance_score: u32,
    pub quality_score: u32,
}

impl Default for Scores {
    fn default() -> Self {
        score(&[])
    }
}

/// Reduce a finding set to the three document scores. Order-independent.
pub fn score(findings: &[Finding]) -> Scores {
    Scores {
        risk_level: risk_level(findings),
        performance_score: performance_score(findings),
        quality_score: quality_score(findings),
    }
}

pub fn risk_level(findings: &[Finding]) -> Severity {
    let mut medium = 0usize;

    for finding in findings {
        if let Finding::Security(risk) = finding {
            match risk.severity {
                Severity::High => return Severity::High,
                Severity::Medium => medium += 1,
                Severity::Low => {}
            }
        }
    }

    if medium > MEDIUM_RISK_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub fn performance_score(findings: &[Finding]) -> u32 {
    let penalty: u32 = findings
        .iter()
        .filter_map(|finding| match finding {
            Finding::Performance(issue) => Some(impact_penalty(issue.impact)),
            _ => None,
        })
        .sum();

    MAX_SCORE.saturating_sub(penalty)
}

pub fn quality_score(findings: &[Finding]) -> u32 {
    let count = findings
        .iter()
        .filter(|finding| matches!(finding, Finding::Quality(_)))
        .count() as u32;

    MAX_SCORE.saturating_sub(count.saturating_mul(QUALITY_PENALTY))
}

fn impact_penalty(impact: Severity) -> u32 {
    match impact {
        Severity::High => 20,
        Severity::Medium => 10,
        Severity::Low => 5,
    }
}
