/// Report assembly
///
/// Builds the terminal artifact of one document analysis. Field names and
/// nesting are read by downstream consumers and are kept verbatim.

use serde::{Deserialize, Serialize};

use crate::core::insights;
use crate::core::models::{
    Finding, Module, ModuleSummary, PerformanceIssue, QualityIssue, SecurityRisk, Severity,
};
use crate::core::scoring::Scores;

/// Error text of a document without macros
pub const NO_MACROS_MESSAGE: &str = "No VBA macros found in file";

/// Document-wide counts and scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_modules: usize,
    pub total_lines: usize,
    pub risk_level: Severity,
    pub performance_score: u32,
    pub quality_score: u32,
}

impl Summary {
    fn from_scores(total_modules: usize, total_lines: usize, scores: Scores) -> Self {
        Self {
            total_modules,
            total_lines,
            risk_level: scores.risk_level,
            performance_score: scores.performance_score,
            quality_score: scores.quality_score,
        }
    }
}

/// Analysis report for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub modules: Vec<ModuleSummary>,
    pub security_risks: Vec<SecurityRisk>,
    pub performance_issues: Vec<PerformanceIssue>,
    pub code_quality: Vec<QualityIssue>,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "aiInsights", default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<String>>,
}

impl Report {
    /// Group findings by category and fill the summary
    ///
    /// Findings keep their insertion order inside each category.
    pub fn assemble(
        modules: &[Module],
        findings: Vec<Finding>,
        scores: Scores,
        preview_chars: usize,
    ) -> Self {
        debug_assert!(findings
            .iter()
            .all(|finding| modules.iter().any(|module| module.name == finding.module())));

        let mut security_risks = Vec::new();
        let mut performance_issues = Vec::new();
        let mut code_quality = Vec::new();

        for finding in findings {
            match finding {
                Finding::Security(risk) => security_risks.push(risk),
                Finding::Performance(issue) => performance_issues.push(issue),
                Finding::Quality(issue) => code_quality.push(issue),
            }
        }

        let total_lines = modules.iter().map(|module| module.line_count).sum();

        Self {
            modules: modules.iter().map(|module| module.summary(preview_chars)).collect(),
            security_risks,
            performance_issues,
            code_quality,
            summary: Summary::from_scores(modules.len(), total_lines, scores),
            error: None,
            insights: None,
        }
    }

    /// A well-formed report carrying only an error
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            modules: Vec::new(),
            security_risks: Vec::new(),
            performance_issues: Vec::new(),
            code_quality: Vec::new(),
            summary: Summary::from_scores(0, 0, Scores::default()),
            error: Some(message.into()),
            insights: None,
        }
    }

    pub fn no_macros() -> Self {
        Self::failed(NO_MACROS_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn findings_count(&self) -> usize {
        self.security_risks.len() + self.performance_issues.len() + self.code_quality.len()
    }

    /// Attach insights; a failed or empty report stays as it is
    pub fn with_insights(mut self) -> Self {
        if self.is_success() && !self.modules.is_empty() {
            self.insights = Some(insights::generate(&self));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::RuleEngine;
    use crate::core::patterns::RuleRegistry;
    use crate::core::scoring;

    fn analyze(modules: &[Module]) -> Report {
        let engine = RuleEngine::new(RuleRegistry::builtin().unwrap());
        let findings: Vec<Finding> = modules.iter().flat_map(|m| engine.apply(m)).collect();
        let scores = scoring::score(&findings);
        Report::assemble(modules, findings, scores, 1000)
    }

    #[test]
    fn test_summary_invariants() {
        let modules = vec![
            Module::new("Module1", "Option Explicit\nSub A()\nEnd Sub"),
            Module::new("Module2", "Sub B()\n  Shell(\"calc\")\nEnd Sub\n"),
        ];
        let report = analyze(&modules);
        assert_eq!(report.summary.total_modules, report.modules.len());
        assert_eq!(report.summary.total_lines, 3 + 4);
        assert_eq!(report.summary.risk_level, Severity::High);
        assert!(report.is_success());
    }

    #[test]
    fn test_findings_follow_module_order() {
        let modules = vec![
            Module::new("First", "Kill \"a\""),
            Module::new("Second", "Kill \"b\""),
        ];
        let report = analyze(&modules);
        let owners: Vec<&str> = report.security_risks.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(owners, vec!["First", "Second"]);
        let owners: Vec<&str> = report.performance_issues.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(owners, vec!["First", "Second"]);
    }

    #[test]
    fn test_failed_report_shape() {
        let report = Report::no_macros();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], NO_MACROS_MESSAGE);
        assert_eq!(json["modules"], serde_json::json!([]));
        assert_eq!(json["securityRisks"], serde_json::json!([]));
        assert_eq!(json["performanceIssues"], serde_json::json!([]));
        assert_eq!(json["codeQuality"], serde_json::json!([]));
        assert_eq!(json["summary"]["totalModules"], 0);
        assert_eq!(json["summary"]["totalLines"], 0);
        assert_eq!(json["summary"]["riskLevel"], "low");
        assert_eq!(json["summary"]["performanceScore"], 100);
        assert_eq!(json["summary"]["qualityScore"], 100);
        assert!(json.get("aiInsights").is_none());
    }

    #[test]
    fn test_successful_report_has_no_error_field() {
        let report = analyze(&[Module::new("Module1", "Option Explicit")]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(report.findings_count(), 0);
    }

    #[test]
    fn test_insights_skip_failed_reports() {
        assert!(Report::no_macros().with_insights().insights.is_none());

        let report = analyze(&[Module::new("Module1", "Option Explicit")]).with_insights();
        assert!(report.insights.is_some());
    }

    #[test]
    fn test_preview_is_bounded() {
        let source = format!("Option Explicit\n{}", "'".repeat(2000));
        let report = analyze(&[Module::new("Module1", source)]);
        assert_eq!(report.modules[0].code.chars().count(), 1003);
    }
}
