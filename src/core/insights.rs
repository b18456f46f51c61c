/// Plain-language remarks derived from a finished report
///
/// Every remark is a pure function of the report, so the same report always
/// yields the same list.

use crate::core::models::Severity;
use crate::core::report::Report;

/// Quality score below which refactoring is suggested
const LOW_QUALITY: u32 = 50;

/// Quality score above which the code is called good
const GOOD_QUALITY: u32 = 80;

/// Total line count above which splitting modules is suggested
const LARGE_PROJECT_LINES: usize = 500;

pub fn generate(report: &Report) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(first) = report.security_risks.first() {
        let high = report
            .security_risks
            .iter()
            .filter(|risk| risk.severity == Severity::High)
            .count();
        if high > 0 {
            insights.push(format!(
                "🔴 {} severe security risk(s) found. Immediate review is required.",
                high
            ));
        }
        insights.push(format!(
            "⚠️ Main risk: {} (module {})",
            first.description, first.module
        ));
    }

    let mut high_impact = report
        .performance_issues
        .iter()
        .filter(|issue| issue.impact == Severity::High);
    if let Some(top) = high_impact.next() {
        insights.push(format!(
            "🚀 {} major performance improvement opportunity(ies).",
            1 + high_impact.count()
        ));
        insights.push(format!("💡 Recommendation: {}", top.suggestion));
    }

    let quality = report.summary.quality_score;
    if quality < LOW_QUALITY {
        insights.push(format!(
            "📝 Code quality score is low ({}/100). Consider refactoring.",
            quality
        ));
    } else if quality > GOOD_QUALITY {
        insights.push(format!("✅ Code quality is good ({}/100).", quality));
    }

    if report.summary.total_lines > LARGE_PROJECT_LINES {
        insights.push(format!(
            "📦 The code is {} lines long; consider splitting it into smaller modules.",
            report.summary.total_lines
        ));
    }

    if !report.modules.is_empty() {
        insights.push(
            "🔄 Consider Office Scripts or Power Automate instead of VBA.".to_string(),
        );
    }

    insights
}
