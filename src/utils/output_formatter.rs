/// Output formatter for analysis reports
///
/// This module handles rendering and exporting reports in various formats,
/// including console text, JSON, HTML, and CSV.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::app::DocumentReport;
use crate::core::models::Severity;
use crate::core::report::Report;

fn colorize_level(level: Severity) -> ColoredString {
    match level {
        Severity::High => level.as_str().red().bold(),
        Severity::Medium => level.as_str().yellow().bold(),
        Severity::Low => level.as_str().green(),
    }
}

fn location(module: &str, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{}", module, line),
        None => module.to_string(),
    }
}

/// Format a report for console output
///
/// # Arguments
///
/// * `report` - Report of one document
/// * `use_markdown` - Whether to wrap the output in markdown triple backticks
///
/// # Returns
///
/// Formatted string for console output
pub fn format_report(report: &Report, use_markdown: bool) -> String {
    let mut output = String::new();

    if use_markdown {
        output.push_str("```\n");
    }

    if let Some(error) = &report.error {
        output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
    }

    let summary = &report.summary;
    output.push_str(&format!("{}\n", "Summary".yellow().bold()));
    output.push_str(&format!(
        "  Modules: {}  Lines: {}\n",
        summary.total_modules, summary.total_lines
    ));
    output.push_str(&format!(
        "  Risk level: {}  Performance: {}/100  Quality: {}/100\n\n",
        colorize_level(summary.risk_level),
        summary.performance_score,
        summary.quality_score
    ));

    if !report.modules.is_empty() {
        output.push_str(&format!("{}\n", "Modules".yellow().bold()));
        for module in &report.modules {
            output.push_str(&format!(
                "  {} ({:?}, {} lines)\n",
                module.name.cyan(),
                module.kind,
                module.line_count
            ));
        }
        output.push('\n');
    }

    if !report.security_risks.is_empty() {
        output.push_str(&format!(
            "{} {}\n",
            "Security Risks".yellow().bold(),
            report.security_risks.len()
        ));
        for risk in &report.security_risks {
            output.push_str(&format!(
                "  [{}] {} at {}\n    - {}\n",
                colorize_level(risk.severity),
                risk.description,
                location(risk.module.as_str(), risk.line).cyan(),
                risk.suggestion
            ));
        }
        output.push('\n');
    }

    if !report.performance_issues.is_empty() {
        output.push_str(&format!(
            "{} {}\n",
            "Performance Issues".yellow().bold(),
            report.performance_issues.len()
        ));
        for issue in &report.performance_issues {
            output.push_str(&format!(
                "  [{}] {} in {}\n    - {}\n",
                colorize_level(issue.impact),
                issue.description,
                location(issue.module.as_str(), issue.line).cyan(),
                issue.suggestion.replace('\n', "\n      ")
            ));
        }
        output.push('\n');
    }

    if !report.code_quality.is_empty() {
        output.push_str(&format!(
            "{} {}\n",
            "Code Quality".yellow().bold(),
            report.code_quality.len()
        ));
        for issue in &report.code_quality {
            output.push_str(&format!(
                "  [{}] {} in {}\n    - {}\n",
                issue.kind.as_str(),
                issue.issue,
                location(issue.module.as_str(), issue.line).cyan(),
                issue.suggestion
            ));
        }
        output.push('\n');
    }

    if let Some(insights) = &report.insights {
        output.push_str(&format!("{}\n", "Insights".yellow().bold()));
        for insight in insights {
            output.push_str(&format!("  {}\n", insight));
        }
        output.push('\n');
    }

    if report.is_success() && report.findings_count() == 0 {
        output.push_str("No findings detected.\n");
    }

    if use_markdown {
        output.push_str("```\n");
    }

    output
}

/// Serialize a report (or a list of tagged reports) as pretty JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report")
}

/// Export a report (or a list of tagged reports) to a JSON file
///
/// # Arguments
///
/// * `value` - Data to export
/// * `output_path` - Path where the JSON file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn export_report_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create JSON output file: {}", output_path.display()))?;

    serde_json::to_writer_pretty(file, value).context("Failed to write JSON data")?;

    Ok(())
}

const HTML_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>VBA Macro Analysis Report</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
        }
        h1 {
            color: #2c3e50;
            border-bottom: 2px solid #3498db;
            padding-bottom: 10px;
        }
        h2 {
            color: #2980b9;
            margin-top: 30px;
        }
        h3 {
            color: #3498db;
            margin-top: 20px;
        }
        .document {
            margin-bottom: 40px;
        }
        .summary {
            background-color: #e8f4f8;
            padding: 15px;
            border-radius: 5px;
            margin-bottom: 20px;
        }
        .error {
            color: #c0392b;
            font-weight: bold;
        }
        .findings {
            list-style-type: none;
            padding-left: 20px;
        }
        .findings li {
            padding: 5px 0;
            border-bottom: 1px solid #eee;
        }
        .level {
            border-radius: 20px;
            padding: 2px 8px;
            font-size: 0.8em;
            margin-right: 10px;
            color: white;
            background-color: #7f8c8d;
        }
        .level-high { background-color: #c0392b; }
        .level-medium { background-color: #e67e22; }
        .level-low { background-color: #27ae60; }
        .suggestion {
            color: #555;
            white-space: pre-wrap;
            font-size: 0.9em;
        }
        .timestamp {
            color: #7f8c8d;
            font-size: 0.9em;
            margin-bottom: 30px;
        }
    </style>
</head>
<body>
    <h1>VBA Macro Analysis Report</h1>
    <div class="timestamp">Generated on: {{timestamp}}</div>

    {{#each documents}}
    <div class="document">
        <h2>{{document}}</h2>
        {{#if error}}<p class="error">{{error}}</p>{{/if}}
        <div class="summary">
            <p>Modules: {{summary.totalModules}} &middot; Lines: {{summary.totalLines}}</p>
            <p>Risk level: <span class="level level-{{summary.riskLevel}}">{{summary.riskLevel}}</span>
               Performance: {{summary.performanceScore}}/100 &middot; Quality: {{summary.qualityScore}}/100</p>
        </div>

        {{#if securityRisks}}
        <h3>Security Risks</h3>
        <ul class="findings">
            {{#each securityRisks}}
            <li><span class="level level-{{severity}}">{{severity}}</span>{{description}} ({{module}}{{#if line}}:{{line}}{{/if}})
                <div class="suggestion">{{suggestion}}</div></li>
            {{/each}}
        </ul>
        {{/if}}

        {{#if performanceIssues}}
        <h3>Performance Issues</h3>
        <ul class="findings">
            {{#each performanceIssues}}
            <li><span class="level level-{{impact}}">{{impact}}</span>{{description}} ({{module}})
                <div class="suggestion">{{suggestion}}</div></li>
            {{/each}}
        </ul>
        {{/if}}

        {{#if codeQuality}}
        <h3>Code Quality</h3>
        <ul class="findings">
            {{#each codeQuality}}
            <li><span class="level">{{type}}</span>{{issue}} ({{module}})
                <div class="suggestion">{{suggestion}}</div></li>
            {{/each}}
        </ul>
        {{/if}}

        {{#if aiInsights}}
        <h3>Insights</h3>
        <ul class="findings">
            {{#each aiInsights}}
            <li>{{this}}</li>
            {{/each}}
        </ul>
        {{/if}}
    </div>
    {{/each}}
</body>
</html>
"#;

/// Create an HTML report for one or more documents
///
/// # Arguments
///
/// * `results` - Tagged reports
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn create_html_report(results: &[DocumentReport], output_path: &Path) -> Result<()> {
    let html = render_html(results)?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create HTML output file: {}", output_path.display()))?;

    file.write_all(html.as_bytes())
        .context("Failed to write HTML data")?;

    Ok(())
}

fn render_html(results: &[DocumentReport]) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("report", HTML_TEMPLATE)
        .context("Failed to register HTML template")?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let template_data = json!({
        "timestamp": timestamp,
        "documents": results,
    });

    handlebars
        .render("report", &template_data)
        .context("Failed to render HTML template")
}

/// Create a CSV report with one row per finding
///
/// # Arguments
///
/// * `results` - Tagged reports
/// * `output_path` - Path where the CSV file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn create_csv_report(results: &[DocumentReport], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create CSV output file: {}", output_path.display()))?;

    write_csv(results, file)
}

fn write_csv<W: Write>(results: &[DocumentReport], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record([
            "Document", "Category", "Module", "Line", "Level", "Rule", "Description", "Suggestion",
        ])
        .context("Failed to write CSV header")?;

    for result in results {
        let document = result.document.as_str();
        let report = &result.report;
        let line = |line: Option<usize>| line.map(|l| l.to_string()).unwrap_or_default();

        for risk in &report.security_risks {
            writer
                .write_record([
                    document,
                    "security",
                    risk.module.as_str(),
                    line(risk.line).as_str(),
                    risk.severity.as_str(),
                    risk.pattern.as_str(),
                    risk.description.as_str(),
                    risk.suggestion.as_str(),
                ])
                .context("Failed to write CSV record")?;
        }

        for issue in &report.performance_issues {
            writer
                .write_record([
                    document,
                    "performance",
                    issue.module.as_str(),
                    line(issue.line).as_str(),
                    issue.impact.as_str(),
                    issue.kind.as_str(),
                    issue.description.as_str(),
                    issue.suggestion.as_str(),
                ])
                .context("Failed to write CSV record")?;
        }

        for issue in &report.code_quality {
            writer
                .write_record([
                    document,
                    "quality",
                    issue.module.as_str(),
                    line(issue.line).as_str(),
                    "",
                    issue.kind.as_str(),
                    issue.issue.as_str(),
                    issue.suggestion.as_str(),
                ])
                .context("Failed to write CSV record")?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Create a summary of findings for multiple documents
///
/// # Arguments
///
/// * `results` - Tagged reports
///
/// # Returns
///
/// Summary string
pub fn create_summary(results: &[DocumentReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n\n", "Analysis Summary".yellow().bold()));
    output.push_str(&format!("Documents analyzed: {}\n", results.len()));

    let failed = results.iter().filter(|r| !r.report.is_success()).count();
    if failed > 0 {
        output.push_str(&format!("Documents with errors: {}\n", failed));
    }

    let total_findings: usize = results.iter().map(|r| r.report.findings_count()).sum();
    output.push_str(&format!("Total findings: {}\n\n", total_findings));

    if !results.is_empty() {
        output.push_str(&format!("{}\n", "Per Document".cyan().bold()));

        for result in results {
            let summary = &result.report.summary;
            output.push_str(&format!(
                "  {}: risk {}, performance {}, quality {}\n",
                result.document,
                colorize_level(summary.risk_level),
                summary.performance_score,
                summary.quality_score
            ));
        }
    }

    output
}
