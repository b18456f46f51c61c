/// Simple example demonstrating how to use the VBA Analyzer library

use anyhow::Result;
use vba_analyzer::analyze_source;

fn main() -> Result<()> {
    let code = r#"Sub AutoOpen()
    Dim tmp As String
    tmp = Environ("TEMP") & "\payload.exe"
    Shell(tmp)
    For i = 1 To 500
        Cells(i, 1).Value = i
    Next i
End Sub
"#;

    println!("Analyzing module: Module1");

    let report = analyze_source("Module1", code)?;

    println!("\nRisk level: {}", report.summary.risk_level);
    println!("Performance score: {}/100", report.summary.performance_score);
    println!("Quality score: {}/100", report.summary.quality_score);

    for risk in &report.security_risks {
        println!("\n[{}] {}", risk.severity, risk.description);
        if let Some(line) = risk.line {
            println!("  line {}: {}", line, risk.suggestion);
        }
    }

    for issue in &report.performance_issues {
        println!("\n[{}] {}", issue.impact, issue.description);
    }

    for issue in &report.code_quality {
        println!("\n[{}] {}", issue.kind.as_str(), issue.issue);
    }

    Ok(())
}
