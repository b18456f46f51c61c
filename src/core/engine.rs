/// Rule engine
///
/// Applies every rule of a registry to one module, in registry order, and
/// turns matches into findings. Rules never see each other's output, so the
/// engine is a pure function of the module text and the registry.

use log::debug;

use crate::core::models::{
    Finding, Module, PerformanceIssue, QualityIssue, SecurityRisk,
};
use crate::core::patterns::{Check, Rule, RuleRegistry, Weight};

/// Applies a rule registry to modules
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> RuleEngine<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    /// Run every rule against a module
    ///
    /// Findings come out in rule order, then line order. A module with no
    /// source text yields nothing.
    pub fn apply(&self, module: &Module) -> Vec<Finding> {
        if module.is_empty() {
            debug!("Module {} is empty, skipping rules", module.name);
            return Vec::new();
        }

        let mut findings = Vec::new();
        for rule in self.registry.rules() {
            let before = findings.len();
            apply_rule(rule, module, &mut findings);

            let hits = findings.len() - before;
            if hits > 0 {
                debug!("Rule {} produced {} finding(s) in {}", rule.id, hits, module.name);
            }
        }

        findings
    }
}

fn apply_rule(rule: &Rule, module: &Module, findings: &mut Vec<Finding>) {
    let source = module.source();

    match &rule.check {
        Check::Line(regex) => {
            for (index, line) in module.lines().enumerate() {
                if regex.is_match(line) {
                    findings.push(build_finding(rule, module, Some(index + 1), rule.description.to_string()));
                }
            }
        }
        Check::Anywhere(regex) => {
            if regex.is_match(source) {
                findings.push(build_finding(rule, module, None, rule.description.to_string()));
            }
        }
        Check::Aggregate(regex) => {
            let count = regex.find_iter(source).count();
            if count > 0 {
                let text = fill(rule.description, "count", &count.to_string());
                findings.push(build_finding(rule, module, None, text));
            }
        }
        Check::Absent { marker, min_chars } => {
            if !source.contains(marker) && source.chars().count() > *min_chars {
                findings.push(build_finding(rule, module, None, rule.description.to_string()));
            }
        }
        Check::RoutineLength { regex, max_lines } => {
            for caps in regex.captures_iter(source) {
                let span = match caps.get(0) {
                    Some(span) => span.as_str(),
                    None => continue,
                };
                let lines = span.matches('\n').count();
                if lines > *max_lines {
                    let name = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
                    let text = fill(&fill(rule.description, "name", name), "lines", &lines.to_string());
                    findings.push(build_finding(rule, module, None, text));
                }
            }
        }
        Check::CommentRatio {
            regex,
            min_lines,
            min_percent,
        } => {
            let total = module.line_count;
            let comments = regex.find_iter(source).count();
            if total > *min_lines && comments * 100 < total * min_percent {
                findings.push(build_finding(rule, module, None, rule.description.to_string()));
            }
        }
        Check::Naming(regex) => {
            let mut names: Vec<&str> = Vec::new();
            for caps in regex.captures_iter(source) {
                if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                    if !names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
                        names.push(name);
                    }
                }
            }
            if !names.is_empty() {
                let text = fill(rule.description, "names", &names.join(", "));
                findings.push(build_finding(rule, module, None, text));
            }
        }
    }
}

fn build_finding(rule: &Rule, module: &Module, line: Option<usize>, text: String) -> Finding {
    let module_name = module.name.clone();
    let suggestion = rule.suggestion.to_string();

    match rule.weight {
        Weight::Severity(severity) => Finding::Security(SecurityRisk {
            pattern: rule.pattern.to_string(),
            description: text,
            severity,
            module: module_name,
            line,
            suggestion,
        }),
        Weight::Impact(impact) => Finding::Performance(PerformanceIssue {
            kind: rule.id.to_string(),
            module: module_name,
            description: text,
            impact,
            line,
            suggestion,
        }),
        Weight::Issue(kind) => Finding::Quality(QualityIssue {
            issue: text,
            kind,
            module: module_name,
            line,
            suggestion,
        }),
    }
}

/// Substitute `{key}` in a description template
fn fill(template: &str, key: &str, value: &str) -> String {
    template.replace(&format!("{{{}}}", key), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Category, IssueType, Severity};

    fn run(source: &str) -> Vec<Finding> {
        let registry = RuleRegistry::builtin().unwrap();
        RuleEngine::new(registry).apply(&Module::new("Module1", source))
    }

    fn security(findings: &[Finding]) -> Vec<SecurityRisk> {
        findings
            .iter()
            .filter_map(|f| match f {
                Finding::Security(risk) => Some(risk),
                _ => None,
            })
            .cloned()
            .collect()
    }

    fn performance(findings: &[Finding]) -> Vec<PerformanceIssue> {
        findings
            .iter()
            .filter_map(|f| match f {
                Finding::Performance(issue) => Some(issue),
                _ => None,
            })
            .cloned()
            .collect()
    }

    fn quality(findings: &[Finding]) -> Vec<QualityIssue> {
        findings
            .iter()
            .filter_map(|f| match f {
                Finding::Quality(issue) => Some(issue),
                _ => None,
            })
            .cloned()
            .collect()
    }

    #[test]
    fn test_shell_call_is_reported_with_line() {
        let findings = run("Option Explicit\nSub Run()\n    Call Shell(\"cmd.exe /c dir\", 1)\nEnd Sub");
        let risks = security(&findings);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].severity, Severity::High);
        assert_eq!(risks[0].line, Some(3));
        assert_eq!(risks[0].pattern, r"Shell\s*\(");
        assert_eq!(risks[0].module, "Module1");
    }

    #[test]
    fn test_per_line_findings_are_rule_major() {
        let source = "Option Explicit\nSendKeys \"{ENTER}\"\nKill \"C:\\a.txt\"\nKill \"C:\\b.txt\"\nSendKeys \"x\"";
        let risks = security(&run(source));
        let order: Vec<(&str, Option<usize>)> = risks
            .iter()
            .map(|r| (r.description.as_str(), r.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Deletes files", Some(3)),
                ("Deletes files", Some(4)),
                ("Simulates keyboard input", Some(2)),
                ("Simulates keyboard input", Some(5)),
            ]
        );
    }

    #[test]
    fn test_wscript_shell_and_file_output() {
        let source = "Option Explicit\nSet sh = CreateObject(\"WScript.Shell\")\nOpen \"C:\\log.txt\" For Output As #1\nSet app = GetObject(, \"Excel.Application\")";
        let risks = security(&run(source));
        let severities: Vec<Severity> = risks.iter().map(|r| r.severity).collect();
        assert_eq!(severities, vec![Severity::High, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn test_cell_loop_detection() {
        let source = "Option Explicit\nSub Fill()\n    Dim i As Long\n    For i = 1 To 100\n        Cells(i, 1).Value = i\n    Next i\nEnd Sub";
        let issues = performance(&run(source));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "cell_loop");
        assert_eq!(issues[0].impact, Severity::High);
        assert_eq!(issues[0].line, None);
    }

    #[test]
    fn test_cell_access_without_loop_is_not_flagged() {
        let source = "Option Explicit\nSub Fill()\n    Cells(1, 1).Value = 1\nEnd Sub";
        assert!(performance(&run(source)).is_empty());
    }

    #[test]
    fn test_select_activate_is_aggregated() {
        let source = "Option Explicit\nSheets(\"Data\").Activate\nRange(\"A1\").Select\nRange(\"B1\").select\n";
        let issues = performance(&run(source));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "select_usage");
        assert_eq!(issues[0].description, "Select/Activate used 3 times");
        assert_eq!(issues[0].impact, Severity::Medium);
    }

    #[test]
    fn test_screen_updating_only_checked_for_long_modules() {
        let filler = "' filler line for length\n".repeat(30);
        let long = format!("Option Explicit\n{}", filler);
        assert!(long.len() > 500);
        let kinds: Vec<String> = performance(&run(&long)).iter().map(|i| i.kind.clone()).collect();
        assert_eq!(kinds, vec!["screen_updating"]);

        let optimized = format!("Option Explicit\nApplication.ScreenUpdating = False\n{}", filler);
        assert!(performance(&run(&optimized)).is_empty());

        assert!(performance(&run("Option Explicit\nSub A()\nEnd Sub")).is_empty());
    }

    #[test]
    fn test_missing_option_explicit() {
        let issues = performance(&run("Sub A()\nEnd Sub"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "option_explicit");
        assert_eq!(issues[0].impact, Severity::Low);
    }

    #[test]
    fn test_long_routine_is_reported() {
        let body = "    total = total + 1\n".repeat(60);
        let source = format!("Option Explicit\n' counter\nSub Accumulate()\n{}End Sub", body);
        let issues = quality(&run(&source));
        let complexity: Vec<&QualityIssue> = issues
            .iter()
            .filter(|i| i.kind == IssueType::Complexity)
            .collect();
        assert_eq!(complexity.len(), 1);
        assert_eq!(complexity[0].issue, "Routine Accumulate is too long (61 lines)");
    }

    #[test]
    fn test_routine_span_stops_at_first_end_marker() {
        // Non-greedy pairing: an "End Sub" inside a comment closes the span early,
        // so this 60-line routine is not reported.
        let body = "    total = total + 1\n".repeat(60);
        let source = format!("Option Explicit\nSub Accumulate()\n    ' End Sub is reached below\n{}End Sub", body);
        let issues = quality(&run(&source));
        assert!(issues.iter().all(|i| i.kind != IssueType::Complexity));
    }

    #[test]
    fn test_comment_ratio() {
        let mut lines = vec!["Option Explicit".to_string(), "' Totals".to_string()];
        for n in 0..28 {
            lines.push(format!("Debug.Print {}", n));
        }
        let source = lines.join("\n");
        let issues = quality(&run(&source));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::Documentation);
        assert_eq!(issues[0].issue, "Insufficient comments");

        // Three comment lines out of thirty reaches the 10% floor
        lines[2] = "Rem first".to_string();
        lines[3] = "    ' second".to_string();
        let source = lines.join("\n");
        assert!(quality(&run(&source)).is_empty());
    }

    #[test]
    fn test_short_modules_skip_comment_ratio() {
        let print_lines = |count: usize| {
            (0..count)
                .map(|n| format!("Debug.Print {}", n))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let twenty = format!("Option Explicit\n{}", print_lines(19));
        assert!(quality(&run(&twenty)).is_empty());

        let twenty_one = format!("Option Explicit\n{}", print_lines(20));
        assert_eq!(quality(&run(&twenty_one)).len(), 1);
    }

    #[test]
    fn test_poor_names_listed_once() {
        let source = "Option Explicit\nDim x As Long\nDim Tmp As String\nx = 5\nTMP = \"\"";
        let issues = quality(&run(source));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::Naming);
        assert_eq!(issues[0].issue, "Non-descriptive variable names used (x, Tmp)");
    }

    #[test]
    fn test_empty_module_has_no_findings() {
        assert!(run("").is_empty());
    }

    #[test]
    fn test_whitespace_module_is_still_checked() {
        let findings = run(&" ".repeat(600));
        let kinds: Vec<String> = performance(&findings).iter().map(|i| i.kind.clone()).collect();
        assert_eq!(kinds, vec!["screen_updating", "option_explicit"]);
        assert_eq!(crate::core::scoring::performance_score(&findings), 85);

        let kinds: Vec<String> = performance(&run("   \n   \n")).iter().map(|i| i.kind.clone()).collect();
        assert_eq!(kinds, vec!["option_explicit"]);
    }

    #[test]
    fn test_findings_are_deterministic() {
        let source = "Sub A()\nShell \"x\"\nShell(\"y\")\nRange(\"A1\").Select\nx = 1\nEnd Sub";
        assert_eq!(run(source), run(source));
    }

    #[test]
    fn test_category_order_within_module() {
        let source = "Sub A()\nx = Shell(\"calc\")\nRange(\"A1\").Select\nEnd Sub";
        let categories: Vec<Category> = run(source).iter().map(Finding::category).collect();
        let mut deduped = categories.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec![Category::Security, Category::Performance, Category::Quality]
        );
    }
}
