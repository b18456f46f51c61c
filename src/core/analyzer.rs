/// Core macro analyzer implementation
///
/// This file contains the MacroAnalyzer, which drives one document through
/// extraction, classification, rule evaluation, scoring and report assembly.

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::AnalyzerConfig;
use crate::core::engine::RuleEngine;
use crate::core::extractor::MacroExtractor;
use crate::core::models::{Finding, Module, RawModule};
use crate::core::patterns::{RuleError, RuleRegistry};
use crate::core::report::Report;
use crate::core::scoring;

/// Core macro analyzer structure
pub struct MacroAnalyzer<'r> {
    /// Rule engine over the registry in use
    engine: RuleEngine<'r>,

    /// Configuration options
    config: AnalyzerConfig,
}

impl MacroAnalyzer<'static> {
    /// Create an analyzer over the built-in rule registry
    ///
    /// # Arguments
    ///
    /// * `config` - Analyzer configuration
    ///
    /// # Returns
    ///
    /// A new MacroAnalyzer, or the rule error if a built-in pattern is invalid
    pub fn new(config: AnalyzerConfig) -> Result<Self, RuleError> {
        Ok(Self::with_registry(RuleRegistry::builtin()?, config))
    }
}

impl<'r> MacroAnalyzer<'r> {
    pub fn with_registry(registry: &'r RuleRegistry, config: AnalyzerConfig) -> Self {
        Self {
            engine: RuleEngine::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one document
    ///
    /// Extraction failures and documents without macros both end in a
    /// well-formed report with `error` set.
    ///
    /// # Arguments
    ///
    /// * `extractor` - Source of the document's macro modules
    /// * `path` - Path to the document
    ///
    /// # Returns
    ///
    /// The document report
    pub fn analyze_document(&self, extractor: &dyn MacroExtractor, path: &Path) -> Report {
        info!("Analyzing document: {}", path.display());
        let start_time = Instant::now();

        let raw = match extractor.extract(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Extraction failed for {}: {}", path.display(), e);
                return Report::failed(e.to_string());
            }
        };

        let report = self.analyze_modules(raw);

        info!(
            "Analysis of {} completed in {:?} ({} findings)",
            path.display(),
            start_time.elapsed(),
            report.findings_count()
        );

        report
    }

    /// Analyze already extracted modules
    ///
    /// Findings come out in module order, then rule order, then line order,
    /// whether or not modules are scanned in parallel.
    pub fn analyze_modules(&self, raw: Vec<RawModule>) -> Report {
        if raw.is_empty() {
            info!("No VBA macros found");
            return Report::no_macros();
        }

        let modules: Vec<Module> = raw.into_iter().map(Module::from).collect();
        warn_duplicate_names(&modules);

        for module in &modules {
            debug!(
                "Module {} ({:?}, {} lines)",
                module.name, module.kind, module.line_count
            );
        }

        let findings: Vec<Finding> = if self.config.parallel && modules.len() > 1 {
            let per_module: Vec<Vec<Finding>> = modules
                .par_iter()
                .map(|module| self.engine.apply(module))
                .collect();
            per_module.into_iter().flatten().collect()
        } else {
            modules
                .iter()
                .flat_map(|module| self.engine.apply(module))
                .collect()
        };

        let scores = scoring::score(&findings);
        let report = Report::assemble(&modules, findings, scores, self.config.preview_chars);

        if self.config.insights {
            report.with_insights()
        } else {
            report
        }
    }
}

fn warn_duplicate_names(modules: &[Module]) {
    for (i, module) in modules.iter().enumerate() {
        if modules[..i].iter().any(|earlier| earlier.name == module.name) {
            warn!("Duplicate module name in document: {}", module.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::ExtractionError;
    use crate::core::models::Severity;
    use crate::core::report::NO_MACROS_MESSAGE;

    struct FixedExtractor(Vec<RawModule>);

    impl MacroExtractor for FixedExtractor {
        fn extract(&self, _path: &Path) -> Result<Vec<RawModule>, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl MacroExtractor for FailingExtractor {
        fn extract(&self, path: &Path) -> Result<Vec<RawModule>, ExtractionError> {
            Err(ExtractionError::Unsupported(path.to_path_buf()))
        }
    }

    fn sample_modules() -> Vec<RawModule> {
        vec![
            RawModule::new("Module1", "Sub Run()\n  Shell \"calc\"\n  Shell(\"cmd\")\nEnd Sub"),
            RawModule::new("Class1.cls", "VERSION 1.0 CLASS\nOption Explicit\nKill \"x\""),
            RawModule::new("Module2", "Range(\"A1\").Select\nRange(\"B1\").Activate"),
        ]
    }

    #[test]
    fn test_no_macros() {
        let analyzer = MacroAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let report = analyzer.analyze_document(&FixedExtractor(Vec::new()), Path::new("doc.xlsm"));
        assert_eq!(report.error.as_deref(), Some(NO_MACROS_MESSAGE));
        assert_eq!(report.summary.risk_level, Severity::Low);
        assert_eq!(report.summary.performance_score, 100);
        assert_eq!(report.summary.quality_score, 100);
    }

    #[test]
    fn test_extraction_failure_becomes_error_report() {
        let analyzer = MacroAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let report = analyzer.analyze_document(&FailingExtractor, Path::new("doc.xlsm"));
        assert!(report.error.as_deref().unwrap().starts_with("Unsupported document type"));
        assert!(report.modules.is_empty());
        assert_eq!(report.findings_count(), 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let parallel = MacroAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let sequential = MacroAnalyzer::new(AnalyzerConfig {
            parallel: false,
            ..AnalyzerConfig::default()
        })
        .unwrap();

        let a = parallel.analyze_modules(sample_modules());
        let b = sequential.analyze_modules(sample_modules());
        assert_eq!(a, b);
    }

    #[test]
    fn test_document_report() {
        let analyzer = MacroAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let report = analyzer.analyze_document(&FixedExtractor(sample_modules()), Path::new("doc"));

        assert!(report.is_success());
        assert_eq!(report.summary.total_modules, 3);
        assert_eq!(report.summary.total_lines, 4 + 3 + 2);
        assert_eq!(report.summary.risk_level, Severity::High);

        let lines: Vec<(&str, Option<usize>)> = report
            .security_risks
            .iter()
            .map(|r| (r.module.as_str(), r.line))
            .collect();
        assert_eq!(
            lines,
            vec![("Module1", Some(3)), ("Class1.cls", Some(3))]
        );

        let kinds: Vec<&str> = report
            .performance_issues
            .iter()
            .map(|p| p.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["option_explicit", "select_usage", "option_explicit"]);
        assert!(report.insights.is_none());
    }

    #[test]
    fn test_insights_follow_config() {
        let analyzer = MacroAnalyzer::new(AnalyzerConfig {
            insights: true,
            ..AnalyzerConfig::default()
        })
        .unwrap();
        let report = analyzer.analyze_modules(sample_modules());
        assert!(report.insights.unwrap().len() >= 2);
    }
}
