/// VBA Analyzer - static analysis of VBA macro modules
///
/// This library classifies the macro modules of a document, scans them for
/// security risks, performance anti-patterns and code quality issues, and
/// produces a scored report.

// Re-export core modules
pub mod core;
pub mod utils;

// Re-export main analyzer types for convenience
pub use crate::core::analyzer::MacroAnalyzer;
pub use crate::core::extractor::{ExtractionError, MacroExtractor, SourceExtractor};
pub use crate::core::models::{
    Finding, Module, ModuleKind, PerformanceIssue, QualityIssue, RawModule, SecurityRisk, Severity,
};
pub use crate::core::patterns::{load_rules, RuleError, RuleRegistry};
pub use crate::core::report::{Report, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a single document with the default configuration
///
/// This is a convenience function for simple use cases.
///
/// # Arguments
///
/// * `path` - Exported module file, directory of exports or JSON module dump
///
/// # Returns
///
/// The document report; extraction problems are reported in its `error` field
pub fn analyze_document<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Report> {
    let analyzer = MacroAnalyzer::new(config::default_config())?;
    Ok(analyzer.analyze_document(&SourceExtractor::new(), path.as_ref()))
}

/// Analyze one in-memory module with the default configuration
pub fn analyze_source(name: &str, code: &str) -> anyhow::Result<Report> {
    let analyzer = MacroAnalyzer::new(config::default_config())?;
    Ok(analyzer.analyze_modules(vec![RawModule::new(name, code)]))
}

/// Library configuration and utilities
pub mod config {
    use std::path::Path;

    use anyhow::{Context, Result};
    use log::info;
    use serde::{Deserialize, Serialize};

    /// Characters of module source kept in a report preview
    pub const DEFAULT_PREVIEW_CHARS: usize = 1000;

    /// Analyzer options; every field falls back to its default when absent
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AnalyzerConfig {
        /// Length of the source preview in module summaries
        pub preview_chars: usize,
        /// Scan modules on the rayon pool
        pub parallel: bool,
        /// Attach plain-language insights to successful reports
        pub insights: bool,
        /// Per-document deadline in seconds (0 for none)
        pub timeout_secs: u64,
    }

    impl Default for AnalyzerConfig {
        fn default() -> Self {
            Self {
                preview_chars: DEFAULT_PREVIEW_CHARS,
                parallel: true,
                insights: false,
                timeout_secs: 0,
            }
        }
    }

    /// Create default configuration
    pub fn default_config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    /// Load configuration from a JSON file
    pub fn load_config(path: &Path) -> Result<AnalyzerConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Configuration file not found: {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in configuration file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Command-line application functionality
pub mod app {
    use std::path::Path;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use log::warn;
    use serde::{Deserialize, Serialize};

    use crate::config::AnalyzerConfig;
    use crate::core::analyzer::MacroAnalyzer;
    use crate::core::extractor::SourceExtractor;
    use crate::core::report::Report;

    /// A report tagged with the document it belongs to
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DocumentReport {
        pub document: String,
        #[serde(flatten)]
        pub report: Report,
    }

    /// Analyze one document, giving up after `config.timeout_secs`
    ///
    /// A document that misses the deadline yields an error report; its worker
    /// thread is left to finish on its own.
    pub fn analyze_with_deadline(path: &Path, config: &AnalyzerConfig) -> Result<Report> {
        let analyzer = MacroAnalyzer::new(config.clone())?;

        if config.timeout_secs == 0 {
            return Ok(analyzer.analyze_document(&SourceExtractor::new(), path));
        }

        let (tx, rx) = mpsc::channel();
        let document = path.to_path_buf();
        thread::spawn(move || {
            let report = analyzer.analyze_document(&SourceExtractor::new(), &document);
            let _ = tx.send(report);
        });

        match rx.recv_timeout(Duration::from_secs(config.timeout_secs)) {
            Ok(report) => Ok(report),
            Err(RecvTimeoutError::Timeout) => {
                warn!("Analysis timed out for {}", path.display());
                Ok(Report::failed(format!(
                    "Analysis timed out after {}s",
                    config.timeout_secs
                )))
            }
            Err(RecvTimeoutError::Disconnected) => Err(anyhow!(
                "Analysis worker for {} stopped without a report",
                path.display()
            )),
        }
    }

    /// Run the analyzer on multiple documents
    ///
    /// # Arguments
    ///
    /// * `paths` - Documents to analyze
    /// * `config` - Configuration options
    ///
    /// # Returns
    ///
    /// One tagged report per document, in input order
    pub fn run_analyzer<P: AsRef<Path>>(
        paths: &[P],
        config: &AnalyzerConfig,
    ) -> Result<Vec<DocumentReport>> {
        let mut results = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let report = analyze_with_deadline(path, config)?;
            results.push(DocumentReport {
                document: path.to_string_lossy().to_string(),
                report,
            });
        }

        Ok(results)
    }
}
