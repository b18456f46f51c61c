/// Macro module extraction
///
/// Extractors turn a document path into `(name, source)` pairs. Container
/// formats are handled by external tools; this crate reads exported module
/// files, directories of exports and JSON module dumps.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::models::RawModule;
use crate::utils::file_utils::{self, InputKind};

/// Error raised while extracting modules from a document
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported document type: {} (expected an exported module, a JSON module dump or a directory)", .0.display())]
    Unsupported(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid module dump {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractionError {
    fn io(path: &Path, source: io::Error) -> Self {
        ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Source of macro modules for one document
///
/// An empty vector means the document carries no macros.
pub trait MacroExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Vec<RawModule>, ExtractionError>;
}

/// Extractor for exported module sources
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceExtractor;

impl SourceExtractor {
    pub fn new() -> Self {
        Self
    }

    fn read_module(path: &Path) -> Result<RawModule, ExtractionError> {
        let code = file_utils::read_source_text(path).map_err(|e| ExtractionError::io(path, e))?;
        Ok(RawModule::new(file_utils::module_name(path), code))
    }

    fn read_directory(dir: &Path) -> Result<Vec<RawModule>, ExtractionError> {
        let files = file_utils::collect_module_files(dir).map_err(|e| ExtractionError::io(dir, e))?;
        debug!("Found {} module file(s) under {}", files.len(), dir.display());

        files.iter().map(|file| Self::read_module(file)).collect()
    }

    fn read_dump(path: &Path) -> Result<Vec<RawModule>, ExtractionError> {
        let text = file_utils::read_source_text(path).map_err(|e| ExtractionError::io(path, e))?;

        serde_json::from_str(&text).map_err(|source| ExtractionError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MacroExtractor for SourceExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<RawModule>, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }

        let kind = file_utils::detect_input_kind(path);
        info!("Extracting macros from {} ({:?})", path.display(), kind);

        match kind {
            InputKind::ModuleFile => Ok(vec![Self::read_module(path)?]),
            InputKind::Directory => Self::read_directory(path),
            InputKind::ModuleDump => Self::read_dump(path),
            InputKind::Unsupported => Err(ExtractionError::Unsupported(path.to_path_buf())),
        }
    }
}
