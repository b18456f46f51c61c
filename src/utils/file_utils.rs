/// File handling utilities
///
/// This module provides helpers for recognizing exported macro module files,
/// decoding their text, and walking directories of exports.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

/// Extensions of exported macro module files
pub const MODULE_EXTENSIONS: &[&str] = &["bas", "cls", "frm", "vba"];

/// Extension of a JSON module dump
pub const DUMP_EXTENSION: &str = "json";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Kind of an analysis input, decided from the path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single exported module (`.bas`, `.cls`, `.frm`, `.vba`)
    ModuleFile,
    /// A JSON array of `{name, code}` objects
    ModuleDump,
    /// A directory of exported modules
    Directory,
    /// Anything else, including Office containers
    Unsupported,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Detect the input kind of a path.
///
/// # Arguments
///
/// * `path` - Path handed to the analyzer
///
/// # Returns
///
/// The detected input kind
pub fn detect_input_kind(path: &Path) -> InputKind {
    if path.is_dir() {
        return InputKind::Directory;
    }

    match extension_of(path).as_deref() {
        Some(ext) if MODULE_EXTENSIONS.contains(&ext) => InputKind::ModuleFile,
        Some(DUMP_EXTENSION) => InputKind::ModuleDump,
        _ => InputKind::Unsupported,
    }
}

pub fn is_module_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| MODULE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decode module text.
///
/// UTF-8 with an optional byte-order mark; anything that is not valid UTF-8
/// is read as Latin-1, which maps every byte to a character.
pub fn decode_source(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Source is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&byte| char::from(byte)).collect()
        }
    }
}

/// Read and decode the text of a module file
pub fn read_source_text(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_source(&bytes))
}

/// Collect every exported module file below a directory.
///
/// # Arguments
///
/// * `dir` - Directory to walk recursively
///
/// # Returns
///
/// Module file paths sorted by path
pub fn collect_module_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_module_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Module name for an exported file: its file name, extension included
pub fn module_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_input_kind() {
        let dir = tempdir().unwrap();
        assert_eq!(detect_input_kind(dir.path()), InputKind::Directory);
        assert_eq!(detect_input_kind(Path::new("Module1.bas")), InputKind::ModuleFile);
        assert_eq!(detect_input_kind(Path::new("Sheet.CLS")), InputKind::ModuleFile);
        assert_eq!(detect_input_kind(Path::new("dump.json")), InputKind::ModuleDump);
        assert_eq!(detect_input_kind(Path::new("book.xlsm")), InputKind::Unsupported);
        assert_eq!(detect_input_kind(Path::new("README")), InputKind::Unsupported);
    }

    #[test]
    fn test_decode_source() {
        assert_eq!(decode_source(b"\xEF\xBB\xBFSub A()"), "Sub A()");
        assert_eq!(decode_source("Sub Café()".as_bytes()), "Sub Café()");
        // 0xE9 alone is not UTF-8; Latin-1 reads it as 'é'
        assert_eq!(decode_source(b"' caf\xE9"), "' café");
    }

    #[test]
    fn test_collect_module_files_sorted() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("forms");
        fs::create_dir(&nested).unwrap();

        for path in [
            dir.path().join("b.bas"),
            dir.path().join("a.cls"),
            dir.path().join("notes.txt"),
            nested.join("UserForm1.frm"),
        ] {
            let mut file = File::create(path).unwrap();
            writeln!(file, "Option Explicit").unwrap();
        }

        let files = collect_module_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| module_name(p)).collect();
        assert_eq!(names, vec!["a.cls", "b.bas", "UserForm1.frm"]);
    }

    #[test]
    fn test_module_name_keeps_extension() {
        assert_eq!(module_name(Path::new("/tmp/export/Module1.bas")), "Module1.bas");
    }
}
