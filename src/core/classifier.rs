/// Module kind classification
///
/// A cheap header heuristic, not a parser: it looks for literal markers in
/// the first characters of the source and falls back to the module name's
/// extension.

use std::path::Path;

use crate::core::models::ModuleKind;

/// Number of leading characters inspected for header markers
pub const HEADER_CHARS: usize = 100;

const CLASS_MARKERS: &[&str] = &["Class Module", "VERSION 1.0 CLASS"];
const FORM_MARKERS: &[&str] = &["UserForm"];

/// Assign a module kind from the module name and source header. Never fails.
pub fn classify(name: &str, source: &str) -> ModuleKind {
    let header = leading_chars(source, HEADER_CHARS);

    if CLASS_MARKERS.iter().any(|marker| header.contains(marker)) {
        return ModuleKind::Class;
    }
    if FORM_MARKERS.iter().any(|marker| header.contains(marker)) {
        return ModuleKind::Form;
    }

    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("cls") => ModuleKind::Class,
        Some("frm") => ModuleKind::Form,
        _ => ModuleKind::Standard,
    }
}

fn leading_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_markers() {
        assert_eq!(
            classify("Class1", "' Class Module for orders\nPrivate mId As Long"),
            ModuleKind::Class
        );
        assert_eq!(
            classify("Sheet", "VERSION 1.0 CLASS\nBEGIN\n  MultiUse = -1\nEND"),
            ModuleKind::Class
        );
        assert_eq!(
            classify(
                "UserForm1",
                "VERSION 5.00\nBegin {C62A69F0-16DC-11CE-9E98-00AA00575482} UserForm1"
            ),
            ModuleKind::Form
        );
        assert_eq!(classify("Module1", "Option Explicit\n"), ModuleKind::Standard);
    }

    #[test]
    fn test_class_marker_wins_over_form_marker() {
        assert_eq!(classify("X", "Class Module UserForm helper"), ModuleKind::Class);
    }

    #[test]
    fn test_markers_beyond_header_are_ignored() {
        let source = format!("{}Class Module", " ".repeat(HEADER_CHARS));
        assert_eq!(classify("Module1", &source), ModuleKind::Standard);
    }

    #[test]
    fn test_name_extension_fallback() {
        assert_eq!(classify("Invoice.cls", "Option Explicit"), ModuleKind::Class);
        assert_eq!(classify("Dialog.FRM", ""), ModuleKind::Form);
        assert_eq!(classify("Module1.bas", ""), ModuleKind::Standard);
    }

    #[test]
    fn test_multibyte_header_does_not_panic() {
        let source = "가".repeat(150);
        assert_eq!(classify("Module1", &source), ModuleKind::Standard);
    }
}
