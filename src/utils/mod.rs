/// Utility modules for the macro analyzer
///
/// This module contains helpers for reading module exports and for rendering
/// reports in the supported output formats.

pub mod file_utils;
pub mod output_formatter;
