/// Core module for macro analysis
///
/// This module contains the analysis pipeline: module classification, the
/// rule registry and engine, scoring, and report assembly.

pub mod analyzer;
pub mod classifier;
pub mod engine;
pub mod extractor;
pub mod insights;
pub mod models;
pub mod patterns;
pub mod report;
pub mod scoring;
