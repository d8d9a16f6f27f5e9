//! Prompt extraction from source files.
//!
//! A string or template literal counts as a prompt when it is bound to an
//! identifier whose name contains `prompt`, when it carries an `@prompt`
//! comment annotation, or when it is assigned to a previously annotated
//! identifier.

mod annotation;
mod python;
mod tsjs;

use crate::types::SourcePrompt;
use crate::Result;

/// Source language family, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    TsJs,
    Python,
}

impl Language {
    /// Pick the scanner for a path. Unknown extensions get the TS/JS scanner.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".py") || lower.ends_with(".pyi") {
            Language::Python
        } else {
            Language::TsJs
        }
    }
}

/// Scan `source` for prompt definitions.
pub fn extract_prompts(source: &str, file: &str) -> Result<Vec<SourcePrompt>> {
    match Language::from_path(file) {
        Language::Python => python::scan(source, file),
        Language::TsJs => tsjs::scan(source, file),
    }
}
