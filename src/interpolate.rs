//! Span-based variable substitution for extracted prompts.

use std::collections::HashMap;

use crate::types::SourcePrompt;

/// Interpolate `values` into an extracted prompt, producing the final prompt
/// text.
///
/// Vars are keyed by their expression text; a var with no supplied value
/// falls back to that expression text. Substitution runs in reverse source
/// order so earlier spans stay valid while later ones are replaced. Vars
/// whose spans do not land inside the content are skipped.
pub fn interpolate(prompt: &SourcePrompt, values: &HashMap<String, String>) -> String {
    let base = prompt.span.inner.start;
    let mut result = prompt.content.clone();

    for var in prompt.vars.iter().rev() {
        let (start, end) = match (
            var.span.outer.start.checked_sub(base),
            var.span.outer.end.checked_sub(base),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => continue,
        };
        if end < start
            || end > result.len()
            || !result.is_char_boundary(start)
            || !result.is_char_boundary(end)
        {
            continue;
        }
        let replacement = values
            .get(&var.exp)
            .map(String::as_str)
            .unwrap_or(var.exp.as_str());
        result.replace_range(start..end, replacement);
    }

    result
}
