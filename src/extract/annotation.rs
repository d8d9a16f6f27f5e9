//! `@prompt` annotation detection in comment text.

const MARKER: &str = "@prompt";

/// Check comment text for an `@prompt` annotation.
///
/// Returns `None` when the text does not mention `@prompt` at all,
/// `Some(true)` when a token-bounded annotation is present, and `Some(false)`
/// when the mention is part of a longer token (`@prompting`, `my@prompt`).
pub(crate) fn annotation_marker(comment: &str) -> Option<bool> {
    let lower = comment.to_lowercase();
    let pos = lower.find(MARKER)?;

    let valid_before = lower[..pos]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric() && c != '_');
    let valid_after = lower[pos + MARKER.len()..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric() && c != '_');

    Some(valid_before && valid_after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_marker() {
        assert_eq!(annotation_marker("@prompt"), Some(true));
        assert_eq!(annotation_marker(" @prompt "), Some(true));
        assert_eq!(annotation_marker("@prompt greeting"), Some(true));
        assert_eq!(annotation_marker("greeting @prompt"), Some(true));
    }

    #[test]
    fn surrounding_text() {
        assert_eq!(annotation_marker("@prompt for user greeting"), Some(true));
        assert_eq!(annotation_marker("This is a @prompt comment"), Some(true));
        assert_eq!(annotation_marker("* @prompt"), Some(true));
        assert_eq!(annotation_marker("*@prompt"), Some(true));
        assert_eq!(annotation_marker("  * @prompt  "), Some(true));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(annotation_marker("@PROMPT"), Some(true));
        assert_eq!(annotation_marker("@Prompt"), Some(true));
        assert_eq!(annotation_marker("@PrOmPt with mixed case"), Some(true));
    }

    #[test]
    fn longer_tokens_rejected() {
        assert_eq!(annotation_marker("@prompting"), Some(false));
        assert_eq!(annotation_marker("my@prompt"), Some(false));
        assert_eq!(annotation_marker("@prompt_id"), Some(false));
        assert_eq!(annotation_marker("x@prompty"), Some(false));
    }

    #[test]
    fn no_mention() {
        assert_eq!(annotation_marker("just a comment"), None);
        assert_eq!(annotation_marker("prompt without the at sign"), None);
        assert_eq!(annotation_marker(""), None);
    }
}
