//! Prompt scanner for Python sources.
//!
//! Same lexical approach as the TS/JS scanner: comments and string literals
//! are tokenized exactly, with just enough statement state to associate a
//! literal with the name it is bound to. f-string placeholders become vars.

use std::collections::HashSet;

use memchr::memchr;

use super::annotation::annotation_marker;
use crate::types::{PromptVar, SourcePrompt, Span, SpanPair};
use crate::Result;

pub(crate) fn scan(source: &str, file: &str) -> Result<Vec<SourcePrompt>> {
    Scanner::new(source, file).run()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Words that can never open a binding statement.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

struct Scanner<'a> {
    src: &'a [u8],
    text: &'a str,
    file: &'a str,
    pos: usize,
    prompts: Vec<SourcePrompt>,
    annotated: HashSet<String>,
    pending: bool,
    pending_since_stmt: bool,
    stmt_started: bool,
    /// First token of the statement, when it is a plain identifier.
    first_ident: Option<String>,
    /// The first identifier turned out not to be a simple binding target
    /// (keyword, call, attribute access).
    first_broken: bool,
    /// The token just consumed was the statement's first identifier.
    first_just_set: bool,
    target: Option<String>,
    awaiting_value: bool,
    last_ident: Option<(usize, usize)>,
    last_sig: u8,
    /// `(`/`[`/`{` nesting depth; newlines inside do not end statements.
    depth: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, file: &'a str) -> Self {
        Self {
            src: text.as_bytes(),
            text,
            file,
            pos: 0,
            prompts: Vec::new(),
            annotated: HashSet::new(),
            pending: false,
            pending_since_stmt: false,
            stmt_started: false,
            first_ident: None,
            first_broken: false,
            first_just_set: false,
            target: None,
            awaiting_value: false,
            last_ident: None,
            last_sig: 0,
            depth: 0,
        }
    }

    fn run(mut self) -> Result<Vec<SourcePrompt>> {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            match b {
                b'\n' => {
                    if self.depth == 0 {
                        self.end_statement();
                    }
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\\' if self.peek(1) == Some(b'\n') => self.pos += 2,
                b'#' => self.line_comment(),
                b'\'' | b'"' => self.string_literal(self.pos, false)?,
                b'=' => self.equals(),
                b';' => {
                    self.end_statement();
                    self.last_sig = b;
                    self.pos += 1;
                }
                b'(' | b'[' | b'{' => {
                    self.depth += 1;
                    self.code_token(b);
                    self.pos += 1;
                }
                b')' | b']' | b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.code_token(b);
                    self.pos += 1;
                }
                _ if is_ident_start(b) => self.identifier()?,
                _ => {
                    self.code_token(b);
                    self.pos += 1;
                }
            }
        }
        Ok(self.prompts)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn code_token(&mut self, b: u8) {
        if !self.stmt_started {
            // Statement opens with punctuation: not a binding.
            self.first_broken = true;
        }
        if self.first_just_set && matches!(b, b'.' | b'(' | b'[') {
            self.first_broken = true;
        }
        self.first_just_set = false;
        self.stmt_started = true;
        self.awaiting_value = false;
        self.last_ident = None;
        self.last_sig = b;
    }

    fn end_statement(&mut self) {
        if !self.stmt_started {
            return;
        }
        if self.pending && !self.pending_since_stmt {
            // An annotated declaration without a string value still flags the
            // name, so a later assignment to it is captured.
            if let Some(first) = self.first_ident.take() {
                if !self.first_broken {
                    self.annotated.insert(first);
                }
            }
            self.pending = false;
        }
        self.pending_since_stmt = false;
        self.stmt_started = false;
        self.first_ident = None;
        self.first_broken = false;
        self.first_just_set = false;
        self.target = None;
        self.awaiting_value = false;
        self.last_ident = None;
    }

    fn line_comment(&mut self) {
        let start = self.pos + 1;
        let end = memchr(b'\n', &self.src[start..])
            .map(|i| start + i)
            .unwrap_or(self.src.len());
        if let Some(valid) = annotation_marker(&self.text[start..end]) {
            self.pending = valid;
            self.pending_since_stmt = valid && self.stmt_started;
        }
        self.pos = end;
    }

    fn identifier(&mut self) -> Result<()> {
        let start = self.pos;
        let mut end = self.pos;
        while end < self.src.len() && is_ident_continue(self.src[end]) {
            end += 1;
        }
        let word = &self.text[start..end];

        // A short run of prefix letters directly before a quote is a string
        // prefix, not an identifier.
        if word.len() <= 2
            && word
                .bytes()
                .all(|b| matches!(b.to_ascii_lowercase(), b'f' | b'r' | b'b' | b'u'))
            && matches!(self.src.get(end).copied(), Some(b'\'' | b'"'))
        {
            let is_f = word.to_ascii_lowercase().contains('f');
            self.pos = end;
            return self.string_literal(start, is_f);
        }

        let first_token = !self.stmt_started;
        self.stmt_started = true;
        self.first_just_set = false;

        if KEYWORDS.contains(&word) {
            if first_token {
                self.first_broken = true;
            }
            self.last_ident = None;
        } else {
            if first_token {
                self.first_ident = Some(word.to_string());
                self.first_just_set = true;
            }
            if self.last_sig == b'.' {
                self.last_ident = None;
            } else {
                self.last_ident = Some((start, end));
            }
        }
        self.awaiting_value = false;
        self.last_sig = self.src[end - 1];
        self.pos = end;
        Ok(())
    }

    fn equals(&mut self) {
        if self.peek(1) == Some(b'=') {
            self.code_token(b'=');
            self.pos += 2;
            return;
        }
        match self.last_sig {
            // tail of `!=`, `<=`, `+=`, `:=`, `@=`, ...
            b'<' | b'>' | b'!' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b':'
            | b'@' => {
                self.code_token(b'=');
                self.pos += 1;
            }
            _ => {
                // Keyword defaults and other bracketed assignments are not
                // bindings.
                if self.depth > 0 {
                    self.awaiting_value = false;
                } else if !self.first_broken && self.first_ident.is_some() {
                    let target = self.first_ident.clone();
                    if self.pending {
                        if let Some(t) = &target {
                            self.annotated.insert(t.clone());
                        }
                    }
                    self.target = target;
                    self.awaiting_value = true;
                } else if let Some((s, e)) = self.last_ident {
                    self.target = Some(self.text[s..e].to_string());
                    self.awaiting_value = true;
                } else {
                    self.awaiting_value = false;
                }
                self.first_just_set = false;
                self.stmt_started = true;
                self.last_ident = None;
                self.last_sig = b'=';
                self.pos += 1;
            }
        }
    }

    /// Scan a string literal; cursor is on the opening quote, `prefix_start`
    /// is where the literal (including any prefix letters) begins.
    fn string_literal(&mut self, prefix_start: usize, is_f: bool) -> Result<()> {
        let quote = self.src[self.pos];
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        let quote_len = if triple { 3 } else { 1 };
        self.pos += quote_len;
        let inner_start = self.pos;
        let mut vars = Vec::new();

        loop {
            match self.src.get(self.pos).copied() {
                Some(b'\\') => self.pos += 2,
                Some(b) if b == quote => {
                    if !triple || (self.peek(1) == Some(quote) && self.peek(2) == Some(quote)) {
                        break;
                    }
                    self.pos += 1;
                }
                Some(b'\n') if !triple => {
                    return Err(crate::Error::parse(self.file, "unterminated string literal"));
                }
                Some(b'{') if is_f => {
                    if self.peek(1) == Some(b'{') {
                        self.pos += 2;
                    } else if let Some(var) = self.fstring_var()? {
                        vars.push(var);
                    }
                }
                Some(b'}') if is_f => {
                    self.pos += if self.peek(1) == Some(b'}') { 2 } else { 1 };
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(self.file, "unterminated string literal"));
                }
            }
        }

        let inner = Span::new(inner_start, self.pos);
        self.pos += quote_len;
        let outer = Span::new(prefix_start, self.pos);
        self.finish_literal(outer, inner, vars);
        Ok(())
    }

    /// Parse an f-string `{...}` placeholder; cursor is on the `{`.
    fn fstring_var(&mut self) -> Result<Option<PromptVar>> {
        let outer_start = self.pos;
        self.pos += 1;
        let inner_start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.src.get(self.pos).copied() {
                Some(b'{' | b'(' | b'[') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b')' | b']') => {
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                }
                Some(b'}') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.pos += 1;
                }
                Some(q @ (b'\'' | b'"')) => self.skip_expr_string(q)?,
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(
                        self.file,
                        "unterminated f-string expression",
                    ));
                }
            }
        }
        let inner_end = self.pos;
        self.pos += 1;
        let outer = Span::new(outer_start, self.pos);

        let region = &self.text[inner_start..inner_end];
        let exp_region = &region[..expression_end(region.as_bytes())];
        let exp = exp_region.trim();
        if exp.is_empty() {
            return Ok(None);
        }
        let lead = exp_region.len() - exp_region.trim_start().len();
        let inner = Span::new(inner_start + lead, inner_start + lead + exp.len());
        Ok(Some(PromptVar {
            exp: exp.to_string(),
            span: SpanPair::new(outer, inner),
        }))
    }

    fn skip_expr_string(&mut self, quote: u8) -> Result<()> {
        self.pos += 1;
        loop {
            match self.src.get(self.pos).copied() {
                Some(b'\\') => self.pos += 2,
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(self.file, "unterminated string literal"));
                }
            }
        }
    }

    fn finish_literal(&mut self, outer: Span, inner: Span, vars: Vec<PromptVar>) {
        self.stmt_started = true;
        if self.awaiting_value {
            if let Some(target) = &self.target {
                let named = target.to_lowercase().contains("prompt");
                let annotated = self.annotated.contains(target);
                if self.pending || named || annotated {
                    self.prompts.push(SourcePrompt {
                        file: self.file.to_string(),
                        content: self.text[inner.start..inner.end].to_string(),
                        span: SpanPair::new(outer, inner),
                        vars,
                    });
                    self.pending = false;
                }
            }
        }
        self.awaiting_value = false;
        self.first_just_set = false;
        self.last_ident = None;
        self.last_sig = b'"';
    }
}

/// Where the placeholder's expression ends within `region`: before a
/// top-level format spec (`:`), conversion (`!r`/`!s`/`!a`), or debug `=`.
fn expression_end(region: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut i = 0;
    while i < region.len() {
        match region[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            q @ (b'\'' | b'"') => {
                i += 1;
                while i < region.len() && region[i] != q {
                    if region[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b':' if depth == 0 => return i,
            b'!' if depth == 0
                && matches!(region.get(i + 1), Some(b'r' | b's' | b'a'))
                && matches!(region.get(i + 2), None | Some(b':')) =>
            {
                return i;
            }
            b'=' if depth == 0 => {
                let prev = if i == 0 { 0 } else { region[i - 1] };
                let terminal = matches!(region.get(i + 1), None | Some(b':' | b'!'));
                if terminal && !matches!(prev, b'=' | b'!' | b'<' | b'>') {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    region.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(source: &str) -> Vec<SourcePrompt> {
        scan(source, "prompts.py").expect("scan should succeed")
    }

    #[test]
    fn detect_name_heuristic() {
        let found = prompts(r#"user_prompt = "You are a helpful assistant.""#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "You are a helpful assistant.");
        assert_eq!(found[0].span.outer, Span::new(14, 44));
        assert_eq!(found[0].span.inner, Span::new(15, 43));
    }

    #[test]
    fn detect_annotated_fstring_with_var() {
        let found = prompts("# @prompt\ngreeting = f\"Hello, {name}!\"");
        assert_eq!(found.len(), 1);
        let prompt = &found[0];
        assert_eq!(prompt.content, "Hello, {name}!");
        assert_eq!(prompt.span.outer, Span::new(21, 38));
        assert_eq!(prompt.span.inner, Span::new(23, 37));
        assert_eq!(prompt.vars.len(), 1);
        assert_eq!(prompt.vars[0].exp, "name");
        assert_eq!(prompt.vars[0].span.outer, Span::new(30, 36));
        assert_eq!(prompt.vars[0].span.inner, Span::new(31, 35));
    }

    #[test]
    fn escaped_braces_are_not_vars() {
        let found = prompts(r#"my_prompt = f"{{literal}} {x}""#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vars.len(), 1);
        assert_eq!(found[0].vars[0].exp, "x");
    }

    #[test]
    fn format_spec_and_conversion_trimmed_from_exp() {
        let found = prompts(r#"price_prompt = f"cost: {price:.2f} repr: {obj!r}""#);
        assert_eq!(found[0].vars.len(), 2);
        assert_eq!(found[0].vars[0].exp, "price");
        assert_eq!(found[0].vars[1].exp, "obj");
    }

    #[test]
    fn debug_marker_trimmed_from_exp() {
        let found = prompts(r#"debug_prompt = f"{value=}""#);
        assert_eq!(found[0].vars.len(), 1);
        assert_eq!(found[0].vars[0].exp, "value");
    }

    #[test]
    fn plain_assignments_ignored() {
        let found = prompts("regular = \"nothing special\"\nother = f\"also {nothing}\"\n");
        assert!(found.is_empty());
    }

    #[test]
    fn annotation_applies_to_next_statement_only() {
        let found = prompts("# @prompt\ndo_work()\n\nmessage = \"not captured\"\n");
        assert!(found.is_empty());
    }

    #[test]
    fn annotated_bare_declaration_flags_later_assignment() {
        let found = prompts("# @prompt\nmsg: str\nmsg = f\"hi {x}\"\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "hi {x}");
        assert_eq!(found[0].vars[0].exp, "x");
    }

    #[test]
    fn triple_quoted_fstring() {
        let source = "# @prompt\ntext = f\"\"\"Dear {user},\nwelcome!\"\"\"\n";
        let found = prompts(source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "Dear {user},\nwelcome!");
        assert_eq!(found[0].vars.len(), 1);
        assert_eq!(found[0].vars[0].exp, "user");
    }

    #[test]
    fn uppercase_prefix() {
        let found = prompts(r#"sys_prompt = F"role: {role}""#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vars[0].exp, "role");
    }

    #[test]
    fn docstring_not_captured() {
        let found = prompts("\"\"\"Module docstring with prompt word.\"\"\"\nx = 1\n");
        assert!(found.is_empty());
    }

    #[test]
    fn attribute_assignment_not_captured() {
        let found = prompts("config.prompt = \"nope\"\n");
        assert!(found.is_empty());
    }

    #[test]
    fn near_miss_annotation_rejected() {
        let found = prompts("# @prompting\nhello = \"Hello, world!\"\n");
        assert!(found.is_empty());
    }

    #[test]
    fn unterminated_string_is_parse_error() {
        let err = scan("my_prompt = \"abc", "prompts.py").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
        assert!(err.to_string().contains("prompts.py"));
    }

    #[test]
    fn keyword_default_not_captured() {
        let found = prompts("def greet(user_prompt=\"fallback\"):\n    return user_prompt\n");
        assert!(found.is_empty());
    }

    #[test]
    fn nested_call_in_placeholder() {
        let found = prompts(r#"the_prompt = f"Hello, {format_name(user, title='Dr.')}!""#);
        assert_eq!(found[0].vars.len(), 1);
        assert_eq!(found[0].vars[0].exp, "format_name(user, title='Dr.')");
    }
}
