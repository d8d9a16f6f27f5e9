//! Prompt scanner for the TypeScript/JavaScript family.
//!
//! A lexical pass over the source: comments, string literals, and template
//! literals are tokenized exactly; in between, just enough statement state is
//! tracked to associate a literal with the identifier it is bound to.

use std::collections::HashSet;

use memchr::{memchr, memmem};

use super::annotation::annotation_marker;
use crate::types::{PromptVar, SourcePrompt, Span, SpanPair};
use crate::Result;

pub(crate) fn scan(source: &str, file: &str) -> Result<Vec<SourcePrompt>> {
    Scanner::new(source, file).run()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

struct Scanner<'a> {
    src: &'a [u8],
    text: &'a str,
    file: &'a str,
    pos: usize,
    prompts: Vec<SourcePrompt>,
    /// Identifiers flagged by an annotation on their declaration.
    annotated: HashSet<String>,
    /// An annotation is waiting to apply.
    pending: bool,
    /// The pending annotation appeared inside the current statement, so it
    /// targets the next one and survives this statement's end.
    pending_since_stmt: bool,
    /// Code tokens seen since the last statement boundary.
    stmt_started: bool,
    /// Inside a `const`/`let`/`var` declarator.
    decl: bool,
    /// The binding target of the current declaration or assignment.
    target: Option<String>,
    /// Saw `=`; the next token decides whether the initializer is a literal.
    awaiting_value: bool,
    /// Byte range of the last standalone identifier token.
    last_ident: Option<(usize, usize)>,
    /// Last significant byte, to tell `.prop` access and compound operators.
    last_sig: u8,
    /// `(`/`[` nesting depth; newlines inside do not end statements.
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
            decl: false,
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
                    if self.depth == 0 && !self.awaiting_value {
                        self.end_statement();
                    }
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment()?,
                b'\'' | b'"' => self.string_literal(b)?,
                b'`' => self.template_literal()?,
                b'=' => self.equals(),
                b';' | b'}' => {
                    self.end_statement();
                    self.last_sig = b;
                    self.pos += 1;
                }
                b'(' | b'[' => {
                    self.depth += 1;
                    self.code_token(b);
                    self.pos += 1;
                }
                b')' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.code_token(b);
                    self.pos += 1;
                }
                _ if is_ident_start(b) => self.identifier(),
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

    /// Any code token other than an identifier or literal: the statement is
    /// underway, and a pending `=` no longer points at a direct literal.
    fn code_token(&mut self, b: u8) {
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
            self.pending = false;
        }
        self.pending_since_stmt = false;
        self.stmt_started = false;
        self.decl = false;
        self.target = None;
        self.awaiting_value = false;
        self.last_ident = None;
    }

    fn apply_marker(&mut self, comment: &str) {
        if let Some(valid) = annotation_marker(comment) {
            self.pending = valid;
            self.pending_since_stmt = valid && self.stmt_started;
        }
    }

    fn line_comment(&mut self) {
        let start = self.pos + 2;
        let end = memchr(b'\n', &self.src[start..])
            .map(|i| start + i)
            .unwrap_or(self.src.len());
        let comment = &self.text[start..end];
        self.apply_marker(comment);
        self.pos = end;
    }

    fn block_comment(&mut self) -> Result<()> {
        let start = self.pos + 2;
        let close = memmem::find(&self.src[start..], b"*/").ok_or_else(|| {
            crate::Error::parse(self.file, "unterminated block comment")
        })?;
        let comment = &self.text[start..start + close];
        self.apply_marker(comment);
        self.pos = start + close + 2;
        Ok(())
    }

    fn identifier(&mut self) {
        let start = self.pos;
        let mut end = self.pos;
        while end < self.src.len() && is_ident_continue(self.src[end]) {
            end += 1;
        }
        let word = &self.text[start..end];
        self.stmt_started = true;

        match word {
            "const" | "let" | "var" => {
                self.decl = true;
                self.target = None;
                self.awaiting_value = false;
                self.last_ident = None;
            }
            _ => {
                let after_dot = self.last_sig == b'.';
                if self.decl && self.target.is_none() {
                    self.target = Some(word.to_string());
                    if self.pending {
                        self.annotated.insert(word.to_string());
                    }
                    self.last_ident = None;
                } else if after_dot {
                    self.last_ident = None;
                } else {
                    self.last_ident = Some((start, end));
                }
                self.awaiting_value = false;
            }
        }

        self.last_sig = self.src[end - 1];
        self.pos = end;
    }

    fn equals(&mut self) {
        match self.peek(1) {
            // `==` / `===`
            Some(b'=') => {
                let len = if self.peek(2) == Some(b'=') { 3 } else { 2 };
                self.code_token(b'=');
                self.pos += len;
            }
            // arrow function
            Some(b'>') => {
                self.code_token(b'=');
                self.pos += 2;
            }
            _ => match self.last_sig {
                // tail of `<=`, `!=`, `+=`, ... — an operator, not a binding
                b'<' | b'>' | b'!' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' => {
                    self.code_token(b'=');
                    self.pos += 1;
                }
                _ => {
                    // Default parameter values and other parenthesized
                    // assignments are not bindings.
                    if self.depth > 0 {
                        self.awaiting_value = false;
                    } else if self.decl && self.target.is_some() {
                        self.awaiting_value = true;
                    } else if let Some((s, e)) = self.last_ident {
                        self.target = Some(self.text[s..e].to_string());
                        self.awaiting_value = true;
                    } else {
                        self.awaiting_value = false;
                    }
                    self.stmt_started = true;
                    self.last_ident = None;
                    self.last_sig = b'=';
                    self.pos += 1;
                }
            },
        }
    }

    fn string_literal(&mut self, quote: u8) -> Result<()> {
        let start = self.pos;
        let mut i = self.pos + 1;
        loop {
            match self.src.get(i).copied() {
                Some(b'\\') => i += 2,
                Some(b) if b == quote => break,
                Some(b'\n') | None => {
                    return Err(crate::Error::parse(self.file, "unterminated string literal"));
                }
                Some(_) => i += 1,
            }
        }
        let outer = Span::new(start, i + 1);
        let inner = Span::new(start + 1, i);
        self.pos = i + 1;
        self.finish_literal(outer, inner, Vec::new());
        Ok(())
    }

    fn template_literal(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let mut vars = Vec::new();
        loop {
            match self.src.get(self.pos).copied() {
                Some(b'\\') => self.pos += 2,
                Some(b'`') => break,
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    if let Some(var) = self.template_expr()? {
                        vars.push(var);
                    }
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(
                        self.file,
                        "unterminated template literal",
                    ));
                }
            }
        }
        let inner = Span::new(start + 1, self.pos);
        self.pos += 1;
        let outer = Span::new(start, self.pos);
        self.finish_literal(outer, inner, vars);
        Ok(())
    }

    /// Parse a `${...}` placeholder; cursor is on the `$`.
    fn template_expr(&mut self) -> Result<Option<PromptVar>> {
        let outer_start = self.pos;
        self.pos += 2;
        let inner_start = self.pos;
        let mut depth = 1usize;
        loop {
            match self.src.get(self.pos).copied() {
                Some(b'{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.pos += 1;
                }
                Some(q @ (b'\'' | b'"')) => self.skip_expr_string(q)?,
                Some(b'`') => self.skip_nested_template()?,
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(
                        self.file,
                        "unterminated template expression",
                    ));
                }
            }
        }
        let inner_end = self.pos;
        self.pos += 1;
        let outer = Span::new(outer_start, self.pos);

        let raw = &self.text[inner_start..inner_end];
        let exp = raw.trim();
        if exp.is_empty() {
            return Ok(None);
        }
        let lead = raw.len() - raw.trim_start().len();
        let inner = Span::new(inner_start + lead, inner_start + lead + exp.len());
        Ok(Some(PromptVar {
            exp: exp.to_string(),
            span: SpanPair::new(outer, inner),
        }))
    }

    /// Skip a quoted string inside a placeholder expression.
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

    /// Skip a template literal nested inside a placeholder expression,
    /// including its own placeholders.
    fn skip_nested_template(&mut self) -> Result<()> {
        self.pos += 1;
        loop {
            match self.src.get(self.pos).copied() {
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.template_expr()?;
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(crate::Error::parse(
                        self.file,
                        "unterminated template literal",
                    ));
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
        self.last_ident = None;
        self.last_sig = b'"';
    }
}
