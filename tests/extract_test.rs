//! End-to-end extraction and interpolation over realistic source files.

use std::collections::HashMap;

use promptrig::{extract_prompts, interpolate, RunRequest, Span};

const TS_FIXTURE: &str = r#"import { client } from "./client";

// The assistant's persona.
const systemPrompt = "You are a helpful assistant.";

// @prompt
const greeting = `Hello, ${user.name}! Welcome to ${product}.`;

function notAPrompt() {
  const label = `Click ${count} times`;
  return label;
}

let followUp;
// @prompt
followUp = `Anything else, ${user.name}?`;
"#;

#[test]
fn extracts_all_prompts_from_ts_fixture() {
    let prompts = extract_prompts(TS_FIXTURE, "workbench.ts").unwrap();
    assert_eq!(prompts.len(), 3);

    assert_eq!(prompts[0].content, "You are a helpful assistant.");
    assert!(prompts[0].vars.is_empty());

    assert_eq!(prompts[1].content, "Hello, ${user.name}! Welcome to ${product}.");
    let vars: Vec<&str> = prompts[1].vars.iter().map(|v| v.exp.as_str()).collect();
    assert_eq!(vars, ["user.name", "product"]);

    assert_eq!(prompts[2].content, "Anything else, ${user.name}?");
}

#[test]
fn spans_point_back_into_the_file() {
    let prompts = extract_prompts(TS_FIXTURE, "workbench.ts").unwrap();
    for prompt in &prompts {
        let Span { start, end } = prompt.span.inner;
        assert_eq!(&TS_FIXTURE[start..end], prompt.content);
        for var in &prompt.vars {
            let Span { start, end } = var.span.inner;
            assert_eq!(&TS_FIXTURE[start..end], var.exp);
        }
    }
}

#[test]
fn extract_interpolate_run_request_roundtrip() {
    let prompts = extract_prompts(TS_FIXTURE, "workbench.ts").unwrap();
    let mut values = HashMap::new();
    values.insert("user.name".to_string(), "Ada".to_string());
    values.insert("product".to_string(), "the workbench".to_string());

    let rendered = interpolate(&prompts[1], &values);
    assert_eq!(rendered, "Hello, Ada! Welcome to the workbench.");

    let request = RunRequest::from_source(&prompts[1], &values)
        .with_model("gpt-5-mini");
    assert_eq!(request.prompt, "Hello, Ada! Welcome to the workbench.");
    assert_eq!(request.model.as_deref(), Some("gpt-5-mini"));
}

const PY_FIXTURE: &str = r#"import os

# @prompt
SUMMARY = f"Summarize {doc_title} in {word_count} words."

banner = "not a prompt"

def build() -> str:
    task_prompt = f"Review: {task['name']}"
    return task_prompt
"#;

#[test]
fn extracts_prompts_from_py_fixture() {
    let prompts = extract_prompts(PY_FIXTURE, "workbench.py").unwrap();
    assert_eq!(prompts.len(), 2);

    assert_eq!(prompts[0].content, "Summarize {doc_title} in {word_count} words.");
    let vars: Vec<&str> = prompts[0].vars.iter().map(|v| v.exp.as_str()).collect();
    assert_eq!(vars, ["doc_title", "word_count"]);

    assert_eq!(prompts[1].content, "Review: {task['name']}");
    assert_eq!(prompts[1].vars[0].exp, "task['name']");
}

#[test]
fn py_spans_point_back_into_the_file() {
    let prompts = extract_prompts(PY_FIXTURE, "workbench.py").unwrap();
    for prompt in &prompts {
        let Span { start, end } = prompt.span.inner;
        assert_eq!(&PY_FIXTURE[start..end], prompt.content);
    }
}

#[test]
fn parse_errors_name_the_file() {
    let err = extract_prompts("const bad = `oops", "broken.ts").unwrap_err();
    assert!(err.to_string().contains("broken.ts"));
}
