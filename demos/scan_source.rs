//! Scan a source file for prompts and print them, raw and interpolated.
//!
//! Pass a path to a `.ts`/`.js`/`.py` file, or run without arguments to scan
//! a built-in sample.

use std::collections::HashMap;

use promptrig::{extract_prompts, interpolate};

const SAMPLE: &str = r#"// @prompt
const greeting = `Hello, ${name}! Welcome to ${product}.`;
const systemPrompt = "You are a helpful assistant.";
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (source, file) = match std::env::args().nth(1) {
        Some(path) => (std::fs::read_to_string(&path)?, path),
        None => (SAMPLE.to_string(), "sample.ts".to_string()),
    };

    let mut values = HashMap::new();
    values.insert("name".to_string(), "Ada".to_string());
    values.insert("product".to_string(), "promptrig".to_string());

    for prompt in extract_prompts(&source, &file)? {
        println!(
            "{}:{}..{}",
            prompt.file, prompt.span.outer.start, prompt.span.outer.end
        );
        println!("  template: {}", prompt.content);
        println!("  rendered: {}", interpolate(&prompt, &values));
        for var in &prompt.vars {
            println!("  var: {}", var.exp);
        }
    }
    Ok(())
}
