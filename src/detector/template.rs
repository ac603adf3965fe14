//! Brace-placeholder template rendering for diagnosis/fix text.
//!
//! Placeholders are `{name}`; a literal brace is written doubled (`{{`,
//! `}}`). A placeholder whose name is absent from the variable map is a
//! hard error — callers must never silently substitute an empty string.

use std::collections::HashMap;

use crate::error::{DetectionError, Result};

/// Renders `template` against `variables`, replacing each `{name}` with its
/// value.
///
/// # Errors
///
/// Returns `DetectionError::MissingVariable` if the template references a
/// name absent from `variables`.
pub fn render(pattern_id: &str, template: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                for next in chars.by_ref() {
                    if next == '}' {
                        break;
                    }
                    name.push(next);
                }
                let value = variables.get(&name).ok_or_else(|| DetectionError::MissingVariable {
                    pattern_id: pattern_id.to_string(),
                    variable: name.clone(),
                })?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
