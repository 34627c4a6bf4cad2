//! `{{ }}` placeholder interpolation in strings
//!
//! The input is scanned once, left to right. Every `{{` pushes its position onto a stack and every `}}` pops the
//! most recent one, so nested placeholders are evaluated innermost first:
//!
//! ```text
//! {{ ref vars.{{ ref vars.env }}Value }}
//!            ^^^^^^^^^^^^^^^^^^^ evaluated first, e.g. "npr"
//! {{ ref vars.nprValue }}         evaluated second
//! ```
//!
//! The evaluated text replaces the placeholder and scanning continues right after it. Inserted text is never
//! scanned again, even when it contains `{{` or `}}`.
//!
//! A string that is exactly one placeholder evaluates to the value itself (a number stays a number, an object stays
//! an object). Anything else evaluates to a string.
use crate::error::{Brace, Error, Result};
use crate::expression::Evaluator;
use crate::value::Value;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[tracing::instrument(level = "trace", skip(evaluator, root))]
pub fn interpolate(evaluator: &Evaluator, root: &Value, input: &str) -> Result<Value> {
    if !input.contains(OPEN) && !input.contains(CLOSE) {
        return Ok(Value::String(input.to_string()));
    }

    let unbalanced = |side| Error::UnbalancedExpression {
        side,
        input: input.to_string(),
    };

    let mut text = input.to_string();
    let mut open_braces: Vec<usize> = Vec::new();
    let mut cursor = 0;

    // braces are ascii, so every index compared or sliced at below is a char boundary
    while cursor + 1 < text.len() {
        let rest = &text.as_bytes()[cursor..];

        if rest.starts_with(OPEN.as_bytes()) {
            open_braces.push(cursor + OPEN.len());
            cursor += OPEN.len();
            continue;
        }

        if rest.starts_with(CLOSE.as_bytes()) {
            let start = open_braces.pop().ok_or_else(|| unbalanced(Brace::Closing))?;
            let region = (start - OPEN.len())..(cursor + CLOSE.len());

            let result = evaluator.evaluate(root, &text[start..cursor])?;
            if region.start == 0 && region.end == text.len() {
                return Ok(result);
            }

            let rendered = result.to_string();
            tracing::trace!(expression = &text[start..cursor], %rendered, "placeholder replaced");

            cursor = region.start + rendered.len();
            text.replace_range(region, &rendered);
            continue;
        }

        cursor += 1;
    }

    if !open_braces.is_empty() {
        return Err(unbalanced(Brace::Opening));
    }

    Ok(Value::String(text))
}
