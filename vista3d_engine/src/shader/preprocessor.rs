/// Conditional-compilation preprocessor for shader templates.
///
/// Lines between `#if EXPR` / `#else` / `#endif` are kept or dropped
/// according to the flag set. `EXPR` is an OR of AND-chains of flags, each
/// optionally negated: `A`, `!A`, `A && !B`, `A || !B`, `A && B || C`.
/// Flag names are case-insensitive. Every other line, including other
/// directives such as `#version` or `#define`, passes through unchanged.
/// Blank lines are dropped.

use rustc_hash::FxHashSet;
use crate::error::{Error, Result};

/// Evaluate one `#if` expression against upper-case `flags`
pub fn evaluate(expression: &str, flags: &FxHashSet<String>) -> Result<bool> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(Error::InvalidResource("empty #if expression".to_string()));
    }
    let mut any = false;
    for chain in expression.split("||") {
        let mut all = true;
        for term in chain.split("&&") {
            let term = term.trim();
            let (negated, name) = match term.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, term),
            };
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::InvalidResource(format!(
                    "malformed #if expression '{}'", expression
                )));
            }
            let defined = flags.contains(&name.to_ascii_uppercase());
            all &= defined != negated;
        }
        any |= all;
    }
    Ok(any)
}

struct Block {
    /// Whether the enclosing blocks are all active
    parent_active: bool,
    condition: bool,
    in_else: bool,
}

impl Block {
    fn active(&self) -> bool {
        self.parent_active && (self.condition != self.in_else)
    }
}

/// Resolve the conditional blocks of `source` against upper-case `flags`
///
/// # Errors
///
/// Returns `Error::InvalidResource` for unbalanced blocks or malformed
/// expressions, naming the offending line.
pub fn preprocess(source: &str, flags: &FxHashSet<String>) -> Result<String> {
    let mut stack: Vec<Block> = Vec::new();
    let mut output = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim_start();
        let active = stack.last().map_or(true, Block::active);

        if let Some(expression) = trimmed.strip_prefix("#if") {
            if !expression.starts_with(char::is_whitespace) {
                return Err(Error::InvalidResource(format!(
                    "line {}: malformed #if directive", line_number
                )));
            }
            // Inactive regions are not evaluated
            let condition = if active { evaluate(expression, flags)? } else { false };
            stack.push(Block { parent_active: active, condition, in_else: false });
        } else if trimmed.starts_with("#else") {
            match stack.last_mut() {
                Some(block) if !block.in_else => block.in_else = true,
                Some(_) => {
                    return Err(Error::InvalidResource(format!("line {}: duplicate #else", line_number)));
                }
                None => {
                    return Err(Error::InvalidResource(format!("line {}: #else without #if", line_number)));
                }
            }
        } else if trimmed.starts_with("#endif") {
            if stack.pop().is_none() {
                return Err(Error::InvalidResource(format!("line {}: #endif without #if", line_number)));
            }
        } else if active && !trimmed.is_empty() {
            output.push_str(line);
            output.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(Error::InvalidResource(format!("{} unterminated #if block(s)", stack.len())));
    }
    Ok(output)
}

#[cfg(test)]
#[path = "preprocessor_tests.rs"]
mod tests;
