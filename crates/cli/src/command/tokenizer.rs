//! Quote-aware tokenizer for the command-line grammar (spec §6: "Arguments
//! may be bare tokens or quoted strings").

use dbg_core::error::{Error, Result};

/// Splits a raw command line into whitespace-separated tokens, honoring
/// double-quoted strings (which may themselves contain whitespace) and
/// backslash-escaping within them.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            continue;
        }
        if c == '"' {
            in_token = true;
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => return Err(Error::Input("unterminated escape in quoted string".into())),
                    },
                    Some(other) => current.push(other),
                    None => return Err(Error::Input("unterminated quoted string".into())),
                }
            }
            continue;
        }
        in_token = true;
        current.push(c);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "tokenizer_tests.rs"]
mod tests;
