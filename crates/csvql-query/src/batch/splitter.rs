//! Splitting a script into individual statements

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a script is divided into statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Split on every `;`. A `;` inside a string literal or comment ends the
    /// statement early.
    #[default]
    Naive,
    /// Split only on `;` outside quoted literals and comments.
    #[serde(alias = "quote-aware")]
    QuoteAware,
}

impl SplitMode {
    pub fn split(&self, script: &str) -> Vec<String> {
        match self {
            SplitMode::Naive => split_statements(script),
            SplitMode::QuoteAware => split_statements_quote_aware(script),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Naive => "naive",
            SplitMode::QuoteAware => "quote-aware",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(SplitMode::Naive),
            "quote-aware" | "quote_aware" => Ok(SplitMode::QuoteAware),
            other => Err(format!(
                "unknown split mode '{}' (expected 'naive' or 'quote-aware')",
                other
            )),
        }
    }
}

/// Split a script on the literal `;`, trimming each piece and dropping the
/// empty ones. Order is preserved.
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a script on `;` while respecting string literals and comments.
///
/// Single- and double-quoted literals (with doubled-quote escapes), `--`
/// line comments and `/* */` block comments are scanned over, so a `;`
/// inside them does not end the statement. Comments stay attached to the
/// statement text they appear in.
pub fn split_statements_quote_aware(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut string_char = '\'';
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let chars: Vec<char> = script.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_line_comment {
            current.push(c);
            if c == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            current.push(c);
            if c == '*' && next == Some('/') {
                current.push('/');
                in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if in_string {
            current.push(c);
            if c == string_char {
                // doubled quote is an escaped quote, not the end of the literal
                if next == Some(string_char) {
                    current.push(string_char);
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '-' if next == Some('-') => {
                in_line_comment = true;
                current.push_str("--");
                i += 2;
                continue;
            }
            '/' if next == Some('*') => {
                in_block_comment = true;
                current.push_str("/*");
                i += 2;
                continue;
            }
            '\'' | '"' => {
                in_string = true;
                string_char = c;
                current.push(c);
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
        i += 1;
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}
