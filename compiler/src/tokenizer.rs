use crate::error::PeechyError;
use crate::utils::{quote, syntax_error};
use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

lazy_static! {
    pub static ref TOKEN_REGEX:   Regex = Regex::new(
        r#"((?:-|\b)\d+\b|[=:;{}]|\[\]|\[deprecated\]|\[!\]|\b[A-Za-z_][A-Za-z0-9_]*\b|"[^"\n]*"|&|\||//.*|\s+)"#
    ).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//.*|\s+)$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits schema text into tokens. The last token is always an empty
/// end-of-file marker. Positions are 1-based.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, PeechyError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let part = mat.as_str();

        if start > last_end {
            return Err(syntax_error(
                &format!("Syntax error {}", quote(&text[last_end..start])),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text: part.to_string(),
                line,
                column,
            });
        }

        // Whitespace and comments still move the position
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = mat.end();
    }

    if last_end != text.len() {
        return Err(syntax_error(
            &format!("Syntax error {}", quote(&text[last_end..])),
            line,
            column,
        ));
    }

    tokens.push(Token {
        text: "".to_string(),
        line,
        column,
    });
    trace!("tokenized {} bytes into {} tokens", text.len(), tokens.len());
    Ok(tokens)
}
