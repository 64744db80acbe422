use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::quote;
use crate::error::{error, SyntaxError};

lazy_static! {
    pub static ref TOKEN_REGEX:   Regex = Regex::new(r"((?:-|\b)\d+\b|[=;:,.<>{}\[\]]|\b[A-Za-z_][A-Za-z0-9_]*\b|//.*|\s+)").unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//.*|\s+)$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Line and column of the next unread character.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    line:   usize,
    column: usize,
}

impl Cursor {
    fn advance(&mut self, part: &str) {
        match part.rfind('\n') {
            Some(last) => {
                self.line  += part.matches('\n').count();
                self.column = part[last + 1..].chars().count() + 1;
            }
            None => self.column += part.chars().count(),
        }
    }

    fn stray(self, text: &str) -> SyntaxError {
        error(&format!("Syntax error: {}", quote(text)), self.line, self.column)
    }
}

/// Splits schema text into tokens, dropping whitespace and `//` comments.
/// The returned list always ends with an empty EOF token.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor { line: 1, column: 1 };
    let mut consumed = 0;

    for part in TOKEN_REGEX.find_iter(text) {
        if part.start() != consumed {
            return Err(cursor.stray(&text[consumed..part.start()]));
        }
        if !WHITESPACE_RX.is_match(part.as_str()) {
            tokens.push(Token {
                text:   part.as_str().to_string(),
                line:   cursor.line,
                column: cursor.column,
            });
        }
        cursor.advance(part.as_str());
        consumed = part.end();
    }

    if consumed < text.len() {
        return Err(cursor.stray(&text[consumed..]));
    }

    tokens.push(Token {
        text:   String::new(),
        line:   cursor.line,
        column: cursor.column,
    });
    Ok(tokens)
}
