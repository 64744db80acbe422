use crate::{
    ast::{Definition, DefinitionKind, Field, SourceFile, TypeExpr},
    error::{error, SyntaxError},
    tokenizer::Token,
    utils::quote,
};
use lazy_static::lazy_static;
use netmsg_wire::IntWidth;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:        Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref EQUALS:            Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:         Regex = Regex::new(r"^;$").unwrap();
    static ref COLON:             Regex = Regex::new(r"^:$").unwrap();
    static ref COMMA:             Regex = Regex::new(r"^,$").unwrap();
    static ref DOT:               Regex = Regex::new(r"^\.$").unwrap();
    static ref INTEGER:           Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref LEFT_BRACE:        Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:       Regex = Regex::new(r"^\}$").unwrap();
    static ref LEFT_BRACKET:      Regex = Regex::new(r"^\[$").unwrap();
    static ref RIGHT_BRACKET:     Regex = Regex::new(r"^\]$").unwrap();
    static ref LESS:              Regex = Regex::new(r"^<$").unwrap();
    static ref GREATER:           Regex = Regex::new(r"^>$").unwrap();
    static ref ENUM_KEYWORD:      Regex = Regex::new(r"^enum$").unwrap();
    static ref MESSAGE_KEYWORD:   Regex = Regex::new(r"^message$").unwrap();
    static ref NAMESPACE_KEYWORD: Regex = Regex::new(r"^namespace$").unwrap();
    static ref MARKER_KEYWORD:    Regex = Regex::new(r"^marker$").unwrap();
    static ref EOF:               Regex = Regex::new(r"^$").unwrap();
}

/// Parses the tokens of one source file. `file` is only used as a label.
pub fn parse_schema(tokens: &[Token], file: &str) -> Result<SourceFile, SyntaxError> {
    let mut definitions = Vec::new();
    let mut index       = 0;

    if !tokens.is_empty() {
        parse_items(tokens, &mut index, None, &mut definitions)?;
    }

    Ok(SourceFile {
        name: file.to_string(),
        definitions,
    })
}

fn current_token(tokens: &[Token], index: usize) -> &Token {
    &tokens[index.min(tokens.len() - 1)]
}

fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> bool {
    if test.is_match(&current_token(tokens, *index).text) {
        *index += 1;
        true
    } else {
        false
    }
}

fn expect(tokens: &[Token], index: &mut usize, test: &Regex, expected: &str) -> Result<(), SyntaxError> {
    if !eat(tokens, index, test) {
        let tok = current_token(tokens, *index);
        return Err(error(
            &format!("Expected {} but found {}", expected, quote(&tok.text)),
            tok.line,
            tok.column,
        ));
    }
    Ok(())
}

fn expect_integer(tokens: &[Token], index: &mut usize) -> Result<i64, SyntaxError> {
    let tok = current_token(tokens, *index);
    expect(tokens, index, &INTEGER, "integer")?;
    tok.text.parse::<i64>().map_err(|_| {
        error(
            &format!("Invalid integer {}", quote(&tok.text)),
            tok.line,
            tok.column,
        )
    })
}

fn unexpected_token(tokens: &[Token], index: usize) -> SyntaxError {
    let tok = current_token(tokens, index);
    error(
        &format!("Unexpected token {}", quote(&tok.text)),
        tok.line,
        tok.column,
    )
}

/// Parses definitions until EOF (top level) or the closing brace of the
/// enclosing `namespace` block.
fn parse_items(
    tokens: &[Token],
    index: &mut usize,
    namespace: Option<&str>,
    definitions: &mut Vec<Definition>,
) -> Result<(), SyntaxError> {
    loop {
        match namespace {
            None => {
                if eat(tokens, index, &EOF) {
                    return Ok(());
                }
            }
            Some(_) => {
                if eat(tokens, index, &RIGHT_BRACE) {
                    return Ok(());
                }
                if EOF.is_match(&current_token(tokens, *index).text) {
                    expect(tokens, index, &RIGHT_BRACE, "\"}\"")?;
                }
            }
        }

        if eat(tokens, index, &NAMESPACE_KEYWORD) {
            let name = parse_qualified_name(tokens, index)?;
            expect(tokens, index, &LEFT_BRACE, "\"{\"")?;
            let nested = match namespace {
                Some(outer) => format!("{}.{}", outer, name),
                None => name,
            };
            parse_items(tokens, index, Some(&nested), definitions)?;
        } else if eat(tokens, index, &ENUM_KEYWORD) {
            definitions.push(parse_enum(tokens, index, namespace)?);
        } else if eat(tokens, index, &MESSAGE_KEYWORD) {
            definitions.push(parse_message(tokens, index, namespace)?);
        } else {
            return Err(unexpected_token(tokens, *index));
        }
    }
}

fn parse_qualified_name(tokens: &[Token], index: &mut usize) -> Result<String, SyntaxError> {
    let mut parts = Vec::new();
    loop {
        let tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        parts.push(tok.text.clone());
        if !eat(tokens, index, &DOT) {
            return Ok(parts.join("."));
        }
    }
}

fn parse_enum(tokens: &[Token], index: &mut usize, namespace: Option<&str>) -> Result<Definition, SyntaxError> {
    let name_tok = current_token(tokens, *index);
    expect(tokens, index, &IDENTIFIER, "identifier")?;

    let mut width = None;
    if eat(tokens, index, &COLON) {
        let width_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "enum width")?;
        width = Some(width_tok.text.parse::<IntWidth>().map_err(|msg| {
            error(&msg, width_tok.line, width_tok.column)
        })?);
    }
    expect(tokens, index, &LEFT_BRACE, "\"{\"")?;

    let mut fields = Vec::new();
    while !eat(tokens, index, &RIGHT_BRACE) {
        let f_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        expect(tokens, index, &EQUALS, "\"=\"")?;
        let value = expect_integer(tokens, index)?;
        expect(tokens, index, &SEMICOLON, "\";\"")?;

        fields.push(Field {
            name:   f_tok.text.clone(),
            line:   f_tok.line,
            column: f_tok.column,
            type_:  None,
            value:  Some(value),
        });
    }

    Ok(Definition {
        name:      name_tok.text.clone(),
        namespace: namespace.map(str::to_string),
        line:      name_tok.line,
        column:    name_tok.column,
        kind:      DefinitionKind::Enum { width },
        fields,
    })
}

fn parse_message(tokens: &[Token], index: &mut usize, namespace: Option<&str>) -> Result<Definition, SyntaxError> {
    let name_tok = current_token(tokens, *index);
    expect(tokens, index, &IDENTIFIER, "identifier")?;

    // Identifier tag
    let id = if eat(tokens, index, &EQUALS) {
        Some(expect_integer(tokens, index)?)
    } else {
        None
    };

    // Attributes
    let mut marker = false;
    if eat(tokens, index, &LEFT_BRACKET) {
        let attr = current_token(tokens, *index);
        if !eat(tokens, index, &MARKER_KEYWORD) {
            return Err(error(
                &format!("Unknown message attribute {}", quote(&attr.text)),
                attr.line,
                attr.column,
            ));
        }
        expect(tokens, index, &RIGHT_BRACKET, "\"]\"")?;
        marker = true;
    }
    expect(tokens, index, &LEFT_BRACE, "\"{\"")?;

    let mut fields = Vec::new();
    while !eat(tokens, index, &RIGHT_BRACE) {
        let type_ = parse_type(tokens, index)?;

        let f_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        expect(tokens, index, &SEMICOLON, "\";\"")?;

        fields.push(Field {
            name:   f_tok.text.clone(),
            line:   f_tok.line,
            column: f_tok.column,
            type_:  Some(type_),
            value:  None,
        });
    }

    Ok(Definition {
        name:      name_tok.text.clone(),
        namespace: namespace.map(str::to_string),
        line:      name_tok.line,
        column:    name_tok.column,
        kind:      DefinitionKind::Message { id, marker },
        fields,
    })
}

fn parse_type(tokens: &[Token], index: &mut usize) -> Result<TypeExpr, SyntaxError> {
    let t_tok = current_token(tokens, *index);
    expect(tokens, index, &IDENTIFIER, "type")?;

    let mut type_ = if eat(tokens, index, &LESS) {
        let mut args = Vec::new();
        loop {
            args.push(parse_type(tokens, index)?);
            if !eat(tokens, index, &COMMA) {
                expect(tokens, index, &GREATER, "\">\"")?;
                break;
            }
        }
        TypeExpr::Generic {
            name: t_tok.text.clone(),
            args,
        }
    } else {
        TypeExpr::Name(t_tok.text.clone())
    };

    while eat(tokens, index, &LEFT_BRACKET) {
        let len = if eat(tokens, index, &RIGHT_BRACKET) {
            None
        } else {
            let len = expect_integer(tokens, index)?;
            expect(tokens, index, &RIGHT_BRACKET, "\"]\"")?;
            Some(len)
        };
        type_ = TypeExpr::Array {
            element: Box::new(type_),
            len,
        };
    }

    Ok(type_)
}
