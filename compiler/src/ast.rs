//! Syntax tree produced by the parser for one schema source file.

use std::fmt;

use netmsg_wire::IntWidth;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name:        String,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionKind {
    Enum {
        width: Option<IntWidth>,
    },
    Message {
        id:     Option<i64>,
        marker: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name:      String,
    /// Dotted path of the enclosing `namespace` blocks, if any.
    pub namespace: Option<String>,
    pub line:      usize,
    pub column:    usize,
    pub kind:      DefinitionKind,
    pub fields:    Vec<Field>,
}

/// A message field (`type_` set) or an enum member (`value` set).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name:   String,
    pub line:   usize,
    pub column: usize,
    pub type_:  Option<TypeExpr>,
    pub value:  Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name(String),
    Generic {
        name: String,
        args: Vec<TypeExpr>,
    },
    /// `len` is `None` for `T[]` and `Some(n)` for `T[n]`.
    Array {
        element: Box<TypeExpr>,
        len:     Option<i64>,
    },
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Generic { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            TypeExpr::Array { element, len: None } => write!(f, "{}[]", element),
            TypeExpr::Array { element, len: Some(n) } => write!(f, "{}[{}]", element, n),
        }
    }
}
