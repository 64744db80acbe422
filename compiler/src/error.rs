use std::fmt;
use std::path::PathBuf;

use netmsg_wire::{DecodeError, EncodeError, IntWidth};
use thiserror::Error;

use crate::types::Location;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}:{column}: {msg}")]
    Parse {
        file:   String,
        line:   usize,
        column: usize,
        msg:    String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaErrors),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Tokenizer / parser failure inside one source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: {msg}")]
pub struct SyntaxError {
    pub msg:    String,
    pub line:   usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn in_file(self, file: &str) -> CompileError {
        CompileError::Parse {
            file:   file.to_string(),
            line:   self.line,
            column: self.column,
            msg:    self.msg,
        }
    }
}

pub fn error(msg: &str, line: usize, column: usize) -> SyntaxError {
    SyntaxError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// One structural problem found while validating a schema model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{location}: message {message:?} reuses identifier {id}, already taken by {first:?} at {first_location}")]
    DuplicateMessageId {
        id:             i64,
        message:        String,
        first:          String,
        location:       Location,
        first_location: Location,
    },

    #[error("{location}: message {message:?} has identifier {id}, expected a value in 0..=4294967295")]
    InvalidMessageId {
        id:       i64,
        message:  String,
        location: Location,
    },

    #[error("{location}: field {field:?} of {owner:?} has unsupported kind {kind:?}")]
    UnsupportedKind {
        owner:    String,
        field:    String,
        kind:     String,
        location: Location,
    },

    #[error("{location}: field {field:?} of {owner:?} declares a fixed array of {len} elements, the limit is {max}")]
    FixedArrayTooLong {
        owner:    String,
        field:    String,
        len:      usize,
        max:      usize,
        location: Location,
    },

    #[error("{location}: field {field:?} of {owner:?} is a variable array of {kind:?}, whose elements occupy no bytes on the wire")]
    ZeroWidthElement {
        owner:    String,
        field:    String,
        kind:     String,
        location: Location,
    },

    #[error("{location}: field {field:?} of {owner:?} references {target:?}, which is not a message or enum in this schema")]
    UnresolvedReference {
        owner:    String,
        field:    String,
        target:   String,
        location: Location,
    },

    #[error("{location}: message {message:?} has no fields (mark it [marker] if that is intended)")]
    EmptyMessage {
        message:  String,
        location: Location,
    },

    #[error("{location}: the type {name:?} is defined twice (first at {first_location})")]
    DuplicateTypeName {
        name:           String,
        location:       Location,
        first_location: Location,
    },

    #[error("{location}: the type name {name:?} is reserved")]
    ReservedTypeName {
        name:     String,
        location: Location,
    },

    #[error("{location}: {owner:?} declares {second:?}, which collides with {first:?} as {generated:?}")]
    DuplicateFieldName {
        owner:     String,
        first:     String,
        second:    String,
        generated: String,
        location:  Location,
    },

    #[error("{location}: enum {name:?} has no members")]
    EmptyEnum {
        name:     String,
        location: Location,
    },

    #[error("{location}: member {member:?} of enum {name:?} reuses value {value}, already taken by {first:?}")]
    DuplicateEnumValue {
        name:     String,
        member:   String,
        first:    String,
        value:    i64,
        location: Location,
    },

    #[error("{location}: member {member:?} of enum {name:?} has value {value}, which does not fit {width}")]
    EnumValueOutOfRange {
        name:     String,
        member:   String,
        value:    i64,
        width:    IntWidth,
        location: Location,
    },

    #[error("{location}: recursive nesting {path} needs a variable-length array somewhere in the cycle")]
    RecursiveNesting {
        message:  String,
        path:     String,
        location: Location,
    },

    #[error("registry identifier {id} is claimed by both {first:?} and {second:?}")]
    AmbiguousRegistryEntry {
        id:     u32,
        first:  String,
        second: String,
    },
}

/// Every problem found in one validation pass, in the order they were found.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaErrors(Vec<SchemaError>);

impl SchemaErrors {
    /// Returns `None` when `errors` is empty.
    pub fn new(errors: Vec<SchemaError>) -> Option<SchemaErrors> {
        if errors.is_empty() {
            None
        } else {
            Some(SchemaErrors(errors))
        }
    }

    pub fn errors(&self) -> &[SchemaError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<SchemaError> {
        self.0
    }
}

impl From<SchemaError> for SchemaErrors {
    fn from(error: SchemaError) -> Self {
        SchemaErrors(vec![error])
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema has {} error(s):", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

/// The generated artifact could not be written.
#[derive(Debug, Error)]
#[error("cannot write {}: {source}", .path.display())]
pub struct OutputError {
    pub path:   PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure of the schema-driven [`Value`](crate::value::Value) codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no message or enum named {0:?} in the schema")]
    UnknownType(String),

    #[error("no message with identifier {0} in the schema")]
    UnknownId(u32),

    #[error("message {message:?} is missing field {field:?}")]
    MissingField {
        message: String,
        field:   String,
    },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found:    String,
    },

    #[error("{value} cannot be represented exactly as f32")]
    InexactFloat { value: String },
}
