//! netmsg-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.msg` schema files,
//!  2) Extraction of tagged messages and enums into a [`SchemaModel`](types::SchemaModel),
//!  3) A schema verifier (identifier collisions, unsupported kinds, unresolved
//!     references, recursive nesting, etc.),
//!  4) Code generation for enums, message codecs and the dispatch registry,
//!  5) A schema-driven [`Value`](value::Value) codec with the same wire layout.

pub mod ast;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod extract;
pub mod parser;
pub mod tokenizer;
pub mod types;
pub mod utils;
pub mod value;
pub mod verifier;
pub mod writer;

pub use compiler::{compile_schema, compile_schema_to_rust, Compiler, CompilerOptions};
pub use netmsg_wire::IntWidth;
