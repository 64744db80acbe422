use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use netmsg_wire::IntWidth;
use tracing::{debug, warn};

use crate::{
    ast::SourceFile,
    emit::emit_schema,
    error::{CompileError, SchemaErrors},
    extract::extract_schema,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::{SchemaModel, ValidatedSchema},
    verifier::verify_schema,
    writer::{render, write_output},
};

/// File extension of schema sources picked up from directories.
pub const SCHEMA_EXTENSION: &str = "msg";

/// Knobs shared by the CLI and build scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Only definitions inside this namespace (or below it) are considered.
    pub namespace:          Option<String>,
    /// Width for enums that do not declare one.
    pub default_enum_width: Option<IntWidth>,
    /// Path the generated code imports the runtime from.
    pub runtime_path:       String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            namespace:          None,
            default_enum_width: None,
            runtime_path:       "netmsg".to_string(),
        }
    }
}

/// Runs the whole pipeline over a set of schema sources.
///
/// ```no_run
/// use netmsg_compiler::{Compiler, CompilerOptions};
///
/// let mut compiler = Compiler::new(CompilerOptions::default());
/// compiler.add_path("schema")?;
/// compiler.write("src/generated.rs")?;
/// # Ok::<(), netmsg_compiler::error::CompileError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    sources: Vec<SourceFile>,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Compiler {
        Compiler {
            options,
            sources: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Parses `text` and queues it. `label` names the source in diagnostics.
    pub fn add_source(&mut self, label: &str, text: &str) -> Result<&mut Self, CompileError> {
        let tokens = tokenize_schema(text).map_err(|e| e.in_file(label))?;
        let file   = parse_schema(&tokens, label).map_err(|e| e.in_file(label))?;

        if file.definitions.is_empty() {
            warn!(source = label, "schema source has no definitions");
        } else {
            debug!(source = label, definitions = file.definitions.len(), "parsed schema source");
        }

        self.sources.push(file);
        Ok(self)
    }

    /// Adds a schema file, or every `.msg` file in a directory in name order.
    pub fn add_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self, CompileError> {
        let path = path.as_ref();
        let io_error = |source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(io_error)?;
            let files = schema_files(entries.map(|entry| entry.map(|e| e.path()))).map_err(io_error)?;

            if files.is_empty() {
                warn!(path = %path.display(), "no schema files found in directory");
            }
            for file in files {
                self.add_file(&file)?;
            }
            Ok(self)
        } else {
            self.add_file(path)
        }
    }

    fn add_file(&mut self, path: &Path) -> Result<&mut Self, CompileError> {
        let text = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_source(&path.display().to_string(), &text)
    }

    /// Extracts the schema model from everything added so far.
    pub fn model(&self) -> SchemaModel {
        extract_schema(
            &self.sources,
            self.options.namespace.as_deref(),
            self.options.default_enum_width,
        )
    }

    pub fn validate(&self) -> Result<ValidatedSchema, CompileError> {
        Ok(verify_schema(self.model())?)
    }

    /// Produces the full generated source file.
    pub fn generate(&self) -> Result<String, CompileError> {
        let schema    = self.validate()?;
        let fragments = emit_schema(&schema, &self.options.runtime_path).map_err(SchemaErrors::from)?;
        Ok(render(&schema, &fragments))
    }

    /// Generates and writes to `destination`. Nothing is written when any
    /// earlier stage fails.
    pub fn write<P: AsRef<Path>>(&self, destination: P) -> Result<(), CompileError> {
        let code = self.generate()?;
        write_output(destination.as_ref(), &code)?;
        Ok(())
    }
}

/// Schema files among `entries`, sorted by path. The first unreadable entry
/// aborts the listing.
fn schema_files<I>(entries: I) -> io::Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() && path.extension().map_or(false, |ext| ext == SCHEMA_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Compiles a single schema text with default options.
pub fn compile_schema(text: &str) -> Result<ValidatedSchema, CompileError> {
    let mut compiler = Compiler::new(CompilerOptions::default());
    compiler.add_source("<input>", text)?;
    compiler.validate()
}

/// Generates Rust code for a single schema text with default options.
pub fn compile_schema_to_rust(text: &str) -> Result<String, CompileError> {
    let mut compiler = Compiler::new(CompilerOptions::default());
    compiler.add_source("<input>", text)?;
    compiler.generate()
}
