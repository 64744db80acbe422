use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use netmsg_compiler::error::{CompileError, ValueError};
use netmsg_compiler::value::Value;
use netmsg_compiler::{Compiler, CompilerOptions, IntWidth};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netmsgc")]
#[command(about = "Generate Rust encode/decode code from netmsg schema files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SchemaArgs {
    /// Schema file or directory of `.msg` files (repeatable)
    #[arg(short, long = "input", value_name = "PATH", default_value = "schema")]
    inputs: Vec<PathBuf>,

    /// Only consider definitions inside this namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Width for enums that do not declare one (u8, u16, u32 or u64)
    #[arg(long, value_name = "WIDTH")]
    enum_width: Option<IntWidth>,

    /// Path the generated code imports the runtime from
    #[arg(long, value_name = "PATH", default_value = "netmsg")]
    runtime_path: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Rust source file for the schema
    Generate {
        /// Output `.rs` file, overwritten if it exists
        output: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Validate the schema without writing anything
    Check {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print the extracted schema model as JSON
    Dump {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Decode a binary payload by message identifier and print it as JSON
    Decode {
        /// File holding the encoded message body
        payload: PathBuf,

        /// Message identifier the payload was sent under
        #[arg(long)]
        id: u32,

        #[command(flatten)]
        schema: SchemaArgs,
    },
}

impl SchemaArgs {
    fn compiler(&self) -> Result<Compiler, CompileError> {
        let mut compiler = Compiler::new(CompilerOptions {
            namespace:          self.namespace.clone(),
            default_enum_width: self.enum_width,
            runtime_path:       self.runtime_path.clone(),
        });
        for input in &self.inputs {
            compiler.add_path(input)?;
        }
        Ok(compiler)
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Payload {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate { output, schema } => {
            let compiler = schema.compiler()?;
            compiler.write(&output)?;
            debug!(output = %output.display(), "generation finished");
            Ok(())
        }

        Commands::Check { schema } => {
            let compiler = schema.compiler()?;
            let validated = compiler.validate()?;
            debug!(
                messages = validated.messages().len(),
                enums = validated.enums().len(),
                "schema is valid"
            );
            Ok(())
        }

        Commands::Dump { schema } => {
            let compiler = schema.compiler()?;
            let json = serde_json::to_string_pretty(&compiler.model())?;
            println!("{}", json);
            Ok(())
        }

        Commands::Decode { payload, id, schema } => {
            let compiler = schema.compiler()?;
            let validated = compiler.validate()?;
            let data = fs::read(&payload).map_err(|source| CliError::Payload {
                path: payload.clone(),
                source,
            })?;
            let value = Value::decode_frame(&validated, id, &data)?;
            let json = serde_json::to_string_pretty(&value.to_json(&validated))?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
