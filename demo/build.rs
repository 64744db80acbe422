use std::env;
use std::path::PathBuf;

use netmsg::build::{rerun_if_changed, CompileError, Compiler, CompilerOptions};

fn main() -> Result<(), CompileError> {
    rerun_if_changed("schema");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap_or_default());
    let mut compiler = Compiler::new(CompilerOptions {
        namespace: Some("Game".to_string()),
        ..CompilerOptions::default()
    });
    compiler.add_path("schema")?;
    compiler.write(out_dir.join("messages.rs"))
}
