//! netmsg
//!
//! Runtime support for code generated by `netmsgc`. Generated files import
//! everything they need from this crate's root:
//!
//! - `ReadBuffer` / `WriteBuffer` for the wire layout,
//! - `NetMessage`, `WireEnum` and `EnumValue`,
//! - `Registry` and `RegistryEntry` for dispatch by message identifier,
//! - the `EncodeError`, `DecodeError` and `DispatchError` types.
//!
//! With the `build` feature, [`build`] exposes the compiler for build scripts:
//!
//! ```ignore
//! // build.rs
//! fn main() -> Result<(), netmsg::build::CompileError> {
//!     let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("messages.rs");
//!     let mut compiler = netmsg::build::Compiler::new(Default::default());
//!     compiler.add_path("schema")?;
//!     compiler.write(out)
//! }
//! ```

pub use netmsg_wire::{
    DecodeError, DispatchError, EncodeError, EnumValue, IntWidth, NetMessage, ReadBuffer, Registry,
    RegistryEntry, WireEnum, WriteBuffer,
};

#[cfg(feature = "build")]
pub mod build {
    //! Schema compiler, for `build.rs`.

    pub use netmsg_compiler::error::{CompileError, OutputError, SchemaError, SchemaErrors};
    pub use netmsg_compiler::{Compiler, CompilerOptions};

    /// Tells cargo to rerun the build script when anything under `path` changes.
    pub fn rerun_if_changed<P: AsRef<std::path::Path>>(path: P) {
        println!("cargo:rerun-if-changed={}", path.as_ref().display());
    }
}
