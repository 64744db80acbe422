//! Rust code generation. Each emitter returns one fragment of the output
//! file; [`emit_schema`] collects them in output order.

pub mod enums;
pub mod messages;
pub mod registry;

use tracing::debug;

use crate::{error::SchemaError, types::ValidatedSchema};

pub use enums::emit_enum;
pub use messages::emit_message;
pub use registry::emit_registry;

/// Runtime items the generated code refers to by name.
pub const RUNTIME_ITEMS: [&str; 11] = [
    "DecodeError",
    "DispatchError",
    "EncodeError",
    "EnumValue",
    "IntWidth",
    "NetMessage",
    "ReadBuffer",
    "Registry",
    "RegistryEntry",
    "WireEnum",
    "WriteBuffer",
];

/// The `use` line that brings the runtime into scope.
pub fn emit_imports(runtime_path: &str) -> String {
    format!(
        "#[allow(unused_imports)]\nuse {}::{{{}}};",
        runtime_path,
        RUNTIME_ITEMS.join(", ")
    )
}

/// All fragments for a schema: imports, enums, messages, then the registry.
pub fn emit_schema(schema: &ValidatedSchema, runtime_path: &str) -> Result<Vec<String>, SchemaError> {
    let mut fragments = vec![emit_imports(runtime_path)];
    fragments.extend(schema.enums().iter().map(emit_enum));
    fragments.extend(schema.messages().iter().map(|m| emit_message(schema, m)));
    fragments.push(emit_registry(schema)?);

    debug!(fragments = fragments.len(), "emitted code fragments");
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_use_runtime_path() {
        let line = emit_imports("crate::rt");
        assert!(line.starts_with("#[allow(unused_imports)]\nuse crate::rt::{DecodeError, "));
        assert!(line.ends_with("WireEnum, WriteBuffer};"));
    }
}
