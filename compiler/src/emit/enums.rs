use crate::{
    types::EnumDescriptor,
    utils::{quote, type_ident},
};

/// Generates the Rust enum and its `WireEnum` impl.
pub fn emit_enum(definition: &EnumDescriptor) -> String {
    let name  = type_ident(&definition.name);
    let width = definition.wire_width();
    let mut rust_code: Vec<String> = Vec::new();

    rust_code.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]".to_string());
    rust_code.push(format!("#[repr({})]", width.unsigned_name()));
    rust_code.push(format!("pub enum {} {{", name));
    for member in &definition.members {
        rust_code.push(format!("    {} = {},", type_ident(&member.name), member.value));
    }
    rust_code.push("}".to_string());
    rust_code.push(String::new());

    rust_code.push(format!("impl WireEnum for {} {{", name));
    rust_code.push(format!("    const NAME: &'static str = {};", quote(&definition.name)));
    rust_code.push(format!("    const WIDTH: IntWidth = IntWidth::{:?};", width));
    rust_code.push(String::new());
    rust_code.push("    fn to_value(self) -> u64 {".to_string());
    rust_code.push("        self as u64".to_string());
    rust_code.push("    }".to_string());
    rust_code.push(String::new());
    rust_code.push("    fn from_value(value: u64) -> Option<Self> {".to_string());
    rust_code.push("        match value {".to_string());
    for member in &definition.members {
        rust_code.push(format!(
            "            {} => Some({}::{}),",
            member.value,
            name,
            type_ident(&member.name)
        ));
    }
    rust_code.push("            _ => None,".to_string());
    rust_code.push("        }".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());

    rust_code.join("\n")
}
