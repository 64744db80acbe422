use crate::{
    types::{ArrayLen, FieldKind, MessageDescriptor, Primitive, TypeRef, ValidatedSchema},
    utils::{field_ident, quote, type_ident},
};

/// How generated code reaches the value being encoded: a struct field, or the
/// element handed to an array closure.
enum Access {
    Field(String),
    Item,
}

impl Access {
    fn by_value(&self) -> String {
        match self {
            Access::Field(name) => format!("self.{}", name),
            Access::Item => "*item".to_string(),
        }
    }

    fn by_ref(&self) -> String {
        match self {
            Access::Field(name) => format!("&self.{}", name),
            Access::Item => "item".to_string(),
        }
    }

    fn receiver(&self) -> String {
        match self {
            Access::Field(name) => format!("self.{}", name),
            Access::Item => "item".to_string(),
        }
    }
}

/// Rust type of a field of the given kind.
pub fn rust_type(schema: &ValidatedSchema, kind: &FieldKind) -> String {
    match kind {
        FieldKind::Primitive(p) => p.rust_type().to_string(),
        FieldKind::Array { element, len: ArrayLen::Variable } => {
            format!("Vec<{}>", rust_type(schema, element))
        }
        FieldKind::Array { element, len: ArrayLen::Fixed(n) } => {
            format!("[{}; {}]", rust_type(schema, element), n)
        }
        FieldKind::Named(name) => match schema.resolve(name) {
            Some(TypeRef::Enum(e)) => format!("EnumValue<{}>", type_ident(&e.name)),
            _ => type_ident(name),
        },
        FieldKind::Unsupported(raw) => raw.clone(),
    }
}

fn encode_lines(schema: &ValidatedSchema, kind: &FieldKind, access: &Access, indent: usize, out: &mut Vec<String>) {
    let pad = "    ".repeat(indent);
    match kind {
        FieldKind::Primitive(Primitive::String) => {
            out.push(format!("{}buf.write_string({})?;", pad, access.by_ref()));
        }
        FieldKind::Primitive(p) => {
            out.push(format!("{}buf.write_{}({});", pad, p.name(), access.by_value()));
        }
        FieldKind::Named(name) => match schema.resolve(name) {
            Some(TypeRef::Enum(_)) => {
                out.push(format!("{}buf.write_enum({})?;", pad, access.by_value()));
            }
            _ => {
                out.push(format!("{}{}.encode(buf)?;", pad, access.receiver()));
            }
        },
        FieldKind::Array { element, len } => {
            let method = match len {
                ArrayLen::Variable => "write_vec",
                ArrayLen::Fixed(_) => "write_array",
            };
            out.push(format!("{}buf.{}({}, |buf, item| {{", pad, method, access.by_ref()));
            encode_lines(schema, element, &Access::Item, indent + 1, out);
            out.push(format!("{}    Ok(())", pad));
            out.push(format!("{}}})?;", pad));
        }
        FieldKind::Unsupported(raw) => {
            out.push(format!("{}{};", pad, unsupported(raw)));
        }
    }
}

fn unsupported(raw: &str) -> String {
    format!("compile_error!({})", quote(&format!("unsupported field kind {}", raw)))
}

/// Expression that reads one value of `kind` and evaluates to a `Result`.
fn decode_expr(schema: &ValidatedSchema, kind: &FieldKind) -> String {
    match kind {
        FieldKind::Primitive(p) => format!("buf.read_{}()", p.name()),
        FieldKind::Named(name) => match schema.resolve(name) {
            Some(TypeRef::Enum(_)) => "buf.read_enum()".to_string(),
            _ => format!("{}::decode(buf)", type_ident(name)),
        },
        FieldKind::Array { element, len: ArrayLen::Variable } => format!(
            "buf.read_vec({}, |buf| {})",
            schema.min_wire_size(element),
            decode_expr(schema, element)
        ),
        FieldKind::Array { element, len: ArrayLen::Fixed(_) } => {
            format!("buf.read_array(|buf| {})", decode_expr(schema, element))
        }
        FieldKind::Unsupported(raw) => unsupported(raw),
    }
}

/// Generates the struct for one message and its `NetMessage` impl.
pub fn emit_message(schema: &ValidatedSchema, message: &MessageDescriptor) -> String {
    let name = type_ident(&message.name);
    let mut rust_code: Vec<String> = Vec::new();

    // Struct
    rust_code.push(format!("/// Message `{}`, identifier {}.", message.name, message.id()));
    rust_code.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    if message.fields.is_empty() {
        rust_code.push(format!("pub struct {} {{}}", name));
    } else {
        rust_code.push(format!("pub struct {} {{", name));
        for field in &message.fields {
            rust_code.push(format!(
                "    pub {}: {},",
                field_ident(&field.name),
                rust_type(schema, &field.kind)
            ));
        }
        rust_code.push("}".to_string());
    }
    rust_code.push(String::new());

    rust_code.push(format!("impl NetMessage for {} {{", name));
    rust_code.push(format!("    const ID: u32 = {};", message.id()));
    rust_code.push(format!("    const NAME: &'static str = {};", quote(&message.name)));
    rust_code.push(String::new());

    // Encode, strictly in declaration order; a failure leaves `buf` untouched
    let buf = if message.fields.is_empty() { "_buf" } else { "buf" };
    rust_code.push(format!(
        "    fn encode(&self, {}: &mut WriteBuffer) -> Result<(), EncodeError> {{",
        buf
    ));
    if message.fields.is_empty() {
        rust_code.push("        Ok(())".to_string());
    } else {
        rust_code.push("        buf.all_or_nothing(|buf| {".to_string());
        for field in &message.fields {
            let access = Access::Field(field_ident(&field.name));
            encode_lines(schema, &field.kind, &access, 3, &mut rust_code);
        }
        rust_code.push("            Ok(())".to_string());
        rust_code.push("        })".to_string());
    }
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    // Decode; struct literal fields are evaluated in the order written
    rust_code.push(format!(
        "    fn decode({}: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {{",
        buf
    ));
    if message.fields.is_empty() {
        rust_code.push("        Ok(Self {})".to_string());
    } else {
        rust_code.push("        Ok(Self {".to_string());
        for field in &message.fields {
            rust_code.push(format!(
                "            {}: {}?,",
                field_ident(&field.name),
                decode_expr(schema, &field.kind)
            ));
        }
        rust_code.push("        })".to_string());
    }
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());

    rust_code.join("\n")
}
