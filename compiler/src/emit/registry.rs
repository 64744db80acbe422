use crate::{
    error::SchemaError,
    types::{MessageDescriptor, ValidatedSchema},
    utils::{quote, to_snake_case, type_ident},
};

fn decode_fn_name(message: &MessageDescriptor) -> String {
    format!("decode_{}_{}", to_snake_case(&type_ident(&message.name)), message.id())
}

/// Generates `AnyMessage`, its dispatch helpers and the static `REGISTRY`
/// table, sorted by identifier.
pub fn emit_registry(schema: &ValidatedSchema) -> Result<String, SchemaError> {
    let mut table: Vec<&MessageDescriptor> = schema.messages().iter().collect();
    table.sort_by_key(|m| m.id());
    for pair in table.windows(2) {
        if pair[0].id() == pair[1].id() {
            return Err(SchemaError::AmbiguousRegistryEntry {
                id:     pair[0].id(),
                first:  pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }
    }

    let messages = schema.messages();
    let empty = messages.is_empty();
    let mut rust_code: Vec<String> = Vec::new();

    // Tagged union over every message
    rust_code.push("/// Any message known to this schema.".to_string());
    rust_code.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    rust_code.push("pub enum AnyMessage {".to_string());
    for message in messages {
        let name = type_ident(&message.name);
        rust_code.push(format!("    {}({}),", name, name));
    }
    rust_code.push("}".to_string());
    rust_code.push(String::new());

    rust_code.push("impl AnyMessage {".to_string());

    rust_code.push("    pub fn id(&self) -> u32 {".to_string());
    push_match(&mut rust_code, messages, |name| format!("AnyMessage::{}(_) => {}::ID,", name, name));
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    rust_code.push("    pub fn name(&self) -> &'static str {".to_string());
    push_match(&mut rust_code, messages, |name| format!("AnyMessage::{}(_) => {}::NAME,", name, name));
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    rust_code.push(format!(
        "    pub fn encode(&self, {}: &mut WriteBuffer) -> Result<(), EncodeError> {{",
        if empty { "_buf" } else { "buf" }
    ));
    push_match(&mut rust_code, messages, |name| {
        format!("AnyMessage::{}(ref message) => message.encode(buf),", name)
    });
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    rust_code.push("    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {".to_string());
    rust_code.push("        let mut buf = WriteBuffer::new();".to_string());
    rust_code.push("        self.encode(&mut buf)?;".to_string());
    rust_code.push("        Ok(buf.data())".to_string());
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    rust_code.push("    /// Decodes the message registered under `id`.".to_string());
    rust_code.push("    pub fn decode(id: u32, buf: &mut ReadBuffer<'_>) -> Result<Self, DispatchError> {".to_string());
    rust_code.push("        REGISTRY.decode(id, buf)".to_string());
    rust_code.push("    }".to_string());
    rust_code.push(String::new());

    rust_code.push("    pub fn from_bytes(id: u32, bytes: &[u8]) -> Result<Self, DispatchError> {".to_string());
    rust_code.push("        REGISTRY.decode_frame(id, bytes)".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());

    for message in messages {
        let name = type_ident(&message.name);
        rust_code.push(String::new());
        rust_code.push(format!("impl From<{}> for AnyMessage {{", name));
        rust_code.push(format!("    fn from(message: {}) -> Self {{", name));
        rust_code.push(format!("        AnyMessage::{}(message)", name));
        rust_code.push("    }".to_string());
        rust_code.push("}".to_string());
    }

    // Decode entry points
    for message in &table {
        let name = type_ident(&message.name);
        rust_code.push(String::new());
        rust_code.push(format!(
            "fn {}(buf: &mut ReadBuffer<'_>) -> Result<AnyMessage, DecodeError> {{",
            decode_fn_name(message)
        ));
        rust_code.push(format!("    {}::decode(buf).map(AnyMessage::{})", name, name));
        rust_code.push("}".to_string());
    }
    rust_code.push(String::new());

    // Lookup table
    rust_code.push(format!(
        "static REGISTRY_ENTRIES: [RegistryEntry<AnyMessage>; {}] = [",
        table.len()
    ));
    for message in &table {
        rust_code.push(format!(
            "    RegistryEntry {{ id: {}, name: {}, decode: {} }},",
            message.id(),
            quote(&message.name),
            decode_fn_name(message)
        ));
    }
    rust_code.push("];".to_string());
    rust_code.push(String::new());
    rust_code.push("/// Identifier to decoder table, sorted by identifier.".to_string());
    rust_code.push("pub static REGISTRY: Registry<AnyMessage> = Registry::new(&REGISTRY_ENTRIES);".to_string());

    Ok(rust_code.join("\n"))
}

fn push_match<F>(rust_code: &mut Vec<String>, messages: &[MessageDescriptor], arm: F)
where
    F: Fn(&str) -> String,
{
    if messages.is_empty() {
        rust_code.push("        match *self {}".to_string());
        return;
    }
    rust_code.push("        match *self {".to_string());
    for message in messages {
        rust_code.push(format!("            {}", arm(&type_ident(&message.name))));
    }
    rust_code.push("        }".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extract::extract_schema, parser::parse_schema, tokenizer::tokenize_schema, verifier::verify_schema,
    };

    fn schema(text: &str) -> ValidatedSchema {
        let file = parse_schema(&tokenize_schema(text).unwrap(), "r.msg").unwrap();
        verify_schema(extract_schema(&[file], None, None)).unwrap()
    }

    #[test]
    fn table_is_sorted_by_identifier() {
        let schema = schema("message B = 20 { u8 x; } message A = 3 { u8 y; } message PlayerState = 7 { u8 z; }");
        let code = emit_registry(&schema).unwrap();

        let a = code.find("RegistryEntry { id: 3,").unwrap();
        let p = code.find("RegistryEntry { id: 7,").unwrap();
        let b = code.find("RegistryEntry { id: 20,").unwrap();
        assert!(a < p && p < b);
        assert!(code.contains("[RegistryEntry<AnyMessage>; 3]"));
        assert!(code.contains("name: \"PlayerState\", decode: decode_player_state_7 }"));
        assert!(code.contains("fn decode_player_state_7(buf: &mut ReadBuffer<'_>) -> Result<AnyMessage, DecodeError> {"));
    }

    #[test]
    fn union_follows_declaration_order() {
        let schema = schema("message B = 20 { u8 x; } message A = 3 { u8 y; }");
        let code = emit_registry(&schema).unwrap();
        assert!(code.contains("pub enum AnyMessage {\n    B(B),\n    A(A),\n}"));
        assert!(code.contains("AnyMessage::A(ref message) => message.encode(buf),"));
        assert!(code.contains("impl From<A> for AnyMessage {"));
    }

    #[test]
    fn rechecks_identifier_collisions() {
        let mut model = schema("message A = 1 { u8 x; } message B = 2 { u8 y; }").into_model();
        model.messages[1].identifier = 1;
        let err = emit_registry(&ValidatedSchema::new(model)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::AmbiguousRegistryEntry {
                id:     1,
                first:  "A".into(),
                second: "B".into(),
            }
        );
    }

    #[test]
    fn empty_schema_still_compiles() {
        let schema = schema("");
        let code = emit_registry(&schema).unwrap();
        assert!(code.contains("pub enum AnyMessage {\n}"));
        assert!(code.contains("        match *self {}"));
        assert!(code.contains("pub fn encode(&self, _buf: &mut WriteBuffer)"));
        assert!(code.contains("[RegistryEntry<AnyMessage>; 0] = [\n];"));
    }
}
