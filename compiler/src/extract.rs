use netmsg_wire::IntWidth;
use tracing::debug;

use crate::{
    ast::{Definition, DefinitionKind, SourceFile, TypeExpr},
    types::{
        ArrayLen, EnumDescriptor, EnumMember, FieldDescriptor, FieldKind, Location, MessageDescriptor,
        Primitive, SchemaModel,
    },
};

/// Builds the schema model from parsed sources.
///
/// Only tagged messages (`message Name = N`) are kept. When `namespace` is
/// set, definitions outside it (or a namespace nested below it) are skipped.
/// Enums without a declared width get `default_width`.
pub fn extract_schema(
    files: &[SourceFile],
    namespace: Option<&str>,
    default_width: Option<IntWidth>,
) -> SchemaModel {
    let mut model = SchemaModel {
        namespace: namespace.map(str::to_string),
        ..SchemaModel::default()
    };

    for file in files {
        for def in &file.definitions {
            if !in_namespace(def.namespace.as_deref(), namespace) {
                debug!(
                    source = %file.name,
                    name = %def.name,
                    namespace = def.namespace.as_deref().unwrap_or(""),
                    "skipping definition outside the recognized namespace"
                );
                continue;
            }

            match def.kind {
                DefinitionKind::Enum { width } => {
                    model.enums.push(extract_enum(file, def, width.or(default_width)));
                }
                DefinitionKind::Message { id: Some(id), marker } => {
                    model.messages.push(extract_message(file, def, id, marker));
                }
                DefinitionKind::Message { id: None, .. } => {
                    debug!(source = %file.name, name = %def.name, "skipping untagged message");
                }
            }
        }
    }

    debug!(
        messages = model.messages.len(),
        enums = model.enums.len(),
        "extracted schema model"
    );
    model
}

fn in_namespace(declared: Option<&str>, recognized: Option<&str>) -> bool {
    match (declared, recognized) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(declared), Some(recognized)) => {
            declared == recognized
                || declared
                    .strip_prefix(recognized)
                    .map_or(false, |rest| rest.starts_with('.'))
        }
    }
}

fn location(file: &SourceFile, line: usize, column: usize) -> Location {
    Location {
        source: file.name.clone(),
        line,
        column,
    }
}

fn extract_enum(file: &SourceFile, def: &Definition, width: Option<IntWidth>) -> EnumDescriptor {
    let members = def
        .fields
        .iter()
        .map(|field| EnumMember {
            name:     field.name.clone(),
            value:    field.value.unwrap_or_default(),
            location: location(file, field.line, field.column),
        })
        .collect();

    EnumDescriptor {
        name: def.name.clone(),
        width,
        namespace: def.namespace.clone(),
        members,
        location: location(file, def.line, def.column),
    }
}

fn extract_message(file: &SourceFile, def: &Definition, id: i64, marker: bool) -> MessageDescriptor {
    let fields = def
        .fields
        .iter()
        .enumerate()
        .map(|(order, field)| FieldDescriptor {
            name: field.name.clone(),
            kind: field
                .type_
                .as_ref()
                .map(field_kind)
                .unwrap_or_else(|| FieldKind::Unsupported(String::new())),
            order,
            location: location(file, field.line, field.column),
        })
        .collect();

    MessageDescriptor {
        identifier: id,
        name: def.name.clone(),
        marker,
        namespace: def.namespace.clone(),
        fields,
        location: location(file, def.line, def.column),
    }
}

/// Maps a written type onto a field kind. Anything the wire format cannot
/// express becomes [`FieldKind::Unsupported`].
pub fn field_kind(type_: &TypeExpr) -> FieldKind {
    match type_ {
        TypeExpr::Name(name) => match Primitive::from_name(name) {
            Some(primitive) => FieldKind::Primitive(primitive),
            None => FieldKind::Named(name.clone()),
        },
        TypeExpr::Generic { .. } => FieldKind::Unsupported(type_.to_string()),
        TypeExpr::Array { element, len } => {
            let len = match len {
                None => ArrayLen::Variable,
                Some(n) => match usize::try_from(*n) {
                    Ok(n) => ArrayLen::Fixed(n),
                    Err(_) => return FieldKind::Unsupported(type_.to_string()),
                },
            };
            FieldKind::Array {
                element: Box::new(field_kind(element)),
                len,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};

    fn source(name: &str, text: &str) -> SourceFile {
        parse_schema(&tokenize_schema(text).unwrap(), name).unwrap()
    }

    #[test]
    fn keeps_only_tagged_messages() {
        let file = source(
            "a.msg",
            "message A = 1 { u8 x; } message Draft { u8 y; } enum E { X = 0; }",
        );
        let model = extract_schema(&[file], None, None);
        assert_eq!(model.messages.len(), 1);
        assert_eq!(model.messages[0].name, "A");
        assert_eq!(model.enums.len(), 1);
    }

    #[test]
    fn filters_by_namespace() {
        let file = source(
            "a.msg",
            r#"
            message Outside = 1 { u8 x; }
            namespace Game { message Inside = 2 { u8 x; } }
            namespace Game.Sub { enum Nested { A = 0; } }
            namespace GameOther { message Sibling = 3 { u8 x; } }
            "#,
        );
        let model = extract_schema(&[file], Some("Game"), None);
        let names: Vec<_> = model.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Inside"]);
        assert_eq!(model.enums.len(), 1);
        assert_eq!(model.namespace.as_deref(), Some("Game"));
    }

    #[test]
    fn preserves_field_order_and_locations() {
        let file = source("order.msg", "message M = 7 {\n  u32 b;\n  u8 a;\n  string c;\n}");
        let model = extract_schema(&[file], None, None);
        let fields = &model.messages[0].fields;
        let names: Vec<_> = fields.iter().map(|f| (f.name.as_str(), f.order)).collect();
        assert_eq!(names, vec![("b", 0), ("a", 1), ("c", 2)]);
        assert_eq!(fields[1].location.to_string(), "order.msg:3:6");
    }

    #[test]
    fn applies_default_enum_width() {
        let file = source("e.msg", "enum A { X = 0; } enum B : u32 { Y = 0; }");
        let model = extract_schema(&[file], None, Some(IntWidth::W16));
        assert_eq!(model.enums[0].width, Some(IntWidth::W16));
        assert_eq!(model.enums[1].width, Some(IntWidth::W32));
    }

    #[test]
    fn maps_types_to_kinds() {
        let file = source(
            "k.msg",
            "message M = 1 { f32[3] pos; Item[] items; map<string, u8> lookup; u8[-1] bad; }",
        );
        let model = extract_schema(&[file], None, None);
        let kinds: Vec<_> = model.messages[0].fields.iter().map(|f| f.kind.clone()).collect();
        assert_eq!(
            kinds[0],
            FieldKind::Array {
                element: Box::new(FieldKind::Primitive(Primitive::F32)),
                len:     ArrayLen::Fixed(3),
            }
        );
        assert_eq!(kinds[1].base(), &FieldKind::Named("Item".into()));
        assert_eq!(kinds[2], FieldKind::Unsupported("map<string, u8>".into()));
        assert_eq!(kinds[3], FieldKind::Unsupported("u8[-1]".into()));
    }
}
