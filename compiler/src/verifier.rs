use std::collections::{HashMap, HashSet};

use crate::{
    error::{SchemaError, SchemaErrors},
    types::{ArrayLen, FieldKind, Location, MessageDescriptor, SchemaModel, ValidatedSchema},
    utils::{field_ident, type_ident},
};

/// Names the generated code defines or imports itself.
pub const RESERVED_NAMES: [&str; 19] = [
    "AnyMessage",
    "REGISTRY",
    "NetMessage",
    "WireEnum",
    "EnumValue",
    "ReadBuffer",
    "WriteBuffer",
    "DecodeError",
    "EncodeError",
    "DispatchError",
    "IntWidth",
    "Registry",
    "RegistryEntry",
    "Option",
    "Result",
    "Vec",
    "String",
    "Box",
    "Self",
];

/// Largest element count accepted for a fixed array (`T[N]`).
pub const MAX_FIXED_ARRAY_LEN: usize = 65_536;

/// Checks the whole model and collects every problem before returning.
pub fn verify_schema(model: SchemaModel) -> Result<ValidatedSchema, SchemaErrors> {
    let mut errors = Vec::new();

    check_message_ids(&model, &mut errors);
    check_supported_kinds(&model, &mut errors);
    check_references(&model, &mut errors);
    check_empty_messages(&model, &mut errors);
    check_type_names(&model, &mut errors);
    check_field_names(&model, &mut errors);
    check_enums(&model, &mut errors);
    check_recursion(&model, &mut errors);
    check_zero_width_elements(&model, &mut errors);

    match SchemaErrors::new(errors) {
        Some(errors) => Err(errors),
        None => Ok(ValidatedSchema::new(model)),
    }
}

// 1) Identifiers are unique and fit in a u32
fn check_message_ids(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    let mut seen: HashMap<i64, &MessageDescriptor> = HashMap::new();
    for message in &model.messages {
        if u32::try_from(message.identifier).is_err() {
            errors.push(SchemaError::InvalidMessageId {
                id:       message.identifier,
                message:  message.name.clone(),
                location: message.location.clone(),
            });
            continue;
        }
        if let Some(first) = seen.get(&message.identifier) {
            errors.push(SchemaError::DuplicateMessageId {
                id:             message.identifier,
                message:        message.name.clone(),
                first:          first.name.clone(),
                location:       message.location.clone(),
                first_location: first.location.clone(),
            });
            continue;
        }
        seen.insert(message.identifier, message);
    }
}

fn unsupported_part(kind: &FieldKind) -> Option<String> {
    match kind {
        FieldKind::Unsupported(raw) => Some(raw.clone()),
        FieldKind::Array { len: ArrayLen::Fixed(0), .. } => Some(kind.to_string()),
        FieldKind::Array { element, .. } => unsupported_part(element),
        FieldKind::Primitive(_) | FieldKind::Named(_) => None,
    }
}

fn longest_fixed_len(kind: &FieldKind) -> usize {
    match kind {
        FieldKind::Array { element, len } => {
            let own = match *len {
                ArrayLen::Fixed(n) => n,
                ArrayLen::Variable => 0,
            };
            own.max(longest_fixed_len(element))
        }
        _ => 0,
    }
}

// 2) Every field kind is supported, through array elements
fn check_supported_kinds(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    for message in &model.messages {
        for field in &message.fields {
            if let Some(kind) = unsupported_part(&field.kind) {
                errors.push(SchemaError::UnsupportedKind {
                    owner: message.name.clone(),
                    field: field.name.clone(),
                    kind,
                    location: field.location.clone(),
                });
            }
            let len = longest_fixed_len(&field.kind);
            if len > MAX_FIXED_ARRAY_LEN {
                errors.push(SchemaError::FixedArrayTooLong {
                    owner:    message.name.clone(),
                    field:    field.name.clone(),
                    len,
                    max:      MAX_FIXED_ARRAY_LEN,
                    location: field.location.clone(),
                });
            }
        }
    }
}

// 3) Named references resolve inside the model
fn check_references(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    let defined: HashSet<&str> = model
        .messages
        .iter()
        .map(|m| m.name.as_str())
        .chain(model.enums.iter().map(|e| e.name.as_str()))
        .collect();

    for message in &model.messages {
        for field in &message.fields {
            if let FieldKind::Named(target) = field.kind.base() {
                if !defined.contains(target.as_str()) {
                    errors.push(SchemaError::UnresolvedReference {
                        owner:    message.name.clone(),
                        field:    field.name.clone(),
                        target:   target.clone(),
                        location: field.location.clone(),
                    });
                }
            }
        }
    }
}

// 4) Zero-field messages need the marker attribute
fn check_empty_messages(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    for message in &model.messages {
        if message.fields.is_empty() && !message.marker {
            errors.push(SchemaError::EmptyMessage {
                message:  message.name.clone(),
                location: message.location.clone(),
            });
        }
    }
}

fn check_type_names(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    let mut seen: HashMap<String, &Location> = HashMap::new();
    let names = model
        .enums
        .iter()
        .map(|e| (&e.name, &e.location))
        .chain(model.messages.iter().map(|m| (&m.name, &m.location)));

    for (name, location) in names {
        let ident = type_ident(name);
        if RESERVED_NAMES.contains(&ident.as_str()) || RESERVED_NAMES.contains(&name.as_str()) {
            errors.push(SchemaError::ReservedTypeName {
                name:     name.clone(),
                location: location.clone(),
            });
            continue;
        }
        if let Some(first) = seen.get(&ident) {
            errors.push(SchemaError::DuplicateTypeName {
                name:           name.clone(),
                location:       location.clone(),
                first_location: (*first).clone(),
            });
            continue;
        }
        seen.insert(ident, location);
    }
}

fn check_field_names(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    for message in &model.messages {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for field in &message.fields {
            let generated = field_ident(&field.name);
            if let Some(first) = seen.get(&generated) {
                errors.push(SchemaError::DuplicateFieldName {
                    owner:     message.name.clone(),
                    first:     first.to_string(),
                    second:    field.name.clone(),
                    generated,
                    location:  field.location.clone(),
                });
                continue;
            }
            seen.insert(generated, &field.name);
        }
    }
}

fn check_enums(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    for e in &model.enums {
        if e.members.is_empty() {
            errors.push(SchemaError::EmptyEnum {
                name:     e.name.clone(),
                location: e.location.clone(),
            });
            continue;
        }

        let width = e.wire_width();
        let mut names: HashMap<String, &str> = HashMap::new();
        let mut values: HashMap<i64, &str> = HashMap::new();

        for member in &e.members {
            let generated = type_ident(&member.name);
            if let Some(first) = names.get(&generated) {
                errors.push(SchemaError::DuplicateFieldName {
                    owner:     e.name.clone(),
                    first:     first.to_string(),
                    second:    member.name.clone(),
                    generated: generated.clone(),
                    location:  member.location.clone(),
                });
            } else {
                names.insert(generated, &member.name);
            }

            let fits = u64::try_from(member.value).map_or(false, |v| v <= width.unsigned_max());
            if !fits {
                errors.push(SchemaError::EnumValueOutOfRange {
                    name:     e.name.clone(),
                    member:   member.name.clone(),
                    value:    member.value,
                    width,
                    location: member.location.clone(),
                });
            }

            if let Some(first) = values.get(&member.value) {
                errors.push(SchemaError::DuplicateEnumValue {
                    name:     e.name.clone(),
                    member:   member.name.clone(),
                    first:    first.to_string(),
                    value:    member.value,
                    location: member.location.clone(),
                });
            } else {
                values.insert(member.value, &member.name);
            }
        }
    }
}

/// Messages stored inline in `kind`. A variable-length array breaks the
/// chain, because an empty array ends the recursion.
fn inline_messages<'a>(kind: &'a FieldKind, out: &mut Vec<&'a str>) {
    match kind {
        FieldKind::Named(name) => out.push(name),
        FieldKind::Array { element, len: ArrayLen::Fixed(_) } => inline_messages(element, out),
        _ => {}
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    White,
    Gray,
    Black,
}

// Inline nesting must be acyclic, otherwise the struct has infinite size
fn check_recursion(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    let index: HashMap<&str, usize> = model
        .messages
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.as_str(), i))
        .collect();

    let edges: Vec<Vec<usize>> = model
        .messages
        .iter()
        .map(|m| {
            let mut names = Vec::new();
            for field in &m.fields {
                inline_messages(&field.kind, &mut names);
            }
            names.iter().filter_map(|n| index.get(n).copied()).collect()
        })
        .collect();

    fn visit(
        node: usize,
        model: &SchemaModel,
        edges: &[Vec<usize>],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        errors: &mut Vec<SchemaError>,
    ) {
        marks[node] = Mark::Gray;
        stack.push(node);

        for &next in &edges[node] {
            match marks[next] {
                Mark::White => visit(next, model, edges, marks, stack, errors),
                Mark::Gray => {
                    let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                    let mut path: Vec<&str> = stack[start..]
                        .iter()
                        .map(|&n| model.messages[n].name.as_str())
                        .collect();
                    path.push(model.messages[next].name.as_str());

                    let origin = &model.messages[next];
                    errors.push(SchemaError::RecursiveNesting {
                        message:  origin.name.clone(),
                        path:     path.join(" -> "),
                        location: origin.location.clone(),
                    });
                }
                Mark::Black => {}
            }
        }

        stack.pop();
        marks[node] = Mark::Black;
    }

    let mut marks = vec![Mark::White; model.messages.len()];
    let mut stack = Vec::new();
    for node in 0..model.messages.len() {
        if marks[node] == Mark::White {
            visit(node, model, &edges, &mut marks, &mut stack, errors);
        }
    }
}

/// True when every value of `kind` encodes to zero bytes, e.g. a `[marker]`
/// message or a fixed array of them.
fn occupies_no_bytes<'m>(model: &'m SchemaModel, kind: &FieldKind, visiting: &mut HashSet<&'m str>) -> bool {
    match kind {
        FieldKind::Array { len: ArrayLen::Variable, .. } => false,
        FieldKind::Array { element, len: ArrayLen::Fixed(n) } => {
            *n == 0 || occupies_no_bytes(model, element, visiting)
        }
        FieldKind::Named(name) => {
            let message = match model.messages.iter().find(|m| m.name == *name) {
                Some(message) => message,
                None => return false,
            };
            // Inline cycles are reported by the recursion check
            if !visiting.insert(message.name.as_str()) {
                return false;
            }
            let empty = message.fields.iter().all(|f| occupies_no_bytes(model, &f.kind, visiting));
            visiting.remove(message.name.as_str());
            empty
        }
        FieldKind::Primitive(_) | FieldKind::Unsupported(_) => false,
    }
}

fn has_zero_width_vec(model: &SchemaModel, kind: &FieldKind) -> bool {
    match kind {
        FieldKind::Array { element, len } => {
            (*len == ArrayLen::Variable && occupies_no_bytes(model, element, &mut HashSet::new()))
                || has_zero_width_vec(model, element)
        }
        _ => false,
    }
}

// A count prefix must be backed by at least one byte per element
fn check_zero_width_elements(model: &SchemaModel, errors: &mut Vec<SchemaError>) {
    for message in &model.messages {
        for field in &message.fields {
            if has_zero_width_vec(model, &field.kind) {
                errors.push(SchemaError::ZeroWidthElement {
                    owner:    message.name.clone(),
                    field:    field.name.clone(),
                    kind:     field.kind.to_string(),
                    location: field.location.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract::extract_schema, parser::parse_schema, tokenizer::tokenize_schema};

    fn verify(text: &str) -> Result<ValidatedSchema, SchemaErrors> {
        let file = parse_schema(&tokenize_schema(text).unwrap(), "test.msg").unwrap();
        verify_schema(extract_schema(&[file], None, None))
    }

    fn errors(text: &str) -> Vec<SchemaError> {
        verify(text).unwrap_err().into_vec()
    }

    #[test]
    fn accepts_valid_schema() {
        let schema = verify(
            r#"
            enum Reason { Kicked = 0; Timeout = 300; }
            message Item = 10 { u32 id; }
            message State = 11 { string name; f32[3] pos; Item[] items; Reason why; }
            message Ping = 12 [marker] { }
            "#,
        )
        .unwrap();
        assert_eq!(schema.messages().len(), 3);
        assert!(schema.message_by_id(11).is_some());
        assert_eq!(schema.enumeration("Reason").unwrap().wire_width().bytes(), 2);
    }

    #[test]
    fn reports_duplicate_ids() {
        let errs = errors("message A = 1 { u8 x; } message B = 1 { u8 y; }");
        assert!(matches!(
            &errs[..],
            [SchemaError::DuplicateMessageId { id: 1, message, first, .. }] if message == "B" && first == "A"
        ));
    }

    #[test]
    fn reports_out_of_range_ids() {
        let errs = errors("message A = -1 { u8 x; } message B = 4294967296 { u8 y; }");
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| matches!(e, SchemaError::InvalidMessageId { .. })));
    }

    #[test]
    fn reports_unsupported_kinds_through_arrays() {
        let errs = errors("message A = 1 { map<u8, u8>[] m; u8[0] empty; u8[2][] ok; }");
        let kinds: Vec<_> = errs
            .iter()
            .map(|e| match e {
                SchemaError::UnsupportedKind { kind, .. } => kind.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec!["map<u8, u8>", "u8[0]"]);
    }

    #[test]
    fn reports_unresolved_references() {
        let errs = errors("message A = 1 { Missing[] xs; }");
        assert!(matches!(
            &errs[..],
            [SchemaError::UnresolvedReference { target, field, .. }] if target == "Missing" && field == "xs"
        ));
    }

    #[test]
    fn empty_message_needs_marker() {
        let errs = errors("message A = 1 { } message B = 2 [marker] { }");
        assert!(matches!(&errs[..], [SchemaError::EmptyMessage { message, .. }] if message == "A"));
    }

    #[test]
    fn accumulates_in_check_order() {
        let errs = errors("message A = 1 { } message B = 1 { Nope n; map<u8, u8> m; }");
        assert!(matches!(errs[0], SchemaError::DuplicateMessageId { .. }));
        assert!(matches!(errs[1], SchemaError::UnsupportedKind { .. }));
        assert!(matches!(errs[2], SchemaError::UnresolvedReference { .. }));
        assert!(matches!(errs[3], SchemaError::EmptyMessage { .. }));
    }

    #[test]
    fn reports_type_name_problems() {
        let errs = errors("message A = 1 { u8 x; } enum A { X = 0; } message Registry = 2 { u8 y; }");
        assert!(errs.iter().any(|e| matches!(e, SchemaError::DuplicateTypeName { name, .. } if name == "A")));
        assert!(errs.iter().any(|e| matches!(e, SchemaError::ReservedTypeName { name, .. } if name == "Registry")));
    }

    #[test]
    fn reports_colliding_field_names() {
        let errs = errors("message A = 1 { u8 playerId; u8 player_id; }");
        assert!(matches!(
            &errs[..],
            [SchemaError::DuplicateFieldName { generated, .. }] if generated == "player_id"
        ));
    }

    #[test]
    fn reports_enum_problems() {
        let errs = errors("enum Empty { } enum E : u8 { A = 0; B = 0; C = 256; D = -1; }");
        assert!(matches!(errs[0], SchemaError::EmptyEnum { .. }));
        assert!(errs.iter().any(|e| matches!(e, SchemaError::DuplicateEnumValue { member, .. } if member == "B")));
        let out_of_range: Vec<_> = errs
            .iter()
            .filter_map(|e| match e {
                SchemaError::EnumValueOutOfRange { member, .. } => Some(member.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(out_of_range, vec!["C", "D"]);
    }

    #[test]
    fn reports_inline_recursion() {
        let errs = errors("message A = 1 { B b; } message B = 2 { A[2] a; }");
        assert!(matches!(
            &errs[..],
            [SchemaError::RecursiveNesting { path, .. }] if path == "A -> B -> A"
        ));
    }

    #[test]
    fn allows_recursion_through_variable_arrays() {
        assert!(verify("message Node = 1 { u32 value; Node[] children; }").is_ok());
    }

    #[test]
    fn rejects_variable_arrays_of_empty_elements() {
        let errs = errors(
            r#"
            message Ping = 1 [marker] { }
            message Wrapper = 2 { Ping inner; Ping[3] more; }
            message Batch = 3 { Ping[] pings; Wrapper[][] nested; Ping[2] fixed; }
            "#,
        );
        let fields: Vec<&str> = errs
            .iter()
            .filter_map(|e| match e {
                SchemaError::ZeroWidthElement { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["pings", "nested"]);
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn limits_fixed_array_length() {
        assert!(verify("message M = 1 { u8[65536] ok; }").is_ok());
        let errs = errors("message M = 1 { u8[100000000000] big; u16[70000][] rows; }");
        let lens: Vec<usize> = errs
            .iter()
            .filter_map(|e| match e {
                SchemaError::FixedArrayTooLong { len, max, .. } if *max == MAX_FIXED_ARRAY_LEN => Some(*len),
                _ => None,
            })
            .collect();
        assert_eq!(lens, vec![100_000_000_000, 70_000]);
    }
}
