use std::collections::HashMap;
use std::fmt;

use netmsg_wire::IntWidth;
use serde::{Serialize, Serializer};

/// Where a definition, field or enum member was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub source: String,
    pub line:   usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
}

impl Primitive {
    pub const ALL: [Primitive; 12] = [
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::String,
    ];

    pub fn from_name(name: &str) -> Option<Primitive> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Name used in schema files.
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::String => "string",
        }
    }

    pub const fn rust_type(self) -> &'static str {
        match self {
            Primitive::String => "String",
            other => other.name(),
        }
    }

    /// Integer width and signedness, for the integer primitives only.
    pub const fn int_width(self) -> Option<(IntWidth, bool)> {
        match self {
            Primitive::U8 => Some((IntWidth::W8, false)),
            Primitive::U16 => Some((IntWidth::W16, false)),
            Primitive::U32 => Some((IntWidth::W32, false)),
            Primitive::U64 => Some((IntWidth::W64, false)),
            Primitive::I8 => Some((IntWidth::W8, true)),
            Primitive::I16 => Some((IntWidth::W16, true)),
            Primitive::I32 => Some((IntWidth::W32, true)),
            Primitive::I64 => Some((IntWidth::W64, true)),
            _ => None,
        }
    }

    /// Smallest encoded size. Strings take at least their length prefix.
    pub const fn min_wire_size(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 | Primitive::Bool => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 | Primitive::String => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLen {
    Fixed(usize),
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Primitive(Primitive),
    Array {
        element: Box<FieldKind>,
        len:     ArrayLen,
    },
    /// An enum or nested message, resolved during validation.
    Named(String),
    /// Kept as written so the validator can report it.
    Unsupported(String),
}

impl FieldKind {
    /// The innermost non-array kind.
    pub fn base(&self) -> &FieldKind {
        match self {
            FieldKind::Array { element, .. } => element.base(),
            other => other,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Primitive(p) => f.write_str(p.name()),
            FieldKind::Array { element, len: ArrayLen::Variable } => write!(f, "{}[]", element),
            FieldKind::Array { element, len: ArrayLen::Fixed(n) } => write!(f, "{}[{}]", element, n),
            FieldKind::Named(name) => f.write_str(name),
            FieldKind::Unsupported(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name:     String,
    pub kind:     FieldKind,
    /// Declaration position, which is also the wire position.
    pub order:    usize,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDescriptor {
    /// As written; the validator restricts it to the `u32` range.
    pub identifier: i64,
    pub name:       String,
    pub marker:     bool,
    pub namespace:  Option<String>,
    pub fields:     Vec<FieldDescriptor>,
    pub location:   Location,
}

impl MessageDescriptor {
    /// Identifier as it appears on the wire. Only meaningful after validation.
    pub fn id(&self) -> u32 {
        u32::try_from(self.identifier).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name:     String,
    pub value:    i64,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    pub name:      String,
    /// Declared width, or the configured default when none was declared.
    #[serde(serialize_with = "serialize_width")]
    pub width:     Option<IntWidth>,
    pub namespace: Option<String>,
    pub members:   Vec<EnumMember>,
    pub location:  Location,
}

impl EnumDescriptor {
    /// Width used on the wire: the explicit width, otherwise the smallest one
    /// that holds the largest member value.
    pub fn wire_width(&self) -> IntWidth {
        self.width.unwrap_or_else(|| {
            let max = self
                .members
                .iter()
                .map(|m| u64::try_from(m.value).unwrap_or(0))
                .max()
                .unwrap_or(0);
            IntWidth::smallest_for(max)
        })
    }

    pub fn member_by_value(&self, value: u64) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|m| u64::try_from(m.value).ok() == Some(value))
    }
}

fn serialize_width<S: Serializer>(width: &Option<IntWidth>, serializer: S) -> Result<S::Ok, S::Error> {
    match width {
        Some(width) => serializer.serialize_str(width.unsigned_name()),
        None => serializer.serialize_none(),
    }
}

/// Every message and enum considered in one compiler run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaModel {
    pub namespace: Option<String>,
    pub enums:     Vec<EnumDescriptor>,
    pub messages:  Vec<MessageDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeRef<'a> {
    Message(&'a MessageDescriptor),
    Enum(&'a EnumDescriptor),
}

/// A [`SchemaModel`] that passed validation. Only
/// [`verify_schema`](crate::verifier::verify_schema) creates one, so every
/// named reference resolves and no message nests itself inline.
#[derive(Debug, Clone)]
pub struct ValidatedSchema {
    model:    SchemaModel,
    messages: HashMap<String, usize>,
    enums:    HashMap<String, usize>,
    ids:      HashMap<u32, usize>,
}

impl ValidatedSchema {
    pub(crate) fn new(model: SchemaModel) -> ValidatedSchema {
        let messages = model
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let enums = model
            .enums
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        let ids = model
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id(), i))
            .collect();

        ValidatedSchema {
            model,
            messages,
            enums,
            ids,
        }
    }

    pub fn model(&self) -> &SchemaModel {
        &self.model
    }

    pub fn into_model(self) -> SchemaModel {
        self.model
    }

    pub fn namespace(&self) -> Option<&str> {
        self.model.namespace.as_deref()
    }

    pub fn messages(&self) -> &[MessageDescriptor] {
        &self.model.messages
    }

    pub fn enums(&self) -> &[EnumDescriptor] {
        &self.model.enums
    }

    pub fn message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(name).map(|&i| &self.model.messages[i])
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name).map(|&i| &self.model.enums[i])
    }

    pub fn message_by_id(&self, id: u32) -> Option<&MessageDescriptor> {
        self.ids.get(&id).map(|&i| &self.model.messages[i])
    }

    pub fn resolve(&self, name: &str) -> Option<TypeRef<'_>> {
        self.message(name)
            .map(TypeRef::Message)
            .or_else(|| self.enumeration(name).map(TypeRef::Enum))
    }

    /// Smallest number of bytes a value of `kind` can occupy on the wire.
    pub fn min_wire_size(&self, kind: &FieldKind) -> usize {
        match kind {
            FieldKind::Primitive(p) => p.min_wire_size(),
            FieldKind::Array { len: ArrayLen::Variable, .. } => 4,
            FieldKind::Array { element, len: ArrayLen::Fixed(n) } => {
                n.saturating_mul(self.min_wire_size(element))
            }
            FieldKind::Named(name) => match self.resolve(name) {
                Some(TypeRef::Enum(e)) => e.wire_width().bytes(),
                Some(TypeRef::Message(m)) => m
                    .fields
                    .iter()
                    .fold(0usize, |acc, f| acc.saturating_add(self.min_wire_size(&f.kind))),
                None => 0,
            },
            FieldKind::Unsupported(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location {
            source: "test.msg".into(),
            line:   1,
            column: 1,
        }
    }

    fn member(name: &str, value: i64) -> EnumMember {
        EnumMember {
            name: name.into(),
            value,
            location: loc(),
        }
    }

    #[test]
    fn primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("int"), None);
        assert_eq!(Primitive::String.rust_type(), "String");
    }

    #[test]
    fn enum_width_falls_back_to_smallest() {
        let mut e = EnumDescriptor {
            name:      "Reason".into(),
            width:     None,
            namespace: None,
            members:   vec![member("A", 0), member("B", 300)],
            location:  loc(),
        };
        assert_eq!(e.wire_width(), IntWidth::W16);
        e.width = Some(IntWidth::W32);
        assert_eq!(e.wire_width(), IntWidth::W32);
        assert_eq!(e.member_by_value(300).map(|m| m.name.as_str()), Some("B"));
    }

    #[test]
    fn field_kind_display() {
        let kind = FieldKind::Array {
            element: Box::new(FieldKind::Array {
                element: Box::new(FieldKind::Primitive(Primitive::U8)),
                len:     ArrayLen::Fixed(4),
            }),
            len: ArrayLen::Variable,
        };
        assert_eq!(kind.to_string(), "u8[4][]");
        assert_eq!(kind.base(), &FieldKind::Primitive(Primitive::U8));
    }

    #[test]
    fn model_serializes_to_json() {
        let model = SchemaModel {
            namespace: Some("Game".into()),
            enums:     vec![EnumDescriptor {
                name:      "Reason".into(),
                width:     Some(IntWidth::W8),
                namespace: Some("Game".into()),
                members:   vec![member("Kicked", 0)],
                location:  loc(),
            }],
            messages:  vec![],
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["enums"][0]["width"], "u8");
        assert_eq!(json["enums"][0]["location"]["line"], 1);
    }
}
