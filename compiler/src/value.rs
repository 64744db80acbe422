use std::collections::HashMap;
use std::fmt;

use netmsg_wire::{DecodeError, EncodeError, IntWidth, ReadBuffer, WriteBuffer};

use crate::{
    error::ValueError,
    types::{ArrayLen, EnumDescriptor, FieldKind, MessageDescriptor, Primitive, TypeRef, ValidatedSchema},
};

/// Dynamic message data.
///
/// Values are encoded and decoded against a [`ValidatedSchema`] with exactly
/// the same wire layout as the generated code, which makes them useful for
/// tools that only have the schema at hand. Type and field names borrow from
/// the schema, so a decoded value can outlive its buffer but not its schema.
#[derive(Clone, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value<'a>>),
    /// Enum type name and raw value. The value need not match a member.
    Enum(&'a str, u64),
    Message(&'a str, HashMap<&'a str, Value<'a>>),
}

impl<'a> Value<'a> {
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// Returns `0` for other value kinds.
    pub fn as_uint(&self) -> u64 {
        match *self {
            Value::UInt(value) => value,
            _ => 0,
        }
    }

    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            Value::Int(value) => value,
            _ => 0,
        }
    }

    /// Returns `0.0` for other value kinds.
    pub fn as_float(&self) -> f64 {
        match *self {
            Value::Float(value) => value,
            _ => 0.0,
        }
    }

    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// Returns an empty slice for other value kinds.
    pub fn as_array(&self) -> &[Value<'a>] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn as_enum(&self) -> Option<(&'a str, u64)> {
        match *self {
            Value::Enum(name, raw) => Some((name, raw)),
            _ => None,
        }
    }

    /// Member name of an enum value, or `None` for undeclared values and
    /// other value kinds.
    pub fn enum_member(&self, schema: &'a ValidatedSchema) -> Option<&'a str> {
        let (name, raw) = self.as_enum()?;
        schema
            .enumeration(name)?
            .member_by_value(raw)
            .map(|member| member.name.as_str())
    }

    /// Returns `0` for values that are not arrays.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field of a message value.
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        match *self {
            Value::Message(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// Sets a field on a message value. Does nothing for other value kinds.
    pub fn set(&mut self, name: &'a str, value: Value<'a>) {
        if let Value::Message(_, ref mut fields) = *self {
            fields.insert(name, value);
        }
    }

    /// JSON rendering for inspection. Known enum values render as their
    /// member name, unknown ones as the raw number.
    pub fn to_json(&self, schema: &ValidatedSchema) -> serde_json::Value {
        use serde_json::Value as Json;

        match *self {
            Value::Bool(value) => Json::Bool(value),
            Value::UInt(value) => Json::from(value),
            Value::Int(value) => Json::from(value),
            Value::Float(value) => serde_json::Number::from_f64(value).map_or(Json::Null, Json::Number),
            Value::String(ref value) => Json::String(value.clone()),
            Value::Array(ref values) => Json::Array(values.iter().map(|v| v.to_json(schema)).collect()),
            Value::Enum(name, raw) => {
                let member = schema
                    .enumeration(name)
                    .and_then(|e| e.member_by_value(raw))
                    .map(|m| m.name.clone());
                member.map_or(Json::from(raw), Json::String)
            }
            Value::Message(name, ref fields) => {
                // Declaration order first, then anything the schema does not name
                let declared: Vec<&str> = schema
                    .message(name)
                    .map(|m| m.fields.iter().map(|f| f.name.as_str()).collect())
                    .unwrap_or_default();
                let mut extra: Vec<&str> = fields.keys().copied().filter(|k| !declared.contains(k)).collect();
                extra.sort_unstable();

                let mut object = serde_json::Map::new();
                for key in declared.into_iter().chain(extra) {
                    if let Some(value) = fields.get(key) {
                        object.insert(key.to_string(), value.to_json(schema));
                    }
                }
                Json::Object(object)
            }
        }
    }

    fn describe(&self) -> String {
        match *self {
            Value::Bool(_) => "bool".to_string(),
            Value::UInt(_) => "unsigned integer".to_string(),
            Value::Int(_) => "signed integer".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Enum(name, _) => format!("enum {}", name),
            Value::Message(name, _) => format!("message {}", name),
        }
    }

    /// Encodes a message value. The message type is taken from the value.
    pub fn encode(&self, schema: &ValidatedSchema) -> Result<Vec<u8>, ValueError> {
        let mut bb = WriteBuffer::new();
        match *self {
            Value::Message(name, _) => {
                let message = schema
                    .message(name)
                    .ok_or_else(|| ValueError::UnknownType(name.to_string()))?;
                self.encode_message_bb(schema, message, &mut bb)?;
            }
            _ => {
                return Err(ValueError::TypeMismatch {
                    expected: "message".to_string(),
                    found:    self.describe(),
                })
            }
        }
        Ok(bb.data())
    }

    /// Decodes the message named `message` from the start of `bytes`.
    pub fn decode(schema: &'a ValidatedSchema, message: &str, bytes: &[u8]) -> Result<Value<'a>, ValueError> {
        let message = schema
            .message(message)
            .ok_or_else(|| ValueError::UnknownType(message.to_string()))?;
        Value::decode_message_bb(schema, message, &mut ReadBuffer::new(bytes))
    }

    /// Decodes a payload by message identifier, the way the generated
    /// registry dispatches.
    pub fn decode_frame(schema: &'a ValidatedSchema, id: u32, bytes: &[u8]) -> Result<Value<'a>, ValueError> {
        let message = schema.message_by_id(id).ok_or(ValueError::UnknownId(id))?;
        Value::decode_message_bb(schema, message, &mut ReadBuffer::new(bytes))
    }

    /// Decodes one message starting at the current index of `bb`, leaving the
    /// index just past it.
    pub fn decode_message_bb(
        schema: &'a ValidatedSchema,
        message: &'a MessageDescriptor,
        bb: &mut ReadBuffer<'_>,
    ) -> Result<Value<'a>, ValueError> {
        let mut fields = HashMap::with_capacity(message.fields.len());
        for field in &message.fields {
            fields.insert(field.name.as_str(), Value::decode_field_bb(schema, &field.kind, bb)?);
        }
        Ok(Value::Message(message.name.as_str(), fields))
    }

    /// Decodes one value of `kind` starting at the current index of `bb`.
    pub fn decode_field_bb(
        schema: &'a ValidatedSchema,
        kind: &'a FieldKind,
        bb: &mut ReadBuffer<'_>,
    ) -> Result<Value<'a>, ValueError> {
        match kind {
            FieldKind::Primitive(p) => match p.int_width() {
                Some((width, false)) => Ok(Value::UInt(bb.read_uint(width)?)),
                Some((width, true)) => Ok(Value::Int(bb.read_int(width)?)),
                None => match p {
                    Primitive::F32 => Ok(Value::Float(f64::from(bb.read_f32()?))),
                    Primitive::F64 => Ok(Value::Float(bb.read_f64()?)),
                    Primitive::Bool => Ok(Value::Bool(bb.read_bool()?)),
                    _ => Ok(Value::String(bb.read_string()?)),
                },
            },

            FieldKind::Array { element, len: ArrayLen::Variable } => {
                let min = schema.min_wire_size(element);
                let values = bb.read_vec(min, |bb| Value::decode_field_bb(schema, element, bb))?;
                Ok(Value::Array(values))
            }

            FieldKind::Array { element, len: ArrayLen::Fixed(n) } => {
                let needed = n.saturating_mul(schema.min_wire_size(element));
                if needed > bb.remaining() {
                    return Err(DecodeError::Truncated {
                        offset:    bb.index(),
                        needed,
                        remaining: bb.remaining(),
                    }
                    .into());
                }
                let mut values = Vec::with_capacity(*n);
                for _ in 0..*n {
                    values.push(Value::decode_field_bb(schema, element, bb)?);
                }
                Ok(Value::Array(values))
            }

            FieldKind::Named(name) => match schema.resolve(name) {
                Some(TypeRef::Enum(e)) => Ok(Value::Enum(e.name.as_str(), bb.read_uint(e.wire_width())?)),
                Some(TypeRef::Message(m)) => Value::decode_message_bb(schema, m, bb),
                None => Err(ValueError::UnknownType(name.clone())),
            },

            FieldKind::Unsupported(raw) => Err(ValueError::UnknownType(raw.clone())),
        }
    }

    fn encode_message_bb(
        &self,
        schema: &ValidatedSchema,
        message: &MessageDescriptor,
        bb: &mut WriteBuffer,
    ) -> Result<(), ValueError> {
        let fields = match *self {
            Value::Message(name, ref fields) if name == message.name => fields,
            _ => return Err(self.mismatch(&format!("message {}", message.name))),
        };

        // Schema order, not map order
        for field in &message.fields {
            let value = fields.get(field.name.as_str()).ok_or_else(|| ValueError::MissingField {
                message: message.name.clone(),
                field:   field.name.clone(),
            })?;
            value.write_field_bb(schema, &field.kind, bb)?;
        }
        Ok(())
    }

    /// Appends this value to `bb` as a value of `kind`. On failure `bb` is
    /// left as it was.
    pub fn encode_field_bb(&self, schema: &ValidatedSchema, kind: &FieldKind, bb: &mut WriteBuffer) -> Result<(), ValueError> {
        let start = bb.len();
        let result = self.write_field_bb(schema, kind, bb);
        if result.is_err() {
            bb.truncate(start);
        }
        result
    }

    fn write_field_bb(&self, schema: &ValidatedSchema, kind: &FieldKind, bb: &mut WriteBuffer) -> Result<(), ValueError> {
        match kind {
            FieldKind::Primitive(p) => self.encode_primitive_bb(*p, bb),

            FieldKind::Array { element, len } => {
                let values = match *self {
                    Value::Array(ref values) => values,
                    _ => return Err(self.mismatch(&kind.to_string())),
                };
                match *len {
                    ArrayLen::Variable => bb.write_len(values.len())?,
                    ArrayLen::Fixed(n) if n != values.len() => {
                        return Err(EncodeError::LengthMismatch {
                            expected: n,
                            actual:   values.len(),
                        }
                        .into())
                    }
                    ArrayLen::Fixed(_) => {}
                }
                for value in values {
                    value.write_field_bb(schema, element, bb)?;
                }
                Ok(())
            }

            FieldKind::Named(name) => match schema.resolve(name) {
                Some(TypeRef::Enum(e)) => self.encode_enum_bb(e, bb),
                Some(TypeRef::Message(m)) => self.encode_message_bb(schema, m, bb),
                None => Err(ValueError::UnknownType(name.clone())),
            },

            FieldKind::Unsupported(raw) => Err(ValueError::UnknownType(raw.clone())),
        }
    }

    fn encode_enum_bb(&self, e: &EnumDescriptor, bb: &mut WriteBuffer) -> Result<(), ValueError> {
        match *self {
            Value::Enum(name, raw) if name == e.name => Ok(bb.write_uint(e.wire_width(), raw)?),
            _ => Err(self.mismatch(&format!("enum {}", e.name))),
        }
    }

    fn encode_primitive_bb(&self, p: Primitive, bb: &mut WriteBuffer) -> Result<(), ValueError> {
        if let Some((width, signed)) = p.int_width() {
            return self.encode_int_bb(p, width, signed, bb);
        }

        match (p, self) {
            (Primitive::F32, Value::Float(value)) => {
                let narrow = *value as f32;
                if f64::from(narrow) != *value && !value.is_nan() {
                    return Err(ValueError::InexactFloat {
                        value: value.to_string(),
                    });
                }
                bb.write_f32(narrow);
            }
            (Primitive::F64, Value::Float(value)) => bb.write_f64(*value),
            (Primitive::Bool, Value::Bool(value)) => bb.write_bool(*value),
            (Primitive::String, Value::String(value)) => bb.write_string(value)?,
            _ => return Err(self.mismatch(p.name())),
        }
        Ok(())
    }

    fn encode_int_bb(&self, p: Primitive, width: IntWidth, signed: bool, bb: &mut WriteBuffer) -> Result<(), ValueError> {
        let out_of_range = |value: i128| EncodeError::OutOfRange { value, ty: p.name() };

        match (self, signed) {
            (&Value::UInt(value), false) => bb.write_uint(width, value)?,
            (&Value::Int(value), false) => {
                let value = u64::try_from(value).map_err(|_| out_of_range(i128::from(value)))?;
                bb.write_uint(width, value)?
            }
            (&Value::Int(value), true) => bb.write_int(width, value)?,
            (&Value::UInt(value), true) => {
                let value = i64::try_from(value).map_err(|_| out_of_range(i128::from(value)))?;
                bb.write_int(width, value)?
            }
            _ => return Err(self.mismatch(p.name())),
        }
        Ok(())
    }

    fn mismatch(&self, expected: &str) -> ValueError {
        ValueError::TypeMismatch {
            expected: expected.to_string(),
            found:    self.describe(),
        }
    }
}

impl<'a> fmt::Debug for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::UInt(value) => value.fmt(f),
            Value::Int(value) => value.fmt(f),
            Value::Float(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Array(ref values) => values.fmt(f),
            Value::Enum(name, raw) => write!(f, "{}({})", name, raw),

            Value::Message(name, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                let mut first = true;
                keys.sort();
                write!(f, "{} {{", name)?;

                for key in keys {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, fields[key])?;
                }

                write!(f, "}}")
            }
        }
    }
}
