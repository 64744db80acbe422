use crate::{DecodeError, EncodeError, IntWidth, ReadBuffer, WriteBuffer};

/// Implemented by every generated message type.
///
/// `encode` appends the fields strictly in declaration order and `decode`
/// reads them back in the same order, so `decode(encode(x)) == x` for every
/// value the field kinds can represent. The message identifier is not part of
/// the encoded bytes; framing is left to the transport.
pub trait NetMessage: Sized {
    /// Wire identifier, unique across the whole schema.
    const ID: u32;

    /// Name of the message as declared in the schema.
    const NAME: &'static str;

    fn encode(&self, buf: &mut WriteBuffer) -> Result<(), EncodeError>;

    fn decode(buf: &mut ReadBuffer<'_>) -> Result<Self, DecodeError>;

    /// Encode into a fresh byte vector.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bb = WriteBuffer::new();
        self.encode(&mut bb)?;
        Ok(bb.data())
    }

    /// Decode starting at `cursor` and return the message together with the
    /// cursor position just past it.
    fn decode_at(bytes: &[u8], cursor: usize) -> Result<(Self, usize), DecodeError> {
        let mut bb = ReadBuffer::at(bytes, cursor);
        let message = Self::decode(&mut bb)?;
        Ok((message, bb.index()))
    }

    /// Decode from the start of `bytes`. Trailing bytes are left unread.
    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_at(bytes, 0).map(|(message, _)| message)
    }
}

/// Implemented by every generated enum type.
pub trait WireEnum: Copy {
    const NAME: &'static str;

    /// Fixed number of bytes used on the wire.
    const WIDTH: IntWidth;

    fn to_value(self) -> u64;

    /// `None` when `value` matches no declared member.
    fn from_value(value: u64) -> Option<Self>;
}

/// An enum field as seen on the wire: either a declared member or the raw
/// integer of a member this build does not know about.
///
/// Receivers built against an older schema keep decoding newer senders; the
/// unknown value is preserved and re-encoded unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValue<E> {
    Known(E),
    Unknown(u64),
}

impl<E: WireEnum> EnumValue<E> {
    /// Classify a raw wire value.
    pub fn from_raw(raw: u64) -> Self {
        match E::from_value(raw) {
            Some(member) => EnumValue::Known(member),
            None => EnumValue::Unknown(raw),
        }
    }

    /// The integer written on the wire.
    pub fn raw(self) -> u64 {
        match self {
            EnumValue::Known(member) => member.to_value(),
            EnumValue::Unknown(raw) => raw,
        }
    }

    pub fn known(self) -> Option<E> {
        match self {
            EnumValue::Known(member) => Some(member),
            EnumValue::Unknown(_) => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, EnumValue::Unknown(_))
    }

    /// Encode using the enum's fixed width. An unknown raw value wider than
    /// that width is rejected.
    pub fn encode(self, buf: &mut WriteBuffer) -> Result<(), EncodeError> {
        buf.write_enum(self)
    }

    pub fn decode(buf: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
        buf.read_enum()
    }
}

impl<E: WireEnum> From<E> for EnumValue<E> {
    fn from(member: E) -> Self {
        EnumValue::Known(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Reason {
        Kicked,
        Timeout,
    }

    impl WireEnum for Reason {
        const NAME: &'static str = "Reason";
        const WIDTH: IntWidth = IntWidth::W16;

        fn to_value(self) -> u64 {
            match self {
                Reason::Kicked => 0,
                Reason::Timeout => 300,
            }
        }

        fn from_value(value: u64) -> Option<Self> {
            match value {
                0 => Some(Reason::Kicked),
                300 => Some(Reason::Timeout),
                _ => None,
            }
        }
    }

    #[derive(Debug, PartialEq)]
    struct Heartbeat {
        client_clock: u64,
    }

    impl NetMessage for Heartbeat {
        const ID: u32 = 1;
        const NAME: &'static str = "Heartbeat";

        fn encode(&self, buf: &mut WriteBuffer) -> Result<(), EncodeError> {
            buf.write_u64(self.client_clock);
            Ok(())
        }

        fn decode(buf: &mut ReadBuffer<'_>) -> Result<Self, DecodeError> {
            let client_clock = buf.read_u64()?;
            Ok(Self { client_clock })
        }
    }

    #[test]
    fn enum_value_known_and_unknown() {
        let mut bb = WriteBuffer::new();
        EnumValue::from(Reason::Timeout).encode(&mut bb).unwrap();
        EnumValue::<Reason>::Unknown(7).encode(&mut bb).unwrap();
        assert_eq!(bb.as_slice(), [0x2C, 0x01, 7, 0]);

        let bytes = bb.data();
        let mut rb = ReadBuffer::new(&bytes);
        assert_eq!(EnumValue::<Reason>::decode(&mut rb), Ok(EnumValue::Known(Reason::Timeout)));
        let unknown = EnumValue::<Reason>::decode(&mut rb).unwrap();
        assert!(unknown.is_unknown());
        assert_eq!(unknown.raw(), 7);
        assert_eq!(unknown.known(), None);
        assert_eq!(rb.index(), 4);
    }

    #[test]
    fn enum_unknown_wider_than_width_is_rejected() {
        let mut bb = WriteBuffer::new();
        assert_eq!(
            EnumValue::<Reason>::Unknown(70_000).encode(&mut bb),
            Err(EncodeError::OutOfRange { value: 70_000, ty: "u16" })
        );
    }

    #[test]
    fn message_helpers() {
        let bytes = Heartbeat { client_clock: 42 }.to_bytes().unwrap();
        assert_eq!(bytes, [42, 0, 0, 0, 0, 0, 0, 0]);

        let mut framed = vec![0xAA, 0xBB];
        framed.extend_from_slice(&bytes);
        let (message, cursor) = Heartbeat::decode_at(&framed, 2).unwrap();
        assert_eq!(message, Heartbeat { client_clock: 42 });
        assert_eq!(cursor, 10);

        assert!(matches!(
            Heartbeat::from_bytes(&bytes[..7]),
            Err(DecodeError::Truncated { needed: 8, remaining: 7, .. })
        ));
    }
}
