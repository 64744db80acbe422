use thiserror::Error;

/// Failure raised by an encode routine when a value cannot be represented by
/// its declared wire kind. Nothing is ever truncated or wrapped silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {value} is out of range for {ty}")]
    OutOfRange {
        value: i128,
        ty:    &'static str,
    },

    #[error("length {len} does not fit in the u32 length prefix")]
    LengthOverflow { len: usize },

    #[error("fixed array expects {expected} elements but {actual} were supplied")]
    LengthMismatch {
        expected: usize,
        actual:   usize,
    },
}

/// Failure raised by a decode routine. Decoding never reads past the end of
/// the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer truncated at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset:    usize,
        needed:    usize,
        remaining: usize,
    },

    #[error("length prefix at offset {offset} claims {claimed} bytes but only {remaining} remain")]
    LengthOverrun {
        offset:    usize,
        claimed:   usize,
        remaining: usize,
    },

    #[error("invalid bool byte {byte:#04x} at offset {offset}")]
    InvalidBool {
        offset: usize,
        byte:   u8,
    },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Failure raised when dispatching an inbound frame by message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no message is registered for identifier {0}")]
    UnknownId(u32),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
