use std::str;

use crate::{DecodeError, EncodeError, EnumValue, IntWidth, WireEnum};

/// A netmsg byte buffer meant for reading.
///
/// All integers and floats are fixed-width little-endian. Strings and
/// variable-length arrays carry a `u32` little-endian length prefix.
///
/// Example usage:
///
/// ```
/// let mut bb = netmsg_wire::ReadBuffer::new(&[42, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 104, 105]);
/// assert_eq!(bb.read_u64(), Ok(42));
/// assert_eq!(bb.read_string().as_deref(), Ok("hi"));
/// assert_eq!(bb.remaining(), 0);
/// ```
///
pub struct ReadBuffer<'a> {
    data:  &'a [u8],
    index: usize,
}

impl<'a> ReadBuffer<'a> {
    /// Create a new ReadBuffer that wraps the provided byte slice, positioned
    /// at its first byte.
    pub fn new(data: &'a [u8]) -> ReadBuffer<'a> {
        ReadBuffer { data, index: 0 }
    }

    /// Create a ReadBuffer positioned at `index`. A cursor past the end is
    /// allowed; the first read will then report truncation.
    pub fn at(data: &'a [u8], index: usize) -> ReadBuffer<'a> {
        ReadBuffer { data, index }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current cursor position. Every successful read advances
    /// it by exactly the number of bytes consumed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.index)
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DecodeError::Truncated {
                offset: self.index,
                needed: len,
                remaining,
            });
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Try to read a boolean. Only `0` and `1` are accepted.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.index;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBool { offset, byte }),
        }
    }

    /// Read an unsigned integer of the given width, widened to `u64`.
    pub fn read_uint(&mut self, width: IntWidth) -> Result<u64, DecodeError> {
        Ok(match width {
            IntWidth::W8 => u64::from(self.read_u8()?),
            IntWidth::W16 => u64::from(self.read_u16()?),
            IntWidth::W32 => u64::from(self.read_u32()?),
            IntWidth::W64 => self.read_u64()?,
        })
    }

    /// Read a signed integer of the given width, widened to `i64`.
    pub fn read_int(&mut self, width: IntWidth) -> Result<i64, DecodeError> {
        Ok(match width {
            IntWidth::W8 => i64::from(self.read_i8()?),
            IntWidth::W16 => i64::from(self.read_i16()?),
            IntWidth::W32 => i64::from(self.read_i32()?),
            IntWidth::W64 => self.read_i64()?,
        })
    }

    /// Read a `u32` length prefix.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        Ok(self.read_u32()? as usize)
    }

    /// Try to read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.index;
        let len = self.read_len()?;
        let remaining = self.remaining();
        if len > remaining {
            return Err(DecodeError::LengthOverrun {
                offset,
                claimed: len,
                remaining,
            });
        }
        let bytes = self.read_bytes(len)?;
        str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    /// Read an enum value. Values that match no declared member come back as
    /// [`EnumValue::Unknown`]; the cursor still advances by the enum width.
    pub fn read_enum<E: WireEnum>(&mut self) -> Result<EnumValue<E>, DecodeError> {
        self.read_uint(E::WIDTH).map(EnumValue::from_raw)
    }

    /// Read a count-prefixed sequence, calling `read` once per element.
    ///
    /// `min_element_size` is the smallest number of bytes a single element can
    /// occupy, counted as at least one. A count that cannot possibly fit in
    /// the remaining bytes is rejected before anything is allocated.
    pub fn read_vec<T, E, F>(&mut self, min_element_size: usize, mut read: F) -> Result<Vec<T>, E>
    where
        E: From<DecodeError>,
        F: FnMut(&mut Self) -> Result<T, E>,
    {
        let offset = self.index;
        let count = self.read_len()?;
        let remaining = self.remaining();
        let claimed = count.saturating_mul(min_element_size.max(1));
        if claimed > remaining {
            return Err(E::from(DecodeError::LengthOverrun {
                offset,
                claimed,
                remaining,
            }));
        }

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Read exactly `N` elements with no prefix.
    pub fn read_array<T, E, F, const N: usize>(&mut self, mut read: F) -> Result<[T; N], E>
    where
        E: From<DecodeError>,
        F: FnMut(&mut Self) -> Result<T, E>,
    {
        let offset = self.index;
        let mut items = Vec::new();
        for _ in 0..N {
            items.push(read(self)?);
        }
        items.try_into().map_err(|rest: Vec<T>| {
            E::from(DecodeError::Truncated {
                offset,
                needed: N,
                remaining: rest.len(),
            })
        })
    }
}

#[test]
fn read_bool() {
    let read = |bytes| ReadBuffer::new(bytes).read_bool();
    assert!(matches!(read(&[]), Err(DecodeError::Truncated { .. })));
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Err(DecodeError::InvalidBool { offset: 0, byte: 2 }));
}

#[test]
fn read_fixed_width_little_endian() {
    assert_eq!(ReadBuffer::new(&[0xFE]).read_u8(), Ok(254));
    assert_eq!(ReadBuffer::new(&[0x34, 0x12]).read_u16(), Ok(0x1234));
    assert_eq!(ReadBuffer::new(&[0x78, 0x56, 0x34, 0x12]).read_u32(), Ok(0x1234_5678));
    assert_eq!(
        ReadBuffer::new(&[1, 2, 3, 4, 5, 6, 7, 8]).read_u64(),
        Ok(0x0807_0605_0403_0201)
    );
    assert_eq!(ReadBuffer::new(&[0xFF]).read_i8(), Ok(-1));
    assert_eq!(ReadBuffer::new(&[0x00, 0x80]).read_i16(), Ok(i16::MIN));
    assert_eq!(ReadBuffer::new(&[0xFF, 0xFF, 0xFF, 0x7F]).read_i32(), Ok(i32::MAX));
    assert_eq!(ReadBuffer::new(&[0xFE; 8]).read_i64(), Ok(-0x0101_0101_0101_0102));
    assert_eq!(ReadBuffer::new(&[0, 0, 0, 0x3F]).read_f32(), Ok(0.5));
    assert_eq!(ReadBuffer::new(&[0, 0, 0, 0, 0, 0, 0xF0, 0xBF]).read_f64(), Ok(-1.0));
}

#[test]
fn read_truncated() {
    let mut bb = ReadBuffer::new(&[1, 2, 3]);
    assert_eq!(
        bb.read_u32(),
        Err(DecodeError::Truncated { offset: 0, needed: 4, remaining: 3 })
    );
    // A failed read leaves the cursor untouched.
    assert_eq!(bb.index(), 0);
    assert_eq!(bb.read_u16(), Ok(0x0201));
    assert_eq!(
        bb.read_u16(),
        Err(DecodeError::Truncated { offset: 2, needed: 2, remaining: 1 })
    );
}

#[test]
fn read_at_cursor_past_end() {
    let mut bb = ReadBuffer::at(&[1, 2], 5);
    assert_eq!(bb.remaining(), 0);
    assert!(matches!(bb.read_u8(), Err(DecodeError::Truncated { offset: 5, .. })));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ReadBuffer::new(bytes).read_bytes(len).map(|b| b.to_vec());
    assert_eq!(read(&[], 0), Ok(vec![]));
    assert!(read(&[], 1).is_err());
    assert_eq!(read(&[0], 1), Ok(vec![0]));

    let mut bb = ReadBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok([1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(2), Ok([4, 5].as_slice()));
    assert!(bb.read_bytes(1).is_err());
}

#[test]
fn read_string() {
    let read = |bytes| ReadBuffer::new(bytes).read_string();
    assert_eq!(read(&[0, 0, 0, 0]), Ok(String::new()));
    assert_eq!(read(&[3, 0, 0, 0, 97, 98, 99]), Ok("abc".to_owned()));
    assert_eq!(read(&[4, 0, 0, 0, 240, 159, 141, 149]), Ok("🍕".to_owned()));
    assert!(matches!(read(&[0, 0]), Err(DecodeError::Truncated { .. })));
    assert_eq!(
        read(&[5, 0, 0, 0, 97]),
        Err(DecodeError::LengthOverrun { offset: 0, claimed: 5, remaining: 1 })
    );
    assert_eq!(
        read(&[2, 0, 0, 0, 0xC3, 0x28]),
        Err(DecodeError::InvalidUtf8 { offset: 0 })
    );
}

#[test]
fn read_vec_rejects_impossible_counts() {
    let mut bb = ReadBuffer::new(&[3, 0, 0, 0, 1, 0, 2, 0]);
    assert_eq!(
        bb.read_vec(2, |bb| bb.read_u16()),
        Err(DecodeError::LengthOverrun { offset: 0, claimed: 6, remaining: 4 })
    );

    let mut bb = ReadBuffer::new(&[2, 0, 0, 0, 1, 0, 2, 0]);
    assert_eq!(bb.read_vec(2, |bb| bb.read_u16()), Ok(vec![1, 2]));
    assert_eq!(bb.remaining(), 0);
}

#[test]
fn read_vec_counts_zero_width_elements_as_one_byte() {
    let mut calls = 0;
    let mut bb = ReadBuffer::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
    let result = bb.read_vec(0, |_| {
        calls += 1;
        Ok::<_, DecodeError>(())
    });
    assert_eq!(
        result,
        Err(DecodeError::LengthOverrun { offset: 0, claimed: u32::MAX as usize, remaining: 0 })
    );
    assert_eq!(calls, 0);
}

#[test]
fn read_array() {
    let mut bb = ReadBuffer::new(&[1, 2, 3, 4]);
    let values: [u8; 3] = bb.read_array(|bb| bb.read_u8()).unwrap();
    assert_eq!(values, [1, 2, 3]);
    assert_eq!(bb.index(), 3);
    let more: Result<[u8; 2], _> = bb.read_array(|bb| bb.read_u8());
    assert!(matches!(more, Err(DecodeError::Truncated { .. })));
}

/// A netmsg byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = netmsg_wire::WriteBuffer::new();
/// bb.write_u16(0x0102);
/// bb.write_string("hi").unwrap();
/// assert_eq!(bb.data(), [2, 1, 2, 0, 0, 0, 104, 105]);
/// ```
///
#[derive(Debug, Default, Clone)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

impl WriteBuffer {
    /// Creates an empty WriteBuffer ready for writing.
    pub fn new() -> WriteBuffer {
        WriteBuffer { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops everything written after the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Runs `write` and, if it fails, removes whatever it had appended so the
    /// buffer is left as it was before the call.
    pub fn all_or_nothing<F>(&mut self, write: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        let start = self.data.len();
        let result = write(self);
        if result.is_err() {
            self.truncate(start);
        }
        result
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a boolean value as a single `0` or `1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(u8::from(value));
    }

    /// Write an unsigned integer using `width` bytes. Values that do not fit
    /// are rejected rather than truncated.
    pub fn write_uint(&mut self, width: IntWidth, value: u64) -> Result<(), EncodeError> {
        if value > width.unsigned_max() {
            return Err(EncodeError::OutOfRange {
                value: i128::from(value),
                ty:    width.unsigned_name(),
            });
        }
        match width {
            IntWidth::W8 => self.write_u8(value as u8),
            IntWidth::W16 => self.write_u16(value as u16),
            IntWidth::W32 => self.write_u32(value as u32),
            IntWidth::W64 => self.write_u64(value),
        }
        Ok(())
    }

    /// Write a signed integer using `width` bytes. Values that do not fit are
    /// rejected rather than truncated.
    pub fn write_int(&mut self, width: IntWidth, value: i64) -> Result<(), EncodeError> {
        if value < width.signed_min() || value > width.signed_max() {
            return Err(EncodeError::OutOfRange {
                value: i128::from(value),
                ty:    width.signed_name(),
            });
        }
        match width {
            IntWidth::W8 => self.write_i8(value as i8),
            IntWidth::W16 => self.write_i16(value as i16),
            IntWidth::W32 => self.write_i32(value as i32),
            IntWidth::W64 => self.write_i64(value),
        }
        Ok(())
    }

    /// Write a `u32` length prefix.
    pub fn write_len(&mut self, len: usize) -> Result<(), EncodeError> {
        let prefix = u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { len })?;
        self.write_u32(prefix);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_len(value.len())?;
        self.write_bytes(value.as_bytes());
        Ok(())
    }

    /// Write an enum value using the enum's declared width.
    pub fn write_enum<E: WireEnum>(&mut self, value: EnumValue<E>) -> Result<(), EncodeError> {
        self.write_uint(E::WIDTH, value.raw())
    }

    /// Write a count prefix followed by every element.
    pub fn write_vec<T, F>(&mut self, items: &[T], mut write: F) -> Result<(), EncodeError>
    where
        F: FnMut(&mut Self, &T) -> Result<(), EncodeError>,
    {
        self.write_len(items.len())?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    /// Write every element with no prefix; the length is part of the schema.
    pub fn write_array<T, F>(&mut self, items: &[T], mut write: F) -> Result<(), EncodeError>
    where
        F: FnMut(&mut Self, &T) -> Result<(), EncodeError>,
    {
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut WriteBuffer)) -> Vec<u8> {
    let mut bb = WriteBuffer::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_fixed_width_little_endian() {
    assert_eq!(write_once(|bb| bb.write_u8(254)), [0xFE]);
    assert_eq!(write_once(|bb| bb.write_u16(0x1234)), [0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_u32(0x1234_5678)), [0x78, 0x56, 0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_u64(42)), [42, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_i8(-1)), [0xFF]);
    assert_eq!(write_once(|bb| bb.write_i16(i16::MIN)), [0x00, 0x80]);
    assert_eq!(write_once(|bb| bb.write_i32(-2)), [0xFE, 0xFF, 0xFF, 0xFF]);
    assert_eq!(write_once(|bb| bb.write_i64(-1)), [0xFF; 8]);
    assert_eq!(write_once(|bb| bb.write_f32(0.5)), [0, 0, 0, 0x3F]);
    assert_eq!(write_once(|bb| bb.write_f64(-1.0)), [0, 0, 0, 0, 0, 0, 0xF0, 0xBF]);
}

#[test]
fn write_uint_rejects_out_of_range() {
    let mut bb = WriteBuffer::new();
    assert_eq!(bb.write_uint(IntWidth::W16, 65_535), Ok(()));
    assert_eq!(
        bb.write_uint(IntWidth::W8, 256),
        Err(EncodeError::OutOfRange { value: 256, ty: "u8" })
    );
    assert_eq!(
        bb.write_int(IntWidth::W8, -129),
        Err(EncodeError::OutOfRange { value: -129, ty: "i8" })
    );
    assert_eq!(bb.write_int(IntWidth::W8, -128), Ok(()));
    assert_eq!(bb.data(), [0xFF, 0xFF, 0x80]);
}

#[test]
fn write_string() {
    let write = |s: &str| {
        let mut bb = WriteBuffer::new();
        bb.write_string(s).unwrap();
        bb.data()
    };
    assert_eq!(write(""), [0, 0, 0, 0]);
    assert_eq!(write("abc"), [3, 0, 0, 0, 97, 98, 99]);
    assert_eq!(write("🍕"), [4, 0, 0, 0, 240, 159, 141, 149]);
}

#[test]
fn write_sequences() {
    let mut bb = WriteBuffer::new();
    bb.write_vec(&[1u16, 2], |bb, v| {
        bb.write_u16(*v);
        Ok(())
    })
    .unwrap();
    bb.write_array(&[7u8, 8], |bb, v| {
        bb.write_u8(*v);
        Ok(())
    })
    .unwrap();
    assert_eq!(bb.data(), [2, 0, 0, 0, 1, 0, 2, 0, 7, 8]);
}

#[test]
fn all_or_nothing_rolls_back_failed_writes() {
    let mut bb = WriteBuffer::new();
    bb.write_u8(9);
    let result = bb.all_or_nothing(|bb| {
        bb.write_u32(7);
        bb.write_uint(IntWidth::W8, 300)
    });
    assert_eq!(result, Err(EncodeError::OutOfRange { value: 300, ty: "u8" }));
    assert_eq!(bb.as_slice(), [9]);

    bb.all_or_nothing(|bb| bb.write_uint(IntWidth::W16, 300)).unwrap();
    assert_eq!(bb.data(), [9, 0x2C, 0x01]);
}
