use std::fmt;
use std::str::FromStr;

/// Fixed integer widths understood by the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub const ALL: [IntWidth; 4] = [IntWidth::W8, IntWidth::W16, IntWidth::W32, IntWidth::W64];

    /// Number of bytes a value of this width occupies on the wire.
    pub const fn bytes(self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }

    pub const fn unsigned_max(self) -> u64 {
        match self {
            IntWidth::W8 => u8::MAX as u64,
            IntWidth::W16 => u16::MAX as u64,
            IntWidth::W32 => u32::MAX as u64,
            IntWidth::W64 => u64::MAX,
        }
    }

    pub const fn signed_min(self) -> i64 {
        match self {
            IntWidth::W8 => i8::MIN as i64,
            IntWidth::W16 => i16::MIN as i64,
            IntWidth::W32 => i32::MIN as i64,
            IntWidth::W64 => i64::MIN,
        }
    }

    pub const fn signed_max(self) -> i64 {
        match self {
            IntWidth::W8 => i8::MAX as i64,
            IntWidth::W16 => i16::MAX as i64,
            IntWidth::W32 => i32::MAX as i64,
            IntWidth::W64 => i64::MAX,
        }
    }

    /// The smallest width able to hold `value` as an unsigned integer.
    pub fn smallest_for(value: u64) -> IntWidth {
        Self::ALL
            .into_iter()
            .find(|w| value <= w.unsigned_max())
            .unwrap_or(IntWidth::W64)
    }

    /// Rust name of the unsigned integer type with this width.
    pub const fn unsigned_name(self) -> &'static str {
        match self {
            IntWidth::W8 => "u8",
            IntWidth::W16 => "u16",
            IntWidth::W32 => "u32",
            IntWidth::W64 => "u64",
        }
    }

    /// Rust name of the signed integer type with this width.
    pub const fn signed_name(self) -> &'static str {
        match self {
            IntWidth::W8 => "i8",
            IntWidth::W16 => "i16",
            IntWidth::W32 => "i32",
            IntWidth::W64 => "i64",
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unsigned_name())
    }
}

impl FromStr for IntWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(IntWidth::W8),
            "u16" => Ok(IntWidth::W16),
            "u32" => Ok(IntWidth::W32),
            "u64" => Ok(IntWidth::W64),
            other => Err(format!("unknown integer width \"{}\" (expected u8, u16, u32 or u64)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_width_for_max_value() {
        assert_eq!(IntWidth::smallest_for(0), IntWidth::W8);
        assert_eq!(IntWidth::smallest_for(255), IntWidth::W8);
        assert_eq!(IntWidth::smallest_for(256), IntWidth::W16);
        assert_eq!(IntWidth::smallest_for(65_536), IntWidth::W32);
        assert_eq!(IntWidth::smallest_for(u64::from(u32::MAX) + 1), IntWidth::W64);
    }

    #[test]
    fn parse_width_names() {
        assert_eq!("u16".parse::<IntWidth>(), Ok(IntWidth::W16));
        assert!("i16".parse::<IntWidth>().is_err());
        assert_eq!(IntWidth::W32.to_string(), "u32");
    }
}
