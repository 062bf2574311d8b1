use std::{fmt, ops, str};

use crate::Config;

/// Number of bits after the timestamp, version, and variant fields.
pub(crate) const TAIL_BITS: u32 = 74;

/// Largest value of the 48-bit timestamp field.
pub(crate) const MAX_TIMESTAMP: u64 = (1 << 48) - 1;
const MAX_TAIL: u128 = (1 << TAIL_BITS) - 1;

/// Represents a sequential COMB GUID.
///
/// The 128 bits are laid out as a 48-bit big-endian timestamp, the version nibble `4`, the
/// variant bits `10`, and a 74-bit tail holding the intra-tick counter followed by random bits.
/// Because the timestamp and the counter take the most significant positions, both the byte
/// representation and the 8-4-4-4-12 string sort in generation order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct CombGuid([u8; 16]);

/// The variant field of a UUID-shaped identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xxx` (NCS backward compatibility)
    Var0,
    /// `10xx` (RFC4122)
    Var10,
    /// `110x` (Microsoft backward compatibility)
    Var110,
    /// `111x` (reserved)
    VarReserved,
}

impl CombGuid {
    /// Nil identifier (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max identifier (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates an identifier from the raw field values.
    ///
    /// `tail_hi` carries the 12 tail bits following the version nibble and `tail_lo` the 62 tail
    /// bits following the variant bits.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields(timestamp: u64, tail_hi: u16, tail_lo: u64) -> Self {
        if timestamp > MAX_TIMESTAMP || tail_hi >= 1 << 12 || tail_lo >= 1 << 62 {
            panic!("invalid field value");
        }

        Self([
            (timestamp >> 40) as u8,
            (timestamp >> 32) as u8,
            (timestamp >> 24) as u8,
            (timestamp >> 16) as u8,
            (timestamp >> 8) as u8,
            timestamp as u8,
            0x40 | (tail_hi >> 8) as u8,
            tail_hi as u8,
            0x80 | (tail_lo >> 56) as u8,
            (tail_lo >> 48) as u8,
            (tail_lo >> 40) as u8,
            (tail_lo >> 32) as u8,
            (tail_lo >> 24) as u8,
            (tail_lo >> 16) as u8,
            (tail_lo >> 8) as u8,
            tail_lo as u8,
        ])
    }

    /// Packs a timestamp, a counter, and random bits into an identifier.
    ///
    /// Only the low 48 bits of `timestamp` are encoded. The counter occupies the top
    /// `counter_bits` of the tail and the remaining tail bits are taken from the low end of
    /// `random`.
    pub(crate) const fn from_parts(
        timestamp: u64,
        counter: u32,
        counter_bits: u32,
        random: u128,
    ) -> Self {
        let random_bits = TAIL_BITS - counter_bits;
        let random = random & ((1 << random_bits) - 1);
        let tail = (((counter as u128) << random_bits) | random) & MAX_TAIL;
        Self::from_fields(
            timestamp & MAX_TIMESTAMP,
            (tail >> 62) as u16,
            (tail as u64) & ((1 << 62) - 1),
        )
    }

    /// Returns the 48-bit timestamp field.
    pub const fn timestamp(&self) -> u64 {
        let b = &self.0;
        (b[0] as u64) << 40
            | (b[1] as u64) << 32
            | (b[2] as u64) << 24
            | (b[3] as u64) << 16
            | (b[4] as u64) << 8
            | b[5] as u64
    }

    /// Returns the 74-bit tail (counter and random bits) with version and variant removed.
    pub const fn tail(&self) -> u128 {
        let n = u128::from_be_bytes(self.0);
        let hi = (n >> 64) & 0xfff;
        let lo = n & ((1 << 62) - 1);
        (hi << 62) | lo
    }

    /// Returns the counter field as laid out by a generator using `config`.
    pub fn counter(&self, config: &Config) -> u32 {
        (self.tail() >> (TAIL_BITS - config.counter_bits() as u32)) as u32
    }

    /// Reports the variant field value of the identifier.
    pub const fn variant(&self) -> Variant {
        match self.0[8] >> 4 {
            0..=0b0111 => Variant::Var0,
            0b1000..=0b1011 => Variant::Var10,
            0b1100..=0b1101 => Variant::Var110,
            _ => Variant::VarReserved,
        }
    }

    /// Returns the version field value if the variant field is `10`.
    pub const fn version(&self) -> Option<u8> {
        match self.variant() {
            Variant::Var10 => Some(self.0[6] >> 4),
            _ => None,
        }
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// structure that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use combguid::CombGuid;
    ///
    /// let x = "0004b2a1-03ef-4000-8e5d-1c0ffee1d2a7".parse::<CombGuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "0004b2a1-03ef-4000-8e5d-1c0ffee1d2a7");
    /// assert_eq!(format!("{}", y), "0004b2a1-03ef-4000-8e5d-1c0ffee1d2a7");
    /// # Ok::<(), combguid::ParseError>(())
    /// ```
    pub fn encode(&self) -> impl ops::Deref<Target = str> + fmt::Display {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
            if i == 3 || i == 5 || i == 7 || i == 9 {
                buffer[pos] = b'-';
                pos += 1;
            }
        }
        debug_assert!(buffer.is_ascii());
        GuidStr(buffer)
    }
}

impl fmt::Display for CombGuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for CombGuid {
    type Err = ParseError;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const ERR: ParseError = ParseError {};
        let mut dst = [0u8; 16];
        let mut iter = src.chars();
        for (i, e) in dst.iter_mut().enumerate() {
            let hi = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            let lo = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            *e = (hi << 4) | lo;
            if (i == 3 || i == 5 || i == 7 || i == 9) && iter.next().ok_or(ERR)? != '-' {
                return Err(ERR);
            }
        }
        if iter.next().is_none() {
            Ok(Self(dst))
        } else {
            Err(ERR)
        }
    }
}

impl From<CombGuid> for [u8; 16] {
    fn from(src: CombGuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for CombGuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for CombGuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<CombGuid> for u128 {
    fn from(src: CombGuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for CombGuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<CombGuid> for String {
    fn from(src: CombGuid) -> Self {
        src.encode().to_string()
    }
}

impl TryFrom<String> for CombGuid {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

/// Concrete return type of [`CombGuid::encode()`].
struct GuidStr([u8; 36]);

impl ops::Deref for GuidStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        debug_assert!(self.0.is_ascii());
        // only ASCII hex digits and hyphens are ever written into the buffer
        unsafe { str::from_utf8_unchecked(&self.0) }
    }
}

impl fmt::Display for GuidStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

/// Error parsing an invalid string representation of an identifier.
#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("invalid string representation")]
pub struct ParseError {}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::CombGuid;

    impl From<CombGuid> for uuid::Uuid {
        fn from(src: CombGuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for CombGuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, CombGuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for CombGuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for CombGuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = CombGuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a COMB GUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 16]>::try_from(value)
                .map(Self::Value::from)
                .map_err(de::Error::custom)
        }
    }

}
