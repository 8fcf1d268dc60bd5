use std::fmt::{self, Display};
use std::io::{self, Read, Write};
use std::str::FromStr;

use crate::codec::BinaryCodec;
use crate::errors::KeyTypeError;
use crate::models::KeyType;

/// A point key: a single signed value. Two numerics overlap only when they are equal.
///
/// Aggregating picks the maximum so internal nodes route towards the largest element of
/// each subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Numeric(pub i64);

impl Numeric {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl KeyType for Numeric {
    #[inline]
    fn overlap(a: &Self, b: &Self) -> bool {
        a.0 == b.0
    }

    fn aggregate(keys: &[Self]) -> Self {
        keys.iter().copied().max().unwrap_or(Self(i64::MIN))
    }
}

impl Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Numeric {
    type Err = KeyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| KeyTypeError::ParseError(format!("{s}: {e}")))
    }
}

impl BinaryCodec for Numeric {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.0.encode(writer)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self(i64::decode(reader)?))
    }
}
