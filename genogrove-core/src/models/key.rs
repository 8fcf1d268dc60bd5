use std::fmt::{self, Display};
use std::io::{self, Read, Write};

use crate::codec::BinaryCodec;

///
/// An indexed entry: a key value plus optional associated data.
///
/// A key without data is a plain marker of the value (e.g. a region with no annotation).
///
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key<K, D = ()> {
    value: K,
    data: Option<D>,
}

impl<K, D> Key<K, D> {
    pub fn new(value: K, data: Option<D>) -> Self {
        Self { value, data }
    }

    pub fn with_data(value: K, data: D) -> Self {
        Self {
            value,
            data: Some(data),
        }
    }

    pub fn value_only(value: K) -> Self {
        Self { value, data: None }
    }

    pub fn value(&self) -> &K {
        &self.value
    }

    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn into_parts(self) -> (K, Option<D>) {
        (self.value, self.data)
    }
}

impl<K: Display, D> Display for Key<K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<K: BinaryCodec, D: BinaryCodec> BinaryCodec for Key<K, D> {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.value.encode(writer)?;
        self.data.encode(writer)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let value = K::decode(reader)?;
        let data = Option::<D>::decode(reader)?;
        Ok(Self { value, data })
    }
}
