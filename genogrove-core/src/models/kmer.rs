use std::fmt::{self, Display};
use std::io::{self, Read, Write};
use std::str::FromStr;

use crate::codec::{BinaryCodec, invalid_data};
use crate::errors::{KeyTypeError, Result};
use crate::models::KeyType;

/// Longest sequence that fits the 64 bit encoding.
pub const MAX_K: usize = 32;

/// A nucleotide sequence of up to [`MAX_K`] bases packed two bits per base
/// (`A = 0`, `C = 1`, `G = 2`, `T = 3`), first base in the most significant position.
///
/// K-mers order by length first and then by encoding, which for equal lengths is
/// lexicographic order of the sequence. Two k-mers overlap only when they are identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kmer {
    // field order drives the derived ordering
    k: u8,
    encoding: u64,
}

impl Kmer {
    ///
    /// Encode a sequence. Lower case bases are accepted.
    ///
    /// # Arguments
    /// - sequence: bases to encode, at most 32 of them
    ///
    pub fn new(sequence: &str) -> Result<Self> {
        if sequence.len() > MAX_K {
            return Err(KeyTypeError::KmerTooLong(sequence.len()));
        }
        let mut encoding = 0u64;
        for base in sequence.chars() {
            encoding = (encoding << 2) | u64::from(encode_base(base)?);
        }
        Ok(Self {
            k: sequence.len() as u8,
            encoding,
        })
    }

    ///
    /// Rebuild a k-mer from its packed form. Bits above `2 * k` are dropped.
    ///
    pub fn from_encoding(encoding: u64, k: u8) -> Result<Self> {
        if usize::from(k) > MAX_K {
            return Err(KeyTypeError::KmerTooLong(usize::from(k)));
        }
        let encoding = if usize::from(k) < MAX_K {
            encoding & ((1u64 << (2 * u32::from(k))) - 1)
        } else {
            encoding
        };
        Ok(Self { k, encoding })
    }

    pub fn encoding(&self) -> u64 {
        self.encoding
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    pub fn len(&self) -> usize {
        usize::from(self.k)
    }

    pub fn is_empty(&self) -> bool {
        self.k == 0
    }
}

fn encode_base(base: char) -> Result<u8> {
    match base.to_ascii_uppercase() {
        'A' => Ok(0),
        'C' => Ok(1),
        'G' => Ok(2),
        'T' => Ok(3),
        _ => Err(KeyTypeError::InvalidNucleotide(base)),
    }
}

fn decode_base(bits: u64) -> char {
    match bits & 0b11 {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        _ => 'T',
    }
}

impl KeyType for Kmer {
    #[inline]
    fn overlap(a: &Self, b: &Self) -> bool {
        a.k == b.k && a.encoding == b.encoding
    }

    /// The largest k-mer by `Ord`, so length first and encoding second. Taking the largest
    /// encoding alone would let a short k-mer summarise a subtree holding longer ones, and
    /// the separators would no longer follow the order the leaves are sorted in.
    fn aggregate(keys: &[Self]) -> Self {
        keys.iter().copied().max().unwrap_or_default()
    }
}

impl Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sequence: String = (0..u32::from(self.k))
            .rev()
            .map(|i| decode_base(self.encoding >> (2 * i)))
            .collect();
        write!(f, "{sequence}")
    }
}

impl FromStr for Kmer {
    type Err = KeyTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Kmer::new(s)
    }
}

impl BinaryCodec for Kmer {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.encoding.encode(writer)?;
        self.k.encode(writer)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let encoding = u64::decode(reader)?;
        let k = u8::decode(reader)?;
        Kmer::from_encoding(encoding, k).map_err(invalid_data)
    }
}
