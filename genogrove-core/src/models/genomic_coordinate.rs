use std::fmt::{self, Display};
use std::io::{self, Read, Write};
use std::str::FromStr;

use crate::codec::{BinaryCodec, invalid_data};
use crate::errors::{KeyTypeError, Result};
use crate::models::KeyType;

///
/// Strand of a genomic feature. Variants are declared in sort order: `* < . < + < -`.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    /// `*`, matches any strand
    Any,
    /// `.`, strand not known
    #[default]
    Unstranded,
    /// `+`
    Forward,
    /// `-`
    Reverse,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Any => '*',
            Strand::Unstranded => '.',
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }

    /// Whether features on `self` and `other` can overlap. `*` is a wildcard.
    pub fn compatible(&self, other: &Strand) -> bool {
        *self == Strand::Any || *other == Strand::Any || self == other
    }
}

impl TryFrom<char> for Strand {
    type Error = KeyTypeError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '*' => Ok(Strand::Any),
            '.' => Ok(Strand::Unstranded),
            '+' => Ok(Strand::Forward),
            '-' => Ok(Strand::Reverse),
            other => Err(KeyTypeError::InvalidStrand(other)),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

///
/// A strand-aware closed range. Coordinates overlap like [`Interval`](crate::models::Interval)s
/// and additionally need compatible strands.
///
/// Ordering is by `start`, then `end`, then strand.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenomicCoordinate {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl GenomicCoordinate {
    pub fn new(strand: Strand, start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(KeyTypeError::InvertedInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end, strand })
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    fn empty() -> Self {
        Self {
            start: u64::MAX,
            end: 0,
            strand: Strand::Unstranded,
        }
    }
}

impl KeyType for GenomicCoordinate {
    #[inline]
    fn overlap(a: &Self, b: &Self) -> bool {
        if a.start > b.end || b.start > a.end {
            return false;
        }
        a.strand.compatible(&b.strand)
    }

    fn aggregate(keys: &[Self]) -> Self {
        let Some(first) = keys.first() else {
            return Self::empty();
        };
        let mut result = *first;
        for key in &keys[1..] {
            result.start = result.start.min(key.start);
            result.end = result.end.max(key.end);
            if key.strand != result.strand {
                result.strand = Strand::Any;
            }
        }
        result
    }

    // range-only: a strand mismatch with the first separator says nothing about later keys
    #[inline]
    fn precedes(query: &Self, first: &Self) -> bool {
        query.end < first.start
    }

    #[inline]
    fn may_follow(first: &Self, query: &Self) -> bool {
        first.start <= query.end
    }
}

impl Display for GenomicCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.strand, self.start, self.end)
    }
}

impl FromStr for GenomicCoordinate {
    type Err = KeyTypeError;

    /// Parse the `strand:start-end` form produced by `to_string`.
    fn from_str(s: &str) -> Result<Self> {
        let parse_error = || KeyTypeError::ParseError(s.to_string());
        let (strand, range) = s.split_once(':').ok_or_else(parse_error)?;
        let mut chars = strand.chars();
        let strand = match (chars.next(), chars.next()) {
            (Some(c), None) => Strand::try_from(c)?,
            _ => return Err(parse_error()),
        };
        let (start, end) = range.split_once('-').ok_or_else(parse_error)?;
        let start = start.parse::<u64>().map_err(|_| parse_error())?;
        let end = end.parse::<u64>().map_err(|_| parse_error())?;
        GenomicCoordinate::new(strand, start, end)
    }
}

impl BinaryCodec for GenomicCoordinate {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        (self.strand.as_char() as u8).encode(writer)?;
        self.start.encode(writer)?;
        self.end.encode(writer)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let strand = Strand::try_from(char::from(u8::decode(reader)?)).map_err(invalid_data)?;
        let start = u64::decode(reader)?;
        let end = u64::decode(reader)?;
        Ok(Self { start, end, strand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn gc(strand: char, start: u64, end: u64) -> GenomicCoordinate {
        GenomicCoordinate::new(Strand::try_from(strand).unwrap(), start, end).unwrap()
    }

    #[rstest]
    fn test_strand_order() {
        assert!(Strand::Any < Strand::Unstranded);
        assert!(Strand::Unstranded < Strand::Forward);
        assert!(Strand::Forward < Strand::Reverse);
    }

    #[rstest]
    fn test_ordering_breaks_ties_on_strand() {
        assert!(gc('-', 1, 5) < gc('*', 2, 3));
        assert!(gc('*', 1, 5) < gc('+', 1, 5));
        assert!(gc('+', 1, 5) < gc('-', 1, 5));
        assert_ne!(gc('+', 1, 5), gc('-', 1, 5));
    }

    #[rstest]
    #[case(gc('+', 10, 20), gc('+', 15, 25), true)]
    #[case(gc('+', 10, 20), gc('-', 15, 25), false)]
    #[case(gc('*', 10, 20), gc('-', 15, 25), true)]
    #[case(gc('.', 10, 20), gc('.', 20, 25), true)]
    #[case(gc('.', 10, 20), gc('+', 15, 25), false)]
    #[case(gc('+', 10, 20), gc('+', 21, 25), false)]
    fn test_overlap(
        #[case] a: GenomicCoordinate,
        #[case] b: GenomicCoordinate,
        #[case] expected: bool,
    ) {
        assert_eq!(GenomicCoordinate::overlap(&a, &b), expected);
        assert_eq!(GenomicCoordinate::overlap(&b, &a), expected);
    }

    #[rstest]
    fn test_aggregate_strands() {
        let same = GenomicCoordinate::aggregate(&[gc('+', 10, 20), gc('+', 5, 8)]);
        assert_eq!(same, gc('+', 5, 20));

        let mixed = GenomicCoordinate::aggregate(&[gc('+', 10, 20), gc('-', 30, 40)]);
        assert_eq!(mixed, gc('*', 10, 40));

        let single = GenomicCoordinate::aggregate(&[gc('-', 1, 2)]);
        assert_eq!(single, gc('-', 1, 2));

        assert!(GenomicCoordinate::aggregate(&[]).is_empty());
    }

    #[rstest]
    fn test_string_round_trip() {
        let coordinate = gc('-', 100, 250);
        assert_eq!(coordinate.to_string(), "-:100-250");
        assert_eq!("-:100-250".parse::<GenomicCoordinate>().unwrap(), coordinate);
        assert!("x:1-2".parse::<GenomicCoordinate>().is_err());
        assert!("+:5-2".parse::<GenomicCoordinate>().is_err());
        assert!("+100-200".parse::<GenomicCoordinate>().is_err());
    }

    #[rstest]
    fn test_codec() {
        let coordinate = gc('*', 7, 9);
        let mut buf = Vec::new();
        coordinate.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 17);
        assert_eq!(
            GenomicCoordinate::decode(&mut Cursor::new(buf)).unwrap(),
            coordinate
        );
    }
}
