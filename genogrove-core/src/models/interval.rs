use std::fmt::{self, Debug, Display};
use std::io::{self, Read, Write};

use num_traits::{NumCast, PrimInt, Unsigned};

use crate::codec::{BinaryCodec, invalid_data};
use crate::errors::{KeyTypeError, Result};
use crate::models::KeyType;

/// A closed range `[start, end]`. Both ends are inclusive, so ranges that only touch
/// still overlap.
///
/// Intervals order by `start`, then by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<I = u64>
where
    I: PrimInt + Unsigned + Send + Sync + Debug + Display,
{
    pub start: I,
    pub end: I,
}

impl<I> Interval<I>
where
    I: PrimInt + Unsigned + Send + Sync + Debug + Display,
{
    ///
    /// Create a new interval, rejecting `start > end`.
    ///
    pub fn new(start: I, end: I) -> Result<Self> {
        if start > end {
            return Err(KeyTypeError::InvertedInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The aggregate of nothing: an inverted range that overlaps no other interval.
    pub fn empty() -> Self {
        Self {
            start: I::max_value(),
            end: I::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of positions covered, counting both ends.
    pub fn width(&self) -> I {
        if self.is_empty() {
            I::zero()
        } else {
            self.end - self.start + I::one()
        }
    }
}

impl<I> KeyType for Interval<I>
where
    I: PrimInt + Unsigned + Send + Sync + Debug + Display,
{
    #[inline]
    fn overlap(a: &Self, b: &Self) -> bool {
        std::cmp::max(a.start, b.start) <= std::cmp::min(a.end, b.end)
    }

    fn aggregate(keys: &[Self]) -> Self {
        keys.iter().fold(Self::empty(), |acc, key| Self {
            start: std::cmp::min(acc.start, key.start),
            end: std::cmp::max(acc.end, key.end),
        })
    }

    #[inline]
    fn precedes(query: &Self, first: &Self) -> bool {
        query < first && !Self::overlap(first, query)
    }

    #[inline]
    fn may_follow(first: &Self, query: &Self) -> bool {
        first.start <= query.end
    }
}

impl<I> Display for Interval<I>
where
    I: PrimInt + Unsigned + Send + Sync + Debug + Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

impl<I> BinaryCodec for Interval<I>
where
    I: PrimInt + Unsigned + Send + Sync + Debug + Display,
{
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let start = self.start.to_u64().ok_or_else(|| invalid_data("interval start"))?;
        let end = self.end.to_u64().ok_or_else(|| invalid_data("interval end"))?;
        start.encode(writer)?;
        end.encode(writer)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let start = u64::decode(reader)?;
        let end = u64::decode(reader)?;
        let convert = |value: u64| {
            <I as NumCast>::from(value).ok_or_else(|| {
                invalid_data(format!(
                    "coordinate {value} does not fit in {}",
                    std::any::type_name::<I>()
                ))
            })
        };
        // persisted separators may hold the inverted empty interval, so no `new` here
        Ok(Self {
            start: convert(start)?,
            end: convert(end)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    #[rstest]
    #[case(iv(0, 50), iv(50, 100), true)]
    #[case(iv(0, 50), iv(51, 60), false)]
    #[case(iv(10, 30), iv(25, 35), true)]
    #[case(iv(20, 40), iv(25, 35), true)]
    #[case(iv(50, 60), iv(25, 35), false)]
    #[case(iv(5, 5), iv(5, 5), true)]
    fn test_overlap(#[case] a: Interval, #[case] b: Interval, #[case] expected: bool) {
        assert_eq!(Interval::overlap(&a, &b), expected);
        assert_eq!(Interval::overlap(&b, &a), expected);
    }

    #[rstest]
    fn test_ordering_by_start_then_end() {
        assert!(iv(1, 10) < iv(2, 3));
        assert!(iv(1, 3) < iv(1, 10));
        assert_eq!(iv(4, 8), iv(4, 8));
    }

    #[rstest]
    fn test_aggregate_is_bounding_range() {
        let agg = Interval::aggregate(&[iv(10, 30), iv(5, 12), iv(20, 90)]);
        assert_eq!(agg, iv(5, 90));
    }

    #[rstest]
    fn test_aggregate_of_aggregates_matches_direct_aggregate() {
        let left = Interval::aggregate(&[iv(10, 30), iv(5, 12)]);
        let direct = Interval::aggregate(&[iv(10, 30), iv(5, 12), iv(40, 41)]);
        assert_eq!(Interval::aggregate(&[left, iv(40, 41)]), direct);
    }

    #[rstest]
    fn test_empty_aggregate_overlaps_nothing() {
        let empty: Interval = Interval::aggregate(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.width(), 0);
        assert!(!Interval::overlap(&empty, &iv(0, u64::MAX)));
    }

    #[rstest]
    fn test_inverted_interval_is_rejected() {
        let err = Interval::new(10u32, 5).unwrap_err();
        assert_eq!(
            err,
            KeyTypeError::InvertedInterval {
                start: "10".to_string(),
                end: "5".to_string()
            }
        );
    }

    #[rstest]
    fn test_precedes_and_may_follow() {
        let query = iv(5, 6);
        assert!(Interval::precedes(&query, &iv(10, 20)));
        assert!(!Interval::precedes(&query, &iv(6, 20)));
        assert!(!Interval::precedes(&iv(30, 40), &iv(10, 20)));

        assert!(Interval::may_follow(&iv(6, 7), &query));
        assert!(!Interval::may_follow(&iv(7, 8), &query));
    }

    #[rstest]
    fn test_to_string() {
        assert_eq!(iv(100, 200).to_string(), "[100,200]");
    }

    #[rstest]
    fn test_codec_for_narrow_coordinates() {
        let interval = Interval::new(3u32, 4_000_000_000).unwrap();
        let mut buf = Vec::new();
        interval.encode(&mut buf).unwrap();
        assert_eq!(Interval::<u32>::decode(&mut Cursor::new(buf)).unwrap(), interval);

        let mut wide = Vec::new();
        iv(0, u64::MAX).encode(&mut wide).unwrap();
        assert!(Interval::<u32>::decode(&mut Cursor::new(wide)).is_err());
    }
}
