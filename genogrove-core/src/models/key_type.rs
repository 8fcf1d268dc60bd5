use std::fmt::{Debug, Display};

/// The capabilities a value needs to be indexed in a grove.
///
/// Ordering comes from [`Ord`] and the string form from [`Display`]. On top of that a key
/// type describes when two keys *overlap* and how a collection of keys is *aggregated*
/// into a single separator for an internal tree node.
///
/// `aggregate` must behave like a join: aggregating a mix of already aggregated values and
/// raw keys has to give the same result as aggregating all of the raw keys directly. The
/// tree relies on this to keep separators exact while nodes are split and filled.
///
/// # Examples
///
/// ```
/// use genogrove_core::models::{Interval, KeyType};
///
/// let a = Interval::new(0u64, 50).unwrap();
/// let b = Interval::new(50u64, 100).unwrap();
///
/// assert!(Interval::overlap(&a, &b));
/// assert_eq!(Interval::aggregate(&[a, b]), Interval::new(0, 100).unwrap());
/// ```
pub trait KeyType: Ord + Clone + Debug + Display + Send + Sync {
    /// Whether `a` and `b` overlap. Must be symmetric.
    fn overlap(a: &Self, b: &Self) -> bool;

    /// Reduce `keys` to one value summarising all of them. An empty slice yields a value
    /// that overlaps nothing.
    fn aggregate(keys: &[Self]) -> Self;

    /// Whether `query` lies entirely before a subtree whose first separator is `first`,
    /// so nothing in it (or after it) can overlap `query`.
    ///
    /// Only range-like keys can answer this; point-like keys keep the default and never
    /// abort early.
    fn precedes(_query: &Self, _first: &Self) -> bool {
        false
    }

    /// Whether a leaf whose first key is `first` can still hold keys overlapping `query`
    /// when the leaf chain is walked in ascending order.
    fn may_follow(first: &Self, query: &Self) -> bool {
        Self::overlap(first, query)
    }
}
