//! Key types for genogrove indexes.
//!
//! A grove indexes any value that implements [`KeyType`]: a total order, an overlap
//! predicate and an aggregate used for internal-node separators. This crate defines that
//! contract, the [`Key`] entry pairing a value with optional data, and four built-in key
//! types:
//!
//! | type | overlap | aggregate |
//! |---|---|---|
//! | [`Interval`] | closed ranges share a position | bounding range |
//! | [`Numeric`] | equal values | maximum |
//! | [`Kmer`] | identical sequences | maximum |
//! | [`GenomicCoordinate`] | ranges overlap and strands are compatible | bounding range, `*` strand when mixed |
//!
//! ```rust
//! use genogrove_core::{GenomicCoordinate, KeyType, Strand};
//!
//! let exon = GenomicCoordinate::new(Strand::Forward, 100, 200).unwrap();
//! let read = GenomicCoordinate::new(Strand::Any, 150, 300).unwrap();
//! assert!(GenomicCoordinate::overlap(&exon, &read));
//! ```

pub mod codec;
pub mod errors;
pub mod models;

// re-exports
pub use self::codec::BinaryCodec;
pub use self::errors::KeyTypeError;
pub use self::models::{GenomicCoordinate, Interval, Key, KeyType, Kmer, Numeric, Strand};
