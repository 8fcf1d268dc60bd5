pub mod genomic_coordinate;
pub mod interval;
pub mod key;
pub mod key_type;
pub mod kmer;
pub mod numeric;

// re-export for cleaner imports
pub use self::genomic_coordinate::{GenomicCoordinate, Strand};
pub use self::interval::Interval;
pub use self::key::Key;
pub use self::key_type::KeyType;
pub use self::kmer::Kmer;
pub use self::numeric::Numeric;
