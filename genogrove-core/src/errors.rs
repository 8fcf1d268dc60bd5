use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyTypeError {
    #[error("Interval start {start} is greater than its end {end}")]
    InvertedInterval { start: String, end: String },

    #[error("K-mer length {0} exceeds maximum of 32")]
    KmerTooLong(usize),

    #[error("Invalid nucleotide in k-mer: {0} (only A, C, G, T allowed)")]
    InvalidNucleotide(char),

    #[error("Invalid strand character: {0} (expected one of '*', '.', '+', '-')")]
    InvalidStrand(char),

    #[error("Error parsing key: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, KeyTypeError>;
