use thiserror::Error;

use crate::config::GroveConfigError;
use crate::key_storage::KeyId;

/// Errors raised by a grove and its index trees.
#[derive(Debug, Error)]
pub enum GroveError {
    /// The grove order is below the minimum of 2.
    #[error("Invalid grove order {0}: order must be at least 2")]
    InvalidOrder(usize),

    /// An index was initialised twice.
    #[error("Root node already exists for index: {0}")]
    RootExists(String),

    /// A child lookup outside the node's child list.
    #[error("Child index {index} out of range for node with {len} children")]
    ChildOutOfRange { index: usize, len: usize },

    /// A node handle that does not exist in its tree.
    #[error("Node {0} does not exist in this index tree")]
    MissingNode(usize),

    /// A node whose parent does not list it as a child.
    #[error("Node {0} is not registered as a child of its parent")]
    DetachedNode(usize),

    /// Sorted insertion received a key below the current maximum of the index.
    #[error(
        "Sorted insertion precondition violated for index '{index}': key {key} is less than the current maximum {max}. Use unsorted insert() instead."
    )]
    UnsortedInsert {
        index: String,
        key: String,
        max: String,
    },

    /// Bulk insertion received a key that does not follow its predecessor.
    #[error(
        "Bulk insert precondition violated for index '{index}': key {key} must be greater than {previous}. Use individual insert() for unsorted insertion."
    )]
    UnsortedBulk {
        index: String,
        key: String,
        previous: String,
    },

    /// A key handle issued by another grove, or never issued at all.
    #[error("Key {0} does not belong to this grove")]
    ForeignKey(KeyId),

    /// A structural invariant does not hold.
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    /// Persisted data could not be turned back into a grove.
    #[error("Corrupted grove data: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Config(#[from] GroveConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GroveError>;
