//! The grove: a multi-index B+ tree for overlap queries, with a graph overlay.
//!
//! A [`Grove`] keeps one B+ tree per named index (typically a chromosome). Every key of
//! every index lives in a single append-only [`KeyStorage`] and is addressed by a
//! [`KeyId`] handle. The same handles are the vertices of the [`GraphOverlay`], so
//! relationships between keys (exon to exon, read to gene) can be layered on top of the
//! index without touching the trees.
//!
//! Any type implementing [`genogrove_core::KeyType`] can be indexed.
//!
//! ## Quick Start
//!
//! ```rust
//! use genogrove_core::Interval;
//! use genogrove_structure::{BulkSortedness, Grove};
//!
//! let grove: Grove<Interval, &str> = Grove::new(8).unwrap();
//!
//! // general insertion, in any order
//! let brca1 = grove.insert("chr17", Interval::new(1000, 2000).unwrap(), Some("BRCA1")).unwrap();
//!
//! // sorted input skips the descent from the root
//! grove.insert_sorted("chr17", Interval::new(3000, 4000).unwrap(), Some("TP53")).unwrap();
//!
//! // or load a whole batch at once
//! grove.insert_bulk(
//!     "chr7",
//!     vec![(Interval::new(5000, 6000).unwrap(), Some("EGFR"))],
//!     BulkSortedness::Auto,
//! ).unwrap();
//!
//! let hits = grove.intersect_index(&Interval::new(1500, 3500).unwrap(), "chr17").unwrap();
//! let genes: Vec<&str> = grove
//!     .resolve(&hits)
//!     .iter()
//!     .filter_map(|key| key.data().copied())
//!     .collect();
//! assert_eq!(genes, vec!["BRCA1", "TP53"]);
//!
//! // relationships between keys live in the graph overlay
//! let tp53 = hits.keys()[1];
//! grove.add_edge(brca1, tp53).unwrap();
//! assert_eq!(grove.get_neighbors(brca1), vec![tp53]);
//! ```
//!
//! ## Concurrency
//!
//! A grove is `Send + Sync`. Each index has its own read-write lock, so inserts and
//! queries on different indices run in parallel while queries on one index share it.

pub mod config;
pub mod errors;
pub mod graph_overlay;
pub mod grove;
pub mod key_storage;
pub mod node;
pub mod persist;
pub mod query_result;
pub mod tree;

// re-exports
pub use self::config::{BulkSortedness, GroveConfig, GroveConfigError};
pub use self::errors::{GroveError, Result};
pub use self::graph_overlay::{Edge, GraphOverlay};
pub use self::grove::Grove;
pub use self::key_storage::{KeyId, KeyStorage};
pub use self::node::{Node, NodeId, Slot};
pub use self::query_result::QueryResult;
pub use self::tree::IndexTree;
