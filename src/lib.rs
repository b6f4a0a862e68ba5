//! # docsearch - Compact search data for static documentation
//!
//! Builds the binary search index a documentation site ships to the browser:
//! a prefix trie over lowercased symbol names, a prefix-compressed table of
//! results, and a small table of type labels, behind a 14-byte header.
//!
//! ## Architecture
//!
//! - [`index`] - Trie, result map, type map, serialization and reading
//! - [`output`] - Human-readable dumps with trie statistics
//! - [`utils`] - Bit-packing helpers and base85
//! - [`error`] - The crate error type
//!
//! ## Quick Start
//!
//! ```
//! use docsearch::index::{BuildConfig, EntryType, SearchDataBuilder, Symbol};
//! use docsearch::output::{pretty_print, PrettyPrintOptions};
//!
//! let mut builder = SearchDataBuilder::new(BuildConfig::default());
//! builder.add_symbol(&Symbol::new(EntryType::Namespace, "Math", "namespaceMath.html")).unwrap();
//! builder
//!     .add_symbol(&Symbol::new(EntryType::Class, "Vector", "classMath_1_1Vector.html").prefix(["Math"]))
//!     .unwrap();
//! let data = builder.finish().unwrap();
//!
//! let (dump, _stats) = pretty_print(&data, &PrettyPrintOptions::default()).unwrap();
//! assert!(dump.starts_with("2 symbols\nmath [0]"));
//! ```
//!
//! ## Format
//!
//! Everything is little-endian. Two bit-packing tricks keep the blob small:
//! result map offsets share their top byte with the entry flags, and trie
//! nodes with many results steal bits from the child count.

pub mod error;
pub mod index;
pub mod output;
pub mod utils;

pub use error::{Error, Result};
