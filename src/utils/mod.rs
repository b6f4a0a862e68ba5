//! Utility functions shared by the writer and the reader.
//!
//! ## Modules
//!
//! - [`encoding`] - Bit-packed header/offset fields, bounds-checked reads, base85
//!
//! ```
//! use docsearch::utils::{pack_node_header, unpack_node_header};
//!
//! // More than 127 results switch the header to the wide layout
//! let header = pack_node_header(200, 2).unwrap();
//! assert_eq!(unpack_node_header(header), (200, 2));
//! ```

pub mod encoding;

pub use encoding::*;
