pub mod builder;
pub mod reader;
pub mod result_map;
pub mod trie;
pub mod type_map;
pub mod types;
pub mod writer;

pub use builder::{Keyword, SearchDataBuilder, Symbol};
pub use reader::SearchData;
pub use result_map::{ResultMap, SearchEntry};
pub use trie::Trie;
pub use type_map::TypeMap;
pub use types::*;
pub use writer::{serialize_search_data, SearchDataWriter};
