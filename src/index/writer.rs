//! Assembles the final search data blob and writes it to disk.
//!
//! ```text
//! magic  | version | symbol | result |  type  | trie | result | type
//! header |         | count  |  map   |  map   |      |  map   | map
//!        |         |        | offset | offset |      |        |
//!  24b   |   8b    |  16b   |  32b   |  32b   |      |        |
//! ```

use crate::error::{Error, Result};
use crate::index::result_map::ResultMap;
use crate::index::trie::Trie;
use crate::index::type_map::TypeMap;
use crate::index::types::*;
use crate::utils::{base85_decode, base85_encode};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BASE85_PREAMBLE: &str =
    "/* Generated by https://mcss.mosra.cz/documentation/doxygen/. Do not edit. */\n";
const BASE85_LOAD_START: &str = "Search.load('";
const BASE85_LOAD_END: &str = "');\n";

/// Concatenate the header and the three serialized sections
pub fn serialize_search_data(
    trie: &Trie,
    result_map: &ResultMap,
    type_map: &TypeMap,
    symbol_count: usize,
    merge_subtrees: bool,
    merge_prefixes: bool,
) -> Result<Vec<u8>> {
    let symbol_count =
        u16::try_from(symbol_count).map_err(|_| Error::SymbolCountOverflow(symbol_count))?;

    let serialized_trie = trie.serialize(merge_subtrees)?;
    let serialized_map = result_map.serialize(merge_prefixes)?;
    let serialized_type_map = type_map.serialize()?;

    let result_map_offset = SearchDataHeader::SIZE + serialized_trie.len();
    let type_map_offset = result_map_offset + serialized_map.len();
    let header = SearchDataHeader::new(
        symbol_count,
        section_offset(result_map_offset)?,
        section_offset(type_map_offset)?,
    );

    let mut output = Vec::with_capacity(type_map_offset + serialized_type_map.len());
    output.extend_from_slice(&header.to_bytes());
    output.extend_from_slice(&serialized_trie);
    output.extend_from_slice(&serialized_map);
    output.extend_from_slice(&serialized_type_map);

    tracing::debug!(
        symbols = symbol_count,
        trie = serialized_trie.len(),
        result_map = serialized_map.len(),
        type_map = serialized_type_map.len(),
        total = output.len(),
        "serialized search data"
    );
    Ok(output)
}

fn section_offset(offset: usize) -> Result<u32> {
    u32::try_from(offset).map_err(|_| Error::Corrupt(format!("section offset {offset} exceeds 32 bits")))
}

/// Wrap search data in a one-line loader for inline embedding
pub fn base85_encode_search_data(data: &[u8]) -> String {
    format!(
        "{BASE85_PREAMBLE}{BASE85_LOAD_START}{}{BASE85_LOAD_END}",
        base85_encode(data)
    )
}

/// Extract the search data from [`base85_encode_search_data`] output.
///
/// The result keeps the zero padding added by the encoder.
pub fn base85_decode_search_data(text: &str) -> Result<Vec<u8>> {
    let start = text
        .find(BASE85_LOAD_START)
        .ok_or_else(|| Error::Base85("missing Search.load() call".to_string()))?
        + BASE85_LOAD_START.len();
    let len = text[start..]
        .find('\'')
        .ok_or_else(|| Error::Base85("unterminated Search.load() call".to_string()))?;
    base85_decode(&text[start..start + len])
}

/// True if the file contents look like the base85 loader instead of binary
pub fn is_base85_wrapper(data: &[u8]) -> bool {
    data.starts_with(BASE85_PREAMBLE.as_bytes()) || data.starts_with(BASE85_LOAD_START.as_bytes())
}

/// Writes finished search data to an output directory
pub struct SearchDataWriter;

impl SearchDataWriter {
    /// Write `data` as `searchdata-v1.bin`, or as the base85 `searchdata-v1.js`
    /// loader. Returns the path written.
    pub fn write(output_dir: &Path, data: &[u8], base85: bool) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = if base85 {
            output_dir.join(searchdata_filename_b85())
        } else {
            output_dir.join(searchdata_filename())
        };

        let mut file = BufWriter::with_capacity(65536, File::create(&path)?);
        if base85 {
            file.write_all(base85_encode_search_data(data).as_bytes())?;
        } else {
            file.write_all(data)?;
        }
        file.flush()?;

        tracing::info!(path = %path.display(), bytes = data.len(), "wrote search data");
        Ok(path)
    }
}
