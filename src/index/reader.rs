//! Zero-copy views over serialized search data.
//!
//! Every read is bounds-checked, so arbitrary input produces an error
//! instead of a panic. Trie children must sit at lower offsets than their
//! parent, which also rules out cycles in corrupt data.

use crate::error::{Error, Result};
use crate::index::types::{ResultFlags, SearchDataHeader};
use crate::utils::{read_array, read_u16_le, read_u32_le, unpack_child, unpack_node_header, unpack_offset_flags};
use memchr::memchr;

/// A parsed search data blob split into its three sections
#[derive(Debug, Clone, Copy)]
pub struct SearchData<'a> {
    pub header: SearchDataHeader,
    pub trie: TrieSection<'a>,
    pub result_map: ResultMapSection<'a>,
    pub type_map: TypeMapSection<'a>,
}

impl<'a> SearchData<'a> {
    /// Validate the header and section bounds.
    ///
    /// Bytes after the type map (such as base85 padding) are ignored.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = SearchDataHeader::parse(data)?;
        let result_map_offset = header.result_map_offset as usize;
        let type_map_offset = header.type_map_offset as usize;

        if result_map_offset < SearchDataHeader::SIZE
            || type_map_offset < result_map_offset
            || type_map_offset > data.len()
        {
            return Err(Error::Corrupt(format!(
                "section offsets {result_map_offset} and {type_map_offset} out of order or past {} bytes",
                data.len()
            )));
        }

        Ok(Self {
            header,
            trie: TrieSection::new(&data[SearchDataHeader::SIZE..result_map_offset])?,
            result_map: ResultMapSection::new(&data[result_map_offset..type_map_offset])?,
            type_map: TypeMapSection::new(&data[type_map_offset..])?,
        })
    }
}

/// The serialized trie, root offset included
#[derive(Debug, Clone, Copy)]
pub struct TrieSection<'a> {
    data: &'a [u8],
    root: usize,
}

/// One decoded trie node
#[derive(Debug, Clone, Copy)]
pub struct TrieNode<'a> {
    pub offset: usize,
    results: &'a [u8],
    children: &'a [u8],
}

/// An edge from a node to one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge {
    pub offset: usize,
    pub lookahead_barrier: bool,
    pub byte: u8,
}

impl<'a> TrieSection<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let root = read_u32_le(data, 0)? as usize;
        if root < 4 || root >= data.len() {
            return Err(Error::Corrupt(format!(
                "trie root offset {root} outside of {} bytes",
                data.len()
            )));
        }
        Ok(Self { data, root })
    }

    pub fn root_offset(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode the node at `offset`, checking that it fits and that all its
    /// children come before it
    pub fn node(&self, offset: usize) -> Result<TrieNode<'a>> {
        if offset < 4 {
            return Err(Error::Corrupt(format!("trie node offset {offset} overlaps the root offset")));
        }
        let (result_count, child_count) = unpack_node_header(read_array::<2>(self.data, offset)?);
        let results_start = offset + 2;
        let children_start = results_start + result_count * 2;
        let end = children_start + child_count * 4;
        if end > self.data.len() {
            return Err(Error::Truncated {
                offset: results_start,
                needed: end - results_start,
                len: self.data.len(),
            });
        }

        let node = TrieNode {
            offset,
            results: &self.data[results_start..children_start],
            children: &self.data[children_start..end],
        };
        if let Some(child) = node.children().find(|child| child.offset >= offset) {
            return Err(Error::Corrupt(format!(
                "trie node at {offset} points forward to {}",
                child.offset
            )));
        }
        Ok(node)
    }
}

impl<'a> TrieNode<'a> {
    pub fn result_count(&self) -> usize {
        self.results.len() / 2
    }

    pub fn child_count(&self) -> usize {
        self.children.len() / 4
    }

    pub fn results(&self) -> impl Iterator<Item = u16> + 'a {
        self.results
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
    }

    pub fn children(&self) -> impl Iterator<Item = ChildEdge> + 'a {
        self.children.chunks_exact(4).map(|chunk| {
            let (offset, lookahead_barrier, byte) =
                unpack_child([chunk[0], chunk[1], chunk[2], chunk[3]]);
            ChildEdge {
                offset,
                lookahead_barrier,
                byte,
            }
        })
    }
}

/// The serialized result map
#[derive(Debug, Clone, Copy)]
pub struct ResultMapSection<'a> {
    data: &'a [u8],
    len: usize,
}

/// One result map record as stored, before resolving prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRecord<'a> {
    pub flags: ResultFlags,
    pub alias: Option<u16>,
    /// Referenced entry and the number of its URL bytes to prepend
    pub prefix: Option<(u16, u8)>,
    pub suffix_length: Option<u8>,
    pub name: &'a [u8],
    pub url: &'a [u8],
}

impl<'a> ResultMapSection<'a> {
    /// Validate the offset table: in bounds and never decreasing
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let (table_end, _) = unpack_offset_flags(read_array::<4>(data, 0)?);
        if table_end < 4 || table_end % 4 != 0 || table_end > data.len() {
            return Err(Error::Corrupt(format!(
                "result map offset table of {table_end} bytes doesn't fit {} bytes",
                data.len()
            )));
        }

        let len = table_end / 4 - 1;
        let mut previous = table_end;
        for i in 0..=len {
            let (offset, _) = unpack_offset_flags(read_array::<4>(data, i * 4)?);
            if offset < previous || offset > data.len() {
                return Err(Error::Corrupt(format!(
                    "result map offset {offset} of entry {i} out of order or past {} bytes",
                    data.len()
                )));
            }
            previous = offset;
        }

        Ok(Self { data, len })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn record(&self, index: usize) -> Result<MapRecord<'a>> {
        if index >= self.len {
            return Err(Error::UnknownResult {
                index,
                len: self.len,
            });
        }
        let (start, flags) = unpack_offset_flags(read_array::<4>(self.data, index * 4)?);
        let (end, _) = unpack_offset_flags(read_array::<4>(self.data, (index + 1) * 4)?);
        let flags = ResultFlags(flags);
        // Field reads must not run into the next record
        let data = &self.data[..end];

        let mut offset = start;
        let alias = if flags.is_alias() {
            offset += 2;
            Some(read_u16_le(data, offset - 2)?)
        } else {
            None
        };
        let prefix = if flags.has_prefix() {
            offset += 3;
            Some((read_u16_le(data, offset - 3)?, read_array::<1>(data, offset - 1)?[0]))
        } else {
            None
        };
        let suffix_length = if flags.has_suffix() {
            offset += 1;
            Some(read_array::<1>(data, offset - 1)?[0])
        } else {
            None
        };

        let rest = &data[offset..];
        let (name, url) = match memchr(0, rest) {
            Some(nul) => (&rest[..nul], &rest[nul + 1..]),
            None => (rest, &rest[rest.len()..]),
        };

        Ok(MapRecord {
            flags,
            alias,
            prefix,
            suffix_length,
            name,
            url,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Result<MapRecord<'a>>> + '_ {
        (0..self.len).map(|index| self.record(index))
    }
}

/// The serialized type map
#[derive(Debug, Clone, Copy)]
pub struct TypeMapSection<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> TypeMapSection<'a> {
    /// The entry count follows from where the first name starts, so trailing
    /// bytes after the last name are ignored
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let [_, names_start] = read_array::<2>(data, 0)?;
        let names_start = names_start as usize;
        if names_start < 2 || names_start % 2 != 0 || names_start > data.len() {
            return Err(Error::Corrupt(format!(
                "type map names start at {names_start} in {} bytes",
                data.len()
            )));
        }

        let len = names_start / 2 - 1;
        let mut previous = names_start;
        for i in 0..=len {
            let offset = data[i * 2 + 1] as usize;
            if offset < previous || offset > data.len() {
                return Err(Error::Corrupt(format!(
                    "type map name offset {offset} of entry {i} out of order or past {} bytes",
                    data.len()
                )));
            }
            previous = offset;
        }

        Ok(Self { data, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// CSS class id and label of type tag `index + 1`
    pub fn entry(&self, index: usize) -> Option<(u8, &'a [u8])> {
        if index >= self.len {
            return None;
        }
        let class = self.data[index * 2];
        let start = self.data[index * 2 + 1] as usize;
        let end = self.data[index * 2 + 3] as usize;
        Some((class, &self.data[start..end]))
    }

    pub fn entries(&self) -> impl Iterator<Item = (u8, &'a [u8])> + '_ {
        (0..self.len).filter_map(|index| self.entry(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::result_map::{ResultMap, SearchEntry};
    use crate::index::trie::Trie;
    use crate::index::type_map::TypeMap;
    use crate::index::types::{CssClass, EntryType};
    use crate::index::writer::serialize_search_data;

    fn sample() -> Vec<u8> {
        let mut trie = Trie::new();
        let mut map = ResultMap::new();
        let index = map
            .add(SearchEntry::new("Math", "namespaceMath.html").flags(EntryType::Namespace.into()))
            .unwrap();
        trie.insert(b"math", index, &[]).unwrap();
        let index = map
            .add(
                SearchEntry::new("Math::min(int)", "namespaceMath.html#a1")
                    .flags(ResultFlags::from(EntryType::Func).deprecated())
                    .suffix_length(5),
            )
            .unwrap();
        trie.insert(b"math::min(int)", index, &[4]).unwrap();
        let alias = map.add(SearchEntry::new("fmin", "").alias(index)).unwrap();
        trie.insert(b"fmin", alias, &[]).unwrap();

        let mut type_map = TypeMap::new();
        type_map.push(CssClass::Success, "page");
        type_map.push(CssClass::Primary, "namespace");

        serialize_search_data(&trie, &map, &type_map, 3, true, true).unwrap()
    }

    #[test]
    fn test_parse_sections() {
        let data = sample();
        let parsed = SearchData::parse(&data).unwrap();
        assert_eq!(parsed.header.symbol_count, 3);
        assert_eq!(parsed.result_map.len(), 3);
        assert_eq!(parsed.type_map.len(), 2);
        assert_eq!(parsed.type_map.entry(1), Some((1, &b"namespace"[..])));
        assert_eq!(parsed.type_map.entry(2), None);

        let root = parsed.trie.node(parsed.trie.root_offset()).unwrap();
        assert_eq!(root.result_count(), 0);
        let bytes: Vec<u8> = root.children().map(|c| c.byte).collect();
        assert_eq!(bytes, b"mf");
    }

    #[test]
    fn test_records() {
        let data = sample();
        let parsed = SearchData::parse(&data).unwrap();

        let math = parsed.result_map.record(0).unwrap();
        assert_eq!(math.name, b"Math");
        assert_eq!(math.url, b"namespaceMath.html");
        assert_eq!(math.prefix, None);

        let min = parsed.result_map.record(1).unwrap();
        assert_eq!(min.name, b"::min(int)");
        assert_eq!(min.url, b"#a1");
        assert_eq!(min.prefix, Some((0, 18)));
        assert_eq!(min.suffix_length, Some(5));
        assert!(min.flags.is_deprecated());

        let alias = parsed.result_map.record(2).unwrap();
        assert_eq!(alias.alias, Some(1));
        assert_eq!(alias.name, b"fmin");
        assert!(alias.url.is_empty());

        assert!(matches!(
            parsed.result_map.record(3),
            Err(Error::UnknownResult { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_barrier_edge() {
        let data = sample();
        let parsed = SearchData::parse(&data).unwrap();
        let mut node = parsed.trie.node(parsed.trie.root_offset()).unwrap();
        for _ in 0..4 {
            let child = node.children().next().unwrap();
            assert!(!child.lookahead_barrier);
            node = parsed.trie.node(child.offset).unwrap();
        }
        let child = node.children().next().unwrap();
        assert_eq!(child.byte, b':');
        assert!(child.lookahead_barrier);
    }

    #[test]
    fn test_trailing_padding_ignored() {
        let mut data = sample();
        data.extend_from_slice(&[0, 0, 0]);
        let parsed = SearchData::parse(&data).unwrap();
        assert_eq!(parsed.type_map.len(), 2);
        assert_eq!(parsed.type_map.entry(0), Some((2, &b"page"[..])));
    }

    #[test]
    fn test_rejects_bad_section_offsets() {
        let mut data = sample();
        data[10..14].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(SearchData::parse(&data), Err(Error::Corrupt(_))));

        let mut data = sample();
        data[6..10].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(SearchData::parse(&data), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_rejects_forward_child() {
        // Root at 4 with one child pointing at itself
        let data = [4, 0, 0, 0, 0, 1, 4, 0, 0, b'a'];
        let trie = TrieSection::new(&data).unwrap();
        assert!(matches!(trie.node(4), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_rejects_truncated_node() {
        // Header claims three results but only one follows
        let data = [4, 0, 0, 0, 3, 0, 1, 0];
        let trie = TrieSection::new(&data).unwrap();
        assert!(matches!(trie.node(4), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_rejects_unordered_map_offsets() {
        let data = [12, 0, 0, 0, 8, 0, 0, 0x40, 12, 0, 0, 0];
        assert!(matches!(ResultMapSection::new(&data), Err(Error::Corrupt(_))));
        let data = [8, 0, 0, 0x40, 20, 0, 0, 0];
        assert!(matches!(ResultMapSection::new(&data), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_record_fields_stay_inside_record() {
        // Alias entry with an empty record
        let data = [8, 0, 0, 0, 8, 0, 0, 0];
        let map = ResultMapSection::new(&data).unwrap();
        assert!(matches!(map.record(0), Err(Error::Truncated { .. })));
    }
}
