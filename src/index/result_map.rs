//! Flat, index-addressed table of search results.
//!
//! ```text
//! item 1 flags | item 2 flags |     | item N flags | data | item 1 |
//!   + offset   |   + offset   | ... |   + offset   | size |  data  | ...
//!    8 + 24b   |    8 + 24b   |     |    8 + 24b   |  32b |        |
//! ```
//!
//! Each item is, with the optional fields present only when flagged:
//!
//! ```text
//! alias | prefix   | suffix | name | \0 | URL
//!  id   | id + len | length |      |    |
//!  16b  | 16b + 8b |   8b   |      | 8b |
//! ```

use crate::error::{Error, Result};
use crate::index::trie::Trie;
use crate::index::types::{ResultFlags, ResultIndex};
use crate::utils::pack_offset_flags;

/// One search result before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub name: String,
    /// Empty for aliases
    pub url: String,
    pub flags: ResultFlags,
    /// Target of an alias entry
    pub alias: Option<ResultIndex>,
    /// Bytes of rendered suffix (e.g. a parameter list) at the end of `name`
    pub suffix_length: u8,
}

impl SearchEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            flags: ResultFlags::default(),
            alias: None,
            suffix_length: 0,
        }
    }

    pub fn flags(mut self, flags: ResultFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn alias(mut self, target: ResultIndex) -> Self {
        self.alias = Some(target);
        self
    }

    pub fn suffix_length(mut self, suffix_length: u8) -> Self {
        self.suffix_length = suffix_length;
        self
    }
}

/// Sort key used when ordering the results of a trie node
pub type SortKey = (u8, u8, u8, usize);

/// Ordered list of search results, addressed by index
#[derive(Debug, Clone, Default)]
pub struct ResultMap {
    entries: Vec<SearchEntry>,
}

/// An entry as it is written out, possibly shortened by prefix merging
#[derive(Debug, Clone, Copy)]
struct Record<'a> {
    name: &'a [u8],
    url: &'a [u8],
    flags: ResultFlags,
    alias: Option<ResultIndex>,
    /// Referenced entry and the number of URL bytes taken from it
    prefix: Option<(u16, u8)>,
    suffix_length: u8,
}

impl<'a> Record<'a> {
    fn verbatim(entry: &'a SearchEntry) -> Self {
        Self {
            name: entry.name.as_bytes(),
            url: entry.url.as_bytes(),
            flags: entry.flags,
            alias: entry.alias,
            prefix: None,
            suffix_length: entry.suffix_length,
        }
    }

    fn has_url(&self) -> bool {
        !self.name.is_empty() && !self.url.is_empty()
    }

    fn payload_len(&self) -> usize {
        let mut len = self.name.len();
        if self.flags.is_alias() {
            len += 2;
        }
        if self.flags.has_prefix() {
            len += 3;
        }
        if self.flags.has_suffix() {
            len += 1;
        }
        if self.has_url() {
            len += 1 + self.url.len();
        }
        len
    }

    fn write(&self, index: ResultIndex, entry_count: usize, output: &mut Vec<u8>) -> Result<()> {
        if self.flags.is_alias() {
            let target = self.alias.ok_or(Error::MissingAlias { entry: index })?;
            if target >= entry_count {
                return Err(Error::InvalidAlias {
                    entry: index,
                    target,
                });
            }
            if !self.url.is_empty() {
                return Err(Error::AliasMismatch { entry: index });
            }
            let target = u16::try_from(target).map_err(|_| Error::ResultIndexOverflow(target))?;
            output.extend_from_slice(&target.to_le_bytes());
        }
        if let Some((prefix, url_length)) = self.prefix {
            output.extend_from_slice(&prefix.to_le_bytes());
            output.push(url_length);
        }
        if self.flags.has_suffix() {
            output.push(self.suffix_length);
        }
        output.extend_from_slice(self.name);
        if self.has_url() {
            output.push(0);
            output.extend_from_slice(self.url);
        }
        Ok(())
    }
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its index.
    ///
    /// An entry with an alias target must have the alias type and no URL.
    /// A nonzero suffix length sets HAS_SUFFIX.
    pub fn add(&mut self, mut entry: SearchEntry) -> Result<ResultIndex> {
        let index = self.entries.len();
        match entry.alias {
            Some(_) if !entry.flags.is_alias() || !entry.url.is_empty() => {
                return Err(Error::AliasMismatch { entry: index });
            }
            None if entry.flags.is_alias() => return Err(Error::MissingAlias { entry: index }),
            _ => {}
        }
        if entry.suffix_length > 0 {
            entry.flags = entry.flags.with(ResultFlags::HAS_SUFFIX);
        }

        self.entries.push(entry);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: ResultIndex) -> Option<&SearchEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Status rank, type tag, suffix length, then name length in characters
    pub fn sort_key(&self, index: ResultIndex) -> Option<SortKey> {
        let entry = self.entries.get(index)?;
        Some((
            entry.flags.status_rank(),
            entry.flags.type_id(),
            entry.suffix_length,
            entry.name.chars().count(),
        ))
    }

    /// Serialize the map, optionally storing entries relative to others
    /// whose full name is a prefix of theirs.
    pub fn serialize(&self, merge_prefixes: bool) -> Result<Vec<u8>> {
        let records = if merge_prefixes {
            self.merged_records()?
        } else {
            self.entries.iter().map(Record::verbatim).collect()
        };

        let mut offset = (records.len() + 1) * 4;
        let mut output = Vec::with_capacity(offset);
        for record in &records {
            output.extend_from_slice(&pack_offset_flags(offset, record.flags.0)?);
            offset += record.payload_len();
        }
        output.extend_from_slice(&pack_offset_flags(offset, 0)?);

        for (index, record) in records.iter().enumerate() {
            record.write(index, self.entries.len(), &mut output)?;
        }

        if output.len() != offset {
            return Err(Error::PayloadSizeMismatch {
                expected: offset,
                actual: output.len(),
            });
        }

        tracing::debug!(
            entries = records.len(),
            merged = records.iter().filter(|r| r.prefix.is_some()).count(),
            bytes = output.len(),
            "serialized result map"
        );
        Ok(output)
    }

    fn merged_records(&self) -> Result<Vec<Record<'_>>> {
        let mut names = Trie::new();
        for (index, entry) in self.entries.iter().enumerate() {
            names.insert(entry.name.as_bytes(), index, &[])?;
        }

        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.merge_prefix(&names, index, entry))
            .collect()
    }

    fn merge_prefix<'a>(
        &'a self,
        names: &Trie,
        index: ResultIndex,
        entry: &'a SearchEntry,
    ) -> Result<Record<'a>> {
        // Overloads that differ only in suffix length share the full name.
        // They may reference each other, but only towards a longer suffix,
        // otherwise the references could cycle.
        let longer_suffix = |other: &ResultIndex| {
            *other != index && self.entries[*other].suffix_length > entry.suffix_length
        };

        // Deepest node on the name's path that holds some other entry
        let mut longest = None;
        for (depth, node) in names.path(entry.name.as_bytes()).enumerate() {
            let results = names.results(node);
            if results.contains(&index) {
                if results.iter().any(longer_suffix) {
                    longest = Some((node, depth + 1, true));
                }
            } else if !results.is_empty() {
                longest = Some((node, depth + 1, false));
            }
        }
        let Some((node, name_length, is_self)) = longest else {
            return Ok(Record::verbatim(entry));
        };

        // Of the entries with that name, take the one sharing the most URL
        let mut best: Option<(ResultIndex, usize)> = None;
        for candidate in names.results(node) {
            if *candidate == index || (is_self && !longer_suffix(candidate)) {
                continue;
            }
            let shared = common_prefix_len(entry.url.as_bytes(), self.entries[*candidate].url.as_bytes())
                .min(u8::MAX as usize);
            if best.is_none_or(|(_, len)| len < shared) {
                best = Some((*candidate, shared));
            }
        }
        let Some((prefix, url_length)) = best else {
            return Ok(Record::verbatim(entry));
        };
        let prefix16 = u16::try_from(prefix).map_err(|_| Error::ResultIndexOverflow(prefix))?;

        Ok(Record {
            name: &entry.name.as_bytes()[name_length..],
            url: &entry.url.as_bytes()[url_length..],
            flags: entry.flags.with(ResultFlags::HAS_PREFIX),
            alias: entry.alias,
            prefix: Some((prefix16, url_length as u8)),
            suffix_length: entry.suffix_length,
        })
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::EntryType;
    use crate::output::pretty_print_map;
    use proptest::prelude::*;

    fn dump(serialized: &[u8]) -> String {
        pretty_print_map(serialized, false).unwrap()
    }

    fn typed(entry_type: EntryType) -> ResultFlags {
        ResultFlags::from(entry_type)
    }

    fn hex(text: &str) -> Vec<u8> {
        (0..text.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&text[i..i + 2], 16).unwrap())
            .collect()
    }

    fn math_map() -> ResultMap {
        let mut map = ResultMap::new();
        let func = typed(EntryType::Func);
        assert_eq!(
            map.add(SearchEntry::new("Math", "namespaceMath.html").flags(typed(EntryType::Namespace)))
                .unwrap(),
            0
        );
        assert_eq!(
            map.add(SearchEntry::new("Math::Vector", "classMath_1_1Vector.html").flags(typed(EntryType::Class)))
                .unwrap(),
            1
        );
        assert_eq!(
            map.add(SearchEntry::new("Math::Range", "classMath_1_1Range.html").flags(typed(EntryType::Class)))
                .unwrap(),
            2
        );
        assert_eq!(
            map.add(SearchEntry::new("Math::min()", "namespaceMath.html#abcdef2875").flags(func))
                .unwrap(),
            3
        );
        assert_eq!(
            map.add(
                SearchEntry::new("Math::max(int, int)", "namespaceMath.html#abcdef1234")
                    .suffix_length(8)
                    .flags(func.deprecated().deleted())
            )
            .unwrap(),
            4
        );
        assert_eq!(map.add(SearchEntry::new("Rectangle", "").alias(2)).unwrap(), 5);
        assert_eq!(
            map.add(SearchEntry::new("Rectangle::Rect()", "").suffix_length(2).alias(2))
                .unwrap(),
            6
        );
        map
    }

    #[test]
    fn test_empty() {
        let serialized = ResultMap::new().serialize(true).unwrap();
        assert_eq!(serialized, [4, 0, 0, 0]);
        assert_eq!(dump(&serialized), "");
    }

    #[test]
    fn test_single() {
        let mut map = ResultMap::new();
        let index = map
            .add(
                SearchEntry::new("Magnum", "namespaceMagnum.html")
                    .suffix_length(11)
                    .flags(typed(EntryType::Namespace)),
            )
            .unwrap();
        assert_eq!(index, 0);
        assert!(map.get(0).unwrap().flags.has_suffix());

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "0: Magnum [suffix_length=11, type=NAMESPACE] -> namespaceMagnum.html"
        );
        assert_eq!(serialized.len(), 36);
    }

    #[test]
    fn test_multiple() {
        let serialized = math_map().serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "\
0: Math [type=NAMESPACE] -> namespaceMath.html
1: ::Vector [prefix=0[:0], type=CLASS] -> classMath_1_1Vector.html
2: ::Range [prefix=0[:0], type=CLASS] -> classMath_1_1Range.html
3: ::min() [prefix=0[:18], type=FUNC] -> #abcdef2875
4: ::max(int, int) [prefix=0[:18], suffix_length=8, deprecated, deleted, type=FUNC] -> #abcdef1234
5: Rectangle [alias=2] ->
6: ::Rect() [alias=2, prefix=5[:0], suffix_length=2] ->"
        );
        assert_eq!(serialized.len(), 203);
        assert_eq!(
            serialized,
            hex("20000020370000485b0000487d0000a8930000afb2000000bd000009cb0000004d617468006e616d6573706163654d6174682e68746d6c0000003a3a566563746f7200636c6173734d6174685f315f31566563746f722e68746d6c0000003a3a52616e676500636c6173734d6174685f315f3152616e67652e68746d6c0000123a3a6d696e2829002361626364656632383735000012083a3a6d617828696e742c20696e7429002361626364656631323334020052656374616e676c650200050000023a3a526563742829")
        );
    }

    #[test]
    fn test_multiple_unmerged() {
        let serialized = math_map().serialize(false).unwrap();
        assert_eq!(serialized.len(), 249);
        assert!(dump(&serialized).starts_with("0: Math [type=NAMESPACE] -> namespaceMath.html\n1: Math::Vector [type=CLASS]"));
    }

    #[test]
    fn test_prefix_merge() {
        let mut map = ResultMap::new();
        map.add(SearchEntry::new("Math", "Math.html").flags(typed(EntryType::Namespace)))
            .unwrap();
        map.add(SearchEntry::new("Math::Vector", "Math/Vector.html").flags(typed(EntryType::Class)))
            .unwrap();
        map.add(SearchEntry::new("Math::Range", "Math/Range.html").flags(typed(EntryType::Class)))
            .unwrap();

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "\
0: Math [type=NAMESPACE] -> Math.html
1: ::Vector [prefix=0[:4], type=CLASS] -> /Vector.html
2: ::Range [prefix=0[:4], type=CLASS] -> /Range.html"
        );
    }

    #[test]
    fn test_prefix_picks_longest_shared_url() {
        let mut map = ResultMap::new();
        let class = typed(EntryType::Class);
        map.add(SearchEntry::new("Foo", "a/foo.html").flags(class)).unwrap();
        map.add(SearchEntry::new("Foo", "b/foo.html").flags(class)).unwrap();
        map.add(SearchEntry::new("Foo::Bar", "b/foo.html#bar").flags(class)).unwrap();
        map.add(SearchEntry::new("Foo::Baz", "c/baz.html").flags(class)).unwrap();

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "\
0: Foo [type=CLASS] -> a/foo.html
1: Foo [type=CLASS] -> b/foo.html
2: ::Bar [prefix=1[:10], type=CLASS] -> #bar
3: ::Baz [prefix=0[:0], type=CLASS] -> c/baz.html"
        );
    }

    #[test]
    fn test_overload_self_reference() {
        let mut map = ResultMap::new();
        let func = typed(EntryType::Func);
        map.add(SearchEntry::new("foo(int)", "x.html#a").suffix_length(5).flags(func))
            .unwrap();
        map.add(SearchEntry::new("foo(int)", "x.html#a").suffix_length(3).flags(func))
            .unwrap();

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "\
0: foo(int) [suffix_length=5, type=FUNC] -> x.html#a
1:  [prefix=0[:8], suffix_length=3, type=FUNC] ->"
        );
        assert_eq!(serialized.len(), 34);
    }

    #[test]
    fn test_equal_names_without_longer_suffix_stay_verbatim() {
        let mut map = ResultMap::new();
        let class = typed(EntryType::Class);
        map.add(SearchEntry::new("Foo", "foo.html").flags(class)).unwrap();
        map.add(SearchEntry::new("Foo", "foo.html").flags(class)).unwrap();

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "0: Foo [type=CLASS] -> foo.html\n1: Foo [type=CLASS] -> foo.html"
        );
    }

    #[test]
    fn test_overloads_never_reference_equal_suffix() {
        let mut map = ResultMap::new();
        let func = typed(EntryType::Func);
        map.add(SearchEntry::new("foo()", "x.html").suffix_length(4).flags(func)).unwrap();
        map.add(SearchEntry::new("foo()", "x.html").suffix_length(2).flags(func)).unwrap();
        map.add(SearchEntry::new("foo()", "x.html").suffix_length(2).flags(func)).unwrap();

        let serialized = map.serialize(true).unwrap();
        assert_eq!(
            dump(&serialized),
            "\
0: foo() [suffix_length=4, type=FUNC] -> x.html
1:  [prefix=0[:6], suffix_length=2, type=FUNC] ->
2:  [prefix=0[:6], suffix_length=2, type=FUNC] ->"
        );
    }

    #[test]
    fn test_alias_validation() {
        let mut map = ResultMap::new();
        assert!(matches!(
            map.add(SearchEntry::new("glFoo", "foo.html").alias(0)),
            Err(Error::AliasMismatch { entry: 0 })
        ));
        assert!(matches!(
            map.add(SearchEntry::new("glFoo", "").flags(typed(EntryType::Func)).alias(0)),
            Err(Error::AliasMismatch { entry: 0 })
        ));
        assert!(matches!(
            map.add(SearchEntry::new("glFoo", "")),
            Err(Error::MissingAlias { entry: 0 })
        ));
        assert!(map.is_empty());
    }

    #[test]
    fn test_alias_to_missing_entry() {
        let mut map = ResultMap::new();
        map.add(SearchEntry::new("glFoo", "").alias(7)).unwrap();
        assert!(matches!(
            map.serialize(true),
            Err(Error::InvalidAlias { entry: 0, target: 7 })
        ));
    }

    #[test]
    fn test_offset_overflow() {
        let mut map = ResultMap::new();
        let huge = "x".repeat(1 << 24);
        map.add(SearchEntry::new(huge, "a.html").flags(typed(EntryType::Page)))
            .unwrap();
        map.add(SearchEntry::new("y", "b.html").flags(typed(EntryType::Page)))
            .unwrap();
        assert!(matches!(map.serialize(false), Err(Error::ResultOffsetOverflow(_))));
    }

    #[test]
    fn test_sort_key() {
        let map = math_map();
        assert_eq!(map.sort_key(0), Some((0, 2, 0, 4)));
        assert_eq!(map.sort_key(4), Some((2, 10, 8, 19)));
        assert_eq!(map.sort_key(7), None);
    }

    fn entry_strategy() -> impl Strategy<Value = (String, String, u8, u8)> {
        (
            "(Foo|Bar|::|a|b|\\(\\)){0,6}",
            "(foo|bar|\\.html|#a){0,4}",
            1u8..=14,
            0u8..6,
        )
    }

    proptest! {
        #[test]
        fn offset_table_matches_payload(entries in prop::collection::vec(entry_strategy(), 0..40), merge in any::<bool>()) {
            let mut map = ResultMap::new();
            for (name, url, type_id, suffix_length) in &entries {
                let flags = ResultFlags::from_type_id(*type_id).unwrap();
                map.add(SearchEntry::new(name.clone(), url.clone()).flags(flags).suffix_length(*suffix_length)).unwrap();
            }

            let serialized = map.serialize(merge).unwrap();
            let table_end = (entries.len() + 1) * 4;
            let total = u32::from_le_bytes(serialized[table_end - 4..table_end].try_into().unwrap());
            prop_assert_eq!(total as usize, serialized.len());

            let dumped = dump(&serialized);
            prop_assert_eq!(dumped.lines().count(), entries.len());
        }
    }
}
