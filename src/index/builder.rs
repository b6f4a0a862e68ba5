//! Turns documented symbols into result map entries and trie keys.

use crate::error::{Error, Result};
use crate::index::result_map::{ResultMap, SearchEntry};
use crate::index::trie::Trie;
use crate::index::type_map::TypeMap;
use crate::index::types::{BuildConfig, EntryType, ResultFlags, ResultIndex};
use crate::index::writer::serialize_search_data;
use serde::{Deserialize, Serialize};

/// An extra search term resolving to a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub search: String,
    /// Shown in the results instead of `search`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub suffix_length: u8,
}

/// A documented symbol, as produced by a documentation crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub entry_type: EntryType,
    /// Enclosing scopes, outermost first
    #[serde(default)]
    pub prefix: Vec<String>,
    pub name: String,
    pub url: String,
    /// Function parameters; `Some` marks the symbol as callable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    /// Rendered after the parameters, e.g. ` const`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

impl Symbol {
    pub fn new(entry_type: EntryType, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            entry_type,
            prefix: Vec::new(),
            name: name.into(),
            url: url.into(),
            params: None,
            suffix: None,
            deprecated: false,
            deleted: false,
            keywords: Vec::new(),
        }
    }

    pub fn prefix<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix = prefix.into_iter().map(Into::into).collect();
        self
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn keyword(mut self, search: impl Into<String>, title: Option<&str>, suffix_length: u8) -> Self {
        self.keywords.push(Keyword {
            search: search.into(),
            title: title.map(str::to_string),
            suffix_length,
        });
        self
    }

    fn flags(&self) -> ResultFlags {
        let mut flags = ResultFlags::from(self.entry_type);
        if self.deprecated {
            flags = flags.deprecated();
        }
        if self.deleted {
            flags = flags.deleted();
        }
        flags
    }
}

/// Accumulates symbols and produces the final search data.
///
/// Every symbol is findable by each suffix of its scope path: `Math::Vector::min`
/// is inserted as `math::vector::min`, `vector::min` and `min`.
#[derive(Debug, Clone)]
pub struct SearchDataBuilder {
    config: BuildConfig,
    trie: Trie,
    result_map: ResultMap,
    type_map: TypeMap,
    symbol_count: usize,
}

impl SearchDataBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            trie: Trie::new(),
            result_map: ResultMap::new(),
            type_map: TypeMap::for_entry_types(),
            symbol_count: 0,
        }
    }

    /// Replace the default one-entry-per-[`EntryType`] type map
    pub fn with_type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = type_map;
        self
    }

    /// Add a symbol and its keywords, returning the index of its main entry
    pub fn add_symbol(&mut self, symbol: &Symbol) -> Result<ResultIndex> {
        let joiner = symbol.entry_type.joiner();
        let flags = symbol.flags();

        let mut name_with_args = symbol.name.clone();
        let mut suffix_length = 0;
        if let Some(params) = &symbol.params {
            let params = truncate_params(params.join(", "), self.config.max_params_length);
            name_with_args.push('(');
            name_with_args.push_str(&params);
            name_with_args.push(')');
            suffix_length += params.len() + 2;
        }
        if let Some(suffix) = &symbol.suffix {
            name_with_args.push_str(suffix);
            suffix_length += suffix.len();
        }
        let suffix_length =
            u8::try_from(suffix_length).map_err(|_| Error::SuffixLengthOverflow(suffix_length))?;

        let full_name = symbol
            .prefix
            .iter()
            .map(String::as_str)
            .chain([name_with_args.as_str()])
            .collect::<Vec<_>>()
            .join(joiner);

        let index = self.result_map.add(
            SearchEntry::new(full_name.clone(), symbol.url.clone())
                .flags(flags)
                .suffix_length(suffix_length),
        )?;
        // Callables are also findable with `()` typed out, pointing at a
        // second entry whose suffix excludes the parentheses
        let index_args = match symbol.params {
            Some(_) => Some(self.result_map.add(
                SearchEntry::new(full_name.clone(), symbol.url.clone())
                    .flags(flags)
                    .suffix_length(suffix_length - 2),
            )?),
            None => None,
        };

        let parts: Vec<String> = symbol
            .prefix
            .iter()
            .chain([&symbol.name])
            .map(|part| part.to_lowercase())
            .collect();
        for start in 0..parts.len() {
            let mut key = String::new();
            let mut barriers = Vec::new();
            for part in &parts[start..] {
                if !key.is_empty() {
                    barriers.push(key.len());
                    key.push_str(joiner);
                }
                key.push_str(part);
            }
            if !self.config.add_lookahead_barriers {
                barriers.clear();
            }
            self.trie.insert(key.as_bytes(), index, &barriers)?;

            if let Some(index_args) = index_args {
                if self.config.add_lookahead_barriers {
                    barriers.push(key.len());
                }
                key.push_str("()");
                self.trie.insert(key.as_bytes(), index_args, &barriers)?;
            }
        }

        for keyword in &symbol.keywords {
            let title = keyword
                .title
                .as_deref()
                .filter(|title| !title.is_empty())
                .unwrap_or(&keyword.search);
            let alias = self.result_map.add(
                SearchEntry::new(title, "")
                    .flags(ResultFlags::alias())
                    .alias(index)
                    .suffix_length(keyword.suffix_length),
            )?;
            self.trie.insert(keyword.search.to_lowercase().as_bytes(), alias, &[])?;
        }

        self.symbol_count += 1 + symbol.keywords.len();
        tracing::trace!(name = %full_name, index, keywords = symbol.keywords.len(), "added symbol");
        Ok(index)
    }

    pub fn add_symbols<'s>(&mut self, symbols: impl IntoIterator<Item = &'s Symbol>) -> Result<()> {
        for symbol in symbols {
            self.add_symbol(symbol)?;
        }
        Ok(())
    }

    /// Symbols plus keyword aliases added so far
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn result_map(&self) -> &ResultMap {
        &self.result_map
    }

    /// Sort every trie node's results and serialize everything
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.trie.sort(&self.result_map)?;
        tracing::debug!(
            symbols = self.symbol_count,
            entries = self.result_map.len(),
            nodes = self.trie.node_count(),
            "sorted search trie"
        );
        serialize_search_data(
            &self.trie,
            &self.result_map,
            &self.type_map,
            self.symbol_count,
            self.config.merge_subtrees,
            self.config.merge_prefixes,
        )
    }
}

/// Cut parameter lists longer than `max_length + 1` characters to
/// `max_length` characters and an ellipsis
fn truncate_params(params: String, max_length: usize) -> String {
    if params.chars().count() <= max_length + 1 {
        return params;
    }
    let mut truncated: String = params.chars().take(max_length).collect();
    truncated.push('…');
    truncated
}
