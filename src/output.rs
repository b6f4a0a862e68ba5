//! Human-readable dumps of serialized search data, for tests and debugging

use crate::error::Result;
use crate::index::reader::{ResultMapSection, SearchData, TrieSection, TypeMapSection};
use crate::index::types::{CssClass, EntryType};
use rustc_hash::FxHashSet;
use std::fmt;
use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// What to show in a dump
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyPrintOptions {
    /// Print `#` instead of a subtree that was already printed
    pub show_merged: bool,
    /// Print `$` after edges marked as lookahead barriers
    pub show_lookahead_barriers: bool,
    /// ANSI colors
    pub colors: bool,
}

/// Aggregate trie statistics, collected while printing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub node_count: usize,
    pub max_node_results: usize,
    pub max_node_children: usize,
    pub max_node_result_index: usize,
    pub max_node_child_offset: usize,
}

impl fmt::Display for TrieStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24}{}", "node count:", self.node_count)?;
        writeln!(f, "{:<24}{}", "max node results:", self.max_node_results)?;
        writeln!(f, "{:<24}{}", "max node children:", self.max_node_children)?;
        writeln!(f, "{:<24}{}", "max node result index:", self.max_node_result_index)?;
        write!(f, "{:<24}{}", "max node child offset:", self.max_node_child_offset)
    }
}

/// Colored text accumulated in memory
struct Painter {
    out: Buffer,
}

impl Painter {
    fn new(colors: bool) -> Self {
        Self {
            out: if colors { Buffer::ansi() } else { Buffer::no_color() },
        }
    }

    /// Write `text` in `color`, or uncolored if `None`
    fn paint(&mut self, color: Option<Color>, text: &str) -> io::Result<()> {
        match color {
            Some(color) => {
                // Everything but the structural blue is bold
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(color != Color::Blue))?;
            }
            None => self.out.reset()?,
        }
        self.out.write_all(text.as_bytes())
    }

    fn finish(mut self) -> io::Result<String> {
        if self.out.supports_color() && !self.out.as_slice().is_empty() {
            self.out.reset()?;
        }
        Ok(String::from_utf8_lossy(self.out.as_slice()).into_owned())
    }
}

struct TriePrinter<'a> {
    trie: TrieSection<'a>,
    options: PrettyPrintOptions,
    printed: FxHashSet<usize>,
    stats: TrieStats,
    out: Painter,
}

impl TriePrinter<'_> {
    fn node(&mut self, offset: usize, indent: &str) -> Result<()> {
        if self.options.show_merged && self.printed.contains(&offset) {
            self.out.paint(Some(Color::Red), "#")?;
            return Ok(());
        }

        let node = self.trie.node(offset)?;
        self.stats.node_count += 1;
        self.stats.max_node_results = self.stats.max_node_results.max(node.result_count());
        self.stats.max_node_children = self.stats.max_node_children.max(node.child_count());

        if node.result_count() > 0 {
            self.out.paint(Some(Color::Blue), " [")?;
            for (i, result) in node.results().enumerate() {
                if i > 0 {
                    self.out.paint(Some(Color::Blue), ", ")?;
                }
                self.stats.max_node_result_index =
                    self.stats.max_node_result_index.max(result as usize);
                self.out.paint(Some(Color::Cyan), &result.to_string())?;
            }
            self.out.paint(Some(Color::Blue), "]")?;
        }

        let child_indent = format!("{indent}{}", if node.child_count() > 1 { '|' } else { ' ' });
        for (i, child) in node.children().enumerate() {
            if node.result_count() > 0 || i > 0 {
                self.out.paint(None, "\n")?;
                self.out.paint(Some(Color::Blue), indent)?;
            }
            if child.byte.is_ascii() {
                self.out.paint(Some(Color::White), &char::from(child.byte).to_string())?;
            } else {
                self.out.paint(None, &format!("{:#x}", child.byte))?;
            }
            let barrier = self.options.show_lookahead_barriers && child.lookahead_barrier;
            if barrier {
                self.out.paint(Some(Color::Green), "$")?;
            }
            if !child.byte.is_ascii() || barrier {
                self.out.paint(None, "\n")?;
                self.out.paint(Some(Color::Blue), &format!("{indent} "))?;
            }

            self.stats.max_node_child_offset = self.stats.max_node_child_offset.max(child.offset);
            self.node(child.offset, &child_indent)?;
        }

        self.printed.insert(offset);
        Ok(())
    }
}

fn print_trie(trie: TrieSection<'_>, options: &PrettyPrintOptions) -> Result<(String, TrieStats)> {
    let mut printer = TriePrinter {
        trie,
        options: *options,
        printed: FxHashSet::default(),
        stats: TrieStats::default(),
        out: Painter::new(options.colors),
    };
    printer.node(trie.root_offset(), "")?;
    Ok((printer.out.finish()?, printer.stats))
}

fn type_name(type_id: u8) -> String {
    EntryType::from_type_id(type_id)
        .map(|t| t.name().to_string())
        .unwrap_or_else(|| type_id.to_string())
}

fn print_map(map: ResultMapSection<'_>, colors: bool) -> Result<String> {
    let mut out = Painter::new(colors);
    for (i, record) in map.records().enumerate() {
        let record = record?;
        if i > 0 {
            out.paint(None, "\n")?;
        }

        let mut extra = Vec::new();
        if let Some(alias) = record.alias {
            extra.push(format!("alias={alias}"));
        }
        if let Some((prefix, length)) = record.prefix {
            extra.push(format!("prefix={prefix}[:{length}]"));
        }
        if let Some(suffix_length) = record.suffix_length {
            extra.push(format!("suffix_length={suffix_length}"));
        }
        if record.flags.is_deprecated() {
            extra.push("deprecated".to_string());
        }
        if record.flags.is_deleted() {
            extra.push("deleted".to_string());
        }
        if !record.flags.is_alias() {
            extra.push(format!("type={}", type_name(record.flags.type_id())));
        }

        out.paint(Some(Color::Cyan), &i.to_string())?;
        out.paint(Some(Color::Blue), ": ")?;
        out.paint(Some(Color::White), &String::from_utf8_lossy(record.name))?;
        out.paint(Some(Color::Blue), " [")?;
        for (j, item) in extra.iter().enumerate() {
            if j > 0 {
                out.paint(Some(Color::Blue), ", ")?;
            }
            out.paint(Some(Color::Yellow), item)?;
        }
        out.paint(Some(Color::Blue), "] ->")?;
        if !record.url.is_empty() {
            out.paint(None, &format!(" {}", String::from_utf8_lossy(record.url)))?;
        }
    }
    Ok(out.finish()?)
}

fn print_type_map(type_map: TypeMapSection<'_>) -> String {
    type_map
        .entries()
        .enumerate()
        .map(|(i, (class, label))| {
            let class = CssClass::from_id(class)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| class.to_string());
            format!(
                "({}, {}, '{}')",
                type_name(i as u8 + 1),
                class,
                String::from_utf8_lossy(label)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Dump a serialized trie (root offset included) and collect statistics
pub fn pretty_print_trie(serialized: &[u8], options: &PrettyPrintOptions) -> Result<(String, TrieStats)> {
    print_trie(TrieSection::new(serialized)?, options)
}

/// Dump a serialized result map, one entry per line
pub fn pretty_print_map(serialized: &[u8], colors: bool) -> Result<String> {
    print_map(ResultMapSection::new(serialized)?, colors)
}

/// Dump a serialized type map, one `(TYPE, CLASS, 'label')` tuple per line
pub fn pretty_print_type_map(serialized: &[u8]) -> Result<String> {
    Ok(print_type_map(TypeMapSection::new(serialized)?))
}

/// Dump a complete search data blob: symbol count, trie, result map and
/// type map
pub fn pretty_print(data: &[u8], options: &PrettyPrintOptions) -> Result<(String, TrieStats)> {
    let parsed = SearchData::parse(data)?;
    let (trie, stats) = print_trie(parsed.trie, options)?;
    let map = print_map(parsed.result_map, options.colors)?;
    let type_map = print_type_map(parsed.type_map);
    Ok((
        format!("{} symbols\n{trie}\n{map}\n{type_map}", parsed.header.symbol_count),
        stats,
    ))
}
