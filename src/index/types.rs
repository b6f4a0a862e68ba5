use crate::error::{Error, Result};
use crate::utils::{read_array, read_u16_le, read_u32_le};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the binary layout; the client search script must match it.
pub const SEARCHDATA_FORMAT_VERSION: u8 = 1;

/// Magic bytes at the start of every search data blob
pub const SEARCHDATA_MAGIC: [u8; 3] = *b"MCS";

/// Index into the result map
pub type ResultIndex = usize;

/// File name of the client search script matching this format version
pub fn search_filename() -> String {
    format!("search-v{SEARCHDATA_FORMAT_VERSION}.js")
}

/// File name of the binary search data
pub fn searchdata_filename() -> String {
    format!("searchdata-v{SEARCHDATA_FORMAT_VERSION}.bin")
}

/// File name of the base85-wrapped search data
pub fn searchdata_filename_b85() -> String {
    format!("searchdata-v{SEARCHDATA_FORMAT_VERSION}.js")
}

/// Per-entry flags, stored in the high byte of the result map offset table.
///
/// The low nibble holds the status bits, the high nibble the entry type.
/// Type 0 is reserved for aliases, which take their type from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResultFlags(pub u8);

impl ResultFlags {
    pub const NONE: u8 = 0;
    pub const HAS_SUFFIX: u8 = 1 << 0;
    pub const DEPRECATED: u8 = 1 << 1;
    pub const DELETED: u8 = 1 << 2;
    pub const HAS_PREFIX: u8 = 1 << 3;
    pub const TYPE_MASK: u8 = 0xf << 4;
    pub const ALIAS: u8 = 0;

    /// Flags for an alias entry
    pub fn alias() -> Self {
        Self(Self::ALIAS)
    }

    /// Flags for a regular entry of the given type (1 to 15)
    pub fn from_type_id(type_id: u8) -> Result<Self> {
        if type_id == 0 || type_id > 0xf {
            return Err(Error::InvalidEntryType(type_id));
        }
        Ok(Self(type_id << 4))
    }

    pub fn type_id(&self) -> u8 {
        (self.0 & Self::TYPE_MASK) >> 4
    }

    pub fn is_alias(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::ALIAS
    }

    pub fn is_deprecated(&self) -> bool {
        self.0 & Self::DEPRECATED != 0
    }

    pub fn is_deleted(&self) -> bool {
        self.0 & Self::DELETED != 0
    }

    pub fn has_prefix(&self) -> bool {
        self.0 & Self::HAS_PREFIX != 0
    }

    pub fn has_suffix(&self) -> bool {
        self.0 & Self::HAS_SUFFIX != 0
    }

    pub fn deprecated(mut self) -> Self {
        self.0 |= Self::DEPRECATED;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.0 |= Self::DELETED;
        self
    }

    pub fn with(mut self, bits: u8) -> Self {
        self.0 |= bits;
        self
    }

    /// Usable entries first, then deleted, deprecated last
    pub fn status_rank(&self) -> u8 {
        if self.is_deprecated() {
            2
        } else if self.is_deleted() {
            1
        } else {
            0
        }
    }
}

impl From<EntryType> for ResultFlags {
    fn from(entry_type: EntryType) -> Self {
        Self((entry_type as u8) << 4)
    }
}

/// Kinds of documented symbols.
///
/// The discriminant is the type tag stored in [`ResultFlags`], so the order
/// here is also the order equally-named results appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EntryType {
    Page = 1,
    Namespace = 2,
    Group = 3,
    Class = 4,
    Struct = 5,
    Union = 6,
    Typedef = 7,
    Dir = 8,
    File = 9,
    Func = 10,
    Define = 11,
    Enum = 12,
    EnumValue = 13,
    Var = 14,
}

impl EntryType {
    pub const ALL: [EntryType; 14] = [
        EntryType::Page,
        EntryType::Namespace,
        EntryType::Group,
        EntryType::Class,
        EntryType::Struct,
        EntryType::Union,
        EntryType::Typedef,
        EntryType::Dir,
        EntryType::File,
        EntryType::Func,
        EntryType::Define,
        EntryType::Enum,
        EntryType::EnumValue,
        EntryType::Var,
    ];

    pub fn from_type_id(type_id: u8) -> Option<Self> {
        Self::ALL.get((type_id as usize).checked_sub(1)?).copied()
    }

    /// Upper-case name used in dumps
    pub fn name(&self) -> &'static str {
        match self {
            EntryType::Page => "PAGE",
            EntryType::Namespace => "NAMESPACE",
            EntryType::Group => "GROUP",
            EntryType::Class => "CLASS",
            EntryType::Struct => "STRUCT",
            EntryType::Union => "UNION",
            EntryType::Typedef => "TYPEDEF",
            EntryType::Dir => "DIR",
            EntryType::File => "FILE",
            EntryType::Func => "FUNC",
            EntryType::Define => "DEFINE",
            EntryType::Enum => "ENUM",
            EntryType::EnumValue => "ENUM_VALUE",
            EntryType::Var => "VAR",
        }
    }

    /// String placed between the prefix components of a full name
    pub fn joiner(&self) -> &'static str {
        match self {
            EntryType::Dir | EntryType::File => "/",
            EntryType::Page | EntryType::Group => " » ",
            _ => "::",
        }
    }

    /// CSS class and label the client shows next to results of this type
    pub fn css_class(&self) -> (CssClass, &'static str) {
        match self {
            EntryType::Page => (CssClass::Success, "page"),
            EntryType::Namespace => (CssClass::Primary, "namespace"),
            EntryType::Group => (CssClass::Success, "group"),
            EntryType::Class => (CssClass::Primary, "class"),
            EntryType::Struct => (CssClass::Primary, "struct"),
            EntryType::Union => (CssClass::Primary, "union"),
            EntryType::Typedef => (CssClass::Primary, "typedef"),
            EntryType::Dir => (CssClass::Warning, "dir"),
            EntryType::File => (CssClass::Warning, "file"),
            EntryType::Func => (CssClass::Info, "func"),
            EntryType::Define => (CssClass::Info, "define"),
            EntryType::Enum => (CssClass::Primary, "enum"),
            EntryType::EnumValue => (CssClass::Default, "enum val"),
            EntryType::Var => (CssClass::Default, "var"),
        }
    }
}

/// Color classes understood by the client stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CssClass {
    Default = 0,
    Primary = 1,
    Success = 2,
    Warning = 3,
    Danger = 4,
    Info = 5,
    Dim = 6,
}

impl CssClass {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(CssClass::Default),
            1 => Some(CssClass::Primary),
            2 => Some(CssClass::Success),
            3 => Some(CssClass::Warning),
            4 => Some(CssClass::Danger),
            5 => Some(CssClass::Info),
            6 => Some(CssClass::Dim),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CssClass::Default => "DEFAULT",
            CssClass::Primary => "PRIMARY",
            CssClass::Success => "SUCCESS",
            CssClass::Warning => "WARNING",
            CssClass::Danger => "DANGER",
            CssClass::Info => "INFO",
            CssClass::Dim => "DIM",
        }
    }
}

/// Header at the start of the search data blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDataHeader {
    /// Magic number (SEARCHDATA_MAGIC)
    pub magic: [u8; 3],
    /// Format version
    pub version: u8,
    /// Symbols plus their keyword aliases
    pub symbol_count: u16,
    /// Absolute offset of the result map section
    pub result_map_offset: u32,
    /// Absolute offset of the type map section
    pub type_map_offset: u32,
}

impl SearchDataHeader {
    /// Size of header in bytes
    pub const SIZE: usize = 3 + 1 + 2 + 4 + 4; // 14 bytes

    pub fn new(symbol_count: u16, result_map_offset: u32, type_map_offset: u32) -> Self {
        Self {
            magic: SEARCHDATA_MAGIC,
            version: SEARCHDATA_FORMAT_VERSION,
            symbol_count,
            result_map_offset,
            type_map_offset,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..3].copy_from_slice(&self.magic);
        out[3] = self.version;
        out[4..6].copy_from_slice(&self.symbol_count.to_le_bytes());
        out[6..10].copy_from_slice(&self.result_map_offset.to_le_bytes());
        out[10..14].copy_from_slice(&self.type_map_offset.to_le_bytes());
        out
    }

    /// Parse and validate a header from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        let magic = read_array::<3>(data, 0)?;
        if magic != SEARCHDATA_MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = read_array::<1>(data, 3)?[0];
        if version != SEARCHDATA_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: version,
                expected: SEARCHDATA_FORMAT_VERSION,
            });
        }

        Ok(Self {
            magic,
            version,
            symbol_count: read_u16_le(data, 4)?,
            result_map_offset: read_u32_le(data, 6)?,
            type_map_offset: read_u32_le(data, 10)?,
        })
    }
}

/// Configuration for building search data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Deduplicate byte-identical trie subtrees
    pub merge_subtrees: bool,
    /// Store result names and URLs relative to a shared prefix entry
    pub merge_prefixes: bool,
    /// Mark joiner edges so `mathvector` doesn't match `math::vector`
    pub add_lookahead_barriers: bool,
    /// Emit the base85 JavaScript wrapper instead of the raw binary
    pub base85: bool,
    /// Function parameter lists longer than this (in characters) get cut
    pub max_params_length: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            merge_subtrees: true,
            merge_prefixes: true,
            add_lookahead_barriers: true,
            base85: false,
            max_params_length: 48, // Fits most full function names in the result list
        }
    }
}

impl BuildConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
