pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building or reading search data.
///
/// Build-side variants are fatal: a corrupted index is worse than no index,
/// so nothing is written once one of them is returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid symbol input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lookahead barrier at offset {offset} is outside of the {key_len}-byte key")]
    BarrierOutOfRange { offset: usize, key_len: usize },

    #[error("lookahead barriers must be strictly increasing, got {previous} followed by {next}")]
    BarriersUnordered { previous: usize, next: usize },

    #[error("trie node with {results} results and {children} children does not fit the node header")]
    NodeHeaderOverflow { results: usize, children: usize },

    #[error("trie child offset {0} does not fit into 23 bits")]
    ChildOffsetOverflow(usize),

    #[error("result index {0} does not fit into 16 bits")]
    ResultIndexOverflow(usize),

    #[error("trie references result {index} but the result map has only {len} entries")]
    UnknownResult { index: usize, len: usize },

    #[error("result map offset {0} does not fit into 24 bits")]
    ResultOffsetOverflow(usize),

    #[error("result map payload is {actual} bytes but the offset table promised {expected}")]
    PayloadSizeMismatch { expected: usize, actual: usize },

    #[error("alias entry {entry} references nonexistent entry {target}")]
    InvalidAlias { entry: usize, target: usize },

    #[error("entry {entry} has an alias target, so it must have the alias type and an empty URL")]
    AliasMismatch { entry: usize },

    #[error("entry {entry} has the alias type but no alias target")]
    MissingAlias { entry: usize },

    #[error("suffix length {0} does not fit into 8 bits")]
    SuffixLengthOverflow(usize),

    #[error("symbol count {0} does not fit into 16 bits")]
    SymbolCountOverflow(usize),

    #[error("type map has {0} entries but at most 15 fit")]
    TypeMapTooLarge(usize),

    #[error("type map name offset {0} does not fit into 8 bits")]
    TypeMapNameOverflow(usize),

    #[error("invalid entry type {0}")]
    InvalidEntryType(u8),

    #[error("search data truncated: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated { offset: usize, needed: usize, len: usize },

    #[error("bad search data magic {0:?}")]
    BadMagic([u8; 3]),

    #[error("unsupported search data version {found}, expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("corrupt search data: {0}")]
    Corrupt(String),

    #[error("invalid base85 data: {0}")]
    Base85(String),
}
