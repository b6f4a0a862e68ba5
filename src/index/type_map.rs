//! Side table mapping entry type tags to a CSS class and a label.
//!
//! ```text
//!     type 1     |     type 2     |     |         |        | type 1 |
//! class |  name  | class |  name  | ... | padding |  end   |  name  | ...
//!   ID  | offset |   ID  | offset |     |         | offset |  data  |
//!   8b  |   8b   |   8b  |   8b   |     |    8b   |   8b   |        |
//! ```

use crate::error::{Error, Result};
use crate::index::types::{CssClass, EntryType};

/// Type tags are 4 bits and 0 is taken by aliases
pub const MAX_TYPE_MAP_ENTRIES: usize = 15;

/// Labels for type tags 1, 2, ... in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeMap {
    entries: Vec<(CssClass, String)>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per [`EntryType`], in tag order
    pub fn for_entry_types() -> Self {
        Self {
            entries: EntryType::ALL
                .iter()
                .map(|t| {
                    let (class, label) = t.css_class();
                    (class, label.to_string())
                })
                .collect(),
        }
    }

    /// Append the next type tag's class and label
    pub fn push(&mut self, class: CssClass, label: impl Into<String>) {
        self.entries.push((class, label.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.entries.len() > MAX_TYPE_MAP_ENTRIES {
            return Err(Error::TypeMapTooLarge(self.entries.len()));
        }

        let names_start = (self.entries.len() + 1) * 2;
        let mut table = Vec::with_capacity(names_start);
        let mut names = Vec::new();
        for (class, label) in &self.entries {
            table.push(*class as u8);
            table.push(name_offset(names_start + names.len())?);
            names.extend_from_slice(label.as_bytes());
        }
        table.push(0);
        table.push(name_offset(names_start + names.len())?);

        table.extend_from_slice(&names);
        Ok(table)
    }
}

fn name_offset(offset: usize) -> Result<u8> {
    u8::try_from(offset).map_err(|_| Error::TypeMapNameOverflow(offset))
}
