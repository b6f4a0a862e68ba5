//! Byte-level prefix trie mapping search keys to result indices.
//!
//! Serialized layout, children always before their parent:
//!
//! ```text
//!  root  |     |       header         | results | child 1 | child 1 | child 1 |
//! offset | ... | | result # | child # |   ...   | offset  | barrier |  byte   | ...
//!  32b   |     |0|    7b    |   8b    |  n*16b  |   23b   |    1b   |   8b    |
//! ```
//!
//! With more than 127 results the header switches to `|1| 11b | 4b |`, see
//! [`crate::utils::pack_node_header`].

use crate::error::{Error, Result};
use crate::index::result_map::ResultMap;
use crate::index::types::ResultIndex;
use crate::utils::{pack_child, pack_node_header};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Index of a node in the trie arena
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Copy)]
struct Edge {
    byte: u8,
    lookahead_barrier: bool,
    node: NodeId,
}

#[derive(Debug, Clone, Default)]
struct Node {
    results: Vec<ResultIndex>,
    /// Kept in insertion order, which is also the serialization order
    children: Vec<Edge>,
}

/// Prefix trie over raw key bytes.
///
/// Nodes live in a flat arena and refer to each other by index.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Insert `result` at `key`.
    ///
    /// Each offset in `lookahead_barriers` marks the edge leaving the node at
    /// that depth, so the client won't continue a match across it. Offsets
    /// must be strictly increasing and inside the key.
    pub fn insert(
        &mut self,
        key: &[u8],
        result: ResultIndex,
        lookahead_barriers: &[usize],
    ) -> Result<()> {
        for (i, &offset) in lookahead_barriers.iter().enumerate() {
            if offset >= key.len() {
                return Err(Error::BarrierOutOfRange {
                    offset,
                    key_len: key.len(),
                });
            }
            if i > 0 && lookahead_barriers[i - 1] >= offset {
                return Err(Error::BarriersUnordered {
                    previous: lookahead_barriers[i - 1],
                    next: offset,
                });
            }
        }

        let mut barriers = lookahead_barriers.iter().copied().peekable();
        let mut node = ROOT;
        for (depth, &byte) in key.iter().enumerate() {
            let barrier = barriers.next_if_eq(&depth).is_some();
            node = self.child_or_insert(node, byte, barrier);
        }
        self.nodes[node].results.push(result);
        Ok(())
    }

    fn child_or_insert(&mut self, node: NodeId, byte: u8, barrier: bool) -> NodeId {
        if let Some(edge) = self.nodes[node].children.iter_mut().find(|e| e.byte == byte) {
            // A barrier, once set, sticks
            edge.lookahead_barrier |= barrier;
            return edge.node;
        }

        let child = self.nodes.len();
        self.nodes.push(Node::default());
        self.nodes[node].children.push(Edge {
            byte,
            lookahead_barrier: barrier,
            node: child,
        });
        child
    }

    /// Nodes along `key`, one per byte, stopping where the path ends
    pub fn path<'a>(&'a self, key: &'a [u8]) -> impl Iterator<Item = NodeId> + 'a {
        key.iter().scan(ROOT, move |node, &byte| {
            let edge = self.nodes[*node].children.iter().find(|e| e.byte == byte)?;
            *node = edge.node;
            Some(edge.node)
        })
    }

    /// Results stored at a node
    pub fn results(&self, node: NodeId) -> &[ResultIndex] {
        &self.nodes[node].results
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Order each node's results for display.
    ///
    /// Key: status (usable, deleted, deprecated), type tag, suffix length,
    /// full name length. The sort is stable, so ties keep insertion order.
    pub fn sort(&mut self, result_map: &ResultMap) -> Result<()> {
        let keys: Vec<_> = (0..result_map.len())
            .filter_map(|index| result_map.sort_key(index))
            .collect();

        if let Some(&index) = self
            .nodes
            .iter()
            .flat_map(|node| &node.results)
            .find(|&&index| index >= keys.len())
        {
            return Err(Error::UnknownResult {
                index,
                len: keys.len(),
            });
        }

        self.nodes
            .par_iter_mut()
            .for_each(|node| node.results.sort_by_key(|&index| keys[index]));
        Ok(())
    }

    /// Serialize the trie.
    ///
    /// With `merge_subtrees`, a node whose bytes (child offsets included)
    /// match an already written node is not written again; its parent
    /// points at the existing copy instead.
    pub fn serialize(&self, merge_subtrees: bool) -> Result<Vec<u8>> {
        let mut output = vec![0u8; 4];
        let mut merged = FxHashMap::default();
        let table = if merge_subtrees { Some(&mut merged) } else { None };

        let root = self.serialize_node(ROOT, &mut output, table)?;
        output[..4].copy_from_slice(&(root as u32).to_le_bytes());

        tracing::debug!(
            nodes = self.nodes.len(),
            unique = if merge_subtrees { merged.len() } else { self.nodes.len() },
            bytes = output.len(),
            "serialized trie"
        );
        Ok(output)
    }

    /// Returns the absolute offset of the node's bytes in `output`
    fn serialize_node(
        &self,
        node: NodeId,
        output: &mut Vec<u8>,
        mut merged: Option<&mut FxHashMap<Vec<u8>, usize>>,
    ) -> Result<usize> {
        let node = &self.nodes[node];

        let mut child_offsets = Vec::with_capacity(node.children.len());
        for edge in &node.children {
            let offset = self.serialize_node(edge.node, output, merged.as_deref_mut())?;
            child_offsets.push((edge, offset));
        }

        let mut serialized =
            Vec::with_capacity(2 + node.results.len() * 2 + node.children.len() * 4);
        serialized.extend_from_slice(&pack_node_header(node.results.len(), node.children.len())?);
        for &result in &node.results {
            let result = u16::try_from(result).map_err(|_| Error::ResultIndexOverflow(result))?;
            serialized.extend_from_slice(&result.to_le_bytes());
        }
        for (edge, offset) in child_offsets {
            serialized.extend_from_slice(&pack_child(offset, edge.lookahead_barrier, edge.byte)?);
        }

        if let Some(table) = merged {
            if let Some(&offset) = table.get(&serialized) {
                return Ok(offset);
            }
            let offset = output.len();
            output.extend_from_slice(&serialized);
            table.insert(serialized, offset);
            return Ok(offset);
        }

        let offset = output.len();
        output.extend_from_slice(&serialized);
        Ok(offset)
    }
}
