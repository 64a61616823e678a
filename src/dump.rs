//! Persisted tree document, the `standard-v1` format
//!
//! The on-disk shape matches the reference ecosystem's tooling field
//! for field, so a dump written here loads in the JS library and vice
//! versa:
//!
//! ```json
//! {
//!   "format": "standard-v1",
//!   "leafEncoding": ["address"],
//!   "tree": ["0x…", "0x…", "0x…"],
//!   "values": [ { "value": ["0x1111…"], "treeIndex": 2 }, … ]
//! }
//! ```

use crate::model::{parse_signature, Hash, LeafValue};
use crate::tree::{LeafEntry, MerkleTree};
use crate::{Error, Result, FORMAT};
use serde::{Deserialize, Serialize};

/// Serialized form of a [`MerkleTree`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeDump {
    pub format: String,
    #[serde(rename = "leafEncoding")]
    pub leaf_encoding: Vec<String>,
    /// All 2n-1 node hashes, root first
    pub tree: Vec<Hash>,
    /// Leaf values in original input order
    pub values: Vec<DumpEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DumpEntry {
    pub value: LeafValue,
    #[serde(rename = "treeIndex")]
    pub tree_index: usize,
}

impl MerkleTree {
    /// Serialize the full tree so it can be reloaded without rehashing
    pub fn dump(&self) -> TreeDump {
        TreeDump {
            format: FORMAT.to_string(),
            leaf_encoding: self.signature.iter().map(|t| t.to_string()).collect(),
            tree: self.tree.clone(),
            values: self
                .entries
                .iter()
                .map(|e| DumpEntry {
                    value: e.value.clone(),
                    tree_index: e.tree_index,
                })
                .collect(),
        }
    }

    /// Reconstruct a tree from a dump
    ///
    /// Checks the document's shape (format tag, node count, leaf index
    /// range and uniqueness) without rehashing; use
    /// [`MerkleTree::validate`] for the full recheck.
    pub fn load(dump: TreeDump) -> Result<Self> {
        if dump.format != FORMAT {
            return Err(Error::FormatVersion { found: dump.format });
        }

        let n = dump.values.len();
        if n == 0 {
            return Err(Error::CorruptData("dump contains no leaf values".into()));
        }
        if dump.tree.len() != 2 * n - 1 {
            return Err(Error::CorruptData(format!(
                "expected {} node hashes for {} leaves, found {}",
                2 * n - 1,
                n,
                dump.tree.len()
            )));
        }

        let signature = parse_signature(&dump.leaf_encoding)?;

        let mut seen = vec![false; dump.tree.len()];
        for entry in &dump.values {
            if entry.tree_index < n - 1 || entry.tree_index >= dump.tree.len() {
                return Err(Error::CorruptData(format!(
                    "leaf tree index {} outside leaf range {}..{}",
                    entry.tree_index,
                    n - 1,
                    dump.tree.len()
                )));
            }
            if seen[entry.tree_index] {
                return Err(Error::CorruptData(format!(
                    "duplicate leaf tree index {}",
                    entry.tree_index
                )));
            }
            seen[entry.tree_index] = true;
        }

        Ok(MerkleTree {
            tree: dump.tree,
            entries: dump
                .values
                .into_iter()
                .map(|e| LeafEntry {
                    value: e.value,
                    tree_index: e.tree_index,
                })
                .collect(),
            signature,
        })
    }
}
