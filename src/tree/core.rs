//! Hashing rules and flat-array tree arithmetic
//!
//! The tree is a flat array of `2n - 1` digests: node 0 is the root,
//! the children of node `i` sit at `2i + 1` and `2i + 2`, and the `n`
//! leaf hashes occupy the tail of the array. Because the array always
//! holds exactly `2n - 1` nodes, every internal node has two children
//! at every level; there is no odd-node promotion rule to diverge on.

use crate::encode::encode_tuple;
use crate::model::{Hash, LeafType, LeafValue};
use crate::Result;

/// Hash a leaf: double keccak256 of the canonical tuple encoding
///
/// The inner hash is hashed again so a leaf's preimage (a single
/// 32-byte digest) can never collide with an internal node's preimage
/// (two concatenated digests). This is the domain separation that makes
/// the tree second-preimage resistant.
pub fn standard_leaf_hash(signature: &[LeafType], value: &LeafValue) -> Result<Hash> {
    let encoded = encode_tuple(signature, value)?;
    Ok(Hash::keccak256(Hash::keccak256(&encoded).as_bytes()))
}

/// Hash an internal node: keccak256 of the two child digests in
/// ascending byte order
///
/// Sorting before concatenation makes the parent independent of child
/// order, which is what lets verifiers fold a proof without position
/// bits.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    };
    Hash::keccak256_many(&[lo.as_bytes(), hi.as_bytes()])
}

pub fn left_child(i: usize) -> usize {
    2 * i + 1
}

pub fn right_child(i: usize) -> usize {
    2 * i + 2
}

/// Parent of node `i`; caller guarantees `i > 0`
pub fn parent(i: usize) -> usize {
    (i - 1) / 2
}

/// Sibling of node `i`; caller guarantees `i > 0`
pub fn sibling(i: usize) -> usize {
    if i % 2 == 1 {
        i + 1
    } else {
        i - 1
    }
}

/// Fold sorted leaf hashes into the full `2n - 1` node array
///
/// Leaf `k` (ascending hash order) lands at index `2n - 2 - k`;
/// internal nodes are then computed bottom-up. Caller guarantees a
/// non-empty slice.
pub fn make_tree(leaves: &[Hash]) -> Vec<Hash> {
    let n = leaves.len();
    let mut tree = vec![Hash::ZERO; 2 * n - 1];
    for (k, leaf) in leaves.iter().enumerate() {
        tree[2 * n - 2 - k] = *leaf;
    }
    for i in (0..n - 1).rev() {
        tree[i] = hash_pair(&tree[left_child(i)], &tree[right_child(i)]);
    }
    tree
}

/// Fold a proof over a leaf hash, bottom to top, producing the root
/// the proof claims
pub fn process_proof(leaf: Hash, proof: &[Hash]) -> Hash {
    proof.iter().fold(leaf, |acc, sib| hash_pair(&acc, sib))
}
