//! The Merkle tree: construction, proofs, verification

pub(crate) mod core;

use crate::model::{display_tuple, Hash, LeafType, LeafValue};
use crate::{Error, Result};
use std::fmt::Write as _;

/// One leaf record: the original value tuple and the tree index its
/// hash landed at after sorting
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LeafEntry {
    pub value: LeafValue,
    pub tree_index: usize,
}

/// An immutable Merkle tree over a fixed set of value tuples
///
/// Built once with [`MerkleTree::of`] or reloaded from a persisted
/// document with [`MerkleTree::load`]; both yield an equivalent handle.
/// The tree is never mutated after construction, so a shared reference
/// can serve proofs from any number of threads.
#[derive(Clone, Debug, PartialEq)]
pub struct MerkleTree {
    /// Flat array of 2n-1 node hashes, root at index 0
    pub(crate) tree: Vec<Hash>,
    /// Leaf records in original input order
    pub(crate) entries: Vec<LeafEntry>,
    pub(crate) signature: Vec<LeafType>,
}

impl MerkleTree {
    /// Build a tree from value tuples and their type signature
    ///
    /// Leaf hashes are sorted ascending before pairing, so the shape is
    /// a pure function of the value set; each value keeps its original
    /// input index for proof requests.
    pub fn of(values: Vec<LeafValue>, signature: Vec<LeafType>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut hashed: Vec<(usize, Hash)> = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            hashed.push((i, core::standard_leaf_hash(&signature, value)?));
        }
        hashed.sort_by(|a, b| a.1.as_bytes().cmp(b.1.as_bytes()));

        let n = values.len();
        let leaves: Vec<Hash> = hashed.iter().map(|(_, h)| *h).collect();
        let tree = core::make_tree(&leaves);

        let mut entries: Vec<LeafEntry> = values
            .into_iter()
            .map(|value| LeafEntry {
                value,
                tree_index: 0,
            })
            .collect();
        for (k, (original, _)) in hashed.iter().enumerate() {
            entries[*original].tree_index = 2 * n - 2 - k;
        }

        Ok(MerkleTree {
            tree,
            entries,
            signature,
        })
    }

    /// The root hash committing to the entire leaf set
    pub fn root(&self) -> Hash {
        self.tree[0]
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The type signature the tree was built with
    pub fn signature(&self) -> &[LeafType] {
        &self.signature
    }

    /// Iterate leaf values in original input order
    pub fn entries(&self) -> impl Iterator<Item = (usize, &LeafValue)> {
        self.entries.iter().enumerate().map(|(i, e)| (i, &e.value))
    }

    /// The standard leaf hash of a value under this tree's signature
    pub fn leaf_hash(&self, value: &LeafValue) -> Result<Hash> {
        core::standard_leaf_hash(&self.signature, value)
    }

    /// Sibling hashes from the leaf at `index` (original input order)
    /// up to, but excluding, the root
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        let entry = self.entries.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;

        let mut proof = Vec::new();
        let mut i = entry.tree_index;
        while i > 0 {
            proof.push(self.tree[core::sibling(i)]);
            i = core::parent(i);
        }
        Ok(proof)
    }

    /// Proof for a value tuple, located by canonical-encoding equality
    ///
    /// A tuple present more than once is reported as ambiguous; proofs
    /// for duplicates remain available by index.
    pub fn proof_for_value(&self, value: &LeafValue) -> Result<Vec<Hash>> {
        let index = self.index_of(value)?;
        self.proof(index)
    }

    /// Original input index of a value tuple
    pub fn index_of(&self, value: &LeafValue) -> Result<usize> {
        let needle = core::standard_leaf_hash(&self.signature, value)?;
        let mut found = None;
        for (i, entry) in self.entries.iter().enumerate() {
            if self.tree[entry.tree_index] == needle {
                if found.is_some() {
                    return Err(Error::AmbiguousValue(display_tuple(value)));
                }
                found = Some(i);
            }
        }
        found.ok_or_else(|| Error::NotFound(display_tuple(value)))
    }

    /// Verify a proof for a claimed value against this tree's root
    pub fn verify(&self, value: &LeafValue, proof: &[Hash]) -> Result<bool> {
        verify_proof(self.root(), &self.signature, value, proof)
    }

    /// Recompute every node and fail if any hash disagrees
    ///
    /// [`MerkleTree::load`] only checks the document's shape; this is
    /// the full recheck for callers that do not trust the dump's
    /// producer.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            let expected = core::standard_leaf_hash(&self.signature, &entry.value)?;
            if self.tree[entry.tree_index] != expected {
                return Err(Error::CorruptData(format!(
                    "leaf {} hash does not match its value",
                    i
                )));
            }
        }
        let internal = self.entries.len() - 1;
        for i in 0..internal {
            let expected =
                core::hash_pair(&self.tree[core::left_child(i)], &self.tree[core::right_child(i)]);
            if self.tree[i] != expected {
                return Err(Error::CorruptData(format!(
                    "node {} does not hash to its children",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Render the tree as indented text, leaves annotated with their
    /// value tuple
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(0, 0, &mut out);
        out
    }

    fn render_node(&self, i: usize, depth: usize, out: &mut String) {
        let value = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.tree_index == i)
            .map(|(idx, e)| format!("  leaf {} {}", idx, display_tuple(&e.value)))
            .unwrap_or_default();
        let _ = writeln!(out, "{}{}) {}{}", "  ".repeat(depth), i, self.tree[i], value);
        if core::left_child(i) < self.tree.len() {
            self.render_node(core::left_child(i), depth + 1, out);
            self.render_node(core::right_child(i), depth + 1, out);
        }
    }
}

/// Verify a membership proof without a tree handle
///
/// This is the externally reproducible contract: hash the claimed value
/// with the leaf rule, fold the sibling hashes with the sorted-pair
/// rule, compare to the expected root. Any on-chain or third-party
/// verifier computing the same fold accepts the same proofs.
pub fn verify_proof(
    root: Hash,
    signature: &[LeafType],
    value: &LeafValue,
    proof: &[Hash],
) -> Result<bool> {
    let leaf = core::standard_leaf_hash(signature, value)?;
    Ok(core::process_proof(leaf, proof) == root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_signature;
    use serde_json::json;

    const A1: &str = "0x1111111111111111111111111111111111111111";
    const A2: &str = "0x2222222222222222222222222222222222222222";
    const A3: &str = "0x3333333333333333333333333333333333333333";

    fn address_tree(addresses: &[&str]) -> MerkleTree {
        let values = addresses.iter().map(|a| vec![json!(a)]).collect();
        MerkleTree::of(values, parse_signature(&["address"]).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = MerkleTree::of(vec![], parse_signature(&["address"]).unwrap()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = address_tree(&[A1]);
        assert_eq!(tree.len(), 1);
        // Degenerate rule: the root is the leaf hash itself
        assert_eq!(tree.root(), tree.leaf_hash(&vec![json!(A1)]).unwrap());
        let proof = tree.proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(tree.verify(&vec![json!(A1)], &proof).unwrap());
    }

    #[test]
    fn test_two_leaf_tree_structure() {
        let tree = address_tree(&[A1, A2]);
        let h1 = tree.leaf_hash(&vec![json!(A1)]).unwrap();
        let h2 = tree.leaf_hash(&vec![json!(A2)]).unwrap();
        assert_eq!(tree.root(), core::hash_pair(&h1, &h2));

        // Each proof is exactly the other leaf's hash
        assert_eq!(tree.proof_for_value(&vec![json!(A1)]).unwrap(), vec![h2]);
        assert_eq!(tree.proof_for_value(&vec![json!(A2)]).unwrap(), vec![h1]);
    }

    #[test]
    fn test_determinism() {
        let t1 = address_tree(&[A1, A2, A3]);
        let t2 = address_tree(&[A1, A2, A3]);
        assert_eq!(t1.root(), t2.root());
        for i in 0..3 {
            assert_eq!(t1.proof(i).unwrap(), t2.proof(i).unwrap());
        }
    }

    #[test]
    fn test_proof_soundness_all_leaves_odd_counts() {
        // Odd leaf counts exercise every pairing boundary of the layout
        for addrs in [&[A1][..], &[A1, A2][..], &[A1, A2, A3][..]] {
            let tree = address_tree(addrs);
            for (i, value) in tree.entries() {
                let value = value.clone();
                let proof = tree.proof(i).unwrap();
                assert!(
                    tree.verify(&value, &proof).unwrap(),
                    "leaf {} of {} must verify",
                    i,
                    addrs.len()
                );
            }
        }

        let many: Vec<String> = (1..=5)
            .map(|d| format!("0x{}", format!("{:02x}", d).repeat(20)))
            .collect();
        let refs: Vec<&str> = many.iter().map(|s| s.as_str()).collect();
        let tree = address_tree(&refs);
        for (i, value) in tree.entries() {
            let value = value.clone();
            assert!(tree.verify(&value, &tree.proof(i).unwrap()).unwrap());
        }
    }

    #[test]
    fn test_forged_value_rejected() {
        let tree = address_tree(&[A1, A2]);
        let proof = tree.proof_for_value(&vec![json!(A1)]).unwrap();
        assert!(!tree.verify(&vec![json!(A3)], &proof).unwrap());
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let tree = address_tree(&[A1, A2, A3]);
        let value = vec![json!(A1)];
        let mut proof = tree.proof_for_value(&value).unwrap();
        assert!(tree.verify(&value, &proof).unwrap());

        // Flip one byte of one sibling hash
        let mut bytes = *proof[0].as_bytes();
        bytes[0] ^= 0x01;
        proof[0] = Hash::from_bytes(bytes);
        assert!(!tree.verify(&value, &proof).unwrap());
    }

    #[test]
    fn test_wrong_root_rejected() {
        let tree = address_tree(&[A1, A2]);
        let value = vec![json!(A1)];
        let proof = tree.proof_for_value(&value).unwrap();
        let mut bytes = *tree.root().as_bytes();
        bytes[31] ^= 0x01;
        let forged_root = Hash::from_bytes(bytes);
        assert!(!verify_proof(forged_root, tree.signature(), &value, &proof).unwrap());
    }

    #[test]
    fn test_child_order_does_not_matter() {
        // Swapping the operands of the pair rule must not change the
        // recomputed parent
        let tree = address_tree(&[A1, A2]);
        let h1 = tree.leaf_hash(&vec![json!(A1)]).unwrap();
        let h2 = tree.leaf_hash(&vec![json!(A2)]).unwrap();
        assert_eq!(core::hash_pair(&h1, &h2), core::hash_pair(&h2, &h1));
        assert_eq!(tree.root(), core::hash_pair(&h2, &h1));
    }

    #[test]
    fn test_index_out_of_range() {
        let tree = address_tree(&[A1, A2]);
        let err = tree.proof(2).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn test_value_not_found() {
        let tree = address_tree(&[A1, A2]);
        let err = tree.proof_for_value(&vec![json!(A3)]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_duplicate_value_ambiguous() {
        let tree = address_tree(&[A1, A2, A1]);
        let err = tree.proof_for_value(&vec![json!(A1)]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousValue(_)));

        // Proof by index still works for each duplicate
        for i in [0, 2] {
            let proof = tree.proof(i).unwrap();
            assert!(tree.verify(&vec![json!(A1)], &proof).unwrap());
        }
    }

    #[test]
    fn test_lookup_is_semantic_not_textual() {
        // Same address, different case: still the same leaf
        let tree = address_tree(&["0xAbCdEfAbCdEfAbCdEfAbCdEfAbCdEfAbCdEfAbCd"]);
        let lower = vec![json!("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd")];
        assert_eq!(tree.index_of(&lower).unwrap(), 0);
    }

    #[test]
    fn test_validate_accepts_built_tree() {
        let tree = address_tree(&[A1, A2, A3]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_validate_catches_corruption() {
        let mut tree = address_tree(&[A1, A2, A3]);
        let mut bytes = *tree.tree[1].as_bytes();
        bytes[0] ^= 0xff;
        tree.tree[1] = Hash::from_bytes(bytes);
        assert!(matches!(tree.validate(), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_render_mentions_every_leaf() {
        let tree = address_tree(&[A1, A2]);
        let rendered = tree.render();
        assert!(rendered.contains(&tree.root().to_hex()));
        assert!(rendered.contains("leaf 0"));
        assert!(rendered.contains("leaf 1"));
    }

    #[test]
    fn test_multi_field_tuples() {
        let sig = parse_signature(&["address", "uint256"]).unwrap();
        let values = vec![
            vec![json!(A1), json!("100")],
            vec![json!(A2), json!("200")],
            vec![json!(A1), json!("300")],
        ];
        let tree = MerkleTree::of(values, sig).unwrap();

        // Same address, different amount: distinct leaves
        let q = vec![json!(A1), json!(100)];
        let i = tree.index_of(&q).unwrap();
        assert_eq!(i, 0);
        let proof = tree.proof(i).unwrap();
        assert!(tree.verify(&q, &proof).unwrap());
        assert!(!tree.verify(&vec![json!(A1), json!(101)], &proof).unwrap());
    }
}
