//! # canopy
//!
//! A deterministic Merkle tree engine for membership proofs.
//!
//! canopy builds an immutable keccak256 Merkle tree over a fixed set of
//! typed value tuples (addresses, amounts, …), persists it as a
//! `standard-v1` JSON document, and serves single-leaf inclusion proofs
//! that any verifier implementing the same fold accepts, including
//! on-chain ones.
//!
//! ## Core Concepts
//!
//! - **Leaves**: value tuples, ABI-encoded and double-hashed
//! - **Tree**: a flat 2n-1 array of digests, sorted-pair hashing
//! - **Proofs**: bottom-to-top sibling hashes, stateless artifacts
//! - **Dumps**: the persisted document, reloadable without rehashing
//!
//! ## Example
//!
//! ```ignore
//! use canopy::{parse_signature, MerkleTree};
//!
//! let signature = parse_signature(&["address"])?;
//! let tree = MerkleTree::of(values, signature)?;
//! println!("root: {}", tree.root());
//! let proof = tree.proof(0)?;
//! ```

pub mod dump;
pub mod encode;
pub mod model;
pub mod tree;

mod error;

pub use dump::{DumpEntry, TreeDump};
pub use error::{Error, Result};
pub use model::{parse_signature, Hash, LeafType, LeafValue};
pub use tree::{verify_proof, MerkleTree};

/// Format tag of the persisted tree document
pub const FORMAT: &str = "standard-v1";
