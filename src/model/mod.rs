//! Core data model types for canopy

mod hash;
mod value;

pub use hash::Hash;
pub use value::{parse_signature, LeafType, LeafValue};

pub(crate) use value::display_tuple;
