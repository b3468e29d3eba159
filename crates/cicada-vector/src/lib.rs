#![deny(missing_docs)]
//! Sparse feature/attribute vectors and the compact encoding used by the
//! cicada forest decoding core (spec §3 component C4).

pub mod attribute;
pub mod compact;
pub mod feature;
pub mod function;

pub use attribute::{attributes_to_json, parse_attributes_json, AttributeId, AttributeValue, AttributeVector};
pub use compact::CompactFeatureVector;
pub use feature::{FeatureId, FeatureVector};
pub use function::{FeatureFunction, LinearTropical};
