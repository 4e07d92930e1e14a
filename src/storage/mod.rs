//! Serialization of temporal values.
//!
//! Two encodings are provided:
//! - [`layout`]: a packed, 8-byte aligned binary layout with an offset table
//!   for random access to instants or sequences
//! - [`snapshot`]: a serde snapshot through bincode (feature `snapshot`)
//!
//! Both decoders rebuild values through the validating constructors, so a
//! decoded value satisfies the same invariants as a freshly built one.

pub mod layout;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use layout::{decode, encode, packed_size, read_element};

#[cfg(feature = "snapshot")]
pub use snapshot::{from_snapshot, to_snapshot};
