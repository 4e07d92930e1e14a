//! Compute layer: the operations of the temporal algebra.
//!
//! This module separates computation from the representation of temporal
//! values. It provides:
//! - Synchronization of two temporal values on a shared time base
//! - Lifting of base-value functions to temporal values
//! - Restriction to values and to time
//! - Operators built on lifting

pub mod lifting;
pub mod ops;
pub mod restrict;
pub mod sync;
