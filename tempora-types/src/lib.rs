//! # tempora-types
//!
//! Primitive types for the tempora temporal algebra.
//!
//! This crate provides the building blocks temporal values are made of:
//!
//! - **Time types**: `Timestamp`, `Period`, `TimestampSet`, `PeriodSet`
//! - **Base values**: `BaseKind`, `Value`, and the point base `GeoPoint`
//! - **Bounding boxes**: `BoundingBox` over `Period`, `TBox`, and `STBox`
//!
//! All types are serializable with Serde; points are built on top of the
//! `geo` crate's geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use tempora_types::bbox::BoundingBox;
//! use tempora_types::time::Timestamp;
//! use tempora_types::value::Value;
//!
//! let bbox = BoundingBox::from_value(&Value::Float(21.5), Timestamp::from_secs(0));
//! assert!(bbox.may_contain_value(&Value::Float(21.5)));
//! ```

pub mod bbox;
pub mod error;
pub mod point;
pub mod time;
pub mod value;

pub use error::TypeError;
