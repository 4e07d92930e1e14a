//! Base values carried by temporal instants.

use crate::point::GeoPoint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Descriptor of the base type of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseKind {
    Bool,
    Int,
    Float,
    Text,
    Point,
}

/// The bounding box family a base kind is summarized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFamily {
    /// Time only (unordered bases)
    Period,
    /// Value span and time
    Numeric,
    /// Spatial extent and time
    Spatial,
}

impl BaseKind {
    /// Bases whose values can be linearly interpolated.
    pub fn is_continuous(self) -> bool {
        matches!(self, BaseKind::Float | BaseKind::Point)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BaseKind::Int | BaseKind::Float)
    }

    pub fn box_family(self) -> BoxFamily {
        match self {
            BaseKind::Bool | BaseKind::Text => BoxFamily::Period,
            BaseKind::Int | BaseKind::Float => BoxFamily::Numeric,
            BaseKind::Point => BoxFamily::Spatial,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            BaseKind::Bool => 1,
            BaseKind::Int => 2,
            BaseKind::Float => 3,
            BaseKind::Text => 4,
            BaseKind::Point => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(BaseKind::Bool),
            2 => Some(BaseKind::Int),
            3 => Some(BaseKind::Float),
            4 => Some(BaseKind::Text),
            5 => Some(BaseKind::Point),
            _ => None,
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseKind::Bool => "bool",
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::Text => "text",
            BaseKind::Point => "point",
        };
        f.write_str(name)
    }
}

/// A base value.
///
/// Floats compare with `==` semantics (so `0.0 == -0.0`); NaN is rejected by
/// the validators before a value can enter a temporal collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Point(GeoPoint),
}

impl Value {
    pub fn kind(&self) -> BaseKind {
        match self {
            Value::Bool(_) => BaseKind::Bool,
            Value::Int(_) => BaseKind::Int,
            Value::Float(_) => BaseKind::Float,
            Value::Text(_) => BaseKind::Text,
            Value::Point(_) => BaseKind::Point,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&GeoPoint> {
        match self {
            Value::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Numeric view of an int or float value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Linear interpolation between two values of a continuous kind.
    ///
    /// Returns `None` for discrete kinds or mismatched operands.
    pub fn interpolate(&self, other: &Value, fraction: f64) -> Option<Value> {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(a + (b - a) * fraction)),
            (Value::Point(a), Value::Point(b)) => Some(Value::Point(a.interpolate(b, fraction))),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Point(a), Value::Point(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().tag().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => (f + 0.0).to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Point(p) => p.hash(state),
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    if a == b { Ordering::Equal } else { a.total_cmp(&b) }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: by kind first, then by value. Points order by x, y, z, SRID.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_f64(*a, *b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Point(a), Value::Point(b)) => {
                let (ca, cb) = (a.coords(), b.coords());
                cmp_f64(ca[0], cb[0])
                    .then_with(|| cmp_f64(ca[1], cb[1]))
                    .then_with(|| a.z.is_some().cmp(&b.z.is_some()))
                    .then_with(|| cmp_f64(ca[2], cb[2]))
                    .then_with(|| a.srid.cmp(&b.srid))
                    .then_with(|| a.geodetic.cmp(&b.geodetic))
            }
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Point(p) => match p.z {
                Some(z) => write!(f, "POINT Z({} {} {})", p.x(), p.y(), z),
                None => write!(f, "POINT({} {})", p.x(), p.y()),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<GeoPoint> for Value {
    fn from(p: GeoPoint) -> Self {
        Value::Point(p)
    }
}
