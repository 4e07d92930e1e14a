use crate::error::{Result, TemporalError};
use crate::validation::{DefaultValidator, ValueValidator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tempora_types::bbox::BoundingBox;
use tempora_types::time::{Period, Timestamp};
use tempora_types::value::{BaseKind, Value};

/// A single value at a single timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instant {
    value: Value,
    t: Timestamp,
}

impl Instant {
    /// Builds an instant of the declared `kind`, validated with [`DefaultValidator`].
    pub fn make(value: Value, t: Timestamp, kind: BaseKind) -> Result<Self> {
        Self::make_with(value, t, kind, &DefaultValidator)
    }

    /// Builds an instant of the declared `kind` with a caller supplied validator.
    pub fn make_with(
        value: Value,
        t: Timestamp,
        kind: BaseKind,
        validator: &dyn ValueValidator,
    ) -> Result<Self> {
        if value.kind() != kind {
            return Err(TemporalError::IncompatibleOperands(format!(
                "expected a {} value, got {}",
                kind,
                value.kind()
            )));
        }
        validator.validate(&value)?;
        Ok(Self { value, t })
    }

    /// Builds an instant whose kind is taken from the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora::{Instant, Timestamp, Value};
    ///
    /// let inst = Instant::new(2.5, Timestamp::from_secs(10))?;
    /// assert_eq!(inst.value(), &Value::Float(2.5));
    /// assert!(Instant::new(f64::NAN, Timestamp::from_secs(10)).is_err());
    /// # Ok::<(), tempora::TemporalError>(())
    /// ```
    pub fn new(value: impl Into<Value>, t: Timestamp) -> Result<Self> {
        let value = value.into();
        let kind = value.kind();
        Self::make(value, t, kind)
    }

    /// Internal constructor for values computed from already validated inputs.
    pub(crate) fn from_parts(value: Value, t: Timestamp) -> Self {
        Self { value, t }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Owned copy of the value.
    pub fn value_copy(&self) -> Value {
        self.value.clone()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.t
    }

    pub fn kind(&self) -> BaseKind {
        self.value.kind()
    }

    pub fn period(&self) -> Period {
        Period::instant(self.t)
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_value(&self.value, self.t)
    }

    pub fn shift(&self, delta_micros: i64) -> Instant {
        Self {
            value: self.value.clone(),
            t: self.t.shift(delta_micros),
        }
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }

    pub(crate) fn with_value(&self, value: Value) -> Instant {
        Self { value, t: self.t }
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Instants order by timestamp, then by value.
impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t
            .cmp(&other.t)
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// Checks that all instants agree on base kind and point dimensionality.
pub(crate) fn check_homogeneous(instants: &[Instant]) -> Result<BaseKind> {
    let first = instants.first().ok_or(TemporalError::EmptyInput)?;
    let kind = first.kind();
    for inst in &instants[1..] {
        check_compatible(first.value(), inst.value())?;
    }
    Ok(kind)
}

pub(crate) fn check_compatible(a: &Value, b: &Value) -> Result<()> {
    if a.kind() != b.kind() {
        return Err(TemporalError::MixedDimensions(format!(
            "cannot mix {} and {} values",
            a.kind(),
            b.kind()
        )));
    }
    if let (Value::Point(p), Value::Point(q)) = (a, b)
        && !p.same_dimensionality(q)
    {
        return Err(TemporalError::MixedDimensions(format!(
            "points differ in SRID, z or geodetic flag: {} and {}",
            a, b
        )));
    }
    Ok(())
}

/// Bounding box of a non-empty run of instants.
pub(crate) fn bbox_of(instants: &[Instant]) -> BoundingBox {
    let mut bbox = instants[0].bbox();
    for inst in &instants[1..] {
        bbox.merge(&inst.bbox());
    }
    bbox
}
