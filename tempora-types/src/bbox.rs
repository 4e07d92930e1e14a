//! Bounding boxes summarizing temporal values.
//!
//! Each base family has its own box: unordered bases (bool, text) only carry a
//! [`Period`], numbers a [`TBox`] (value span and time span), and points an
//! [`STBox`] (x/y/z spans, time span, SRID). Any dimension of a `TBox` or
//! `STBox` may be absent; topological operators only look at the dimensions
//! present in both operands and fail when there is none.

use crate::error::TypeError;
use crate::time::{Period, Timestamp};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A closed interval of floating point values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    /// Create a span, swapping the bounds if given in reverse.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn point(v: f64) -> Self {
        Self { min: v, max: v }
    }

    pub fn contains_value(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    pub fn union(&self, other: &Span) -> Span {
        Span {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn intersection(&self, other: &Span) -> Option<Span> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(Span { min, max })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// A closed time interval used by numeric and spatial boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub tmin: Timestamp,
    pub tmax: Timestamp,
}

impl TimeSpan {
    pub fn new(a: Timestamp, b: Timestamp) -> Self {
        Self {
            tmin: a.min(b),
            tmax: a.max(b),
        }
    }

    pub fn instant(t: Timestamp) -> Self {
        Self { tmin: t, tmax: t }
    }

    /// The closed hull of a period, ignoring bound inclusivity.
    pub fn from_period(p: &Period) -> Self {
        Self {
            tmin: p.lower(),
            tmax: p.upper(),
        }
    }

    pub fn to_period(&self) -> Period {
        // tmin <= tmax holds by construction and both bounds are inclusive
        Period::new(self.tmin, self.tmax, true, true).unwrap_or_else(|_| Period::instant(self.tmin))
    }

    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        self.tmin <= t && t <= self.tmax
    }

    pub fn contains(&self, other: &TimeSpan) -> bool {
        self.tmin <= other.tmin && other.tmax <= self.tmax
    }

    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.tmin <= other.tmax && other.tmin <= self.tmax
    }

    pub fn union(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            tmin: self.tmin.min(other.tmin),
            tmax: self.tmax.max(other.tmax),
        }
    }

    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let tmin = self.tmin.max(other.tmin);
        let tmax = self.tmax.min(other.tmax);
        (tmin <= tmax).then_some(TimeSpan { tmin, tmax })
    }

    pub fn is_degenerate(&self) -> bool {
        self.tmin == self.tmax
    }

    pub fn shift(&self, delta_micros: i64) -> TimeSpan {
        TimeSpan {
            tmin: self.tmin.shift(delta_micros),
            tmax: self.tmax.shift(delta_micros),
        }
    }
}

/// Value-and-time box of a temporal number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TBox {
    pub value: Option<Span>,
    pub time: Option<TimeSpan>,
}

impl TBox {
    /// Create a box from its optional dimensions; at least one must be present.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora_types::bbox::{Span, TBox};
    ///
    /// let values_only = TBox::new(Some(Span::new(0.0, 10.0)), None)?;
    /// assert!(values_only.time.is_none());
    /// assert!(TBox::new(None, None).is_err());
    /// # Ok::<(), tempora_types::TypeError>(())
    /// ```
    pub fn new(value: Option<Span>, time: Option<TimeSpan>) -> Result<Self, TypeError> {
        if value.is_none() && time.is_none() {
            return Err(TypeError::Empty("box"));
        }
        Ok(Self { value, time })
    }

    pub fn from_instant(value: f64, t: Timestamp) -> Self {
        Self {
            value: Some(Span::point(value)),
            time: Some(TimeSpan::instant(t)),
        }
    }

    fn extent(&self) -> Extent {
        Extent {
            value: self.value,
            time: self.time,
            ..Extent::default()
        }
    }
}

/// The spatial part of an [`STBox`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceExtent {
    pub x: Span,
    pub y: Span,
    pub z: Option<Span>,
}

/// Spatio-temporal box of a temporal point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct STBox {
    pub space: Option<SpaceExtent>,
    pub time: Option<TimeSpan>,
    pub srid: i32,
    pub geodetic: bool,
}

impl STBox {
    pub fn new(
        space: Option<SpaceExtent>,
        time: Option<TimeSpan>,
        srid: i32,
        geodetic: bool,
    ) -> Result<Self, TypeError> {
        if space.is_none() && time.is_none() {
            return Err(TypeError::Empty("box"));
        }
        Ok(Self {
            space,
            time,
            srid,
            geodetic,
        })
    }

    pub fn has_z(&self) -> bool {
        self.space.is_some_and(|s| s.z.is_some())
    }

    fn extent(&self) -> Extent {
        Extent {
            x: self.space.map(|s| s.x),
            y: self.space.map(|s| s.y),
            z: self.space.and_then(|s| s.z),
            time: self.time,
            ..Extent::default()
        }
    }

    fn check_reference(&self, other: &STBox) -> Result<(), TypeError> {
        if self.srid != other.srid {
            return Err(TypeError::SridMismatch(self.srid, other.srid));
        }
        if self.geodetic != other.geodetic {
            return Err(TypeError::GeodeticMismatch);
        }
        Ok(())
    }
}

/// All dimensions a box may carry, for dimension-agnostic topology.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    value: Option<Span>,
    x: Option<Span>,
    y: Option<Span>,
    z: Option<Span>,
    time: Option<TimeSpan>,
}

type SharedDims = (Vec<(Span, Span)>, Option<(TimeSpan, TimeSpan)>);

impl Extent {
    fn shared(&self, other: &Extent) -> Result<SharedDims, TypeError> {
        let spans: Vec<(Span, Span)> = [
            (self.value, other.value),
            (self.x, other.x),
            (self.y, other.y),
            (self.z, other.z),
        ]
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect();
        let time = self.time.zip(other.time);
        if spans.is_empty() && time.is_none() {
            return Err(TypeError::NoSharedDimension);
        }
        Ok((spans, time))
    }

    fn overlaps(&self, other: &Extent) -> Result<bool, TypeError> {
        let (spans, time) = self.shared(other)?;
        Ok(spans.iter().all(|(a, b)| a.overlaps(b)) && time.is_none_or(|(a, b)| a.overlaps(&b)))
    }

    fn contains(&self, other: &Extent) -> Result<bool, TypeError> {
        let (spans, time) = self.shared(other)?;
        Ok(spans.iter().all(|(a, b)| a.contains(b)) && time.is_none_or(|(a, b)| a.contains(&b)))
    }

    fn same(&self, other: &Extent) -> Result<bool, TypeError> {
        let (spans, time) = self.shared(other)?;
        Ok(spans.iter().all(|(a, b)| a == b) && time.is_none_or(|(a, b)| a == b))
    }

    fn adjacent(&self, other: &Extent) -> Result<bool, TypeError> {
        let (spans, time) = self.shared(other)?;
        let mut degenerate = false;
        for (a, b) in &spans {
            match a.intersection(b) {
                Some(inter) => degenerate |= inter.is_degenerate(),
                None => return Ok(false),
            }
        }
        if let Some((a, b)) = time {
            match a.intersection(&b) {
                Some(inter) => degenerate |= inter.is_degenerate(),
                None => return Ok(false),
            }
        }
        Ok(degenerate)
    }

    /// The first ordered dimension shared by both operands (value, then x).
    fn ordered_pair(&self, other: &Extent) -> Result<(Span, Span), TypeError> {
        self.value
            .zip(other.value)
            .or_else(|| self.x.zip(other.x))
            .ok_or(TypeError::NoSharedDimension)
    }

    fn time_pair(&self, other: &Extent) -> Result<(TimeSpan, TimeSpan), TypeError> {
        self.time.zip(other.time).ok_or(TypeError::NoSharedDimension)
    }
}

fn union_opt<T: Copy>(a: Option<T>, b: Option<T>, f: impl Fn(&T, &T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(&a, &b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Bounding box of a temporal value, tagged by base family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundingBox {
    Period(Period),
    TBox(TBox),
    STBox(STBox),
}

impl BoundingBox {
    /// The box of a single instant.
    pub fn from_value(value: &Value, t: Timestamp) -> Self {
        match value {
            Value::Bool(_) | Value::Text(_) => BoundingBox::Period(Period::instant(t)),
            Value::Int(i) => BoundingBox::TBox(TBox::from_instant(*i as f64, t)),
            Value::Float(f) => BoundingBox::TBox(TBox::from_instant(*f, t)),
            Value::Point(p) => BoundingBox::STBox(STBox {
                space: Some(SpaceExtent {
                    x: Span::point(p.x()),
                    y: Span::point(p.y()),
                    z: p.z.map(Span::point),
                }),
                time: Some(TimeSpan::instant(t)),
                srid: p.srid,
                geodetic: p.geodetic,
            }),
        }
    }

    pub fn family_name(&self) -> &'static str {
        match self {
            BoundingBox::Period(_) => "period",
            BoundingBox::TBox(_) => "tbox",
            BoundingBox::STBox(_) => "stbox",
        }
    }

    fn extent(&self) -> Extent {
        match self {
            BoundingBox::Period(p) => Extent {
                time: Some(TimeSpan::from_period(p)),
                ..Extent::default()
            },
            BoundingBox::TBox(b) => b.extent(),
            BoundingBox::STBox(b) => b.extent(),
        }
    }

    /// The time extent of the box, if it has one.
    pub fn period(&self) -> Option<Period> {
        match self {
            BoundingBox::Period(p) => Some(*p),
            BoundingBox::TBox(b) => b.time.map(|t| t.to_period()),
            BoundingBox::STBox(b) => b.time.map(|t| t.to_period()),
        }
    }

    pub fn time_span(&self) -> Option<TimeSpan> {
        self.extent().time
    }

    /// The value span of a numeric box.
    pub fn value_span(&self) -> Option<Span> {
        match self {
            BoundingBox::TBox(b) => b.value,
            _ => None,
        }
    }

    fn check_reference(&self, other: &BoundingBox) -> Result<(), TypeError> {
        if let (BoundingBox::STBox(a), BoundingBox::STBox(b)) = (self, other) {
            a.check_reference(b)?;
        }
        Ok(())
    }

    /// Do the boxes intersect on every shared dimension?
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora_types::bbox::{BoundingBox, Span, TBox, TimeSpan};
    /// use tempora_types::time::{Period, Timestamp};
    ///
    /// let t = Timestamp::from_secs;
    /// let numbers = BoundingBox::TBox(TBox::new(Some(Span::new(0.0, 5.0)), Some(TimeSpan::new(t(0), t(10))))?);
    /// let period = BoundingBox::Period(Period::new(t(8), t(20), true, true)?);
    /// // only the time dimension is shared
    /// assert!(numbers.overlaps(&period)?);
    /// # Ok::<(), tempora_types::TypeError>(())
    /// ```
    pub fn overlaps(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        if let (BoundingBox::Period(a), BoundingBox::Period(b)) = (self, other) {
            return Ok(a.overlaps(b));
        }
        self.check_reference(other)?;
        self.extent().overlaps(&other.extent())
    }

    pub fn contains(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        if let (BoundingBox::Period(a), BoundingBox::Period(b)) = (self, other) {
            return Ok(a.contains(b));
        }
        self.check_reference(other)?;
        self.extent().contains(&other.extent())
    }

    pub fn contained(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        other.contains(self)
    }

    /// Equality restricted to the dimensions present in both boxes.
    pub fn same(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        if let (BoundingBox::Period(a), BoundingBox::Period(b)) = (self, other) {
            return Ok(a == b);
        }
        self.check_reference(other)?;
        self.extent().same(&other.extent())
    }

    /// The boxes touch but their intersection is degenerate on some shared dimension.
    pub fn adjacent(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        if let (BoundingBox::Period(a), BoundingBox::Period(b)) = (self, other) {
            return Ok(a.adjacent(b));
        }
        self.check_reference(other)?;
        self.extent().adjacent(&other.extent())
    }

    /// Strictly earlier in time.
    pub fn before(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        if let (BoundingBox::Period(a), BoundingBox::Period(b)) = (self, other) {
            return Ok(a.before(b));
        }
        let (a, b) = self.extent().time_pair(&other.extent())?;
        Ok(a.tmax < b.tmin)
    }

    pub fn after(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        other.before(self)
    }

    /// Strictly smaller value (numbers) or x coordinate (points).
    pub fn left(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        self.check_reference(other)?;
        let (a, b) = self.extent().ordered_pair(&other.extent())?;
        Ok(a.max < b.min)
    }

    pub fn right(&self, other: &BoundingBox) -> Result<bool, TypeError> {
        other.left(self)
    }

    /// Componentwise union of the dimensions present in either box.
    ///
    /// A period merges into the time dimension of a numeric or spatial box;
    /// numeric and spatial boxes cannot be combined.
    pub fn expand(&self, other: &BoundingBox) -> Result<BoundingBox, TypeError> {
        match (self, other) {
            (BoundingBox::Period(a), BoundingBox::Period(b)) => Ok(BoundingBox::Period(a.expand(b))),
            (BoundingBox::TBox(a), BoundingBox::TBox(b)) => Ok(BoundingBox::TBox(TBox {
                value: union_opt(a.value, b.value, Span::union),
                time: union_opt(a.time, b.time, TimeSpan::union),
            })),
            (BoundingBox::STBox(a), BoundingBox::STBox(b)) => {
                a.check_reference(b)?;
                Ok(BoundingBox::STBox(STBox {
                    space: union_opt(a.space, b.space, |s, o| SpaceExtent {
                        x: s.x.union(&o.x),
                        y: s.y.union(&o.y),
                        z: union_opt(s.z, o.z, Span::union),
                    }),
                    time: union_opt(a.time, b.time, TimeSpan::union),
                    ..*a
                }))
            }
            (BoundingBox::Period(p), BoundingBox::TBox(b))
            | (BoundingBox::TBox(b), BoundingBox::Period(p)) => Ok(BoundingBox::TBox(TBox {
                time: union_opt(b.time, Some(TimeSpan::from_period(p)), TimeSpan::union),
                ..*b
            })),
            (BoundingBox::Period(p), BoundingBox::STBox(b))
            | (BoundingBox::STBox(b), BoundingBox::Period(p)) => Ok(BoundingBox::STBox(STBox {
                time: union_opt(b.time, Some(TimeSpan::from_period(p)), TimeSpan::union),
                ..*b
            })),
            (a, b) => Err(TypeError::IncompatibleBoxes(a.family_name(), b.family_name())),
        }
    }

    /// Fold another box of the same family into this one.
    pub fn merge(&mut self, other: &BoundingBox) {
        if let Ok(merged) = self.expand(other) {
            *self = merged;
        }
    }

    /// Whether a value could appear in a temporal value with this box.
    ///
    /// Period boxes carry no value information and always answer `true`.
    pub fn may_contain_value(&self, value: &Value) -> bool {
        match (self, value) {
            (BoundingBox::TBox(b), v) => match (b.value, v.as_f64()) {
                (Some(span), Some(x)) => span.contains_value(x),
                _ => true,
            },
            (BoundingBox::STBox(b), Value::Point(p)) => match b.space {
                Some(space) => {
                    space.x.contains_value(p.x())
                        && space.y.contains_value(p.y())
                        && match (space.z, p.z) {
                            (Some(zs), Some(z)) => zs.contains_value(z),
                            _ => true,
                        }
                }
                None => true,
            },
            _ => true,
        }
    }

    pub fn shift(&self, delta_micros: i64) -> BoundingBox {
        match self {
            BoundingBox::Period(p) => BoundingBox::Period(p.shift(delta_micros)),
            BoundingBox::TBox(b) => BoundingBox::TBox(TBox {
                time: b.time.map(|t| t.shift(delta_micros)),
                ..*b
            }),
            BoundingBox::STBox(b) => BoundingBox::STBox(STBox {
                time: b.time.map(|t| t.shift(delta_micros)),
                ..*b
            }),
        }
    }
}
