//! R-tree index over the bounding boxes of temporal values.
//!
//! Every indexed value is summarized by its cached [`BoundingBox`], laid out
//! on five axes: numeric value, x, y, z and time. Dimensions a box does not
//! carry span the whole axis, so a period box matches any value range and a
//! numeric box matches any spatial query. The envelope search is a
//! pre-filter; candidates are confirmed with the exact box topology.

use crate::temporal::Temporal;
use log::debug;
use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use std::hash::Hash;
use tempora_types::bbox::{BoundingBox, Span, TimeSpan};
use tempora_types::time::Period;

/// Axis extent used for dimensions a box does not carry.
///
/// Coordinates are clamped into it as well; clamping is monotone, so two
/// intersecting intervals stay intersecting.
const AXIS_LIMIT: f64 = 1.0e18;

type Envelope = AABB<[f64; 5]>;

/// An indexed key together with the box it was inserted with.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry<K> {
    pub key: K,
    pub bbox: BoundingBox,
    envelope: Envelope,
}

impl<K> IndexEntry<K> {
    fn new(key: K, bbox: BoundingBox) -> Self {
        Self {
            key,
            envelope: envelope_of(&bbox),
            bbox,
        }
    }
}

impl<K> RTreeObject for IndexEntry<K> {
    type Envelope = Envelope;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn clamp(v: f64) -> f64 {
    v.clamp(-AXIS_LIMIT, AXIS_LIMIT)
}

fn axis(span: Option<Span>) -> (f64, f64) {
    span.map_or((-AXIS_LIMIT, AXIS_LIMIT), |s| (clamp(s.min), clamp(s.max)))
}

fn time_axis(time: Option<TimeSpan>) -> (f64, f64) {
    time.map_or((-AXIS_LIMIT, AXIS_LIMIT), |ts| {
        (
            clamp(ts.tmin.as_micros() as f64),
            clamp(ts.tmax.as_micros() as f64),
        )
    })
}

fn envelope_of(bbox: &BoundingBox) -> Envelope {
    let (value, x, y, z, time) = match bbox {
        BoundingBox::Period(p) => (
            axis(None),
            axis(None),
            axis(None),
            axis(None),
            time_axis(Some(TimeSpan::from_period(p))),
        ),
        BoundingBox::TBox(b) => (
            axis(b.value),
            axis(None),
            axis(None),
            axis(None),
            time_axis(b.time),
        ),
        BoundingBox::STBox(b) => (
            axis(None),
            axis(b.space.map(|s| s.x)),
            axis(b.space.map(|s| s.y)),
            axis(b.space.and_then(|s| s.z)),
            time_axis(b.time),
        ),
    };
    AABB::from_corners(
        [value.0, x.0, y.0, z.0, time.0],
        [value.1, x.1, y.1, z.1, time.1],
    )
}

/// Index of temporal values by key.
///
/// Inserting a key that is already present replaces its previous box.
///
/// # Examples
///
/// ```
/// use tempora::index::TemporalIndex;
/// use tempora::{Instant, Interpolation, Period, Sequence, Temporal, Timestamp};
///
/// let t = Timestamp::from_secs;
/// let mut index = TemporalIndex::new();
/// index.insert("morning", &Temporal::from(Sequence::make(
///     vec![Instant::new(1.0, t(0))?, Instant::new(3.0, t(100))?],
///     true, true, Interpolation::Linear, true,
/// )?));
/// index.insert("evening", &Temporal::from(Instant::new(9.0, t(500))?));
///
/// let hits = index.query_period(&Period::new(t(50), t(60), true, true)?);
/// assert_eq!(hits, vec![&"morning"]);
/// # Ok::<(), tempora::TemporalError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TemporalIndex<K> {
    tree: RTree<IndexEntry<K>>,
    entries: FxHashMap<K, BoundingBox>,
}

impl<K> Default for TemporalIndex<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TemporalIndex<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            entries: FxHashMap::default(),
        }
    }

    /// Builds an index in one pass; later duplicates of a key win.
    pub fn bulk_load<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, BoundingBox)>,
    {
        let mut entries = FxHashMap::default();
        for (key, bbox) in values {
            entries.insert(key, bbox);
        }
        let objects = entries
            .iter()
            .map(|(key, bbox)| IndexEntry::new(key.clone(), *bbox))
            .collect();
        Self {
            tree: RTree::bulk_load(objects),
            entries,
        }
    }

    /// Indexes `value` under `key`.
    pub fn insert(&mut self, key: K, value: &Temporal) {
        self.insert_bbox(key, value.bbox());
    }

    pub fn insert_bbox(&mut self, key: K, bbox: BoundingBox) {
        if let Some(old) = self.entries.insert(key.clone(), bbox) {
            self.tree.remove(&IndexEntry::new(key.clone(), old));
        }
        self.tree.insert(IndexEntry::new(key, bbox));
    }

    /// Removes `key`, returning the box it was indexed with.
    pub fn remove(&mut self, key: &K) -> Option<BoundingBox> {
        let bbox = self.entries.remove(key)?;
        self.tree.remove(&IndexEntry::new(key.clone(), bbox));
        Some(bbox)
    }

    pub fn get(&self, key: &K) -> Option<&BoundingBox> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose boxes overlap `query` on every shared dimension.
    ///
    /// Boxes that cannot be compared with `query` (no shared dimension, or a
    /// different spatial reference) do not match.
    pub fn query_overlapping(&self, query: &BoundingBox) -> Vec<&K> {
        self.query_with(query, |entry| entry.overlaps(query))
    }

    /// Keys whose boxes lie inside `query` on every shared dimension.
    pub fn query_contained(&self, query: &BoundingBox) -> Vec<&K> {
        self.query_with(query, |entry| entry.contained(query))
    }

    /// Keys whose time extent overlaps `period`.
    pub fn query_period(&self, period: &Period) -> Vec<&K> {
        self.query_overlapping(&BoundingBox::Period(*period))
    }

    fn query_with<F, E>(&self, query: &BoundingBox, exact: F) -> Vec<&K>
    where
        F: Fn(&BoundingBox) -> std::result::Result<bool, E>,
    {
        let envelope = envelope_of(query);
        let mut candidates = 0usize;
        let hits: Vec<&K> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| {
                candidates += 1;
                exact(&entry.bbox).unwrap_or(false)
            })
            .map(|entry| &entry.key)
            .collect();
        debug!(
            "index query: {} candidates, {} hits out of {} entries",
            candidates,
            hits.len(),
            self.len()
        );
        hits
    }
}
