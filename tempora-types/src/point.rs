use geo::{Coord, Point};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A point base value: planar or geodetic coordinates with an optional z.
///
/// The spatial reference (SRID) and the geodetic flag travel with every point
/// so that a temporal point can check that all of its instants agree.
///
/// # Examples
///
/// ```
/// use tempora_types::point::GeoPoint;
///
/// // A drone at 100 meters altitude over lower Manhattan
/// let drone = GeoPoint::new_3d(-74.0060, 40.7128, 100.0).with_srid(4326).geodetic();
/// assert_eq!(drone.z(), Some(100.0));
/// assert!(drone.is_geodetic());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// The 2D position (longitude/latitude or x/y)
    pub point: Point<f64>,
    /// Optional z coordinate (altitude/elevation)
    pub z: Option<f64>,
    /// Spatial reference identifier, 0 when unknown
    pub srid: i32,
    /// Whether coordinates are longitude/latitude on the sphere
    pub geodetic: bool,
}

impl GeoPoint {
    /// Create a planar 2D point with an unknown SRID.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: None,
            srid: 0,
            geodetic: false,
        }
    }

    /// Create a planar 3D point with an unknown SRID.
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            z: Some(z),
            ..Self::new(x, y)
        }
    }

    pub fn from_point(point: Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn geodetic(mut self) -> Self {
        self.geodetic = true;
        self
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn z(&self) -> Option<f64> {
        self.z
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn is_geodetic(&self) -> bool {
        self.geodetic
    }

    /// Project to 2D by discarding z.
    pub fn to_2d(&self) -> Point<f64> {
        self.point
    }

    /// True when both points have the same SRID, z-presence and geodetic flag.
    pub fn same_dimensionality(&self, other: &GeoPoint) -> bool {
        self.srid == other.srid
            && self.has_z() == other.has_z()
            && self.geodetic == other.geodetic
    }

    pub fn is_finite(&self) -> bool {
        self.x().is_finite() && self.y().is_finite() && self.z.is_none_or(f64::is_finite)
    }

    /// The point at `fraction` of the way from `self` to `other`.
    ///
    /// ```
    /// use tempora_types::point::GeoPoint;
    ///
    /// let a = GeoPoint::new(0.0, 0.0);
    /// let b = GeoPoint::new(10.0, 20.0);
    /// assert_eq!(a.interpolate(&b, 0.5), GeoPoint::new(5.0, 10.0));
    /// ```
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        let delta: Coord<f64> = other.point.0 - self.point.0;
        let coord = self.point.0 + delta * fraction;
        GeoPoint {
            point: Point::from(coord),
            z: match (self.z, other.z) {
                (Some(z1), Some(z2)) => Some(z1 + (z2 - z1) * fraction),
                _ => None,
            },
            ..*self
        }
    }

    /// Coordinates as an `[x, y, z]` array, z defaulting to 0.
    pub fn coords(&self) -> [f64; 3] {
        [self.x(), self.y(), self.z.unwrap_or(0.0)]
    }
}

impl Eq for GeoPoint {}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.coords() {
            // +0.0 and -0.0 compare equal and must hash the same
            (c + 0.0).to_bits().hash(state);
        }
        self.z.is_some().hash(state);
        self.srid.hash(state);
        self.geodetic.hash(state);
    }
}
