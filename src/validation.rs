//! Validation hooks for base values.
//!
//! Constructors take a [`ValueValidator`] so that base-type specific checks are
//! injected rather than hard-coded into the algebra.

use crate::config::Config;
use crate::error::{Result, TemporalError};
use tempora_types::point::GeoPoint;
use tempora_types::value::Value;

/// Checks applied to every value entering a temporal collection.
pub trait ValueValidator {
    fn validate(&self, value: &Value) -> Result<()>;

    /// Checks the number of instants of a collection about to be built.
    fn validate_count(&self, _count: usize) -> Result<()> {
        Ok(())
    }
}

/// Rejects non-finite floats and points; accepts everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl ValueValidator for DefaultValidator {
    fn validate(&self, value: &Value) -> Result<()> {
        validate_finite(value)
    }
}

/// Validator driven by a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    config: Config,
}

impl ConfigValidator {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ValueValidator for ConfigValidator {
    fn validate(&self, value: &Value) -> Result<()> {
        validate_finite(value)?;
        if let Value::Point(p) = value {
            if let Some(srid) = self.config.ambient_srid
                && p.srid != srid
            {
                return Err(TemporalError::MixedDimensions(format!(
                    "point SRID {} differs from ambient SRID {}",
                    p.srid, srid
                )));
            }
            if p.is_geodetic() && self.config.check_geodetic_range {
                validate_geographic_point(p)?;
            }
        }
        Ok(())
    }

    fn validate_count(&self, count: usize) -> Result<()> {
        match self.config.max_instants {
            Some(max) if count > max => Err(TemporalError::InvalidValue(format!(
                "{} instants exceed the configured limit of {}",
                count, max
            ))),
            _ => Ok(()),
        }
    }
}

/// Rejects NaN and infinite floats and coordinates.
pub fn validate_finite(value: &Value) -> Result<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(TemporalError::InvalidValue(format!(
            "float value must be finite, got: {}",
            f
        ))),
        Value::Point(p) if !p.is_finite() => Err(TemporalError::InvalidValue(format!(
            "point coordinates must be finite, got: {}",
            value
        ))),
        _ => Ok(()),
    }
}

/// Validates a geodetic point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use tempora::validation::validate_geographic_point;
/// use tempora::GeoPoint;
///
/// let nyc = GeoPoint::new(-74.0060, 40.7128).geodetic();
/// assert!(validate_geographic_point(&nyc).is_ok());
///
/// let invalid = GeoPoint::new(-74.0, 95.0).geodetic();
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &GeoPoint) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !(-180.0..=180.0).contains(&x) {
        return Err(TemporalError::InvalidValue(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(TemporalError::InvalidValue(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}
