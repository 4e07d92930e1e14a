//! Validation policy for temporal value construction.
//!
//! The algebra itself is configuration-free; `Config` only decides how strictly
//! incoming base values are checked by [`ConfigValidator`](crate::validation::ConfigValidator).
use serde::de::Error;

/// Construction-time validation settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SRID every point must carry, if any
    #[serde(default)]
    pub ambient_srid: Option<i32>,

    /// Reject geodetic points outside longitude/latitude ranges
    #[serde(default = "Config::default_check_geodetic_range")]
    pub check_geodetic_range: bool,

    /// Upper bound on instants per collection
    #[serde(default)]
    pub max_instants: Option<usize>,
}

impl Config {
    const fn default_check_geodetic_range() -> bool {
        true
    }

    pub fn with_ambient_srid(mut self, srid: i32) -> Self {
        self.ambient_srid = Some(srid);
        self
    }

    pub fn with_geodetic_range_check(mut self, enabled: bool) -> Self {
        self.check_geodetic_range = enabled;
        self
    }

    pub fn with_max_instants(mut self, max: usize) -> Self {
        assert!(max > 0, "Instant limit must be greater than zero");

        if max > 50_000_000 {
            log::warn!(
                "Instant limit of {} is very large; a single collection of this size \
                needs several gigabytes of memory.",
                max
            );
        }

        self.max_instants = Some(max);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_instants
            && max == 0
        {
            return Err("Instant limit must be greater than zero".to_string());
        }

        if let Some(srid) = self.ambient_srid
            && srid < 0
        {
            return Err(format!("Ambient SRID must not be negative, got {}", srid));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ambient_srid: None,
            check_geodetic_range: Self::default_check_geodetic_range(),
            max_instants: None,
        }
    }
}
