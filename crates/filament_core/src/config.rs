//! # Registry Configuration
//!
//! Sizing for batches and ceilings for allocation. Loaded once at startup,
//! either from code or from a TOML file.

use serde::{Deserialize, Serialize};

use crate::error::{SplineError, SplineResult};

/// Smallest control-point count a spline may have (one segment plus the
/// two extension points).
pub const MIN_CONTROL_POINTS: usize = 4;

/// Smallest number of samples per segment (the sub-interval divides by
/// `vertices_per_segment - 1`).
pub const MIN_VERTICES_PER_SEGMENT: usize = 2;

/// Configuration for a [`SplineRegistry`](crate::SplineRegistry).
///
/// ```rust,ignore
/// let config = SplineConfig::from_toml_str(r#"
///     batch_capacity = 16384
///     max_batches = 8
/// "#)?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineConfig {
    /// Control points held by one batch buffer.
    pub batch_capacity: usize,
    /// Maximum number of batches the registry may create.
    pub max_batches: usize,
    /// Maximum number of live splines.
    pub max_splines: usize,
    /// Samples per segment used by [`SplineRegistry::add`](crate::SplineRegistry::add).
    pub vertices_per_segment: usize,
    /// Whether [`SplineRegistry::assign`](crate::SplineRegistry::assign),
    /// [`MutationContext::modify`](crate::MutationContext::modify) and
    /// [`MutationContext::apply_configured`](crate::MutationContext::apply_configured)
    /// treat input as user points and recompute the extension points.
    pub insert_extension_points: bool,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            batch_capacity: 8192,
            max_batches: 64,
            max_splines: 65_536,
            vertices_per_segment: 8,
            insert_extension_points: true,
        }
    }
}

impl SplineConfig {
    /// Parses a configuration from TOML text. Missing keys take their
    /// default value.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidConfig`] if the text does not parse or
    /// the values fail [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> SplineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SplineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every size is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SplineResult<()> {
        if self.batch_capacity < MIN_CONTROL_POINTS {
            return Err(SplineError::InvalidConfig(format!(
                "batch_capacity must be at least {MIN_CONTROL_POINTS}, got {}",
                self.batch_capacity
            )));
        }
        if self.max_batches == 0 {
            return Err(SplineError::InvalidConfig(
                "max_batches must be greater than zero".to_owned(),
            ));
        }
        if self.max_splines == 0 {
            return Err(SplineError::InvalidConfig(
                "max_splines must be greater than zero".to_owned(),
            ));
        }
        if u32::try_from(self.max_splines).is_err() {
            return Err(SplineError::InvalidConfig(format!(
                "max_splines must fit in 32 bits, got {}",
                self.max_splines
            )));
        }
        if self.vertices_per_segment < MIN_VERTICES_PER_SEGMENT {
            return Err(SplineError::InvalidConfig(format!(
                "vertices_per_segment must be at least {MIN_VERTICES_PER_SEGMENT}, got {}",
                self.vertices_per_segment
            )));
        }
        Ok(())
    }
}
