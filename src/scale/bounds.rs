use serde::{Deserialize, Serialize};

use super::error::ScaleError;

/// Scale at which text renders at its base size.
pub const DEFAULT_SCALE: f32 = 1.0;
pub const DEFAULT_MIN_SCALE: f32 = 0.5;
pub const DEFAULT_MAX_SCALE: f32 = 2.0;

/// Inclusive range a font scale is clamped into.
///
/// Always satisfies `0 < min < max`, both finite. Deserializing validates the
/// same invariant, so bounds read from an app's config file are as safe as
/// ones built with [`ScaleBounds::new`]:
///
/// ```ignore
/// let bounds: ScaleBounds = ron::from_str("(min_scale: 0.7, max_scale: 1.5)")?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct ScaleBounds {
    min_scale: f32,
    max_scale: f32,
}

#[derive(Deserialize)]
struct RawBounds {
    min_scale: f32,
    max_scale: f32,
}

impl TryFrom<RawBounds> for ScaleBounds {
    type Error = ScaleError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Self::new(raw.min_scale, raw.max_scale)
    }
}

impl ScaleBounds {
    /// Fails with [`ScaleError::InvalidBounds`] rather than swapping or
    /// repairing a bad range.
    pub fn new(min_scale: f32, max_scale: f32) -> Result<Self, ScaleError> {
        let valid = min_scale.is_finite()
            && max_scale.is_finite()
            && min_scale > 0.0
            && min_scale < max_scale;
        if !valid {
            return Err(ScaleError::InvalidBounds {
                min: min_scale,
                max: max_scale,
            });
        }
        Ok(Self {
            min_scale,
            max_scale,
        })
    }

    pub fn min(&self) -> f32 {
        self.min_scale
    }

    pub fn max(&self) -> f32 {
        self.max_scale
    }

    pub fn span(&self) -> f32 {
        self.max_scale - self.min_scale
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min_scale..=self.max_scale).contains(&value)
    }

    /// Clamp `value` into the range. NaN maps to the clamped neutral scale.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { DEFAULT_SCALE } else { value };
        value.clamp(self.min_scale, self.max_scale)
    }

    /// The neutral scale, or the nearest bound when the range excludes it.
    pub fn neutral(&self) -> f32 {
        self.clamp(DEFAULT_SCALE)
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}
