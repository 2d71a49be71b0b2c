use std::fmt;

use crate::foundation::error::{StatemapError, StatemapResult};
use crate::foundation::math::sanitize;

pub use kurbo::Affine;

/// Numeric state value as assigned by the data producer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a statemap's tag definition catalogue.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TagDefId(pub usize);

/// Entity identifier; equal to the entity's vertical position in the statemap.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub usize);

/// Identifier of one statemap instance.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct StatemapId(pub u32);

/// Pixel and time extents of the statemap drawing area.
///
/// Times handed to the viewport are relative to `begin`; sample times are absolute, so
/// lookups add `begin` back (see [`MapGeometry::absolute`]).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MapGeometry {
    /// Drawing area width in pixels.
    pub width: f64,
    /// Drawing area height in pixels.
    pub height: f64,
    /// Nanoseconds spanned by the full, unzoomed width.
    pub time_width: f64,
    /// Absolute time of the left edge of the unzoomed map.
    pub begin: f64,
}

impl MapGeometry {
    /// Create a validated geometry; all extents must be finite and positive.
    pub fn new(width: f64, height: f64, time_width: f64, begin: f64) -> StatemapResult<Self> {
        for (name, v) in [("width", width), ("height", height), ("time width", time_width)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(StatemapError::validation(format!(
                    "statemap {name} must be finite and > 0"
                )));
            }
        }
        if !begin.is_finite() || begin < 0.0 {
            return Err(StatemapError::validation(
                "statemap begin must be finite and >= 0",
            ));
        }
        Ok(Self {
            width,
            height,
            time_width,
            begin,
        })
    }

    /// Absolute end of the dataset (`begin + time_width`).
    pub fn end(&self) -> f64 {
        self.begin + self.time_width
    }

    /// Convert a view-relative time into the absolute time base of the samples.
    pub fn absolute(&self, relative: f64) -> f64 {
        relative + self.begin
    }

    /// Clamp a pixel X coordinate into `[0, width]`; NaN maps to 0.
    pub fn clamp_x(&self, x: f64) -> f64 {
        sanitize(x).clamp(0.0, self.width)
    }

    /// Clamp a clicked pixel X coordinate into the drawing area `[0, width)`, the same
    /// half-open range markers are shown in; NaN maps to 0.
    pub fn clamp_click_x(&self, x: f64) -> f64 {
        sanitize(x).clamp(0.0, self.width.next_down())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
