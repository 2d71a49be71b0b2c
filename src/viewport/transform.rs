use crate::foundation::core::{Affine, MapGeometry};
use crate::foundation::math::{clamp_or_max, sanitize};

/// Pan/zoom state of the statemap drawing area.
///
/// The transform scales X only: `screen_x = map_x * scale + translate_x`. Rows are never
/// stretched, but `translate_y` is scaled along with the zoom and clamped against
/// `height * scale`, matching how the scene applies the matrix.
///
/// Every operation is a pure function returning a new viewport; the result always
/// satisfies `scale >= 1`, `translate_x ∈ [-(width*scale - width), 0]` and
/// `translate_y ∈ [-(height*scale - height), 0]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Horizontal zoom factor, `>= 1`.
    pub scale: f64,
    /// Horizontal translation in pixels, `<= 0`.
    pub translate_x: f64,
    /// Vertical translation in pixels, `<= 0`.
    pub translate_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    /// Unzoomed, unpanned viewport.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// `true` at 1:1 with no translation.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Most negative allowed `(translate_x, translate_y)` at the current scale.
    pub fn min_translation(&self, geom: &MapGeometry) -> (f64, f64) {
        (
            -(geom.width * self.scale - geom.width),
            -(geom.height * self.scale - geom.height),
        )
    }

    fn clamped(self, geom: &MapGeometry) -> Self {
        let (min_x, min_y) = self.min_translation(geom);
        Self {
            scale: self.scale,
            translate_x: clamp_or_max(self.translate_x, min_x, 0.0),
            translate_y: clamp_or_max(self.translate_y, min_y, 0.0),
        }
    }

    /// Translate by `(dx, dy)` pixels, then clamp. Non-finite deltas count as zero.
    pub fn pan_by(&self, geom: &MapGeometry, dx: f64, dy: f64) -> Self {
        Self {
            translate_x: self.translate_x + sanitize(dx),
            translate_y: self.translate_y + sanitize(dy),
            ..*self
        }
        .clamped(geom)
    }

    /// Multiply the scale by `factor`, keeping the time under `anchor` fixed.
    ///
    /// The anchor defaults to the horizontal center and is clamped into the map. Zooming
    /// out past 1:1 resets to [`Viewport::IDENTITY`]. A factor that is not finite and
    /// positive, or that would overflow the scale, leaves the viewport unchanged.
    pub fn zoom_by(&self, geom: &MapGeometry, factor: f64, anchor: Option<f64>) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return *self;
        }
        let anchor = anchor.map_or(geom.width / 2.0, |x| geom.clamp_x(x));

        let zoomed = Self {
            scale: self.scale * factor,
            translate_x: self.translate_x * factor + (1.0 - factor) * anchor,
            translate_y: self.translate_y * factor,
        };
        if !zoomed.scale.is_finite() {
            return *self;
        }
        if zoomed.scale < 1.0 {
            return Self::IDENTITY;
        }
        zoomed.clamped(geom)
    }

    /// Translate so that relative `time` sits at the horizontal center, then clamp.
    pub fn centered_on(&self, geom: &MapGeometry, time: f64) -> Self {
        let middle = geom.width / 2.0;
        Self {
            translate_x: -((time / geom.time_width) * geom.width * self.scale - middle),
            ..*self
        }
        .clamped(geom)
    }

    /// Time (relative to `begin`) under pixel `px`.
    pub fn pixel_to_time(&self, geom: &MapGeometry, px: f64) -> f64 {
        let base = (-self.translate_x / (self.scale * geom.width)) * geom.time_width;
        let offset = (px / geom.width) * (geom.time_width / self.scale);
        base + offset
    }

    /// Pixel at which relative `time` is drawn.
    pub fn time_to_pixel(&self, geom: &MapGeometry, time: f64) -> f64 {
        (time / geom.time_width) * geom.width * self.scale + self.translate_x
    }

    /// Relative times at the left and right edges of the drawing area.
    pub fn visible_range(&self, geom: &MapGeometry) -> (f64, f64) {
        (
            self.pixel_to_time(geom, 0.0),
            self.pixel_to_time(geom, geom.width),
        )
    }

    /// Nanoseconds visible across the drawing area.
    pub fn visible_span(&self, geom: &MapGeometry) -> f64 {
        geom.time_width / self.scale
    }

    /// `true` when pixel `x` lies within the drawing area (`0 <= x < width`).
    pub fn is_visible(&self, geom: &MapGeometry, x: f64) -> bool {
        x >= 0.0 && x < geom.width
    }

    /// The statemap transform as an affine matrix `[scale, 0, 0, 1, tx, ty]`.
    pub fn to_affine(&self) -> Affine {
        Affine::new([
            self.scale,
            0.0,
            0.0,
            1.0,
            self.translate_x,
            self.translate_y,
        ])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/transform.rs"]
mod tests;
