use crate::foundation::core::{EntityId, StateId};
use crate::session::controller::SessionOpts;

/// The entity rectangle under a primary click.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityHit {
    /// Entity whose strip was clicked.
    pub entity: EntityId,
    /// Index of the clicked sample; located from the click time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<usize>,
}

/// Normalized user input, dispatched centrally by [`crate::Session::handle`].
///
/// Pixel coordinates are relative to the drawing area; out-of-range values are clamped.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    /// Translate the view by `(dx, dy)` pixels.
    Pan {
        /// Horizontal delta.
        #[serde(default)]
        dx: f64,
        /// Vertical delta.
        #[serde(default)]
        dy: f64,
    },
    /// Multiply the zoom by `factor` around `anchor` (center when absent).
    Zoom {
        /// Zoom factor; `> 1` zooms in.
        factor: f64,
        /// Pixel whose time stays fixed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<f64>,
    },
    /// Place the time marker, optionally inspecting an entity.
    PrimaryClick {
        /// Pixel X of the click.
        x: f64,
        /// Entity rectangle under the pointer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hit: Option<EntityHit>,
    },
    /// Place the delta sub-marker.
    ModifierClick {
        /// Pixel X of the click.
        x: f64,
    },
    /// Toggle inspection of a state.
    LegendClick {
        /// Clicked legend state.
        state: StateId,
    },
    /// Toggle the tag key the inspection is grouped by.
    TagKeyClick {
        /// Clicked tag key.
        key: String,
    },
    /// Toggle painting of one tag value.
    TagValueClick {
        /// Clicked tag value.
        value: String,
    },
    /// Remove the time marker (click on its label).
    DismissMarker,
    /// Remove the entity detail (click on its label).
    DismissDetail,
}

impl Gesture {
    /// Short gesture name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pan { .. } => "pan",
            Self::Zoom { .. } => "zoom",
            Self::PrimaryClick { .. } => "primary_click",
            Self::ModifierClick { .. } => "modifier_click",
            Self::LegendClick { .. } => "legend_click",
            Self::TagKeyClick { .. } => "tag_key_click",
            Self::TagValueClick { .. } => "tag_value_click",
            Self::DismissMarker => "dismiss_marker",
            Self::DismissDetail => "dismiss_detail",
        }
    }
}

/// Toolbar buttons, expanded with the configured factors and step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shorthand {
    /// Zoom in by [`SessionOpts::zoom_in`].
    ZoomIn,
    /// Zoom out by [`SessionOpts::zoom_out`].
    ZoomOut,
    /// Pan left by [`SessionOpts::pan_step`].
    PanLeft,
    /// Pan right by [`SessionOpts::pan_step`].
    PanRight,
    /// Pan up by [`SessionOpts::pan_step`].
    PanUp,
    /// Pan down by [`SessionOpts::pan_step`].
    PanDown,
}

impl Shorthand {
    /// The gesture this button stands for.
    pub fn to_gesture(self, opts: &SessionOpts) -> Gesture {
        let step = opts.pan_step;
        match self {
            Self::ZoomIn => Gesture::Zoom {
                factor: opts.zoom_in,
                anchor: None,
            },
            Self::ZoomOut => Gesture::Zoom {
                factor: opts.zoom_out,
                anchor: None,
            },
            Self::PanLeft => Gesture::Pan { dx: step, dy: 0.0 },
            Self::PanRight => Gesture::Pan { dx: -step, dy: 0.0 },
            Self::PanUp => Gesture::Pan { dx: 0.0, dy: step },
            Self::PanDown => Gesture::Pan { dx: 0.0, dy: -step },
        }
    }
}

/// One entry of a gesture script: a full gesture object or a shorthand name.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// `"zoom_in"`, `"pan_left"`, ...
    Shorthand(Shorthand),
    /// `{"gesture": "primary_click", "x": 120}`
    Gesture(Gesture),
}

impl ScriptStep {
    /// Expand into a gesture.
    pub fn resolve(self, opts: &SessionOpts) -> Gesture {
        match self {
            Self::Shorthand(s) => s.to_gesture(opts),
            Self::Gesture(g) => g,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/gesture.rs"]
mod tests;
