use std::collections::{BTreeMap, BTreeSet};

use crate::breakdown::tag::TagBreakdown;
use crate::foundation::core::{Affine, EntityId, StateId, StatemapId};

/// Handle to a vertical marker line drawn by a [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct MarkerHandle(pub u64);

/// Handle to a text element drawn by a [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct LabelHandle(pub u64);

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Text starts at `x`.
    Start,
    /// Text ends at `x`.
    End,
}

/// Contents of the tag panel shown while a state is being inspected.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TagPanel {
    /// Statemap the selection belongs to.
    pub statemap: StatemapId,
    /// Inspected state.
    pub state: StateId,
    /// Its legend name.
    pub state_name: String,
    /// Tag keys available for the state, sorted.
    pub keys: Vec<String>,
    /// Key the breakdown is grouped by.
    pub active_key: Option<String>,
    /// Tag value currently painted on the map.
    pub active_value: Option<String>,
    /// Breakdown header, e.g. `By reason over span:`.
    pub header: Option<String>,
    /// Ranked rows, already truncated to the display budget.
    pub breakdown: Option<TagBreakdown>,
}

/// Thin drawing collaborator driven by the session.
///
/// The session decides *what* is shown; implementations decide how. Handles returned
/// by `draw_*` are released exactly once through the matching `remove_*`.
pub trait Renderer {
    /// Draw the vertical marker at pixel `x`.
    fn draw_marker(&mut self, x: f64) -> MarkerHandle;
    /// Remove a marker line.
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// Draw text at `(x, y)` in map coordinates.
    fn draw_label(&mut self, x: f64, y: f64, text: &str, anchor: Anchor) -> LabelHandle;
    /// Draw text over the legend entry of `state`.
    fn annotate_legend(&mut self, state: StateId, text: &str) -> LabelHandle;
    /// Remove a text element.
    fn remove_label(&mut self, handle: LabelHandle);
    /// Highlight the legend entry of `state`.
    fn highlight_legend(&mut self, state: StateId);
    /// Remove the highlight from the legend entry of `state`.
    fn unhighlight_legend(&mut self, state: StateId);
    /// Re-weight one sample rectangle.
    fn set_entity_paint(&mut self, entity: EntityId, sample: usize, opacity: f64);
    /// Restore every re-weighted rectangle.
    fn clear_entity_paint(&mut self);
    /// Apply the statemap transform.
    fn set_transform(&mut self, transform: Affine);
    /// Replace the span label text.
    fn set_span_label(&mut self, text: &str);
    /// Show (or with `None`, clear) the tag panel.
    fn show_tag_panel(&mut self, panel: Option<&TagPanel>);
}

/// One call received by a [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum RenderOp {
    DrawMarker {
        handle: MarkerHandle,
        x: f64,
    },
    RemoveMarker {
        handle: MarkerHandle,
    },
    DrawLabel {
        handle: LabelHandle,
        x: f64,
        y: f64,
        text: String,
        anchor: Anchor,
    },
    AnnotateLegend {
        handle: LabelHandle,
        state: StateId,
        text: String,
    },
    RemoveLabel {
        handle: LabelHandle,
    },
    HighlightLegend {
        state: StateId,
    },
    UnhighlightLegend {
        state: StateId,
    },
    SetEntityPaint {
        entity: EntityId,
        sample: usize,
        opacity: f64,
    },
    ClearEntityPaint,
    SetTransform {
        coeffs: [f64; 6],
    },
    SetSpanLabel {
        text: String,
    },
    ShowTagPanel {
        panel: Option<TagPanel>,
    },
}

/// Headless [`Renderer`] that records every call and tracks what is currently live.
///
/// Used by the CLI `replay` command and by tests to check that replaced artifacts are
/// released.
#[derive(Clone, Debug)]
pub struct RecordingRenderer {
    ops: Vec<RenderOp>,
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, f64>,
    labels: BTreeMap<LabelHandle, String>,
    stale_removals: usize,
    highlighted: BTreeSet<StateId>,
    paint: BTreeMap<(EntityId, usize), f64>,
    transform: Affine,
    span_label: String,
    tag_panel: Option<TagPanel>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            next_handle: 1,
            markers: BTreeMap::new(),
            labels: BTreeMap::new(),
            stale_removals: 0,
            highlighted: BTreeSet::new(),
            paint: BTreeMap::new(),
            transform: Affine::IDENTITY,
            span_label: String::new(),
            tag_panel: None,
        }
    }
}

impl RecordingRenderer {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    /// Drain the recorded calls, keeping the live state.
    pub fn take_ops(&mut self) -> Vec<RenderOp> {
        std::mem::take(&mut self.ops)
    }

    /// X positions of live markers, in drawing order.
    pub fn live_markers(&self) -> Vec<f64> {
        self.markers.values().copied().collect()
    }

    /// Texts of live labels and legend annotations, in drawing order.
    pub fn live_labels(&self) -> Vec<&str> {
        self.labels.values().map(String::as_str).collect()
    }

    /// Removals of handles that were never drawn or already removed.
    pub fn stale_removals(&self) -> usize {
        self.stale_removals
    }

    /// Highlighted legend states.
    pub fn highlighted(&self) -> &BTreeSet<StateId> {
        &self.highlighted
    }

    /// Current paint opacity per `(entity, sample)`.
    pub fn paint(&self) -> &BTreeMap<(EntityId, usize), f64> {
        &self.paint
    }

    /// Last transform applied.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Last span label text.
    pub fn span_label(&self) -> &str {
        &self.span_label
    }

    /// Tag panel currently shown.
    pub fn tag_panel(&self) -> Option<&TagPanel> {
        self.tag_panel.as_ref()
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }
}

impl Renderer for RecordingRenderer {
    fn draw_marker(&mut self, x: f64) -> MarkerHandle {
        let handle = MarkerHandle(self.handle());
        self.markers.insert(handle, x);
        self.ops.push(RenderOp::DrawMarker { handle, x });
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_none() {
            self.stale_removals += 1;
        }
        self.ops.push(RenderOp::RemoveMarker { handle });
    }

    fn draw_label(&mut self, x: f64, y: f64, text: &str, anchor: Anchor) -> LabelHandle {
        let handle = LabelHandle(self.handle());
        self.labels.insert(handle, text.to_string());
        self.ops.push(RenderOp::DrawLabel {
            handle,
            x,
            y,
            text: text.to_string(),
            anchor,
        });
        handle
    }

    fn annotate_legend(&mut self, state: StateId, text: &str) -> LabelHandle {
        let handle = LabelHandle(self.handle());
        self.labels.insert(handle, text.to_string());
        self.ops.push(RenderOp::AnnotateLegend {
            handle,
            state,
            text: text.to_string(),
        });
        handle
    }

    fn remove_label(&mut self, handle: LabelHandle) {
        if self.labels.remove(&handle).is_none() {
            self.stale_removals += 1;
        }
        self.ops.push(RenderOp::RemoveLabel { handle });
    }

    fn highlight_legend(&mut self, state: StateId) {
        self.highlighted.insert(state);
        self.ops.push(RenderOp::HighlightLegend { state });
    }

    fn unhighlight_legend(&mut self, state: StateId) {
        self.highlighted.remove(&state);
        self.ops.push(RenderOp::UnhighlightLegend { state });
    }

    fn set_entity_paint(&mut self, entity: EntityId, sample: usize, opacity: f64) {
        self.paint.insert((entity, sample), opacity);
        self.ops.push(RenderOp::SetEntityPaint {
            entity,
            sample,
            opacity,
        });
    }

    fn clear_entity_paint(&mut self) {
        self.paint.clear();
        self.ops.push(RenderOp::ClearEntityPaint);
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
        self.ops.push(RenderOp::SetTransform {
            coeffs: transform.as_coeffs(),
        });
    }

    fn set_span_label(&mut self, text: &str) {
        self.span_label = text.to_string();
        self.ops.push(RenderOp::SetSpanLabel {
            text: text.to_string(),
        });
    }

    fn show_tag_panel(&mut self, panel: Option<&TagPanel>) {
        self.tag_panel = panel.cloned();
        self.ops.push(RenderOp::ShowTagPanel {
            panel: panel.cloned(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render.rs"]
mod tests;
