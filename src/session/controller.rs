use std::sync::Arc;

use crate::{
    breakdown::state::{StateTotals, state_totals},
    breakdown::tag::{TagBreakdown, TagQuery, tag_breakdown},
    dataset::statemap::Statemap,
    foundation::core::{EntityId, StateId},
    foundation::units::signed_time_units,
    session::detail::{EntityDetail, entity_detail, span_text, tag_header, time_to_text},
    session::gesture::{EntityHit, Gesture},
    session::render::{Anchor, LabelHandle, MarkerHandle, Renderer, TagPanel},
    viewport::transform::Viewport,
};

// Label placement in map coordinates: marker text sits above the map, delta text below
// it, the entity detail to the left of its strip.
const TEXT_NUDGE_X: f64 = 3.0;
const MARKER_TEXT_Y: f64 = -5.0;
const DELTA_TEXT_GAP: f64 = 12.0;
const DETAIL_TEXT_X: f64 = -7.0;
const DETAIL_ELBOW_Y: f64 = 12.0;

/// Session configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionOpts {
    /// Tag breakdown rows shown before the rest fold into `...`.
    pub tag_rows: usize,
    /// Recenter on the marker when zooming with a marker placed.
    pub zoom_follows_marker: bool,
    /// Factor used by the zoom-in shorthand.
    pub zoom_in: f64,
    /// Factor used by the zoom-out shorthand.
    pub zoom_out: f64,
    /// Pixels moved by the pan shorthands.
    pub pan_step: f64,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            tag_rows: 20,
            zoom_follows_marker: true,
            zoom_in: 1.25,
            zoom_out: 0.8,
            pan_step: 50.0,
        }
    }
}

/// Result of dispatching one gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The gesture changed session state.
    Applied,
    /// A precondition did not hold; nothing changed.
    Ignored,
}

#[derive(Debug)]
struct Drawn {
    x: f64,
    line: MarkerHandle,
    label: LabelHandle,
}

#[derive(Debug)]
struct Delta {
    time: f64,
    text: String,
    drawn: Option<Drawn>,
}

#[derive(Debug)]
struct TimeMarker {
    time: f64,
    text: String,
    drawn: Option<Drawn>,
    totals: StateTotals,
    legend: Vec<LabelHandle>,
    delta: Option<Delta>,
}

#[derive(Debug)]
struct Detail {
    entity: EntityId,
    info: EntityDetail,
    label: LabelHandle,
}

#[derive(Debug)]
struct Selection {
    state: StateId,
    keys: Vec<String>,
    key: Option<String>,
    value: Option<String>,
    header: Option<String>,
    breakdown: Option<TagBreakdown>,
}

/// Serializable view of the marker.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MarkerSnapshot {
    /// Time relative to `begin`.
    pub time: f64,
    /// Screen X, or `None` while scrolled out of view.
    pub x: Option<f64>,
    /// Label text.
    pub text: String,
}

/// Serializable view of a session, for replay output and tests.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionSnapshot {
    /// Current viewport.
    pub viewport: Viewport,
    /// Span indicator text.
    pub span_label: String,
    /// Primary marker.
    pub marker: Option<MarkerSnapshot>,
    /// Delta sub-marker; its text is the signed delta from the primary marker.
    pub delta: Option<MarkerSnapshot>,
    /// Legend totals at the marker.
    pub state_totals: Option<StateTotals>,
    /// Inspected entity.
    pub detail: Option<EntityDetail>,
    /// State inspection and tag breakdown.
    pub selection: Option<TagPanel>,
}

/// Interactive state for one statemap: viewport, marker, detail and state selection.
///
/// The session is the only writer of that state. Gestures are handled synchronously and
/// fully settle every derived summary before [`Session::handle`] returns.
pub struct Session<R: Renderer> {
    map: Arc<Statemap>,
    renderer: R,
    opts: SessionOpts,
    viewport: Viewport,
    marker: Option<TimeMarker>,
    detail: Option<Detail>,
    selection: Option<Selection>,
}

impl<R: Renderer> Session<R> {
    /// Start a session at the identity viewport and publish the initial span label.
    pub fn new(map: Arc<Statemap>, renderer: R, opts: SessionOpts) -> Self {
        let mut session = Self {
            map,
            renderer,
            opts,
            viewport: Viewport::IDENTITY,
            marker: None,
            detail: None,
            selection: None,
        };
        session.publish_viewport();
        session
    }

    /// The shared statemap.
    pub fn map(&self) -> &Arc<Statemap> {
        &self.map
    }

    /// Session configuration.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The rendering collaborator.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the rendering collaborator.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Consume the session, returning the renderer.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Dispatch one gesture.
    #[tracing::instrument(skip(self, gesture), fields(gesture = gesture.name()))]
    pub fn handle(&mut self, gesture: Gesture) -> Outcome {
        let outcome = match gesture {
            Gesture::Pan { dx, dy } => {
                let next = self.viewport.pan_by(self.map.geometry(), dx, dy);
                self.set_viewport(next)
            }
            Gesture::Zoom { factor, anchor } => self.zoom(factor, anchor),
            Gesture::PrimaryClick { x, hit } => self.primary_click(x, hit),
            Gesture::ModifierClick { x } => self.modifier_click(x),
            Gesture::LegendClick { state } => self.legend_click(state),
            Gesture::TagKeyClick { key } => self.tag_key_click(key),
            Gesture::TagValueClick { value } => self.tag_value_click(value),
            Gesture::DismissMarker => self.dismiss_marker(),
            Gesture::DismissDetail => self.dismiss_detail(),
        };
        if outcome == Outcome::Applied {
            tracing::debug!(viewport = ?self.viewport, "gesture applied");
        }
        outcome
    }

    /// Serializable view of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            viewport: self.viewport,
            span_label: span_text(&self.map, &self.viewport),
            marker: self.marker.as_ref().map(|m| MarkerSnapshot {
                time: m.time,
                x: m.drawn.as_ref().map(|d| d.x),
                text: m.text.clone(),
            }),
            delta: self
                .marker
                .as_ref()
                .and_then(|m| m.delta.as_ref())
                .map(|d| MarkerSnapshot {
                    time: d.time,
                    x: d.drawn.as_ref().map(|dr| dr.x),
                    text: d.text.clone(),
                }),
            state_totals: self.marker.as_ref().map(|m| m.totals.clone()),
            detail: self.detail.as_ref().map(|d| d.info.clone()),
            selection: self.selection.as_ref().map(|s| self.panel(s)),
        }
    }

    fn zoom(&mut self, factor: f64, anchor: Option<f64>) -> Outcome {
        if !factor.is_finite() || factor <= 0.0 {
            return ignored("zoom factor must be finite and positive");
        }
        let geom = *self.map.geometry();
        let mut next = self.viewport.zoom_by(&geom, factor, anchor);
        if self.opts.zoom_follows_marker
            && let Some(m) = &self.marker
        {
            next = next.centered_on(&geom, m.time);
        }
        self.set_viewport(next)
    }

    fn set_viewport(&mut self, next: Viewport) -> Outcome {
        if next == self.viewport {
            return ignored("viewport unchanged");
        }
        self.viewport = next;
        self.publish_viewport();
        self.reposition_markers();
        self.refresh_tags();
        Outcome::Applied
    }

    fn publish_viewport(&mut self) {
        self.renderer.set_transform(self.viewport.to_affine());
        let text = span_text(&self.map, &self.viewport);
        self.renderer.set_span_label(&text);
    }

    fn primary_click(&mut self, x: f64, hit: Option<EntityHit>) -> Outcome {
        let geom = *self.map.geometry();
        let x = geom.clamp_click_x(x);
        let time = self.viewport.pixel_to_time(&geom, x);

        self.release_marker();
        self.release_detail();

        let totals = state_totals(
            self.map.entities().iter().map(|e| &e.series),
            geom.absolute(time),
            None,
        );
        let legend = totals
            .rows
            .iter()
            .map(|row| self.renderer.annotate_legend(row.state, &row.label()))
            .collect();
        let mut marker = TimeMarker {
            time,
            text: time_to_text(&self.map, &self.viewport, time),
            drawn: None,
            totals,
            legend,
            delta: None,
        };
        marker.drawn = Some(self.draw_at(x, MARKER_TEXT_Y, &marker.text));
        tracing::debug!(time, "marker placed");
        self.marker = Some(marker);

        if let Some(hit) = hit {
            self.inspect_entity(hit, geom.absolute(time));
        }

        self.refresh_tags();
        Outcome::Applied
    }

    fn inspect_entity(&mut self, hit: EntityHit, time: f64) {
        let Some(entity) = self.map.entity(hit.entity) else {
            tracing::trace!(entity = hit.entity.0, "hit names no entity");
            return;
        };
        let Some(index) = hit.sample.or_else(|| entity.series.locate(time)) else {
            tracing::trace!(entity = %entity.name, "no sample under the click");
            return;
        };
        let Some(info) = entity_detail(&self.map, entity, index) else {
            tracing::trace!(entity = %entity.name, index, "hit names no sample");
            return;
        };

        let strip = self.map.strip_height();
        let pos = entity.position() as f64;
        let upper = pos * strip < self.map.geometry().height / 2.0;
        let (dir, anchor) = if upper {
            (1.0, Anchor::End)
        } else {
            (-1.0, Anchor::Start)
        };
        let y = strip * (pos + 0.5) + DETAIL_ELBOW_Y * dir;
        let label = self
            .renderer
            .draw_label(DETAIL_TEXT_X, y, &info.text, anchor);

        self.detail = Some(Detail {
            entity: entity.id,
            info,
            label,
        });
    }

    fn modifier_click(&mut self, x: f64) -> Outcome {
        let geom = *self.map.geometry();
        let x = geom.clamp_click_x(x);
        let time = self.viewport.pixel_to_time(&geom, x);

        let Some(base) = self.marker.as_ref().map(|m| m.time) else {
            return ignored("no marker to compare against");
        };
        if let Some(old) = self.marker.as_mut().and_then(|m| m.delta.take()) {
            self.erase(old.drawn);
        }

        let text = signed_time_units(time - base);
        let drawn = self.draw_at(x, geom.height + DELTA_TEXT_GAP, &text);
        if let Some(m) = self.marker.as_mut() {
            m.delta = Some(Delta {
                time,
                text,
                drawn: Some(drawn),
            });
        }
        Outcome::Applied
    }

    fn legend_click(&mut self, state: StateId) -> Outcome {
        if self.map.tags().is_empty() {
            return ignored("statemap has no tags");
        }
        let known = self.map.states().is_empty()
            || self.map.states().iter().any(|s| s.value == state.0);
        if !known {
            return ignored("state not in legend");
        }

        let previous = self.clear_selection();
        if previous == Some(state) {
            return Outcome::Applied;
        }

        self.renderer.highlight_legend(state);
        self.selection = Some(Selection {
            state,
            keys: self.map.tags().keys_for(state),
            key: None,
            value: None,
            header: None,
            breakdown: None,
        });
        self.refresh_tags();
        Outcome::Applied
    }

    fn tag_key_click(&mut self, key: String) -> Outcome {
        let Some(sel) = self.selection.as_mut() else {
            return ignored("no state inspected");
        };
        if !sel.keys.contains(&key) {
            return ignored("tag key not defined for state");
        }

        let had_paint = sel.value.take().is_some();
        if sel.key.as_deref() == Some(key.as_str()) {
            sel.key = None;
            sel.header = None;
            sel.breakdown = None;
        } else {
            sel.key = Some(key);
        }
        if had_paint {
            self.renderer.clear_entity_paint();
        }
        self.refresh_tags();
        Outcome::Applied
    }

    fn tag_value_click(&mut self, value: String) -> Outcome {
        let Some(sel) = self.selection.as_mut() else {
            return ignored("no state inspected");
        };
        let Some(key) = sel.key.clone() else {
            return ignored("no tag key active");
        };
        if !self.map.tags().has_value(sel.state, &key, &value) {
            return ignored("tag value not defined for key");
        }

        if sel.value.take().is_some_and(|v| v == value) {
            self.renderer.clear_entity_paint();
            self.show_panel();
            return Outcome::Applied;
        }
        let state = sel.state;
        sel.value = Some(value.clone());

        self.renderer.clear_entity_paint();
        let matching = self.map.tags().matching(state, &key, &value);
        let mut painted = 0usize;
        for entity in self.map.entities() {
            for (index, sample) in entity.series.samples().iter().enumerate() {
                if sample.kind.weight_of(state) == 0.0 {
                    continue;
                }
                let Some(tags) = &sample.tags else {
                    continue;
                };
                let ratio: f64 = tags
                    .iter()
                    .filter(|(id, _)| matching.contains(*id))
                    .map(|(_, w)| *w)
                    .sum();
                if ratio == 0.0 {
                    continue;
                }
                self.renderer.set_entity_paint(entity.id, index, 1.0 - ratio);
                painted += 1;
            }
        }
        tracing::debug!(%key, %value, painted, "tag value painted");
        self.show_panel();
        Outcome::Applied
    }

    fn dismiss_marker(&mut self) -> Outcome {
        if self.marker.is_none() {
            return ignored("no marker");
        }
        self.release_marker();
        self.refresh_tags();
        Outcome::Applied
    }

    fn dismiss_detail(&mut self) -> Outcome {
        if self.detail.is_none() {
            return ignored("no entity detail");
        }
        self.release_detail();
        self.refresh_tags();
        Outcome::Applied
    }

    fn draw_at(&mut self, x: f64, y: f64, text: &str) -> Drawn {
        let geom = self.map.geometry();
        let (tx, anchor) = if x < geom.width / 2.0 {
            (x + TEXT_NUDGE_X, Anchor::Start)
        } else {
            (x - TEXT_NUDGE_X, Anchor::End)
        };
        Drawn {
            x,
            line: self.renderer.draw_marker(x),
            label: self.renderer.draw_label(tx, y, text, anchor),
        }
    }

    fn erase(&mut self, drawn: Option<Drawn>) {
        if let Some(d) = drawn {
            self.renderer.remove_marker(d.line);
            self.renderer.remove_label(d.label);
        }
    }

    fn release_marker(&mut self) {
        let Some(marker) = self.marker.take() else {
            return;
        };
        self.erase(marker.drawn);
        for handle in marker.legend {
            self.renderer.remove_label(handle);
        }
        if let Some(delta) = marker.delta {
            self.erase(delta.drawn);
        }
    }

    fn release_detail(&mut self) {
        if let Some(detail) = self.detail.take() {
            self.renderer.remove_label(detail.label);
        }
    }

    /// Exit state inspection, returning the state that was inspected.
    fn clear_selection(&mut self) -> Option<StateId> {
        let sel = self.selection.take()?;
        self.renderer.unhighlight_legend(sel.state);
        if sel.value.is_some() {
            self.renderer.clear_entity_paint();
        }
        self.renderer.show_tag_panel(None);
        Some(sel.state)
    }

    /// Redraw the marker and delta after a viewport change, hiding whichever falls
    /// outside the drawing area.
    fn reposition_markers(&mut self) {
        let Some(mut marker) = self.marker.take() else {
            return;
        };
        let geom = *self.map.geometry();

        marker.text = time_to_text(&self.map, &self.viewport, marker.time);
        let old = marker.drawn.take();
        self.erase(old);
        let x = self.viewport.time_to_pixel(&geom, marker.time);
        if self.viewport.is_visible(&geom, x) {
            marker.drawn = Some(self.draw_at(x, MARKER_TEXT_Y, &marker.text));
        }

        if let Some(delta) = marker.delta.as_mut() {
            let old = delta.drawn.take();
            self.erase(old);
            let x = self.viewport.time_to_pixel(&geom, delta.time);
            if self.viewport.is_visible(&geom, x) {
                delta.drawn = Some(self.draw_at(x, geom.height + DELTA_TEXT_GAP, &delta.text));
            }
        }

        self.marker = Some(marker);
    }

    /// Recompute the tag breakdown for the active key and publish the panel.
    ///
    /// With a marker this is a point query at the marker, otherwise a range over the
    /// visible span; a detail pins it to that entity.
    fn refresh_tags(&mut self) {
        let Some(sel) = self.selection.as_ref() else {
            return;
        };
        let computed = sel.key.as_deref().map(|key| {
            let geom = self.map.geometry();
            let pinned = self.detail.as_ref().and_then(|d| self.map.entity(d.entity));
            let marker = self.marker.as_ref().map(|m| m.time);

            let (time, end) = match marker {
                Some(t) => (geom.absolute(t), None),
                None => {
                    let (from, to) = self.viewport.visible_range(geom);
                    (geom.absolute(from), Some(geom.absolute(to)))
                }
            };
            let query = TagQuery {
                state: sel.state,
                key,
                time,
                end,
            };
            let breakdown = match pinned {
                Some(e) => tag_breakdown([&e.series], self.map.tags(), &query),
                None => tag_breakdown(
                    self.map.entities().iter().map(|e| &e.series),
                    self.map.tags(),
                    &query,
                ),
            };
            tracing::debug!(
                key,
                rows = breakdown.rows.len(),
                total = breakdown.total,
                "tag breakdown"
            );
            (
                tag_header(&self.map, pinned, key, marker),
                breakdown.truncate(self.opts.tag_rows),
            )
        });

        if let Some(sel) = self.selection.as_mut() {
            let (header, breakdown) = computed.unzip();
            sel.header = header;
            sel.breakdown = breakdown;
        }
        self.show_panel();
    }

    fn show_panel(&mut self) {
        if let Some(sel) = self.selection.as_ref() {
            let panel = self.panel(sel);
            self.renderer.show_tag_panel(Some(&panel));
        }
    }

    fn panel(&self, sel: &Selection) -> TagPanel {
        TagPanel {
            statemap: self.map.id(),
            state: sel.state,
            state_name: self.map.state_name(sel.state),
            keys: sel.keys.clone(),
            active_key: sel.key.clone(),
            active_value: sel.value.clone(),
            header: sel.header.clone(),
            breakdown: sel.breakdown.clone(),
        }
    }
}

fn ignored(why: &'static str) -> Outcome {
    tracing::trace!(why, "gesture ignored");
    Outcome::Ignored
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
