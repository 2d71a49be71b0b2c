//! Texts shown next to the marker, the span indicator, the entity detail and the tag
//! panel.

use crate::dataset::sample::SampleKind;
use crate::dataset::statemap::{Entity, Statemap};
use crate::foundation::units::time_units;
use crate::viewport::transform::Viewport;

/// Marker text for relative `time`: `offset = <t>[, <t + begin> overall][ (Epoch + <n>s)]`.
///
/// The absolute part appears whenever the view is zoomed or the map does not start at
/// the trace origin.
pub fn time_to_text(map: &Statemap, viewport: &Viewport, time: f64) -> String {
    let begin = map.geometry().begin;
    let mut text = format!("offset = {}", time_units(time));
    if viewport.scale != 1.0 || begin != 0.0 {
        text.push_str(&format!(", {} overall", time_units(time + begin)));
    }
    if let Some([secs, nanos]) = map.start() {
        let epoch = secs as f64 + (time + nanos as f64) / 1e9;
        text.push_str(&format!(" (Epoch + {}s)", epoch.floor()));
    }
    text
}

/// Span indicator: `span = <visible span>[; <marker text of the left edge>]`.
pub fn span_text(map: &Statemap, viewport: &Viewport) -> String {
    let geom = map.geometry();
    let mut text = format!("span = {}", time_units(viewport.visible_span(geom)));
    if viewport.scale != 1.0 || geom.begin != 0.0 {
        text.push_str("; ");
        text.push_str(&time_to_text(
            map,
            viewport,
            viewport.pixel_to_time(geom, 0.0),
        ));
    }
    text
}

/// Per-entity description of one sample.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EntityDetail {
    /// Entity name.
    pub entity: String,
    /// Sample index within the entity.
    pub sample: usize,
    /// Absolute sample start.
    pub time: f64,
    /// Absolute start of the next transition (or the dataset end).
    pub end: f64,
    /// Rendered text.
    pub text: String,
}

/// Describe sample `index` of `entity`:
/// `<kind> <name>[ (<description>)], <state> at <t> for <duration>`.
///
/// For a blend the state part is `<n>% <dominant state>`.
pub fn entity_detail(map: &Statemap, entity: &Entity, index: usize) -> Option<EntityDetail> {
    let sample = entity.series.get(index)?;
    let (time, end) = entity.series.extent(index)?;

    let mut text = format!("{} {}", map.entity_kind(), entity.name);
    if let Some(desc) = &entity.description {
        text.push_str(&format!(" ({desc})"));
    }
    match &sample.kind {
        SampleKind::Single(state) => {
            text.push_str(&format!(", {}", map.state_name(*state)));
        }
        SampleKind::Blend(_) => {
            let (state, share) = sample.kind.dominant()?;
            text.push_str(&format!(
                ", {}% {}",
                (share * 100.0).floor(),
                map.state_name(state)
            ));
        }
    }
    text.push_str(&format!(
        " at {} for {}",
        time_units(time),
        time_units(end - time)
    ));

    Some(EntityDetail {
        entity: entity.name.clone(),
        sample: index,
        time,
        end,
        text,
    })
}

/// Tag panel header: `[<Kind> <name> ]by <key> (at <t>|over span)`, capitalized, with a
/// trailing colon. `marker` is the relative marker time, if any.
pub fn tag_header(
    map: &Statemap,
    pinned: Option<&Entity>,
    key: &str,
    marker: Option<f64>,
) -> String {
    let mut header = String::new();
    if let Some(e) = pinned {
        header.push_str(&format!("{} {} ", map.entity_kind(), e.name));
    }
    header.push_str(&format!("by {key} "));
    match marker {
        Some(t) => header.push_str(&format!("at {}", time_units(t))),
        None => header.push_str("over span"),
    }

    let mut chars = header.chars();
    let mut out: String = chars
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    out.push_str(chars.as_str());
    out.push(':');
    out
}

#[cfg(test)]
#[path = "../../tests/unit/session/detail.rs"]
mod tests;
