use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::{
    dataset::sample::{Sample, SampleKind},
    dataset::tags::TagDefinition,
    foundation::core::{StateId, StatemapId},
    foundation::error::{StatemapError, StatemapResult},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A complete statemap dataset as emitted by the offline renderer.
///
/// The document is a pure data model: it is deserialized from JSON, checked with
/// [`Dataset::validate`], and turned into a queryable [`crate::Statemap`].
pub struct Dataset {
    /// Statemap instance identifier.
    #[serde(default)]
    pub id: StatemapId,
    /// Optional title, used only for summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Total nanoseconds spanned by the unzoomed statemap.
    pub time_width: u64,
    /// Offset of the visible window's start from the trace origin.
    #[serde(default)]
    pub begin: u64,
    /// Epoch reference as `[seconds, nanosecond remainder]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<[u64; 2]>,
    /// Drawing area width in pixels.
    pub pixel_width: u32,
    /// Drawing area height in pixels.
    pub pixel_height: u32,
    /// Prefix used for entity element ids by the renderer.
    #[serde(default = "default_entity_prefix")]
    pub entity_prefix: String,
    /// Display noun for an entity ("CPU", "Thread", ...).
    #[serde(default = "default_entity_kind")]
    pub entity_kind: String,
    /// State legend, in legend order.
    #[serde(default)]
    pub states: Vec<StateDef>,
    /// Tag definition catalogue; the array index is the [`crate::TagDefId`].
    #[serde(default)]
    pub tags: Vec<TagDefinition>,
    /// Entities in vertical order, keyed by name.
    pub entities: IndexMap<String, EntityDef>, // document order is position
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One legend entry.
pub struct StateDef {
    /// Display name.
    pub name: String,
    /// Numeric value samples refer to.
    pub value: u32,
    /// Color chosen by the offline renderer; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// One entity's description and state history.
pub struct EntityDef {
    /// Free-form description shown next to the entity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Samples, strictly increasing by time.
    #[serde(default)]
    pub data: Vec<Sample>,
}

fn default_entity_prefix() -> String {
    "statemap-entity-".to_string()
}

fn default_entity_kind() -> String {
    "Entity".to_string()
}

impl Dataset {
    /// Parse a dataset from JSON text.
    pub fn from_json(text: &str) -> StatemapResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate dataset invariants strictly.
    ///
    /// [`crate::Statemap::from_dataset`] tolerates some of these problems (unsorted
    /// samples, dangling tag references); this check reports all of them.
    pub fn validate(&self) -> StatemapResult<()> {
        if self.time_width == 0 {
            return Err(StatemapError::validation("timeWidth must be > 0"));
        }
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(StatemapError::validation(
                "pixelWidth/pixelHeight must be > 0",
            ));
        }

        let mut values = BTreeSet::new();
        for state in &self.states {
            if state.name.trim().is_empty() {
                return Err(StatemapError::validation(format!(
                    "state {} must have a non-empty name",
                    state.value
                )));
            }
            if !values.insert(state.value) {
                return Err(StatemapError::validation(format!(
                    "state \"{}\" has value ({}) that conflicts with another state",
                    state.name, state.value
                )));
            }
        }
        let known_state = |s: StateId| values.is_empty() || values.contains(&s.0);

        for (i, tag) in self.tags.iter().enumerate() {
            if !known_state(tag.state) {
                return Err(StatemapError::validation(format!(
                    "tag definition {i} refers to unknown state {}",
                    tag.state
                )));
            }
        }

        for (name, entity) in &self.entities {
            if name.trim().is_empty() {
                return Err(StatemapError::validation("entity name must be non-empty"));
            }
            for pair in entity.data.windows(2) {
                if pair[1].time <= pair[0].time {
                    return Err(StatemapError::validation(format!(
                        "entity '{name}' has out-of-order sample at {} (after {})",
                        pair[1].time, pair[0].time
                    )));
                }
            }
            for sample in &entity.data {
                validate_sample(name, sample, &known_state, self.tags.len())?;
            }
        }

        Ok(())
    }
}

fn validate_sample(
    entity: &str,
    sample: &Sample,
    known_state: &impl Fn(StateId) -> bool,
    ntags: usize,
) -> StatemapResult<()> {
    match &sample.kind {
        SampleKind::Single(s) => {
            if !known_state(*s) {
                return Err(StatemapError::validation(format!(
                    "entity '{entity}' sample at {} refers to unknown state {s}",
                    sample.time
                )));
            }
        }
        SampleKind::Blend(weights) => {
            if weights.is_empty() {
                return Err(StatemapError::validation(format!(
                    "entity '{entity}' sample at {} has an empty state blend",
                    sample.time
                )));
            }
            for (s, w) in weights {
                if !known_state(*s) {
                    return Err(StatemapError::validation(format!(
                        "entity '{entity}' sample at {} refers to unknown state {s}",
                        sample.time
                    )));
                }
                if *w < 0.0 {
                    return Err(StatemapError::validation(format!(
                        "entity '{entity}' sample at {} has a negative weight",
                        sample.time
                    )));
                }
            }
        }
    }

    if let Some(tags) = &sample.tags {
        for (id, w) in tags {
            if id.0 >= ntags {
                return Err(StatemapError::validation(format!(
                    "entity '{entity}' sample at {} refers to unknown tag {}",
                    sample.time, id.0
                )));
            }
            if *w < 0.0 {
                return Err(StatemapError::validation(format!(
                    "entity '{entity}' sample at {} has a negative tag weight",
                    sample.time
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/model.rs"]
mod tests;
