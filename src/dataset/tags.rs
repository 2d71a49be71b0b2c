use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{StateId, TagDefId};

const STATE_FIELD: &str = "state";
const TAG_FIELD: &str = "tag";

/// What a fractional tag weight within a sample means.
///
/// On the wire a definition is a flat object: `{"state": 1, "tag": "a1", "reason": "io"}`.
/// Every field other than `state` and `tag` is a tag key; non-string values are kept in
/// their JSON text form.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    try_from = "serde_json::Map<String, serde_json::Value>",
    into = "serde_json::Map<String, serde_json::Value>"
)]
pub struct TagDefinition {
    /// State this tag attributes time within.
    pub state: StateId,
    /// Producer's raw tag string, if any.
    pub tag: Option<String>,
    /// Tag key → tag value pairs.
    pub fields: BTreeMap<String, String>,
}

impl TagDefinition {
    /// Value of `key`, if this definition sets it.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for TagDefinition {
    type Error = String;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let state = map
            .get(STATE_FIELD)
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| "tag definition requires a numeric \"state\"".to_string())?;

        let mut tag = None;
        let mut fields = BTreeMap::new();
        for (k, v) in map {
            if k == STATE_FIELD {
                continue;
            }
            let text = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            if k == TAG_FIELD {
                tag = Some(text);
            } else {
                fields.insert(k, text);
            }
        }

        Ok(Self {
            state: StateId(state),
            tag,
            fields,
        })
    }
}

impl From<TagDefinition> for serde_json::Map<String, serde_json::Value> {
    fn from(def: TagDefinition) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(STATE_FIELD.to_string(), def.state.0.into());
        if let Some(tag) = def.tag {
            map.insert(TAG_FIELD.to_string(), tag.into());
        }
        for (k, v) in def.fields {
            map.insert(k, v.into());
        }
        map
    }
}

/// Immutable per-statemap catalogue of tag definitions, indexed by [`TagDefId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagCatalog {
    defs: Vec<TagDefinition>,
}

impl TagCatalog {
    /// Build a catalogue; the position of each definition is its id.
    pub fn new(defs: Vec<TagDefinition>) -> Self {
        Self { defs }
    }

    /// `true` when the statemap carries no tags at all.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Look up a definition by id.
    pub fn get(&self, id: TagDefId) -> Option<&TagDefinition> {
        self.defs.get(id.0)
    }

    /// Sorted, de-duplicated tag keys defined for `state`.
    pub fn keys_for(&self, state: StateId) -> Vec<String> {
        let keys: BTreeSet<&str> = self
            .defs
            .iter()
            .filter(|d| d.state == state)
            .flat_map(|d| d.fields.keys().map(String::as_str))
            .collect();
        keys.into_iter().map(str::to_string).collect()
    }

    /// `true` when some definition for `state` sets `key` to `value`.
    pub fn has_value(&self, state: StateId, key: &str, value: &str) -> bool {
        self.defs
            .iter()
            .any(|d| d.state == state && d.value(key) == Some(value))
    }

    /// Ids of every definition for `state` whose `key` equals `value`.
    pub fn matching(&self, state: StateId, key: &str, value: &str) -> BTreeSet<TagDefId> {
        self.defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.state == state && d.value(key) == Some(value))
            .map(|(i, _)| TagDefId(i))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/tags.rs"]
mod tests;
