use indexmap::IndexMap;

use crate::foundation::core::{StateId, TagDefId};

/// State composition recorded by one sample.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleKind {
    /// The entity spent the whole sample in one state.
    Single(StateId),
    /// Fractional occupancy of several states within one sample.
    ///
    /// Weights are produced already normalized by the data producer and are not required
    /// to sum to one.
    Blend(IndexMap<StateId, f64>),
}

impl SampleKind {
    /// Weight of `state` within this sample (`0.0` when absent).
    pub fn weight_of(&self, state: StateId) -> f64 {
        match self {
            Self::Single(s) => {
                if *s == state {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Blend(weights) => weights.get(&state).copied().unwrap_or(0.0),
        }
    }

    /// Visit every `(state, weight)` pair in producer order.
    pub fn for_each_weight(&self, mut f: impl FnMut(StateId, f64)) {
        match self {
            Self::Single(s) => f(*s, 1.0),
            Self::Blend(weights) => {
                for (s, w) in weights {
                    f(*s, *w);
                }
            }
        }
    }

    /// The heaviest state and its share of the total weight.
    ///
    /// Ties keep the first state in producer order. Returns `None` for an empty blend.
    pub fn dominant(&self) -> Option<(StateId, f64)> {
        match self {
            Self::Single(s) => Some((*s, 1.0)),
            Self::Blend(weights) => {
                let total: f64 = weights.values().sum();
                let mut best: Option<(StateId, f64)> = None;
                for (s, w) in weights {
                    if best.is_none_or(|(_, bw)| *w > bw) {
                        best = Some((*s, *w));
                    }
                }
                best.map(|(s, w)| (s, if total > 0.0 { w / total } else { 0.0 }))
            }
        }
    }
}

/// One recorded interval of an entity's state history.
///
/// A sample holds from `time` until the next sample's `time`, or until the dataset end
/// for the last sample of an entity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawSample", into = "RawSample")]
pub struct Sample {
    /// Absolute start time in nanoseconds.
    pub time: u64,
    /// State composition.
    pub kind: SampleKind,
    /// Attribution weights keyed by tag definition, if the producer recorded tags.
    pub tags: Option<IndexMap<TagDefId, f64>>,
}

impl Sample {
    /// Single-state sample without tags.
    pub fn single(time: u64, state: u32) -> Self {
        Self {
            time,
            kind: SampleKind::Single(StateId(state)),
            tags: None,
        }
    }

    /// Blended sample without tags.
    pub fn blend(time: u64, weights: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            time,
            kind: SampleKind::Blend(weights.into_iter().map(|(s, w)| (StateId(s), w)).collect()),
            tags: None,
        }
    }

    /// Attach tag weights.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (usize, f64)>) -> Self {
        self.tags = Some(tags.into_iter().map(|(t, w)| (TagDefId(t), w)).collect());
        self
    }

    /// Start time as `f64`, the unit all range arithmetic happens in.
    pub fn start(&self) -> f64 {
        self.time as f64
    }
}

/// Wire shape of a sample: `{ "t": 100, "s": 1 | {"0": 0.25, ...}, "g": {"3": 0.5} }`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct RawSample {
    t: u64,
    s: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    g: Option<IndexMap<TagDefId, f64>>,
}

impl TryFrom<RawSample> for Sample {
    type Error = String;

    fn try_from(raw: RawSample) -> Result<Self, Self::Error> {
        let kind = match raw.s {
            serde_json::Value::Number(n) => {
                let v = n
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| format!("sample at {} has invalid state {n}", raw.t))?;
                SampleKind::Single(StateId(v))
            }
            serde_json::Value::Object(map) => {
                let mut weights = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    let state = k
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("sample at {} has invalid state key '{k}'", raw.t))?;
                    let w = v
                        .as_f64()
                        .filter(|w| w.is_finite())
                        .ok_or_else(|| format!("sample at {} has invalid weight for {k}", raw.t))?;
                    weights.insert(StateId(state), w);
                }
                SampleKind::Blend(weights)
            }
            other => {
                return Err(format!(
                    "sample at {} must carry a state or a state blend, got {other}",
                    raw.t
                ));
            }
        };

        if let Some(tags) = &raw.g
            && tags.values().any(|w| !w.is_finite())
        {
            return Err(format!("sample at {} has a non-finite tag weight", raw.t));
        }

        Ok(Self {
            time: raw.t,
            kind,
            tags: raw.g,
        })
    }
}

impl From<Sample> for RawSample {
    fn from(sample: Sample) -> Self {
        let s = match sample.kind {
            SampleKind::Single(state) => serde_json::Value::from(state.0),
            SampleKind::Blend(weights) => serde_json::Value::Object(
                weights
                    .into_iter()
                    .filter_map(|(s, w)| {
                        serde_json::Number::from_f64(w)
                            .map(|n| (s.0.to_string(), serde_json::Value::Number(n)))
                    })
                    .collect(),
            ),
        };
        Self {
            t: sample.time,
            s,
            g: sample.tags,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/sample.rs"]
mod tests;
