//! Occupancy by tag value within one state.

use std::fmt;

use indexmap::IndexMap;

use crate::dataset::tags::TagCatalog;
use crate::foundation::core::StateId;
use crate::foundation::units::percent;
use crate::index::timeseries::TimeSeries;

/// What to break down: time in `state`, grouped by the values of `key`.
#[derive(Clone, Debug, PartialEq)]
pub struct TagQuery<'a> {
    /// State whose time is being attributed.
    pub state: StateId,
    /// Tag key whose values form the buckets.
    pub key: &'a str,
    /// Absolute query time (range start).
    pub time: f64,
    /// Absolute range end; `None` for a point query.
    pub end: Option<f64>,
}

/// Label of one breakdown row.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagLabel {
    /// A tag value.
    Value(String),
    /// Synthetic row folding everything past the display budget.
    Ellipsis,
}

impl fmt::Display for TagLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(v),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// One row of a [`TagBreakdown`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TagRow {
    /// Tag value, or the ellipsis.
    pub label: TagLabel,
    /// Share of the divisor, in percent.
    pub percent: f64,
}

impl TagRow {
    /// Percentage text, e.g. `12.50%`.
    pub fn percent_text(&self) -> String {
        percent(self.percent)
    }
}

/// Ranked tag value percentages plus their total.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct TagBreakdown {
    /// Rows sorted by descending percentage; ties keep first-encountered order.
    pub rows: Vec<TagRow>,
    /// Sum of every row's percentage, including rows later folded by
    /// [`TagBreakdown::truncate`].
    pub total: f64,
}

impl TagBreakdown {
    /// `true` when no sample contributed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep at most `budget` rows, folding the rest into one [`TagLabel::Ellipsis`] row
    /// that carries their summed percentage.
    pub fn truncate(mut self, budget: usize) -> Self {
        if self.rows.len() > budget {
            let folded: f64 = self.rows.split_off(budget).iter().map(|r| r.percent).sum();
            self.rows.push(TagRow {
                label: TagLabel::Ellipsis,
                percent: folded,
            });
        }
        self
    }

    /// Percentage for tag value `value`, if it has a row of its own.
    pub fn percent_of(&self, value: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| matches!(&r.label, TagLabel::Value(v) if v == value))
            .map(|r| r.percent)
    }
}

/// Attribute time spent in `query.state` to the values of `query.key`.
///
/// Only samples with a non-zero weight for the state that carry tag weights contribute;
/// each tag weight whose definition belongs to the state and sets the key adds
/// `span * weight` to that value. Point queries divide by the entity count, ranges by
/// `(end - time) * entity_count`.
pub fn tag_breakdown<'a>(
    series: impl IntoIterator<Item = &'a TimeSeries>,
    catalog: &TagCatalog,
    query: &TagQuery<'_>,
) -> TagBreakdown {
    let mut by_value: IndexMap<&str, f64> = IndexMap::new();
    let mut entities = 0usize;

    for s in series {
        entities += 1;
        s.for_each_in_range(query.time, query.end, |sample, _, span| {
            if sample.kind.weight_of(query.state) == 0.0 {
                return;
            }
            let Some(tags) = &sample.tags else {
                return;
            };
            for (id, w) in tags {
                let Some(value) = catalog
                    .get(*id)
                    .filter(|d| d.state == query.state)
                    .and_then(|d| d.value(query.key))
                else {
                    continue;
                };
                *by_value.entry(value).or_insert(0.0) += span * w;
            }
        });
    }

    let divisor = match query.end {
        None => entities as f64,
        Some(end) => (end - query.time) * entities as f64,
    };
    if divisor.is_nan() || divisor <= 0.0 || by_value.is_empty() {
        return TagBreakdown::default();
    }

    let mut rows: Vec<TagRow> = by_value
        .into_iter()
        .map(|(v, sum)| TagRow {
            label: TagLabel::Value(v.to_string()),
            percent: sum / divisor * 100.0,
        })
        .collect();
    rows.sort_by(|a, b| b.percent.total_cmp(&a.percent));

    let total = rows.iter().map(|r| r.percent).sum();
    TagBreakdown { rows, total }
}

#[cfg(test)]
#[path = "../../tests/unit/breakdown/tag.rs"]
mod tests;
