//! Time-weighted state occupancy.

use indexmap::IndexMap;

use crate::foundation::core::StateId;
use crate::foundation::math::ratio;
use crate::index::timeseries::TimeSeries;

/// State → fraction (or weight) map, in first-encountered order.
pub type StateMix = IndexMap<StateId, f64>;

/// Composition of the sample active at absolute `time`.
///
/// A single-state sample yields `{state: 1.0}`, a blend is returned verbatim, and no
/// active sample yields an empty map.
pub fn state_at(series: &TimeSeries, time: f64) -> StateMix {
    let mut mix = StateMix::new();
    if let Some(sample) = series.locate(time).and_then(|i| series.get(i)) {
        sample.kind.for_each_weight(|s, w| {
            *mix.entry(s).or_insert(0.0) += w;
        });
    }
    mix
}

/// Fraction of `[time, end]` spent in each state.
///
/// Each sample contributes `weight * span / (end - time)`. For an entity whose samples
/// cover the interval the fractions sum to one. A zero-width interval degrades to
/// [`state_at`]; an inverted one is empty.
pub fn state_over_interval(series: &TimeSeries, time: f64, end: f64) -> StateMix {
    if time.is_nan() || end.is_nan() || end < time {
        return StateMix::new();
    }
    if end == time {
        return state_at(series, time);
    }

    let width = end - time;
    let mut mix = StateMix::new();
    series.for_each_in_range(time, Some(end), |sample, _, span| {
        let share = span / width;
        sample.kind.for_each_weight(|s, w| {
            *mix.entry(s).or_insert(0.0) += w * share;
        });
    });
    mix
}

/// One legend row of [`StateTotals`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StateTotal {
    /// State the row describes.
    pub state: StateId,
    /// Summed weight across entities (entity count for single-state samples).
    pub total: f64,
    /// `total / sum` over all states.
    pub fraction: f64,
}

impl StateTotal {
    /// Legend annotation, e.g. `"3 (75%)"`; both numbers are floored.
    pub fn label(&self) -> String {
        format!(
            "{} ({}%)",
            self.total.floor(),
            (self.fraction * 100.0).floor()
        )
    }
}

/// Per-state totals across many entities, in first-encountered order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct StateTotals {
    /// One row per state seen.
    pub rows: Vec<StateTotal>,
    /// Sum of every row's total.
    pub sum: f64,
}

impl StateTotals {
    /// Row for `state`, if any entity contributed to it.
    pub fn get(&self, state: StateId) -> Option<&StateTotal> {
        self.rows.iter().find(|r| r.state == state)
    }
}

/// Sum per-entity compositions at absolute `time`, or over `[time, end]` when given.
pub fn state_totals<'a>(
    series: impl IntoIterator<Item = &'a TimeSeries>,
    time: f64,
    end: Option<f64>,
) -> StateTotals {
    let mut acc = StateMix::new();
    for s in series {
        let mix = match end {
            None => state_at(s, time),
            Some(end) => state_over_interval(s, time, end),
        };
        for (state, w) in mix {
            *acc.entry(state).or_insert(0.0) += w;
        }
    }

    let sum: f64 = acc.values().sum();
    StateTotals {
        rows: acc
            .into_iter()
            .map(|(state, total)| StateTotal {
                state,
                total,
                fraction: ratio(total, sum),
            })
            .collect(),
        sum,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/breakdown/state.rs"]
mod tests;
