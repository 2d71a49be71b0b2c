use crate::dataset::sample::Sample;

/// Sorted per-entity sample store with time lookups.
///
/// Samples are ordered by start time. Sample `i` is active over
/// `[samples[i].time, samples[i + 1].time)`; the last sample is active until the dataset
/// end handed to [`TimeSeries::new`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
    end: f64,
}

/// One sample visited by a range walk.
#[derive(Clone, Copy, Debug)]
pub struct RangeVisit<'a> {
    /// The visited sample.
    pub sample: &'a Sample,
    /// Its index within the series.
    pub index: usize,
    /// Overlap between the query range and the sample's interval.
    ///
    /// Point queries report a span of exactly `1.0`; it is a count, not a measure.
    pub span: f64,
}

impl TimeSeries {
    /// Wrap samples that are already sorted by time; `end` is the absolute dataset end.
    pub fn new(samples: Vec<Sample>, end: f64) -> Self {
        debug_assert!(
            samples.windows(2).all(|w| w[0].time <= w[1].time),
            "samples must be sorted by time"
        );
        Self { samples, end }
    }

    /// All samples in time order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when the entity recorded nothing.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`.
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Absolute dataset end time.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Index of the sample active at `time`.
    ///
    /// This is the largest `i` with `samples[i].time <= time`; equal times resolve to the
    /// later index. `None` when the series is empty or `time` precedes the first sample.
    pub fn locate(&self, time: f64) -> Option<usize> {
        if time.is_nan() {
            return None;
        }
        self.samples
            .partition_point(|s| s.start() <= time)
            .checked_sub(1)
    }

    /// `[start, end)` of the sample at `index`, the end being the next sample's start or
    /// the dataset end.
    pub fn extent(&self, index: usize) -> Option<(f64, f64)> {
        let sample = self.samples.get(index)?;
        let end = self
            .samples
            .get(index + 1)
            .map(Sample::start)
            .unwrap_or(self.end);
        Some((sample.start(), end))
    }

    /// Walk the samples overlapping `[time, end_time]`.
    ///
    /// Without `end_time` this is a point query yielding at most one visit with span 1.
    /// A range with `end_time < time` yields nothing.
    pub fn range(&self, time: f64, end_time: Option<f64>) -> RangeVisits<'_> {
        let mut walk = RangeVisits {
            series: self,
            next: 0,
            time,
            end_time,
            done: true,
        };

        if self.samples.is_empty() || time.is_nan() {
            return walk;
        }

        match end_time {
            None => {
                if let Some(idx) = self.locate(time) {
                    walk.next = idx;
                    walk.done = false;
                }
            }
            Some(end) => {
                if end.is_nan() || end < time {
                    return walk;
                }
                walk.next = self.locate(time).unwrap_or(0);
                walk.done = false;
            }
        }
        walk
    }

    /// Callback form of [`TimeSeries::range`]: `visit(sample, index, clipped_span)`.
    pub fn for_each_in_range(
        &self,
        time: f64,
        end_time: Option<f64>,
        mut visit: impl FnMut(&Sample, usize, f64),
    ) {
        for v in self.range(time, end_time) {
            visit(v.sample, v.index, v.span);
        }
    }
}

/// Iterator returned by [`TimeSeries::range`].
#[derive(Clone, Debug)]
pub struct RangeVisits<'a> {
    series: &'a TimeSeries,
    next: usize,
    time: f64,
    end_time: Option<f64>,
    done: bool,
}

impl<'a> Iterator for RangeVisits<'a> {
    type Item = RangeVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let samples = &self.series.samples;
        let index = self.next;
        let sample = samples.get(index)?;

        let Some(end) = self.end_time else {
            self.done = true;
            return Some(RangeVisit {
                sample,
                index,
                span: 1.0,
            });
        };

        if sample.start() > end {
            self.done = true;
            return None;
        }

        let from = sample.start().max(self.time);
        let to = match samples.get(index + 1) {
            Some(next) => next.start().min(end),
            None => end.min(self.series.end),
        };

        self.next += 1;
        if self.next >= samples.len() {
            self.done = true;
        }

        Some(RangeVisit {
            sample,
            index,
            span: (to - from).max(0.0),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/index/timeseries.rs"]
mod tests;
