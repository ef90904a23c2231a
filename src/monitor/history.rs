use serde::Serialize;
use std::collections::VecDeque;

use crate::air_quality::{Pollutant, round_half_up};
use crate::devices::DerivedReading;

/// Fixed-capacity rolling window; the oldest entry is dropped on overflow.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    /// A zero capacity is bumped to one so the latest value is always kept.
    /// Storage grows on demand, so a large capacity costs nothing up front.
    pub fn new(capacity: usize) -> Self {
        History {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Min / max / mean of one series. The mean is rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl SeriesSummary {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return None;
        }
        Some(SeriesSummary {
            min,
            max,
            average: round_half_up(sum / count as f64 * 10.0) / 10.0,
        })
    }
}

impl History<DerivedReading> {
    pub fn summary(&self, pollutant: Pollutant) -> Option<SeriesSummary> {
        SeriesSummary::from_values(self.iter().map(|r| r.pollutants().get(pollutant)))
    }

    pub fn aqi_summary(&self) -> Option<SeriesSummary> {
        SeriesSummary::from_values(self.iter().map(|r| r.aqi as f64))
    }
}
