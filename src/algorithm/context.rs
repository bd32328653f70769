//! Per-stay query context shared by the score calculators and feature aggregators

use chrono::{Duration, NaiveDateTime};

use crate::codes::{Concept, EventTable, ItemCodeMap, normalize};
use crate::models::{IcuStay, Measurement};
use crate::store::{EventSource, TimeWindow};

/// Minimum, maximum and mean of the non-missing values in a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ValueSummary {
    /// Summarise a set of values; `None` when there are none
    #[must_use]
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        (count > 0).then(|| Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// A normalised reading tagged with its concept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub time: NaiveDateTime,
    pub concept: Concept,
    pub value: f64,
}

/// Everything needed to query one stay's events
#[derive(Clone, Copy)]
pub struct StayContext<'a> {
    pub store: &'a dyn EventSource,
    pub codes: &'a ItemCodeMap,
    pub stay: &'a IcuStay,
    /// Observation window anchored at ICU admission
    pub window: TimeWindow,
}

impl<'a> StayContext<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn EventSource,
        codes: &'a ItemCodeMap,
        stay: &'a IcuStay,
        observation: Duration,
    ) -> Self {
        Self {
            store,
            codes,
            stay,
            window: stay.observation_window(observation),
        }
    }

    /// The same stay queried over a different window
    #[must_use]
    pub const fn with_window(self, window: TimeWindow) -> Self {
        Self { window, ..self }
    }

    /// Chart readings of the concepts, converted to their reporting unit
    #[must_use]
    pub fn chart_readings(&self, concepts: &[Concept]) -> Vec<Reading> {
        let itemids = self.codes.codes_of(concepts);
        let measurements = self
            .store
            .chart_measurements(self.stay.stay_id, &itemids, &self.window);
        self.normalise(EventTable::Chart, measurements)
    }

    /// Lab readings of the concepts for the stay's subject
    #[must_use]
    pub fn lab_readings(&self, concepts: &[Concept]) -> Vec<Reading> {
        let itemids = self.codes.codes_of(concepts);
        let measurements =
            self.store
                .lab_measurements(self.stay.subject_id, &itemids, &self.window);
        self.normalise(EventTable::Lab, measurements)
    }

    /// Output readings of the concepts
    #[must_use]
    pub fn output_readings(&self, concepts: &[Concept]) -> Vec<Reading> {
        let itemids = self.codes.codes_of(concepts);
        let measurements = self
            .store
            .output_measurements(self.stay.stay_id, &itemids, &self.window);
        self.normalise(EventTable::Output, measurements)
    }

    /// Summary of the chart values of one or more concepts sharing a unit
    #[must_use]
    pub fn chart_summary(&self, concepts: &[Concept]) -> Option<ValueSummary> {
        ValueSummary::of(self.chart_readings(concepts).into_iter().map(|r| r.value))
    }

    /// Summary of the lab values of one or more concepts sharing a unit
    #[must_use]
    pub fn lab_summary(&self, concepts: &[Concept]) -> Option<ValueSummary> {
        ValueSummary::of(self.lab_readings(concepts).into_iter().map(|r| r.value))
    }

    fn normalise(&self, table: EventTable, measurements: Vec<Measurement>) -> Vec<Reading> {
        measurements
            .into_iter()
            .filter_map(|measurement| {
                let concept = self.codes.concept_of(table, measurement.itemid)?;
                let value = normalize(concept, measurement.value)?;
                Some(Reading {
                    time: measurement.time,
                    concept,
                    value,
                })
            })
            .collect()
    }
}
