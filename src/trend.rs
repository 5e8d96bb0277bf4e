use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{RiskLevel, TrendPoint};
use crate::risk;

/// Per-period counts of entities by risk level; the buckets are disjoint and
/// cover every counted entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Ordered score history per tracked entity over a fixed period axis.
///
/// The axis is declared up front (e.g. "Jan".."May") and defines display
/// order; recordings slot into it without ever reordering existing points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendTracker {
    axis: Vec<String>,
    series: HashMap<Uuid, Vec<TrendPoint>>,
}

impl TrendTracker {
    pub fn new(axis: Vec<String>) -> Self {
        Self {
            axis,
            series: HashMap::new(),
        }
    }

    pub fn axis(&self) -> &[String] {
        &self.axis
    }

    fn axis_index(&self, period: &str) -> Result<usize, EngineError> {
        self.axis
            .iter()
            .position(|p| p == period)
            .ok_or_else(|| EngineError::UnknownPeriod(period.to_string()))
    }

    /// Appends or overwrites the point for a period. Points for periods not
    /// yet present are inserted at their axis position; earlier recordings
    /// keep their order.
    pub fn record(&mut self, entity: Uuid, period: &str, value: f64) -> Result<(), EngineError> {
        let target = self.axis_index(period)?;
        let axis = &self.axis;
        let points = self.series.entry(entity).or_default();

        if let Some(existing) = points.iter_mut().find(|p| p.period == period) {
            existing.value = value;
            return Ok(());
        }

        let insert_at = points
            .iter()
            .position(|p| {
                axis.iter().position(|a| a == &p.period).unwrap_or(usize::MAX) > target
            })
            .unwrap_or(points.len());
        points.insert(
            insert_at,
            TrendPoint {
                period: period.to_string(),
                value,
            },
        );
        Ok(())
    }

    /// Full ordered trend; empty for an entity never recorded.
    pub fn series(&self, entity: Uuid) -> Vec<TrendPoint> {
        self.series.get(&entity).cloned().unwrap_or_default()
    }

    /// Cohort distribution at one period. Entities without a reading for the
    /// period are skipped; every entity with a reading lands in exactly one
    /// bucket.
    pub fn aggregate(&self, entities: &[Uuid], period: &str) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for entity in entities {
            let Some(points) = self.series.get(entity) else {
                continue;
            };
            let Some(point) = points.iter().find(|p| p.period == period) else {
                continue;
            };
            match risk::level_for(point.value) {
                RiskLevel::High => counts.high += 1,
                RiskLevel::Medium => counts.medium += 1,
                RiskLevel::Low => counts.low += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_axis() -> Vec<String> {
        ["Jan", "Feb", "Mar", "Apr", "May"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    #[test]
    fn recordings_land_in_axis_order() {
        let mut tracker = TrendTracker::new(month_axis());
        let id = Uuid::new_v4();
        tracker.record(id, "Mar", 61.0).unwrap();
        tracker.record(id, "Jan", 45.0).unwrap();
        tracker.record(id, "May", 85.0).unwrap();
        tracker.record(id, "Feb", 52.0).unwrap();

        let series = tracker.series(id);
        let periods: Vec<&str> = series.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["Jan", "Feb", "Mar", "May"]);
    }

    #[test]
    fn overwrite_replaces_value_without_reordering() {
        let mut tracker = TrendTracker::new(month_axis());
        let id = Uuid::new_v4();
        tracker.record(id, "Jan", 45.0).unwrap();
        tracker.record(id, "Feb", 52.0).unwrap();
        tracker.record(id, "Jan", 48.0).unwrap();

        let series = tracker.series(id);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].period, "Jan");
        assert_eq!(series[0].value, 48.0);
        assert_eq!(series[1].period, "Feb");
    }

    #[test]
    fn unknown_period_is_rejected() {
        let mut tracker = TrendTracker::new(month_axis());
        let err = tracker.record(Uuid::new_v4(), "Week 1", 50.0).unwrap_err();
        assert!(err.to_string().contains("Week 1"));
    }

    #[test]
    fn unknown_entity_has_an_empty_series() {
        let tracker = TrendTracker::new(month_axis());
        assert!(tracker.series(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn aggregate_partitions_entities_by_level() {
        let mut tracker = TrendTracker::new(month_axis());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let unrecorded = Uuid::new_v4();
        tracker.record(a, "May", 85.0).unwrap();
        tracker.record(b, "May", 62.0).unwrap();
        tracker.record(c, "May", 25.0).unwrap();

        let counts = tracker.aggregate(&[a, b, c, unrecorded], "May");
        assert_eq!(counts.high, 1);
        assert_eq!(counts.medium, 1);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn aggregate_skips_entities_without_a_reading_for_the_period() {
        let mut tracker = TrendTracker::new(month_axis());
        let a = Uuid::new_v4();
        tracker.record(a, "Jan", 85.0).unwrap();
        let counts = tracker.aggregate(&[a], "May");
        assert_eq!(counts.total(), 0);
    }
}
