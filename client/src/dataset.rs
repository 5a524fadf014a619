use std::collections::HashMap;

use chrono::{DateTime, Local, Utc};
use common::req::{SensorReading, SensorType};

/// One chart row: a display time bucket holding at most one value per
/// sensor type. A type with no reading in the bucket stays absent and
/// renders as a gap, never as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub bucket: String,
    pub values: HashMap<SensorType, f64>,
}

/// Numeric reductions over one type's series within the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    /// Value of the chronologically last reading.
    pub current: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// Display bucket key: local time truncated to the minute.
pub fn bucket_key(timestamp: DateTime<Utc>) -> String {
    let local: DateTime<Local> = timestamp.into();
    local.format("%d/%m/%Y %H:%M").to_string()
}

/// Reshape a flat reading list (possibly spanning several sensor types)
/// into timestamp-bucketed multi-series rows, ascending in time.
///
/// Source order is not trusted. A duplicate (type, bucket) keeps the last
/// value in timestamp order.
pub fn aggregate(readings: &[SensorReading]) -> Vec<AggregatedRow> {
    let mut sorted: Vec<&SensorReading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    // minute truncation keeps equal bucket keys adjacent after the sort,
    // so comparing against the last row is enough to group
    let mut rows: Vec<AggregatedRow> = Vec::new();
    for reading in sorted {
        let key = bucket_key(reading.timestamp);
        match rows.last_mut() {
            Some(row) if row.bucket == key => {
                row.values.insert(reading.sensor_type, reading.value);
            }
            _ => {
                let mut values = HashMap::new();
                values.insert(reading.sensor_type, reading.value);
                rows.push(AggregatedRow { bucket: key, values });
            }
        }
    }
    rows
}

/// Summary statistics over the full (ungrouped) value set of one type.
/// `None` when the series is empty.
pub fn summarize(readings: &[SensorReading], sensor_type: SensorType) -> Option<SeriesSummary> {
    let mut series: Vec<&SensorReading> = readings
        .iter()
        .filter(|r| r.sensor_type == sensor_type)
        .collect();
    series.sort_by_key(|r| r.timestamp);

    let values: Vec<f64> = series.iter().map(|r| r.value).collect();
    let current = *values.last()?;
    let sum: f64 = values.iter().sum();
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);

    Some(SeriesSummary {
        current,
        average: sum / values.len() as f64,
        max,
        min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(id: i64, sensor_type: SensorType, value: f64, min: u32, sec: u32) -> SensorReading {
        SensorReading {
            id,
            device_id: 7,
            sensor_type,
            value,
            unit: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, min, sec).unwrap(),
        }
    }

    #[test]
    fn buckets_merge_types_and_keep_gaps() {
        let readings = vec![
            reading(1, SensorType::Temperature, 20.0, 0, 0),
            reading(2, SensorType::Humidity, 55.0, 0, 30),
            reading(3, SensorType::Temperature, 21.0, 5, 0),
        ];
        let rows = aggregate(&readings);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[&SensorType::Temperature], 20.0);
        assert_eq!(rows[0].values[&SensorType::Humidity], 55.0);
        assert_eq!(rows[1].values[&SensorType::Temperature], 21.0);
        // the gap stays a gap
        assert!(!rows[1].values.contains_key(&SensorType::Humidity));
        assert_ne!(rows[0].bucket, rows[1].bucket);
    }

    #[test]
    fn rows_come_out_ascending_regardless_of_input_order() {
        let readings = vec![
            reading(1, SensorType::Temperature, 23.0, 9, 0),
            reading(2, SensorType::Temperature, 21.0, 1, 0),
            reading(3, SensorType::Temperature, 22.0, 5, 0),
        ];
        let rows = aggregate(&readings);
        let values: Vec<f64> = rows
            .iter()
            .map(|r| r.values[&SensorType::Temperature])
            .collect();
        assert_eq!(values, vec![21.0, 22.0, 23.0]);
    }

    #[test]
    fn duplicate_type_in_bucket_keeps_last_by_time() {
        let readings = vec![
            reading(2, SensorType::Temperature, 20.5, 0, 45),
            reading(1, SensorType::Temperature, 20.0, 0, 10),
        ];
        let rows = aggregate(&readings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[&SensorType::Temperature], 20.5);
    }

    #[test]
    fn empty_input_yields_no_rows_and_no_summary() {
        assert!(aggregate(&[]).is_empty());
        assert_eq!(summarize(&[], SensorType::Temperature), None);
    }

    #[test]
    fn summary_reductions() {
        let readings = vec![
            reading(1, SensorType::Temperature, 10.0, 0, 0),
            reading(2, SensorType::Temperature, 20.0, 1, 0),
            reading(3, SensorType::Temperature, 30.0, 2, 0),
        ];
        let summary = summarize(&readings, SensorType::Temperature).unwrap();
        assert_eq!(summary.average, 20.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.current, 30.0);
    }

    #[test]
    fn summary_current_follows_time_not_input_order() {
        let readings = vec![
            reading(2, SensorType::Temperature, 25.0, 9, 0),
            reading(1, SensorType::Temperature, 19.0, 1, 0),
        ];
        let summary = summarize(&readings, SensorType::Temperature).unwrap();
        assert_eq!(summary.current, 25.0);
    }

    #[test]
    fn summary_ignores_other_types() {
        let readings = vec![
            reading(1, SensorType::Temperature, 21.0, 0, 0),
            reading(2, SensorType::Humidity, 60.0, 0, 0),
        ];
        let summary = summarize(&readings, SensorType::Temperature).unwrap();
        assert_eq!(summary.current, 21.0);
        assert_eq!(summary.max, 21.0);
    }

    #[test]
    fn single_reading_summary_is_that_value_everywhere() {
        let readings = vec![reading(1, SensorType::Noise, 42.5, 0, 0)];
        let summary = summarize(&readings, SensorType::Noise).unwrap();
        assert_eq!(summary.current, 42.5);
        assert_eq!(summary.average, 42.5);
        assert_eq!(summary.max, 42.5);
        assert_eq!(summary.min, 42.5);
    }
}
