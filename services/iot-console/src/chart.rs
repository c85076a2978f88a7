//! Shaping sensor series for display

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{CombinedGraph, Project, Sensor, SensorData};

/// The most recent `maxDataPoints` readings of a sensor
pub fn display_window(sensor: &Sensor) -> &[SensorData] {
    last_points(&sensor.data, sensor.graph_info.max_data_points)
}

pub fn last_points(data: &[SensorData], count: usize) -> &[SensorData] {
    let start = data.len().saturating_sub(count);
    &data[start..]
}

/// Render a reading timestamp as `HH:MM:SS` (UTC), or unchanged if it does not parse
pub fn time_label(datetime: &str) -> String {
    match DateTime::parse_from_rfc3339(datetime) {
        Ok(parsed) => parsed.with_timezone(&Utc).format("%H:%M:%S").to_string(),
        Err(_) => datetime.to_string(),
    }
}

/// One x-axis position of a combined chart
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub datetime: String,
    /// Sensor title to value
    pub values: BTreeMap<String, f64>,
}

/// Merge the series of a combined graph's sensors into rows keyed by timestamp
///
/// Rows appear in the order their timestamp is first seen, walking the
/// project's sensors in project order. Sensors sharing a title overwrite
/// each other within a row.
pub fn combined_rows(project: &Project, graph: &CombinedGraph) -> Vec<CombinedRow> {
    let mut rows: Vec<CombinedRow> = Vec::new();

    let members = project.sensors.iter().filter(|sensor| {
        graph
            .sensors
            .iter()
            .any(|member| member.sensor_id == sensor.id)
    });

    for sensor in members {
        for point in &sensor.data {
            match rows.iter_mut().find(|row| row.datetime == point.datetime) {
                Some(row) => {
                    row.values.insert(sensor.title.clone(), point.value);
                }
                None => rows.push(CombinedRow {
                    datetime: point.datetime.clone(),
                    values: BTreeMap::from([(sensor.title.clone(), point.value)]),
                }),
            }
        }
    }

    rows
}

/// Optional time bounds for combined graph aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("from".to_string(), iso_timestamp(from)));
        }
        if let Some(to) = self.to {
            pairs.push(("to".to_string(), iso_timestamp(to)));
        }
        pairs
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
