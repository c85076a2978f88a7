//! Merging live readings into a project snapshot
//!
//! Snapshots are immutable. A merge produces a new [`Project`] that shares
//! every untouched sensor with the previous one through `Arc`.

use std::sync::Arc;

use crate::model::{Project, Sensor, SensorReading};

/// Append `reading` to the first sensor on the reading's pin
///
/// Returns the input snapshot itself (pointer-equal) when no sensor is on
/// that pin. When several sensors share the pin only the first one in
/// project order receives the point. Merging the same reading twice
/// appends it twice.
pub fn merge(project: &Arc<Project>, reading: &SensorReading) -> Arc<Project> {
    let Some(index) = project
        .sensors
        .iter()
        .position(|sensor| sensor.pin_number == reading.pin)
    else {
        return Arc::clone(project);
    };

    let mut sensor = Sensor::clone(&project.sensors[index]);
    sensor.data.push(reading.to_point());

    let mut next = Project::clone(project);
    next.sensors[index] = Arc::new(sensor);
    Arc::new(next)
}
