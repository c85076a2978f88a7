//! BDD step definitions for live merge feature

use std::sync::Arc;

use cucumber::{given, then, when};

use iot_console::model::{Project, SensorReading};
use iot_console::reconcile::merge;

use crate::world::ConsoleWorld;

#[given(expr = "a project with sensor {string} on pin {string} holding {int} reading(s)")]
fn project_with_sensor(world: &mut ConsoleWorld, title: String, pin: String, readings: usize) {
    let data: Vec<serde_json::Value> = (0..readings)
        .map(|n| serde_json::json!({"datetime": format!("t{}", n), "value": n as f64}))
        .collect();
    let sensor = serde_json::json!({
        "id": format!("s-{}", pin),
        "title": title,
        "pinNumber": pin,
        "data": data,
    });

    let mut sensors = world
        .project
        .as_ref()
        .map(|p| {
            p.sensors
                .iter()
                .map(|s| serde_json::to_value(s.as_ref()).unwrap())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    sensors.push(sensor);

    let project: Project = serde_json::from_value(serde_json::json!({
        "projectId": "p1",
        "projectName": "Greenhouse",
        "sensordata": sensors,
    }))
    .unwrap();
    world.project = Some(Arc::new(project));
}

#[when(expr = "a reading of {float} arrives for pin {string}")]
fn reading_arrives(world: &mut ConsoleWorld, value: f64, pin: String) {
    let before = world.project().clone();
    let after = merge(&before, &SensorReading::new(pin, value, "2024-01-01T00:00:00.000Z"));
    world.previous = Some(before);
    world.project = Some(after);
}

#[then(expr = "sensor {string} holds {int} reading(s)")]
fn sensor_holds(world: &mut ConsoleWorld, title: String, count: usize) {
    let sensor = world
        .project()
        .sensors
        .iter()
        .find(|s| s.title == title)
        .expect("sensor not found");
    assert_eq!(sensor.data.len(), count);
}

#[then(expr = "the last reading of sensor {string} is {float}")]
fn last_reading_is(world: &mut ConsoleWorld, title: String, value: f64) {
    let sensor = world
        .project()
        .sensors
        .iter()
        .find(|s| s.title == title)
        .expect("sensor not found");
    assert_eq!(sensor.data.last().map(|d| d.value), Some(value));
}

#[then(expr = "sensor {string} is shared with the previous snapshot")]
fn sensor_is_shared(world: &mut ConsoleWorld, title: String) {
    let previous = world.previous.as_ref().expect("no previous snapshot");
    let position = previous
        .sensors
        .iter()
        .position(|s| s.title == title)
        .expect("sensor not found");
    assert!(Arc::ptr_eq(
        &previous.sensors[position],
        &world.project().sensors[position]
    ));
}

#[then("the snapshot is unchanged")]
fn snapshot_unchanged(world: &mut ConsoleWorld) {
    let previous = world.previous.as_ref().expect("no previous snapshot");
    assert!(Arc::ptr_eq(previous, world.project()));
}
