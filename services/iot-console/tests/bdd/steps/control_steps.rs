//! BDD step definitions for button controls feature

use cucumber::{given, then, when};

use iot_console::controls::{ButtonControl, Gesture};
use iot_console::model::{Button, SwitchState};

use crate::world::ConsoleWorld;

fn parse_state(s: &str) -> SwitchState {
    match s {
        "on" => SwitchState::On,
        "off" => SwitchState::Off,
        other => panic!("Unknown state: {}", other),
    }
}

fn create(world: &mut ConsoleWorld, button: serde_json::Value) {
    let button: Button = serde_json::from_value(button).unwrap();
    world.control = Some(ButtonControl::new(button));
    world.transitions.clear();
}

#[given(expr = "a momentary button on pin {string} sending {string} and {string}")]
fn momentary_button(world: &mut ConsoleWorld, pin: String, on: String, off: String) {
    create(
        world,
        serde_json::json!({
            "id": "b1", "title": "Pulse", "type": "momentary",
            "pinnumber": pin, "sendingdata": [on, off]
        }),
    );
}

#[given(expr = "a toggle button on pin {string} with on {string} and off {string}")]
fn toggle_button(world: &mut ConsoleWorld, pin: String, on: String, off: String) {
    create(
        world,
        serde_json::json!({
            "id": "b1", "title": "Pump", "type": "toggle",
            "pinnumber": pin, "ondata": on, "offdata": off
        }),
    );
}

#[given(expr = "a toggle button on pin {string} with on {string} and off {string} last released as {string}")]
fn toggle_button_released(
    world: &mut ConsoleWorld,
    pin: String,
    on: String,
    off: String,
    released: String,
) {
    create(
        world,
        serde_json::json!({
            "id": "b1", "title": "Pump", "type": "toggle",
            "pinnumber": pin, "ondata": on, "offdata": off, "releaseddata": released
        }),
    );
}

#[given(expr = "a touch button on pin {string} sending {string} and {string} last released as {string}")]
fn touch_button(world: &mut ConsoleWorld, pin: String, on: String, off: String, released: String) {
    create(
        world,
        serde_json::json!({
            "id": "b1", "title": "Pad", "type": "touch",
            "pinnumber": pin, "sendingdata": [on, off], "releaseddata": released
        }),
    );
}

#[when(expr = "the button receives {string}")]
fn button_receives(world: &mut ConsoleWorld, gesture: String) {
    let gesture: Gesture = gesture.parse().unwrap();
    let transition = world.control().handle(gesture);
    world.transitions.push(transition);
}

#[then(expr = "the button starts {word}")]
fn button_starts(world: &mut ConsoleWorld, state: String) {
    assert_eq!(world.control().state(), parse_state(&state));
}

#[then(expr = "the button is {word}")]
fn button_is(world: &mut ConsoleWorld, state: String) {
    assert_eq!(world.control().state(), parse_state(&state));
}

#[then(expr = "the sent values are {string}")]
fn sent_values(world: &mut ConsoleWorld, expected: String) {
    let sent: Vec<String> = world
        .transitions
        .iter()
        .flat_map(|t| t.commands.iter().map(|c| c.data.clone()))
        .collect();
    assert_eq!(sent.join(","), expected);
}

#[then(expr = "every command targets pin {string}")]
fn commands_target(world: &mut ConsoleWorld, pin: String) {
    assert!(world
        .transitions
        .iter()
        .flat_map(|t| t.commands.iter())
        .all(|c| c.pin == pin));
}

#[then(expr = "the persisted values are {string}")]
fn persisted_values(world: &mut ConsoleWorld, expected: String) {
    let persisted: Vec<String> = world
        .transitions
        .iter()
        .filter_map(|t| t.persist.clone())
        .collect();
    assert_eq!(persisted.join(","), expected);
}

#[then("nothing is persisted")]
fn nothing_persisted(world: &mut ConsoleWorld) {
    assert!(world.transitions.iter().all(|t| t.persist.is_none()));
}

#[then("the last gesture had no effect")]
fn last_gesture_no_effect(world: &mut ConsoleWorld) {
    assert!(world.transitions.last().expect("no gesture").is_empty());
}
