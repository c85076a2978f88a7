//! Button controls and the commands they send
//!
//! A [`ButtonControl`] is a two-state machine per button. Feeding it a
//! [`Gesture`] yields a [`Transition`]: the pin commands to send and, for
//! toggle and touch buttons, the raw value to persist as the button's
//! released value. The persisted value is also how the state is restored:
//! a control starts `On` when the persisted value equals its on value.
//!
//! [`ControlPanel`] holds the controls of one project and executes
//! transitions through [`DeviceCommands`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{ConsoleError, Result};
use crate::model::{Button, ButtonKind, PinCommand, Project, SwitchState};

/// User interaction with a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Press,
    Release,
    Activate,
}

impl FromStr for Gesture {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "press" => Ok(Gesture::Press),
            "release" => Ok(Gesture::Release),
            "activate" | "click" => Ok(Gesture::Activate),
            other => Err(ConsoleError::Config(format!("Unknown gesture '{}'", other))),
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gesture::Press => write!(f, "press"),
            Gesture::Release => write!(f, "release"),
            Gesture::Activate => write!(f, "activate"),
        }
    }
}

/// Effects of one gesture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub commands: Vec<PinCommand>,
    /// Value to store as the button's released value
    pub persist: Option<String>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.persist.is_none()
    }

    fn send(pin: &str, value: &str) -> Self {
        Self {
            commands: vec![PinCommand::new(pin, value)],
            persist: None,
        }
    }

    fn send_and_persist(pin: &str, value: &str) -> Self {
        Self {
            commands: vec![PinCommand::new(pin, value)],
            persist: Some(value.to_string()),
        }
    }
}

/// State machine of a single button
#[derive(Debug, Clone)]
pub struct ButtonControl {
    button: Button,
    state: SwitchState,
}

impl ButtonControl {
    pub fn new(button: Button) -> Self {
        let state = initial_state(&button);
        Self { button, state }
    }

    pub fn button(&self) -> &Button {
        &self.button
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn handle(&mut self, gesture: Gesture) -> Transition {
        let pin = self.button.pin.as_str();
        match (&self.button.kind, gesture) {
            (ButtonKind::Momentary { values, .. }, Gesture::Press) => {
                self.state = SwitchState::On;
                Transition::send(pin, &values.on)
            }
            (ButtonKind::Momentary { values, .. }, Gesture::Release) => {
                self.state = SwitchState::Off;
                Transition::send(pin, &values.off)
            }
            (ButtonKind::Toggle { on, off, .. }, Gesture::Activate) => {
                self.state = self.state.flipped();
                let value = match self.state {
                    SwitchState::On => on,
                    SwitchState::Off => off,
                };
                Transition::send_and_persist(pin, value)
            }
            (ButtonKind::Touch { values, .. }, Gesture::Activate) => {
                self.state = self.state.flipped();
                let value = match self.state {
                    SwitchState::On => &values.on,
                    SwitchState::Off => &values.off,
                };
                Transition::send_and_persist(pin, value)
            }
            (kind, gesture) => {
                debug!(
                    "{} button '{}' ignores {}",
                    kind.type_name(),
                    self.button.title,
                    gesture
                );
                Transition::default()
            }
        }
    }
}

fn initial_state(button: &Button) -> SwitchState {
    match &button.kind {
        ButtonKind::Momentary { .. } => SwitchState::Off,
        ButtonKind::Toggle {
            on,
            released,
            default_state,
            ..
        } => match released {
            Some(value) => state_of(value == on),
            None => *default_state,
        },
        ButtonKind::Touch {
            values, released, ..
        } => state_of(released.as_deref() == Some(values.on.as_str())),
    }
}

fn state_of(on: bool) -> SwitchState {
    if on {
        SwitchState::On
    } else {
        SwitchState::Off
    }
}

/// Outbound side of the controls
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DeviceCommands: Send + Sync {
    async fn send_command(&self, command: &PinCommand) -> Result<()>;

    async fn persist_released(&self, button_id: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl DeviceCommands for ApiClient {
    async fn send_command(&self, command: &PinCommand) -> Result<()> {
        self.send_pin_command(command).await
    }

    async fn persist_released(&self, button_id: &str, value: &str) -> Result<()> {
        self.update_released_value(button_id, value).await
    }
}

/// Controls of every button in a project
pub struct ControlPanel {
    controls: HashMap<String, ButtonControl>,
    device: Arc<dyn DeviceCommands>,
}

impl std::fmt::Debug for ControlPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPanel")
            .field("controls", &self.controls.len())
            .finish()
    }
}

impl ControlPanel {
    pub fn new(project: &Project, device: Arc<dyn DeviceCommands>) -> Self {
        let controls = project
            .signals()
            .flat_map(|signal| signal.button.iter())
            .map(|button| (button.id.clone(), ButtonControl::new(button.clone())))
            .collect();
        Self { controls, device }
    }

    pub fn control(&self, button_id: &str) -> Option<&ButtonControl> {
        self.controls.get(button_id)
    }

    /// Apply a gesture and send its commands
    ///
    /// Send and persist failures are logged; the state change stands.
    pub async fn dispatch(&mut self, button_id: &str, gesture: Gesture) -> Result<Transition> {
        let control = self
            .controls
            .get_mut(button_id)
            .ok_or_else(|| ConsoleError::NotFound(format!("button {}", button_id)))?;
        let transition = control.handle(gesture);

        for command in &transition.commands {
            debug!("Sending {:?} to pin {}", command.data, command.pin);
            if let Err(e) = self.device.send_command(command).await {
                warn!("Command for pin {} failed: {}", command.pin, e);
            }
        }
        if let Some(value) = &transition.persist {
            if let Err(e) = self.device.persist_released(button_id, value).await {
                warn!("Persisting released value of {} failed: {}", button_id, e);
            }
        }

        Ok(transition)
    }
}
