//! Project, sensor and control types as exchanged with the backend

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Projects
// ============================================================================

/// A project with all of its sensors, signals and combined graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "id")]
    pub project_id: String,
    #[serde(alias = "name")]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "board")]
    pub development_board: String,
    #[serde(rename = "totalsensor", default)]
    pub sensor_count: u32,
    #[serde(rename = "sensordata", alias = "sensors", default)]
    pub sensors: Vec<Arc<Sensor>>,
    #[serde(rename = "sendingsignal", default)]
    pub signal_groups: Vec<SignalGroup>,
    #[serde(default)]
    pub combined_sensor_graphs: Vec<CombinedGraph>,
    /// Access token devices use to push readings into this project
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Project {
    /// All signals across the project's signal groups
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signal_groups.iter().flat_map(|group| group.signal.iter())
    }

    pub fn find_button(&self, button_id: &str) -> Option<&Button> {
        self.signals()
            .flat_map(|signal| signal.button.iter())
            .find(|button| button.id == button_id)
    }

    pub fn find_sensor(&self, sensor_id: &str) -> Option<&Arc<Sensor>> {
        self.sensors.iter().find(|sensor| sensor.id == sensor_id)
    }
}

/// Fields a user supplies when creating or editing a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub project_name: String,
    pub description: String,
    pub development_board: String,
}

// ============================================================================
// Sensors
// ============================================================================

/// A sensor and the readings recorded for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "pinnumber")]
    pub pin_number: String,
    #[serde(default)]
    pub type_of_pin: String,
    #[serde(default)]
    pub graph_info: GraphInfo,
    #[serde(default)]
    pub data: Vec<SensorData>,
}

/// One timestamped reading of a sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub datetime: String,
    #[serde(deserialize_with = "number_or_string")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSensor {
    pub sensor_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorUpdate {
    pub title: String,
    pub type_of_pin: String,
    pub pin_number: String,
}

/// How a sensor's series is charted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphInfo {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub graph_type: GraphType,
    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,
    #[serde(default)]
    pub x_axis_label: String,
    #[serde(default)]
    pub y_axis_label: String,
}

impl Default for GraphInfo {
    fn default() -> Self {
        Self {
            title: String::new(),
            graph_type: GraphType::default(),
            max_data_points: default_max_data_points(),
            x_axis_label: String::new(),
            y_axis_label: String::new(),
        }
    }
}

fn default_max_data_points() -> usize {
    50
}

/// Chart style; anything unrecognised renders as a line chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GraphType {
    #[default]
    Line,
    Bar,
    Area,
    Composed,
    Scatter,
    Pie,
}

impl From<String> for GraphType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "bar" => GraphType::Bar,
            "area" => GraphType::Area,
            "composed" => GraphType::Composed,
            "scatter" => GraphType::Scatter,
            "pie" => GraphType::Pie,
            _ => GraphType::Line,
        }
    }
}

impl From<GraphType> for String {
    fn from(value: GraphType) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for GraphType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphType::Line => write!(f, "line"),
            GraphType::Bar => write!(f, "bar"),
            GraphType::Area => write!(f, "area"),
            GraphType::Composed => write!(f, "composed"),
            GraphType::Scatter => write!(f, "scatter"),
            GraphType::Pie => write!(f, "pie"),
        }
    }
}

// ============================================================================
// Signals and buttons
// ============================================================================

/// Wrapper the backend uses around a project's signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalGroup {
    #[serde(default)]
    pub signal: Vec<Signal>,
}

/// A named group of control buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "buttons")]
    pub button: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSignal {
    pub title: String,
    pub buttons: Vec<ButtonDraft>,
}

/// A control bound to one device pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "pinnumber", alias = "pinNumber", default)]
    pub pin: String,
    #[serde(flatten)]
    pub kind: ButtonKind,
}

/// A button as submitted on create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDraft {
    pub title: String,
    #[serde(rename = "pinnumber")]
    pub pin: String,
    #[serde(flatten)]
    pub kind: ButtonKind,
}

impl From<&Button> for ButtonDraft {
    fn from(button: &Button) -> Self {
        Self {
            title: button.title.clone(),
            pin: button.pin.clone(),
            kind: button.kind.clone(),
        }
    }
}

/// Per-type payload of a button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ButtonKind {
    /// Sends `on` while pressed and `off` on release
    Momentary {
        #[serde(rename = "sendingdata", default)]
        values: ValuePair,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        char: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
    /// Flips between `ondata` and `offdata` on each activation
    Toggle {
        #[serde(rename = "ondata")]
        on: String,
        #[serde(rename = "offdata")]
        off: String,
        #[serde(rename = "defaultState", default)]
        default_state: SwitchState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        char: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
        #[serde(rename = "releaseddata", default, skip_serializing_if = "Option::is_none")]
        released: Option<String>,
    },
    /// Flips between the two sending values on each touch
    Touch {
        #[serde(default = "default_sensitivity")]
        sensitivity: u32,
        #[serde(rename = "sendingdata", default)]
        values: ValuePair,
        #[serde(rename = "releaseddata", default, skip_serializing_if = "Option::is_none")]
        released: Option<String>,
    },
}

impl ButtonKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ButtonKind::Momentary { .. } => "momentary",
            ButtonKind::Toggle { .. } => "toggle",
            ButtonKind::Touch { .. } => "touch",
        }
    }
}

fn default_sensitivity() -> u32 {
    40
}

/// On/off state of a switch-like control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

impl SwitchState {
    pub fn flipped(self) -> Self {
        match self {
            SwitchState::On => SwitchState::Off,
            SwitchState::Off => SwitchState::On,
        }
    }
}

/// The `[on, off]` values a momentary or touch button sends
///
/// The backend stores these as a two-element array; older records hold a
/// single string, which is taken as the on value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PairRepr", into = "Vec<String>")]
pub struct ValuePair {
    pub on: String,
    pub off: String,
}

impl ValuePair {
    pub fn new(on: impl Into<String>, off: impl Into<String>) -> Self {
        Self {
            on: on.into(),
            off: off.into(),
        }
    }
}

impl Default for ValuePair {
    fn default() -> Self {
        Self::new("1", "0")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PairRepr {
    List(Vec<String>),
    Single(String),
}

impl From<PairRepr> for ValuePair {
    fn from(repr: PairRepr) -> Self {
        let defaults = ValuePair::default();
        match repr {
            PairRepr::List(values) => {
                let mut values = values.into_iter();
                ValuePair {
                    on: values.next().unwrap_or(defaults.on),
                    off: values.next().unwrap_or(defaults.off),
                }
            }
            PairRepr::Single(on) => ValuePair { on, ..defaults },
        }
    }
}

impl From<ValuePair> for Vec<String> {
    fn from(pair: ValuePair) -> Self {
        vec![pair.on, pair.off]
    }
}

/// An outbound command for one device pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinCommand {
    #[serde(rename = "pinnumber")]
    pub pin: String,
    pub data: String,
}

impl PinCommand {
    pub fn new(pin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            data: data.into(),
        }
    }
}

// ============================================================================
// Combined graphs
// ============================================================================

/// A chart aggregating several sensors of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedGraph {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sensors: Vec<SensorRef>,
    #[serde(rename = "convinegraphInfo", alias = "graphInfo", default)]
    pub graph_info: GraphInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRef {
    #[serde(rename = "sensorid")]
    pub sensor_id: String,
    #[serde(rename = "sensorTitle", default)]
    pub sensor_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCombinedGraph {
    pub title: String,
    pub sensor_ids: Vec<String>,
}

/// Server-side aggregate for a combined graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedGraphData {
    #[serde(default)]
    pub results: Vec<AverageData>,
    #[serde(rename = "convinegraphInfo", default)]
    pub graph_info: GraphInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageData {
    pub title: String,
    #[serde(deserialize_with = "number_or_string")]
    pub average: f64,
}

// ============================================================================
// Live readings and users
// ============================================================================

/// A single reading pushed over the live channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(alias = "pinNumber", alias = "pinnumber", alias = "sensorId")]
    pub pin: String,
    #[serde(deserialize_with = "number_or_string")]
    pub value: f64,
    #[serde(default, alias = "datetime")]
    pub timestamp: String,
}

impl SensorReading {
    pub fn new(pin: impl Into<String>, value: f64, timestamp: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            value,
            timestamp: timestamp.into(),
        }
    }

    pub fn to_point(&self) -> SensorData {
        SensorData {
            datetime: self.timestamp.clone(),
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Accept numeric values that some firmware reports as strings
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
