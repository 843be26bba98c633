// ── Model capability table ──
//
// Maps the hardware model number from a device signature to the kind of
// device and the attribute names polled for it.

use serde::Serialize;

/// Broad device category, derived from the signature model number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceKind {
    Thermostat,
    Light,
    Dimmer,
    Switch,
    LoadController,
    Valve,
    Sensor,
    Unknown,
}

const THERMOSTAT_MODELS: &[u32] = &[
    300, 336, 737, 738, 739, 742, 1123, 1124, 1510, 1512, 7372, 7373,
];
const LIGHT_MODELS: &[u32] = &[2121];
const DIMMER_MODELS: &[u32] = &[2131, 2132];
const SWITCH_MODELS: &[u32] = &[2506, 2600, 2610];
const LOAD_CONTROLLER_MODELS: &[u32] = &[2151, 2152, 2180, 2181];
const VALVE_MODELS: &[u32] = &[3150, 3151, 3153, 3155, 31532];
const SENSOR_MODELS: &[u32] = &[4110, 5050, 5051, 5052, 5053];

const THERMOSTAT_ATTRIBUTES: &[&str] = &[
    "roomTemperature",
    "roomSetpoint",
    "roomSetpointMin",
    "roomSetpointMax",
    "outputPercentDisplay",
    "setpointMode",
    "alarmsActive1",
    "wattage",
];
const LIGHT_ATTRIBUTES: &[&str] = &["onOff", "powerMode", "wattageInstant", "alarmsActive1"];
const DIMMER_ATTRIBUTES: &[&str] = &[
    "onOff",
    "intensity",
    "intensityMin",
    "powerMode",
    "wattageInstant",
    "alarmsActive1",
];
const SWITCH_ATTRIBUTES: &[&str] = &["onOff", "powerMode", "wattageInstant", "alarmsActive1"];
const LOAD_CONTROLLER_ATTRIBUTES: &[&str] = &[
    "onOff",
    "wattageInstant",
    "waterTemperature",
    "drStatus",
    "alarmsActive1",
];
const VALVE_ATTRIBUTES: &[&str] = &["valveStatus", "batteryVoltage", "batteryStatus", "alarmsActive1"];
const SENSOR_ATTRIBUTES: &[&str] = &["waterLeakStatus", "roomTemperature", "batteryVoltage", "batteryStatus"];

impl DeviceKind {
    /// Classify a signature model number.
    pub fn from_model(model: u32) -> Self {
        let tables: [(&[u32], Self); 7] = [
            (THERMOSTAT_MODELS, Self::Thermostat),
            (LIGHT_MODELS, Self::Light),
            (DIMMER_MODELS, Self::Dimmer),
            (SWITCH_MODELS, Self::Switch),
            (LOAD_CONTROLLER_MODELS, Self::LoadController),
            (VALVE_MODELS, Self::Valve),
            (SENSOR_MODELS, Self::Sensor),
        ];
        tables
            .iter()
            .find(|(models, _)| models.contains(&model))
            .map_or(Self::Unknown, |(_, kind)| *kind)
    }

    /// Attribute names read on every poll for this kind.
    pub fn attributes(self) -> &'static [&'static str] {
        match self {
            Self::Thermostat => THERMOSTAT_ATTRIBUTES,
            Self::Light => LIGHT_ATTRIBUTES,
            Self::Dimmer => DIMMER_ATTRIBUTES,
            Self::Switch => SWITCH_ATTRIBUTES,
            Self::LoadController => LOAD_CONTROLLER_ATTRIBUTES,
            Self::Valve => VALVE_ATTRIBUTES,
            Self::Sensor => SENSOR_ATTRIBUTES,
            Self::Unknown => &[],
        }
    }

    /// Whether the vendor keeps an energy history for this kind.
    pub fn tracks_energy(self) -> bool {
        !matches!(self, Self::Valve | Self::Sensor | Self::Unknown)
    }
}
