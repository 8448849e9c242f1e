//! Device classes and the table that maps each class to its local shape.
//!
//! | Class | Value | Controllable | Display |
//! |-------|-------|--------------|---------|
//! | `switch`, `light`, `cover`, `lock` | boolean | yes | on/off |
//! | `binary_sensor` | boolean | no | on/off |
//! | `sensor` | numeric | no | plain or unit-suffixed |
//! | `media_player`, `climate`, `vacuum` | text | yes | none |
//! | anything else | text | no | none |

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Category of an announced device function.
///
/// Unrecognized classes are kept verbatim in [`Other`](Self::Other) so that
/// they still materialize (as read-only text) and round-trip through storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceClass {
    Switch,
    Light,
    BinarySensor,
    Cover,
    Lock,
    Sensor,
    MediaPlayer,
    Climate,
    Vacuum,
    Other(String),
}

/// How a class renders in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    OnOff,
    /// Plain number, suffixed with the unit when one is announced.
    Measurement,
    None,
}

/// One row of the class table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTraits {
    pub value_kind: ValueKind,
    pub controllable: bool,
    pub display: DisplayKind,
}

const ACTUATOR: ClassTraits = ClassTraits {
    value_kind: ValueKind::Boolean,
    controllable: true,
    display: DisplayKind::OnOff,
};

const BINARY_SENSOR: ClassTraits = ClassTraits {
    value_kind: ValueKind::Boolean,
    controllable: false,
    display: DisplayKind::OnOff,
};

const MEASUREMENT: ClassTraits = ClassTraits {
    value_kind: ValueKind::Numeric,
    controllable: false,
    display: DisplayKind::Measurement,
};

const TEXT_CONTROL: ClassTraits = ClassTraits {
    value_kind: ValueKind::Text,
    controllable: true,
    display: DisplayKind::None,
};

const TEXT_READ_ONLY: ClassTraits = ClassTraits {
    value_kind: ValueKind::Text,
    controllable: false,
    display: DisplayKind::None,
};

impl DeviceClass {
    /// The nine classes bridged by default.
    pub const DEFAULT_WHITELIST: [Self; 9] = [
        Self::Switch,
        Self::Light,
        Self::Sensor,
        Self::BinarySensor,
        Self::Cover,
        Self::MediaPlayer,
        Self::Climate,
        Self::Lock,
        Self::Vacuum,
    ];

    /// Look up this class in the class table.
    #[must_use]
    pub fn traits(&self) -> ClassTraits {
        match self {
            Self::Switch | Self::Light | Self::Cover | Self::Lock => ACTUATOR,
            Self::BinarySensor => BINARY_SENSOR,
            Self::Sensor => MEASUREMENT,
            Self::MediaPlayer | Self::Climate | Self::Vacuum => TEXT_CONTROL,
            Self::Other(_) => TEXT_READ_ONLY,
        }
    }

    /// Whether payloads of this class are encoded as on/off literals.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.traits().value_kind == ValueKind::Boolean
    }

    /// Wire name as used in discovery topics (`binary_sensor`, …).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Switch => "switch",
            Self::Light => "light",
            Self::BinarySensor => "binary_sensor",
            Self::Cover => "cover",
            Self::Lock => "lock",
            Self::Sensor => "sensor",
            Self::MediaPlayer => "media_player",
            Self::Climate => "climate",
            Self::Vacuum => "vacuum",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for DeviceClass {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "switch" => Self::Switch,
            "light" => Self::Light,
            "binary_sensor" => Self::BinarySensor,
            "cover" => Self::Cover,
            "lock" => Self::Lock,
            "sensor" => Self::Sensor,
            "media_player" => Self::MediaPlayer,
            "climate" => Self::Climate,
            "vacuum" => Self::Vacuum,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for DeviceClass {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(class) => class,
            Err(never) => match never {},
        }
    }
}

impl From<DeviceClass> for String {
    fn from(value: DeviceClass) -> Self {
        match value {
            DeviceClass::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved display profile of a materialized variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "unit", rename_all = "snake_case")]
pub enum DisplayProfile {
    OnOff,
    Plain,
    Unit(String),
    None,
}

impl DisplayProfile {
    /// Resolve a class's [`DisplayKind`] against the announced unit.
    #[must_use]
    pub fn resolve(kind: DisplayKind, unit: &str) -> Self {
        match kind {
            DisplayKind::OnOff => Self::OnOff,
            DisplayKind::Measurement if unit.is_empty() => Self::Plain,
            DisplayKind::Measurement => Self::Unit(unit.to_string()),
            DisplayKind::None => Self::None,
        }
    }
}

/// Compact text form used by storage adapters: `on_off`, `plain`,
/// `unit:°C`, `none`.
impl fmt::Display for DisplayProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff => f.write_str("on_off"),
            Self::Plain => f.write_str("plain"),
            Self::Unit(unit) => write!(f, "unit:{unit}"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Error returned when parsing an unknown [`DisplayProfile`] text form.
#[derive(Debug, thiserror::Error)]
#[error("unknown display profile {0:?}")]
pub struct UnknownDisplayProfile(pub String);

impl FromStr for DisplayProfile {
    type Err = UnknownDisplayProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_off" => Ok(Self::OnOff),
            "plain" => Ok(Self::Plain),
            "none" => Ok(Self::None),
            other => other
                .strip_prefix("unit:")
                .map(|unit| Self::Unit(unit.to_string()))
                .ok_or_else(|| UnknownDisplayProfile(other.to_string())),
        }
    }
}
