//! Discovery announcements: topic classification and body parsing.
//!
//! Announcements arrive on `{base}/{class}/{slug}/config`, or
//! `{base}/{class}/{node}/{slug}/config` when the publisher groups entities
//! by node. The body is a JSON object; both the long and the abbreviated
//! Home Assistant keys are accepted, and topics starting or ending with `~`
//! are expanded against the `~` base.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::device_class::DeviceClass;

/// Where an announcement's device class and slug came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTopic {
    pub device_class: DeviceClass,
    pub node_id: Option<String>,
    pub object_slug: String,
}

/// Classification of an inbound topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind {
    /// A well-formed discovery config topic.
    Discovery(DiscoveryTopic),
    /// Anything else, including misshapen config topics; candidate telemetry.
    Telemetry,
}

impl TopicKind {
    /// Classify `topic` against the base discovery prefix.
    #[must_use]
    pub fn classify(base: &str, topic: &str) -> Self {
        let base = base.trim_end_matches('/');
        let Some(inner) = topic
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_suffix("/config"))
        else {
            return Self::Telemetry;
        };

        let segments: Vec<&str> = inner.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Self::Telemetry;
        }
        match segments.as_slice() {
            [class, slug] => Self::Discovery(DiscoveryTopic {
                device_class: DeviceClass::from((*class).to_string()),
                node_id: None,
                object_slug: (*slug).to_string(),
            }),
            [class, node, slug] => Self::Discovery(DiscoveryTopic {
                device_class: DeviceClass::from((*class).to_string()),
                node_id: Some((*node).to_string()),
                object_slug: (*slug).to_string(),
            }),
            _ => Self::Telemetry,
        }
    }
}

/// Why an announcement body was rejected. Never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum MalformedAnnouncement {
    #[error("announcement body is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("announcement body is not a JSON object")]
    NotAnObject,
    #[error("announcement fields have unexpected types")]
    InvalidFields(#[source] serde_json::Error),
    #[error("announcement has no unique_id")]
    MissingUniqueId,
}

#[derive(Debug, Deserialize)]
struct RawAnnouncement {
    #[serde(default, alias = "uniq_id", deserialize_with = "scalar_string")]
    unique_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "stat_t")]
    state_topic: Option<String>,
    #[serde(default, alias = "cmd_t")]
    command_topic: Option<String>,
    #[serde(default, alias = "pl_on", deserialize_with = "scalar_string")]
    payload_on: Option<String>,
    #[serde(default, alias = "pl_off", deserialize_with = "scalar_string")]
    payload_off: Option<String>,
    #[serde(default, alias = "unit_of_meas")]
    unit_of_measurement: Option<String>,
    #[serde(default, rename = "~")]
    topic_base: Option<String>,
}

/// A validated discovery announcement body.
///
/// Every field but `unique_id` is optional; absent fields leave the
/// corresponding record field at its current (or default) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub unique_id: String,
    pub name: Option<String>,
    pub state_topic: Option<String>,
    pub command_topic: Option<String>,
    pub payload_on: Option<String>,
    pub payload_off: Option<String>,
    pub unit_of_measurement: Option<String>,
}

impl Announcement {
    /// Parse and validate an announcement body.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedAnnouncement`] when the body is not a JSON object,
    /// a known field has the wrong type, or `unique_id` is missing/blank.
    pub fn parse(body: &str) -> Result<Self, MalformedAnnouncement> {
        let json: serde_json::Value =
            serde_json::from_str(body).map_err(MalformedAnnouncement::InvalidJson)?;
        if !json.is_object() {
            return Err(MalformedAnnouncement::NotAnObject);
        }
        let raw: RawAnnouncement =
            serde_json::from_value(json).map_err(MalformedAnnouncement::InvalidFields)?;

        let unique_id = raw
            .unique_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(MalformedAnnouncement::MissingUniqueId)?;

        let base = raw.topic_base.as_deref();
        let topic = |value: Option<String>| {
            value
                .map(|t| expand_topic(&t, base))
                .filter(|t| !t.is_empty())
        };

        Ok(Self {
            unique_id,
            name: raw.name,
            state_topic: topic(raw.state_topic),
            command_topic: topic(raw.command_topic),
            payload_on: raw.payload_on,
            payload_off: raw.payload_off,
            unit_of_measurement: raw.unit_of_measurement,
        })
    }
}

fn expand_topic(topic: &str, base: Option<&str>) -> String {
    let Some(base) = base else {
        return topic.to_string();
    };
    if let Some(rest) = topic.strip_prefix('~') {
        format!("{base}{rest}")
    } else if let Some(rest) = topic.strip_suffix('~') {
        format!("{rest}{base}")
    } else {
        topic.to_string()
    }
}

/// Accept strings, numbers and booleans (`"pl_on": 1` is common).
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a scalar, found {other}"))),
    }
}
