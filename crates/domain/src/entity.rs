//! Entity record: one per discovered device function.
//!
//! A record is built from the first announcement of a `unique_id` and merged
//! with every later announcement of the same id. It carries the encoding
//! contract for its class: how inbound state payloads become local values
//! and how local writes become command payloads.

use serde::{Deserialize, Serialize};

use crate::device_class::{DeviceClass, DisplayProfile};
use crate::discovery::{Announcement, DiscoveryTopic};
use crate::error::{BridgeError, ReadOnlyEntityError, ValidationError};
use crate::id::ObjectId;
use crate::time::Timestamp;
use crate::value::{Value, ValueKind};

pub const DEFAULT_ON_PAYLOAD: &str = "ON";
pub const DEFAULT_OFF_PAYLOAD: &str = "OFF";

/// A registered device function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub device_class: DeviceClass,
    pub object_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub display_name: String,
    pub state_topic: Option<String>,
    pub command_topic: Option<String>,
    pub on_payload: String,
    pub off_payload: String,
    pub unit: String,
    /// Handle of the materialized local variable; `None` until materialized.
    pub local_ref: Option<ObjectId>,
    pub discovered_at: Timestamp,
}

/// An encoded outbound command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Payload to publish on the command topic.
    pub payload: String,
    /// The requested value, normalized to the entity's value kind.
    pub value: Value,
}

impl EntityRecord {
    /// Build a fresh record from the first announcement of an id.
    ///
    /// Fields the announcement omits start from their defaults
    /// (`display_name` = slug, `ON`/`OFF`, empty unit).
    #[must_use]
    pub fn from_announcement(
        topic: &DiscoveryTopic,
        announcement: &Announcement,
        at: Timestamp,
    ) -> Self {
        let mut record = Self {
            id: announcement.unique_id.clone(),
            device_class: topic.device_class.clone(),
            object_slug: topic.object_slug.clone(),
            node_id: topic.node_id.clone(),
            display_name: topic.object_slug.clone(),
            state_topic: None,
            command_topic: None,
            on_payload: DEFAULT_ON_PAYLOAD.to_string(),
            off_payload: DEFAULT_OFF_PAYLOAD.to_string(),
            unit: String::new(),
            local_ref: None,
            discovered_at: at,
        };
        record.merge(topic, announcement, at);
        record
    }

    /// Merge a re-announcement into this record.
    ///
    /// Class, slug and node come from the topic. Announced fields overwrite
    /// the stored ones; omitted fields keep their current values. The
    /// `local_ref` is never touched here. Returns whether the device class
    /// changed.
    pub fn merge(
        &mut self,
        topic: &DiscoveryTopic,
        announcement: &Announcement,
        at: Timestamp,
    ) -> bool {
        let class_changed = self.device_class != topic.device_class;

        self.device_class = topic.device_class.clone();
        self.object_slug = topic.object_slug.clone();
        self.node_id = topic.node_id.clone();
        if let Some(name) = &announcement.name {
            self.display_name = name.clone();
        }
        if let Some(t) = &announcement.state_topic {
            self.state_topic = Some(t.clone());
        }
        if let Some(t) = &announcement.command_topic {
            self.command_topic = Some(t.clone());
        }
        if let Some(p) = &announcement.payload_on {
            self.on_payload = p.clone();
        }
        if let Some(p) = &announcement.payload_off {
            self.off_payload = p.clone();
        }
        if let Some(unit) = &announcement.unit_of_measurement {
            self.unit = unit.clone();
        }
        self.discovered_at = at;

        class_changed
    }

    /// Local value type of this entity.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.device_class.traits().value_kind
    }

    /// Display profile of the materialized variable.
    #[must_use]
    pub fn display_profile(&self) -> DisplayProfile {
        DisplayProfile::resolve(self.device_class.traits().display, &self.unit)
    }

    /// Whether the class accepts local writes at all.
    #[must_use]
    pub fn is_controllable(&self) -> bool {
        self.device_class.traits().controllable
    }

    /// Whether local writes can be turned into commands.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.command_topic.is_some() && self.is_controllable()
    }

    /// State and command share one topic, so no distinct echo will arrive.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.state_topic.is_some() && self.state_topic == self.command_topic
    }

    /// Coerce an inbound state payload into a local value.
    ///
    /// Never fails: an unrecognized boolean payload is `false`, a
    /// non-numeric sensor payload is kept as text.
    #[must_use]
    pub fn coerce_state(&self, payload: &str) -> Value {
        match self.value_kind() {
            ValueKind::Boolean => Value::Bool(payload.eq_ignore_ascii_case(&self.on_payload)),
            ValueKind::Numeric => payload
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or_else(|| Value::Text(payload.to_string()), Value::Number),
            ValueKind::Text => Value::Text(payload.to_string()),
        }
    }

    /// Encode a local write request as a command payload.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ReadOnlyEntity`] when the entity has no command
    /// topic or its class is not controllable, and
    /// [`ValidationError::UnsupportedValue`] when `value` cannot be expressed
    /// in the entity's value kind.
    pub fn encode_command(&self, value: &Value) -> Result<Command, BridgeError> {
        if !self.is_writable() {
            return Err(ReadOnlyEntityError {
                id: self.id.clone(),
            }
            .into());
        }

        let expected = self.value_kind();
        let unsupported = || ValidationError::UnsupportedValue { expected };

        let command = match expected {
            ValueKind::Boolean => {
                let on = match value {
                    Value::Bool(b) => *b,
                    Value::Number(n) => *n != 0.0,
                    Value::Text(t) if t.eq_ignore_ascii_case(&self.on_payload) => true,
                    Value::Text(t) if t.eq_ignore_ascii_case(&self.off_payload) => false,
                    Value::Text(_) => return Err(unsupported().into()),
                };
                let payload = if on { &self.on_payload } else { &self.off_payload };
                Command {
                    payload: payload.clone(),
                    value: Value::Bool(on),
                }
            }
            ValueKind::Numeric => {
                let n = match value {
                    Value::Number(n) => *n,
                    Value::Text(t) => t.trim().parse().map_err(|_| unsupported())?,
                    Value::Bool(_) => return Err(unsupported().into()),
                };
                Command {
                    payload: n.to_string(),
                    value: Value::Number(n),
                }
            }
            ValueKind::Text => {
                let payload = value.to_string();
                Command {
                    value: Value::Text(payload.clone()),
                    payload,
                }
            }
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn topic(class: DeviceClass, slug: &str) -> DiscoveryTopic {
        DiscoveryTopic {
            device_class: class,
            node_id: None,
            object_slug: slug.to_string(),
        }
    }

    fn record(class: DeviceClass, body: &str) -> EntityRecord {
        let ann = Announcement::parse(body).unwrap();
        EntityRecord::from_announcement(&topic(class, "obj"), &ann, now())
    }

    #[test]
    fn should_apply_defaults_when_fields_are_omitted() {
        let rec = record(DeviceClass::Switch, r#"{"unique_id":"u1"}"#);
        assert_eq!(rec.display_name, "obj");
        assert_eq!(rec.on_payload, "ON");
        assert_eq!(rec.off_payload, "OFF");
        assert_eq!(rec.unit, "");
        assert!(rec.state_topic.is_none());
        assert!(rec.local_ref.is_none());
    }

    #[test]
    fn should_keep_unannounced_fields_on_merge() {
        let mut rec = record(
            DeviceClass::Switch,
            r#"{"unique_id":"u1","name":"Plug","state_topic":"s/1"}"#,
        );
        let ann = Announcement::parse(r#"{"unique_id":"u1","command_topic":"c/1"}"#).unwrap();
        let class_changed = rec.merge(&topic(DeviceClass::Switch, "obj"), &ann, now());

        assert_eq!(rec.display_name, "Plug");
        assert_eq!(rec.state_topic.as_deref(), Some("s/1"));
        assert_eq!(rec.command_topic.as_deref(), Some("c/1"));
        assert!(!class_changed);
    }

    #[test]
    fn should_report_class_change() {
        let mut rec = record(DeviceClass::Switch, r#"{"unique_id":"u1","state_topic":"a"}"#);
        let ann = Announcement::parse(r#"{"unique_id":"u1","state_topic":"b"}"#).unwrap();
        assert!(rec.merge(&topic(DeviceClass::Light, "obj"), &ann, now()));
        assert_eq!(rec.device_class, DeviceClass::Light);
        assert_eq!(rec.state_topic.as_deref(), Some("b"));
    }

    #[test]
    fn should_coerce_boolean_payload_case_insensitively() {
        let rec = record(DeviceClass::Switch, r#"{"unique_id":"u1"}"#);
        assert_eq!(rec.coerce_state("ON"), Value::Bool(true));
        assert_eq!(rec.coerce_state("on"), Value::Bool(true));
        assert_eq!(rec.coerce_state("OFF"), Value::Bool(false));
        assert_eq!(rec.coerce_state("garbage"), Value::Bool(false));
    }

    #[test]
    fn should_coerce_boolean_against_custom_on_payload() {
        let rec = record(
            DeviceClass::BinarySensor,
            r#"{"unique_id":"u1","payload_on":"open","payload_off":"closed"}"#,
        );
        assert_eq!(rec.coerce_state("OPEN"), Value::Bool(true));
        assert_eq!(rec.coerce_state("ON"), Value::Bool(false));
    }

    #[test]
    fn should_coerce_sensor_payload_to_number_or_text() {
        let rec = record(DeviceClass::Sensor, r#"{"unique_id":"t","unit_of_measurement":"°C"}"#);
        assert_eq!(rec.coerce_state("21.5"), Value::Number(21.5));
        assert_eq!(
            rec.coerce_state("unavailable"),
            Value::Text("unavailable".to_string())
        );
        assert_eq!(rec.coerce_state("NaN"), Value::Text("NaN".to_string()));
    }

    #[test]
    fn should_keep_text_payload_verbatim() {
        let rec = record(DeviceClass::MediaPlayer, r#"{"unique_id":"m"}"#);
        assert_eq!(
            rec.coerce_state(r#"{"state":"playing"}"#),
            Value::Text(r#"{"state":"playing"}"#.to_string())
        );
    }

    #[test]
    fn should_encode_boolean_command_with_payload_literals() {
        let rec = record(
            DeviceClass::Light,
            r#"{"unique_id":"l","command_topic":"c","payload_on":"1","payload_off":"0"}"#,
        );
        let cmd = rec.encode_command(&Value::Bool(true)).unwrap();
        assert_eq!(cmd.payload, "1");
        assert_eq!(cmd.value, Value::Bool(true));
        let cmd = rec.encode_command(&Value::Number(0.0)).unwrap();
        assert_eq!(cmd.payload, "0");
        assert_eq!(cmd.value, Value::Bool(false));
    }

    #[test]
    fn should_reject_unrelated_text_for_boolean_entity() {
        let rec = record(DeviceClass::Switch, r#"{"unique_id":"s","command_topic":"c"}"#);
        let err = rec
            .encode_command(&Value::Text("maybe".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Validation(ValidationError::UnsupportedValue {
                expected: ValueKind::Boolean
            })
        ));
    }

    #[test]
    fn should_encode_text_command_as_plain_text() {
        let rec = record(DeviceClass::Climate, r#"{"unique_id":"c","command_topic":"c"}"#);
        let cmd = rec.encode_command(&Value::Number(21.0)).unwrap();
        assert_eq!(cmd.payload, "21");
        assert_eq!(cmd.value, Value::Text("21".to_string()));
    }

    #[test]
    fn should_refuse_command_without_command_topic() {
        let rec = record(DeviceClass::Switch, r#"{"unique_id":"s"}"#);
        assert!(matches!(
            rec.encode_command(&Value::Bool(true)),
            Err(BridgeError::ReadOnlyEntity(_))
        ));
    }

    #[test]
    fn should_refuse_command_for_non_controllable_class() {
        let rec = record(
            DeviceClass::BinarySensor,
            r#"{"unique_id":"b","command_topic":"c"}"#,
        );
        assert!(!rec.is_writable());
        assert!(matches!(
            rec.encode_command(&Value::Bool(true)),
            Err(BridgeError::ReadOnlyEntity(_))
        ));
    }

    #[test]
    fn should_be_optimistic_only_when_topics_match() {
        let same = record(
            DeviceClass::Switch,
            r#"{"unique_id":"a","state_topic":"t","command_topic":"t"}"#,
        );
        let split = record(
            DeviceClass::Switch,
            r#"{"unique_id":"b","state_topic":"s","command_topic":"c"}"#,
        );
        let none = record(DeviceClass::Switch, r#"{"unique_id":"c"}"#);
        assert!(same.is_optimistic());
        assert!(!split.is_optimistic());
        assert!(!none.is_optimistic());
    }

    #[test]
    fn should_resolve_display_profile_from_unit() {
        let rec = record(DeviceClass::Sensor, r#"{"unique_id":"t","unit_of_measurement":"%"}"#);
        assert_eq!(rec.display_profile(), DisplayProfile::Unit("%".to_string()));
        let rec = record(DeviceClass::Lock, r#"{"unique_id":"l"}"#);
        assert_eq!(rec.display_profile(), DisplayProfile::OnOff);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let rec = record(
            DeviceClass::Sensor,
            r#"{"unique_id":"t","state_topic":"s/t","unit_of_measurement":"°C"}"#,
        );
        let json = serde_json::to_string(&rec).unwrap();
        let parsed: EntityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rec);
    }
}
