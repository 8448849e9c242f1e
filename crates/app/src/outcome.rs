//! Results of inbound message handling.
//!
//! The inbound path never fails: anything that cannot be applied is reported
//! as [`Ignored`] and logged, not surfaced.

use habridge_domain::device_class::DeviceClass;
use habridge_domain::discovery::MalformedAnnouncement;
use habridge_domain::error::BridgeError;
use habridge_domain::id::ObjectId;

/// What happened to one inbound message.
#[derive(Debug)]
pub enum InboundOutcome {
    /// An announcement was merged into the registry.
    Discovered {
        id: String,
        local_ref: ObjectId,
        created: bool,
    },
    /// Telemetry updated this many local objects.
    Routed { updated: usize },
    /// The message was dropped.
    Ignored(Ignored),
    /// Discovery aborted; nothing was persisted for this announcement.
    Failed(BridgeError),
}

/// Why an inbound message was dropped.
#[derive(Debug)]
pub enum Ignored {
    /// Announcement for a class outside the whitelist.
    ClassNotAllowed(DeviceClass),
    /// Unparsable body or missing `unique_id`.
    MalformedAnnouncement(MalformedAnnouncement),
    /// No known entity listens on the topic.
    UnmatchedTelemetry,
}
