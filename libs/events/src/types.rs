//! Feed message definitions.
//!
//! The upstream writes one [`FeedMessage`] per line. The reporter splits
//! each message into either the in-sync signal or an [`EndpointUpdate`].

use serde::{Deserialize, Serialize};
use statusrep_id::EndpointId;

use crate::EventError;

// =============================================================================
// Feed Type Constants
// =============================================================================

/// All feed message type names as constants.
pub mod feed_types {
    pub const IN_SYNC: &str = "in_sync";
    pub const WORKLOAD_ENDPOINT_STATUS_UPDATE: &str = "workload_endpoint_status_update";
    pub const WORKLOAD_ENDPOINT_STATUS_REMOVE: &str = "workload_endpoint_status_remove";
    pub const UNKNOWN: &str = "unknown";
}

// =============================================================================
// Endpoint Updates
// =============================================================================

/// A change to an endpoint's policy-programming status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointUpdate {
    /// The endpoint's policy has been programmed.
    StatusUpdate { id: EndpointId },

    /// The endpoint has been removed.
    StatusRemove { id: EndpointId },

    /// A message type this reporter does not understand.
    Unknown,
}

impl EndpointUpdate {
    /// The endpoint this update refers to, if any.
    pub fn endpoint_id(&self) -> Option<&EndpointId> {
        match self {
            EndpointUpdate::StatusUpdate { id } | EndpointUpdate::StatusRemove { id } => Some(id),
            EndpointUpdate::Unknown => None,
        }
    }
}

// =============================================================================
// Feed Messages
// =============================================================================

/// One line of the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Upstream sync status. `true` means a full snapshot has been delivered.
    InSync { in_sync: bool },

    /// Endpoint became active.
    WorkloadEndpointStatusUpdate { id: EndpointId },

    /// Endpoint was removed.
    WorkloadEndpointStatusRemove { id: EndpointId },

    /// Any message type not listed above.
    #[serde(other)]
    Unknown,
}

/// Where a feed message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// Value for the in-sync channel.
    InSync(bool),

    /// Value for the endpoint update channel.
    Endpoint(EndpointUpdate),
}

impl FeedMessage {
    /// Returns the wire name of this message's type.
    pub fn feed_type(&self) -> &'static str {
        match self {
            FeedMessage::InSync { .. } => feed_types::IN_SYNC,
            FeedMessage::WorkloadEndpointStatusUpdate { .. } => {
                feed_types::WORKLOAD_ENDPOINT_STATUS_UPDATE
            }
            FeedMessage::WorkloadEndpointStatusRemove { .. } => {
                feed_types::WORKLOAD_ENDPOINT_STATUS_REMOVE
            }
            FeedMessage::Unknown => feed_types::UNKNOWN,
        }
    }

    /// Splits the message onto the channel it belongs to.
    ///
    /// Unrecognized messages go to the endpoint channel so the reporter
    /// can log and skip them.
    pub fn route(self) -> FeedItem {
        match self {
            FeedMessage::InSync { in_sync } => FeedItem::InSync(in_sync),
            FeedMessage::WorkloadEndpointStatusUpdate { id } => {
                FeedItem::Endpoint(EndpointUpdate::StatusUpdate { id })
            }
            FeedMessage::WorkloadEndpointStatusRemove { id } => {
                FeedItem::Endpoint(EndpointUpdate::StatusRemove { id })
            }
            FeedMessage::Unknown => FeedItem::Endpoint(EndpointUpdate::Unknown),
        }
    }
}

/// Parse a single feed line.
pub fn parse_feed_line(line: &str) -> Result<FeedMessage, EventError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(EventError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn nginx() -> EndpointId {
        EndpointId::new("k8s", "default/nginx", "eth0")
    }

    #[test]
    fn test_parse_in_sync() {
        let msg = parse_feed_line(r#"{"type":"in_sync","in_sync":true}"#).unwrap();
        assert_eq!(msg, FeedMessage::InSync { in_sync: true });
        assert_eq!(msg.route(), FeedItem::InSync(true));
    }

    #[test]
    fn test_parse_status_update() {
        let line = r#"{"type":"workload_endpoint_status_update","id":{"orchestrator_id":"k8s","workload_id":"default/nginx","endpoint_id":"eth0"}}"#;
        let msg = parse_feed_line(line).unwrap();
        assert_eq!(msg.feed_type(), feed_types::WORKLOAD_ENDPOINT_STATUS_UPDATE);
        assert_eq!(
            msg.route(),
            FeedItem::Endpoint(EndpointUpdate::StatusUpdate { id: nginx() })
        );
    }

    #[test]
    fn test_parse_status_remove() {
        let line = r#"{"type":"workload_endpoint_status_remove","id":{"orchestrator_id":"k8s","workload_id":"default/nginx","endpoint_id":"eth0"}}"#;
        let msg = parse_feed_line(line).unwrap();
        assert_eq!(
            msg.route(),
            FeedItem::Endpoint(EndpointUpdate::StatusRemove { id: nginx() })
        );
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let msg = parse_feed_line(r#"{"type":"host_endpoint_status_update","id":"x"}"#).unwrap();
        assert_eq!(msg, FeedMessage::Unknown);
        assert_eq!(msg.route(), FeedItem::Endpoint(EndpointUpdate::Unknown));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_blank_line(#[case] line: &str) {
        assert!(matches!(parse_feed_line(line), Err(EventError::Empty)));
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"in_sync":true}"#)]
    #[case(r#"{"type":"in_sync"}"#)]
    fn test_malformed_line(#[case] line: &str) {
        assert!(matches!(
            parse_feed_line(line),
            Err(EventError::Serialization(_))
        ));
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let msg = FeedMessage::WorkloadEndpointStatusRemove { id: nginx() };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.feed_type());
    }

    #[test]
    fn test_endpoint_id_accessor() {
        let update = EndpointUpdate::StatusRemove { id: nginx() };
        assert_eq!(update.endpoint_id(), Some(&nginx()));
        assert_eq!(EndpointUpdate::Unknown.endpoint_id(), None);
    }
}
