//! Endpoint identifier and its status filename encoding.

use serde::{Deserialize, Serialize};

use crate::IdError;

/// Separator placed between the escaped components of a status filename.
const COMPONENT_SEPARATOR: char = ' ';

// =============================================================================
// Endpoint Identifier
// =============================================================================

/// Identifies one workload endpoint.
///
/// Values are immutable once built; two identifiers are the same endpoint
/// exactly when all three components are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    /// Orchestrator that owns the workload (e.g. `k8s`).
    pub orchestrator_id: String,

    /// Workload name, usually `namespace/pod`.
    pub workload_id: String,

    /// Interface name within the workload.
    pub endpoint_id: String,
}

impl EndpointId {
    /// Creates an identifier from its three components.
    #[must_use]
    pub fn new(
        orchestrator_id: impl Into<String>,
        workload_id: impl Into<String>,
        endpoint_id: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator_id: orchestrator_id.into(),
            workload_id: workload_id.into(),
            endpoint_id: endpoint_id.into(),
        }
    }

    /// Encodes this identifier as a single filesystem-safe path segment.
    #[must_use]
    pub fn to_status_filename(&self) -> String {
        let mut out = String::with_capacity(
            self.orchestrator_id.len() + self.workload_id.len() + self.endpoint_id.len() + 2,
        );
        escape_component(&self.orchestrator_id, &mut out);
        out.push(COMPONENT_SEPARATOR);
        escape_component(&self.workload_id, &mut out);
        out.push(COMPONENT_SEPARATOR);
        escape_component(&self.endpoint_id, &mut out);
        out
    }

    /// Decodes a name produced by [`EndpointId::to_status_filename`].
    pub fn from_status_filename(name: &str) -> Result<Self, IdError> {
        if name.is_empty() {
            return Err(IdError::Empty);
        }

        let parts: Vec<&str> = name.split(COMPONENT_SEPARATOR).collect();
        let [orchestrator_id, workload_id, endpoint_id] = &parts[..] else {
            return Err(IdError::WrongComponentCount {
                actual: parts.len(),
            });
        };

        Ok(Self {
            orchestrator_id: unescape_component(orchestrator_id)?,
            workload_id: unescape_component(workload_id)?,
            endpoint_id: unescape_component(endpoint_id)?,
        })
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.orchestrator_id, self.workload_id, self.endpoint_id
        )
    }
}

impl std::str::FromStr for EndpointId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_status_filename(s)
    }
}

// =============================================================================
// Escaping
// =============================================================================

fn escape_component(component: &str, out: &mut String) {
    out.push_str(&urlencoding::encode(component));
}

fn unescape_component(component: &str) -> Result<String, IdError> {
    // `decode` leaves malformed escapes in place, so reject them first.
    let bytes = component.as_bytes();
    for (offset, _) in component.match_indices('%') {
        let well_formed = bytes
            .get(offset + 1..offset + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(IdError::InvalidEscape { offset });
        }
    }

    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| IdError::InvalidUtf8)
}

// =============================================================================
// Tests
// =============================================================================
