//! Outcome payload handed from the simulated agent to a waiting test.

use serde::{Deserialize, Serialize};

/// Outcome of a frame the agent finished handling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Failure description, `None` on success
    pub err: Option<String>,
    /// Instance the frame referred to
    pub instance_uuid: Option<String>,
    /// Node that handled the frame
    pub node_uuid: Option<String>,
    /// Tenant owning the instance
    pub tenant_uuid: Option<String>,
    /// Volume the frame referred to
    pub volume_uuid: Option<String>,
    /// Whether the instance is a concentrator (CNCI)
    pub cnci: bool,
}

impl FrameResult {
    /// A successful result with no identifiers
    pub fn ok() -> Self {
        Self::default()
    }

    /// A failed result
    pub fn failed(err: impl Into<String>) -> Self {
        Self {
            err: Some(err.into()),
            ..Self::default()
        }
    }

    pub fn with_instance(mut self, uuid: impl Into<String>) -> Self {
        self.instance_uuid = Some(uuid.into());
        self
    }

    pub fn with_node(mut self, uuid: impl Into<String>) -> Self {
        self.node_uuid = Some(uuid.into());
        self
    }

    pub fn with_tenant(mut self, uuid: impl Into<String>) -> Self {
        self.tenant_uuid = Some(uuid.into());
        self
    }

    pub fn with_volume(mut self, uuid: impl Into<String>) -> Self {
        self.volume_uuid = Some(uuid.into());
        self
    }

    /// Mark the instance as a concentrator
    pub fn with_cnci(mut self) -> Self {
        self.cnci = true;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}
