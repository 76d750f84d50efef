//! Ports and connections.

use std::fmt;

use serde::Serialize;

use super::ObjectId;

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    /// Issues requests (CPU side of a link).
    Requestor,
    /// Services requests (memory side of a link).
    Responder,
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requestor => "requestor",
            Self::Responder => "responder",
        })
    }
}

/// A port declared by an object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Port name (`"mem_side"`).
    pub name: &'static str,
    /// Direction.
    pub role: PortRole,
    /// Vector ports accept any number of connections.
    pub vector: bool,
}

impl PortSpec {
    pub(crate) const fn requestor(name: &'static str) -> Self {
        Self {
            name,
            role: PortRole::Requestor,
            vector: false,
        }
    }

    pub(crate) const fn responder(name: &'static str) -> Self {
        Self {
            name,
            role: PortRole::Responder,
            vector: false,
        }
    }

    pub(crate) const fn vector(name: &'static str, role: PortRole) -> Self {
        Self {
            name,
            role,
            vector: true,
        }
    }
}

/// A specific port on a specific object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    /// Owning object.
    pub object: ObjectId,
    /// Port name as declared by the object's kind.
    pub port: &'static str,
}

/// A connection, always stored requestor first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Requesting end.
    pub requestor: PortRef,
    /// Responding end.
    pub responder: PortRef,
}

impl Edge {
    /// Returns the far end of this edge as seen from `port`, if `port` is one of its ends.
    pub fn peer_of(&self, port: PortRef) -> Option<PortRef> {
        if self.requestor == port {
            Some(self.responder)
        } else if self.responder == port {
            Some(self.requestor)
        } else {
            None
        }
    }
}
