//! Opaque state handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-issued position in the model's context space.
///
/// Handles are capabilities, not numbers: the only thing a client may do with
/// one is hand it back to the server that issued it. There is deliberately no
/// ordering, hashing or arithmetic; the raw value is only exposed for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateHandle(i64);

impl StateHandle {
    /// Sentinel for stateless queries where the whole context is in the request.
    pub const UNKNOWN: Self = Self(-1);

    /// Root state: start of input, no context consumed.
    pub const INITIAL: Self = Self(0);

    /// Wrap a raw handle received from the server.
    pub fn from_wire(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw value for encoding into a request.
    pub fn to_wire(self) -> i64 {
        self.0
    }

    /// Whether this is the unknown-context sentinel.
    pub fn is_unknown(self) -> bool {
        self.0 < 0
    }

    /// Whether this is the root state.
    pub fn is_initial(self) -> bool {
        self == Self::INITIAL
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "state(unknown)")
        } else {
            write!(f, "state#{}", self.0)
        }
    }
}
