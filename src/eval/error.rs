use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::{gate::GateId, wire::WireId};

/// Which end of a wire failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    Source,
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Hard failures. Structural variants abort the whole evaluation call with
/// no partial mutation; `Evaluation` is raised per gate and downgraded to a
/// [`Warning::GateFallback`] by the circuit evaluator.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("Invalid gate {gate}: {reason}")]
    InvalidGate { gate: GateId, reason: String },

    #[error("Invalid wire {wire}: {reason}")]
    InvalidWire { wire: WireId, reason: String },

    #[error("Wire {wire} references missing {endpoint} gate {gate}")]
    MissingDependency {
        wire: WireId,
        gate: GateId,
        endpoint: Endpoint,
    },

    #[error("Circular dependency: {}", .stack.iter().join(" -> "))]
    CircularDependency { stack: Vec<GateId> },

    #[error("Evaluation of gate {gate} failed: {reason}")]
    Evaluation { gate: GateId, reason: String },
}

impl Error {
    pub fn invalid_gate(gate: impl Into<GateId>, reason: impl Into<String>) -> Self {
        Error::InvalidGate {
            gate: gate.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_wire(wire: impl Into<WireId>, reason: impl Into<String>) -> Self {
        Error::InvalidWire {
            wire: wire.into(),
            reason: reason.into(),
        }
    }

    pub fn evaluation(gate: &GateId, reason: impl Into<String>) -> Self {
        Error::Evaluation {
            gate: gate.clone(),
            reason: reason.into(),
        }
    }
}

/// Non-blocking diagnostics. Evaluation proceeds; the editor surfaces these
/// as fault indicators without freezing the simulation.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum Warning {
    #[error("Duplicate gate ID {0}; last definition wins")]
    DuplicateGateId(GateId),

    #[error("Duplicate wire ID {0}; last definition wins")]
    DuplicateWireId(WireId),

    #[error("Wire {wire}: input pin {pin} of gate {gate} is already driven; last wire wins")]
    InputPinContested {
        wire: WireId,
        gate: GateId,
        pin: usize,
    },

    #[error("Wire {wire}: invalid output pin index {pin} on gate {gate}")]
    InvalidOutputPin {
        wire: WireId,
        gate: GateId,
        pin: i32,
    },

    #[error("Feedback loop detected: {}", .stack.iter().join(" -> "))]
    CircularDependency { stack: Vec<GateId> },

    #[error("Gate {gate} fell back to low outputs: {reason}")]
    GateFallback { gate: GateId, reason: String },
}
