use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

use crate::core::gate::GateId;

/// Identity of a wire, as assigned by the editor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub String);

impl WireId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for WireId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for WireId {
    fn from(s: &str) -> Self {
        WireId(s.to_owned())
    }
}

impl From<String> for WireId {
    fn from(s: String) -> Self {
        WireId(s)
    }
}

/// Pin index naming a gate's single/primary output. Non-negative indices
/// select among multiple outputs (flip-flop Q̄, counter bits).
pub const OUTPUT_PIN: i32 = -1;

/// One endpoint of a wire: a gate plus a pin on it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    #[serde(rename = "gateId")]
    pub gate: GateId,
    #[serde(rename = "pinIndex")]
    pub pin: i32,
}

impl PinRef {
    /// The conventional source endpoint: the gate's primary output.
    #[must_use]
    pub fn output(gate: impl Into<GateId>) -> Self {
        Self {
            gate: gate.into(),
            pin: OUTPUT_PIN,
        }
    }

    /// A specific output pin, for multi-output gates. Indices beyond
    /// `i32::MAX` saturate so they can never alias the negative
    /// [`OUTPUT_PIN`] convention.
    #[must_use]
    pub fn output_pin(gate: impl Into<GateId>, pin: u32) -> Self {
        Self {
            gate: gate.into(),
            pin: i32::try_from(pin).unwrap_or(i32::MAX),
        }
    }

    /// A specific input pin on the target gate.
    #[must_use]
    pub fn input(gate: impl Into<GateId>, pin: u32) -> Self {
        Self {
            gate: gate.into(),
            pin: i32::try_from(pin).unwrap_or(i32::MAX),
        }
    }

    /// Output pin resolved to an index into `Gate::outputs`.
    pub fn output_index(&self) -> usize {
        if self.pin < 0 {
            0
        } else {
            self.pin as usize
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.gate, self.pin)
    }
}

/// Directed connection from one gate's output pin to another gate's input
/// pin. `is_active` mirrors the source output for the UI; it carries no
/// logic of its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub from: PinRef,
    pub to: PinRef,
    #[serde(default, rename = "isActive")]
    pub is_active: bool,
}

impl Wire {
    #[must_use]
    pub fn new(id: impl Into<WireId>, from: PinRef, to: PinRef) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            is_active: false,
        }
    }

    /// Wire from `source`'s primary output to `target`'s input pin `pin`.
    #[must_use]
    pub fn connect(
        id: impl Into<WireId>,
        source: impl Into<GateId>,
        target: impl Into<GateId>,
        pin: u32,
    ) -> Self {
        Self::new(id, PinRef::output(source), PinRef::input(target, pin))
    }

    /// Input pin resolved to an index into the target gate's `inputs`.
    pub fn target_pin(&self) -> usize {
        self.to.pin.max(0) as usize
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.id, self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_pin_convention() {
        let pin = PinRef::output("a");
        assert_eq!(pin.pin, OUTPUT_PIN);
        assert_eq!(pin.output_index(), 0);
        assert_eq!(PinRef::output_pin("a", 2).output_index(), 2);
    }

    #[test]
    fn oversized_pin_indices_saturate_instead_of_wrapping() {
        assert_eq!(PinRef::output_pin("a", u32::MAX).pin, i32::MAX);
        assert_eq!(PinRef::input("a", u32::MAX).pin, i32::MAX);
        // Saturated indices stay on the non-negative side of the convention.
        assert!(PinRef::output_pin("a", u32::MAX).pin != OUTPUT_PIN);
    }

    #[test]
    fn wire_round_trips_through_serde() {
        let wire = Wire::connect("w1", "a", "b", 1);
        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("\"pinIndex\":-1"));
        let back: Wire = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wire);
    }
}
