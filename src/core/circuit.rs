use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    gate::{Gate, GateId},
    wire::Wire,
};

/// The evaluation unit: plain serializable data, treated as an immutable
/// value per evaluation step. Evaluation never mutates a `Circuit` in place;
/// it returns a fresh snapshot, which keeps before/after diffing cheap and
/// exact.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub gates: Vec<Gate>,
    pub wires: Vec<Wire>,
}

impl Circuit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_gate(&mut self, gate: Gate) -> &mut Self {
        self.gates.push(gate);
        self
    }

    pub fn add_wire(&mut self, wire: Wire) -> &mut Self {
        self.wires.push(wire);
        self
    }

    /// Looks a gate up by id. Duplicate ids resolve to the last record,
    /// matching the evaluator's last-write-wins policy.
    pub fn gate(&self, id: &str) -> Option<&Gate> {
        self.gates.iter().rev().find(|g| &*g.id == id)
    }

    pub fn gate_mut(&mut self, id: &str) -> Option<&mut Gate> {
        self.gates.iter_mut().rev().find(|g| &*g.id == id)
    }

    pub fn wire(&self, id: &str) -> Option<&Wire> {
        self.wires.iter().rev().find(|w| &*w.id == id)
    }

    /// Gate index by id, last record winning on duplicates.
    pub(crate) fn gate_index(&self) -> HashMap<&str, usize> {
        self.gates
            .iter()
            .enumerate()
            .map(|(i, g)| (&*g.id.0, i))
            .collect()
    }

    /// Pin-by-pin output transitions from `self` to `next`, matched by gate
    /// id. This is the surface the timing-capture collaborator consumes; the
    /// engine itself emits no events.
    pub fn diff(&self, next: &Circuit) -> Vec<Transition> {
        let prev_index = self.gate_index();

        let mut transitions = Vec::new();
        for gate in &next.gates {
            let Some(prev) = prev_index.get(&*gate.id.0).map(|&i| &self.gates[i]) else {
                continue;
            };
            let pins = prev.outputs.len().max(gate.outputs.len());
            for pin in 0..pins {
                let from = prev.outputs.get(pin).copied().unwrap_or(false);
                let to = gate.outputs.get(pin).copied().unwrap_or(false);
                if from != to {
                    transitions.push(Transition {
                        gate: gate.id.clone(),
                        pin,
                        from,
                        to,
                    });
                }
            }
        }
        transitions
    }
}

/// A single output-pin state change between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub gate: GateId,
    pub pin: usize,
    pub from: bool,
    pub to: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::Gate;

    #[test]
    fn diff_reports_only_changed_pins() {
        let mut before = Circuit::new();
        before.add_gate(Gate::input("a", false));
        before.add_gate(Gate::input("b", true));

        let mut after = before.clone();
        after.gate_mut("a").unwrap().set_input_value(true);

        let transitions = before.diff(&after);
        assert_eq!(
            transitions,
            vec![Transition {
                gate: "a".into(),
                pin: 0,
                from: false,
                to: true,
            }]
        );
    }

    #[test]
    fn duplicate_ids_resolve_to_last_record() {
        let mut circuit = Circuit::new();
        circuit.add_gate(Gate::input("a", false));
        circuit.add_gate(Gate::input("a", true));
        assert!(circuit.gate("a").unwrap().primary_output());
    }
}
