use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::{
    core::circuit::Circuit,
    eval::error::{Endpoint, Error, Warning},
};

/// Pre-flight structural validation. Hard errors (malformed records,
/// dangling references) abort evaluation before anything is touched;
/// everything else comes back as warnings and evaluation proceeds.
///
/// Cycle detection is deliberately not here: ordering owns it, and a cycle
/// is diagnostic data rather than a reason to refuse feedback circuits.
pub fn validate(circuit: &Circuit) -> Result<Vec<Warning>, Error> {
    let mut warnings = Vec::new();

    let mut gate_ids = HashSet::new();
    for gate in &circuit.gates {
        if gate.id.is_empty() {
            return Err(Error::invalid_gate(gate.id.clone(), "missing id"));
        }
        if !gate_ids.insert(&gate.id) {
            warnings.push(Warning::DuplicateGateId(gate.id.clone()));
        }
    }

    let index = circuit.gate_index();

    let mut wire_ids = HashSet::new();
    let mut driven_pins: HashMap<(&str, usize), usize> = HashMap::new();
    for wire in &circuit.wires {
        if wire.id.is_empty() {
            return Err(Error::invalid_wire(wire.id.clone(), "missing id"));
        }
        if !wire_ids.insert(&wire.id) {
            warnings.push(Warning::DuplicateWireId(wire.id.clone()));
        }

        if wire.from.gate.is_empty() {
            return Err(Error::invalid_wire(wire.id.clone(), "empty source gate id"));
        }
        if wire.to.gate.is_empty() {
            return Err(Error::invalid_wire(wire.id.clone(), "empty target gate id"));
        }

        let source = index
            .get(&*wire.from.gate.0)
            .ok_or_else(|| Error::MissingDependency {
                wire: wire.id.clone(),
                gate: wire.from.gate.clone(),
                endpoint: Endpoint::Source,
            })?;
        if !index.contains_key(&*wire.to.gate.0) {
            return Err(Error::MissingDependency {
                wire: wire.id.clone(),
                gate: wire.to.gate.clone(),
                endpoint: Endpoint::Target,
            });
        }

        let source_gate = &circuit.gates[*source];
        let declared = source_gate.kind.output_arity(&source_gate.metadata);
        if wire.from.pin >= 0 && wire.from.pin as usize >= declared {
            warnings.push(Warning::InvalidOutputPin {
                wire: wire.id.clone(),
                gate: wire.from.gate.clone(),
                pin: wire.from.pin,
            });
        }

        // Fan-in 1: a contested input pin keeps only its last wire.
        let pin = (&*wire.to.gate.0, wire.target_pin());
        if let Some(count) = driven_pins.get_mut(&pin) {
            *count += 1;
            warnings.push(Warning::InputPinContested {
                wire: wire.id.clone(),
                gate: wire.to.gate.clone(),
                pin: wire.target_pin(),
            });
        } else {
            driven_pins.insert(pin, 1);
        }
    }

    trace!(
        gates = circuit.gates.len(),
        wires = circuit.wires.len(),
        warnings = warnings.len(),
        "validation finished"
    );

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        gate::Gate,
        wire::{PinRef, Wire},
    };

    #[test]
    fn clean_circuit_validates_without_warnings() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_gate(Gate::not("n"))
            .add_wire(Wire::connect("w1", "a", "n", 0));
        assert_eq!(validate(&circuit).unwrap(), vec![]);
    }

    #[test]
    fn empty_gate_id_is_a_hard_error() {
        let mut circuit = Circuit::new();
        circuit.add_gate(Gate::and(""));
        assert!(matches!(
            validate(&circuit),
            Err(Error::InvalidGate { .. })
        ));
    }

    #[test]
    fn empty_wire_id_is_a_hard_error() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_gate(Gate::not("n"))
            .add_wire(Wire::connect("", "a", "n", 0));
        assert!(matches!(
            validate(&circuit),
            Err(Error::InvalidWire { .. })
        ));
    }

    #[test]
    fn empty_endpoint_id_is_a_hard_error() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_wire(Wire::connect("w1", "a", "", 0));
        assert!(matches!(
            validate(&circuit),
            Err(Error::InvalidWire { .. })
        ));
    }

    #[test]
    fn missing_source_and_target_are_distinguished() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::not("n"))
            .add_wire(Wire::connect("w1", "ghost", "n", 0));
        assert_eq!(
            validate(&circuit),
            Err(Error::MissingDependency {
                wire: "w1".into(),
                gate: "ghost".into(),
                endpoint: Endpoint::Source,
            })
        );

        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_wire(Wire::connect("w1", "a", "ghost", 0));
        assert_eq!(
            validate(&circuit),
            Err(Error::MissingDependency {
                wire: "w1".into(),
                gate: "ghost".into(),
                endpoint: Endpoint::Target,
            })
        );
    }

    #[test]
    fn duplicate_ids_are_warnings_not_errors() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_gate(Gate::input("a", true))
            .add_gate(Gate::not("n"))
            .add_wire(Wire::connect("w1", "a", "n", 0))
            .add_wire(Wire::connect("w1", "a", "n", 0));

        let warnings = validate(&circuit).unwrap();
        assert!(warnings.contains(&Warning::DuplicateGateId("a".into())));
        assert!(warnings.contains(&Warning::DuplicateWireId("w1".into())));
    }

    #[test]
    fn out_of_range_output_pin_is_a_warning() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_gate(Gate::not("n"))
            .add_wire(Wire::new(
                "w1",
                PinRef::output_pin("a", 3),
                PinRef::input("n", 0),
            ));

        let warnings = validate(&circuit).unwrap();
        assert_eq!(
            warnings,
            vec![Warning::InvalidOutputPin {
                wire: "w1".into(),
                gate: "a".into(),
                pin: 3,
            }]
        );
    }

    #[test]
    fn contested_input_pin_is_a_warning() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_gate(Gate::input("b", true))
            .add_gate(Gate::not("n"))
            .add_wire(Wire::connect("w1", "a", "n", 0))
            .add_wire(Wire::connect("w2", "b", "n", 0));

        let warnings = validate(&circuit).unwrap();
        assert_eq!(
            warnings,
            vec![Warning::InputPinContested {
                wire: "w2".into(),
                gate: "n".into(),
                pin: 0,
            }]
        );
    }
}
