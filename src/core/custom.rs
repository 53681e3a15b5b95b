use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{circuit::Circuit, gate::GateId};

/// Reusable gate definition authored by the user: either a plain truth table
/// or a nested circuit with explicit pin mappings. Recursive by construction;
/// a `Custom` gate inside the internal circuit nests another definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomGateDefinition {
    pub id: String,
    pub name: String,
    /// Named input pins, in pin order. The length is the gate's input arity.
    pub inputs: Vec<String>,
    /// Named output pins, in pin order.
    pub outputs: Vec<String>,
    pub body: CustomGateBody,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomGateBody {
    /// Maps an input bit-string (`'0'`/`'1'`, pin order) to an output
    /// bit-string of the same convention.
    TruthTable(BTreeMap<String, String>),
    /// Nested circuit. `input_map[i]` names the `Input` gate that receives
    /// external input pin `i`; `output_map[j]` names the gate whose primary
    /// output is exposed as external output pin `j`.
    Subcircuit {
        circuit: Circuit,
        input_map: Vec<GateId>,
        output_map: Vec<GateId>,
    },
}

impl CustomGateDefinition {
    #[must_use]
    pub fn from_truth_table(
        id: impl Into<String>,
        name: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        table: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            inputs,
            outputs,
            body: CustomGateBody::TruthTable(table),
        }
    }

    #[must_use]
    pub fn from_subcircuit(
        id: impl Into<String>,
        name: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        circuit: Circuit,
        input_map: Vec<GateId>,
        output_map: Vec<GateId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            inputs,
            outputs,
            body: CustomGateBody::Subcircuit {
                circuit,
                input_map,
                output_map,
            },
        }
    }

    /// Bit-string key for a truth-table lookup, pin order preserved.
    pub fn encode_inputs(values: &[bool]) -> String {
        values.iter().map(|v| if *v { '1' } else { '0' }).collect()
    }

    /// Decodes a truth-table row into pin values. Rows shorter than the
    /// declared output count are padded with `false`.
    pub fn decode_outputs(&self, row: &str) -> Vec<bool> {
        (0..self.outputs.len().max(1))
            .map(|i| row.as_bytes().get(i) == Some(&b'1'))
            .collect()
    }
}
