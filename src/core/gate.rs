use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

use crate::core::custom::CustomGateDefinition;

/// Identity of a gate, as assigned by the editor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateId(pub String);

impl GateId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for GateId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for GateId {
    fn from(s: &str) -> Self {
        GateId(s.to_owned())
    }
}

impl From<String> for GateId {
    fn from(s: String) -> Self {
        GateId(s)
    }
}

/// Closed set of gate behaviors. Evaluation dispatches by matching on this
/// enum, so adding a variant forces every match site to handle it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateKind {
    And,
    Or,
    Not,
    Xor,
    Nand,
    Nor,
    Input,
    Output,
    Mux,
    Clock,
    #[serde(rename = "D_FF")]
    DFlipFlop,
    #[serde(rename = "SR_LATCH")]
    SrLatch,
    BinaryCounter,
    Custom,
}

pub(crate) const DEFAULT_COUNTER_WIDTH: usize = 4;

impl GateKind {
    /// Declared number of input pins. `Custom` gates declare their own arity
    /// through their definition; without one they accept nothing.
    pub fn input_arity(self, metadata: &GateMetadata) -> usize {
        match self {
            GateKind::And | GateKind::Or | GateKind::Xor | GateKind::Nand | GateKind::Nor => 2,
            GateKind::Not | GateKind::Output | GateKind::BinaryCounter => 1,
            GateKind::Input | GateKind::Clock => 0,
            GateKind::Mux => 3,
            GateKind::DFlipFlop | GateKind::SrLatch => 2,
            GateKind::Custom => metadata
                .custom_definition()
                .map(|def| def.inputs.len())
                .unwrap_or(0),
        }
    }

    /// Declared number of output pins.
    pub fn output_arity(self, metadata: &GateMetadata) -> usize {
        match self {
            GateKind::DFlipFlop | GateKind::SrLatch => 2,
            GateKind::BinaryCounter => match metadata {
                GateMetadata::Counter { width, .. } => (*width).max(1),
                _ => DEFAULT_COUNTER_WIDTH,
            },
            GateKind::Custom => metadata
                .custom_definition()
                .map(|def| def.outputs.len().max(1))
                .unwrap_or(1),
            _ => 1,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Gate-local persistent state, threaded between evaluation calls by the
/// circuit evaluator. Every sequential behavior lives here so circuits stay
/// plain serializable data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateMetadata {
    #[default]
    None,
    Clock {
        is_running: bool,
        frequency_hz: f64,
        /// Unset until the first evaluation pins the phase origin.
        start_time: Option<f64>,
    },
    FlipFlop {
        q: bool,
        q_bar: bool,
        prev_clock: bool,
    },
    Latch {
        q: bool,
        q_bar: bool,
    },
    Counter {
        value: u32,
        width: usize,
        prev_clock: bool,
    },
    Custom {
        /// `None` models a malformed or missing definition; evaluation
        /// degrades to all-false outputs plus a warning.
        definition: Option<CustomGateDefinition>,
    },
}

impl GateMetadata {
    pub fn custom_definition(&self) -> Option<&CustomGateDefinition> {
        match self {
            GateMetadata::Custom { definition } => definition.as_ref(),
            _ => None,
        }
    }
}

/// Canvas coordinates. Owned by the editor, ignored by evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: GateId,
    pub kind: GateKind,
    #[serde(default)]
    pub position: Position,
    /// Last-resolved input signal per pin, in pin order.
    #[serde(default)]
    pub inputs: Vec<bool>,
    /// Last-computed output signal per pin, in pin order.
    #[serde(default)]
    pub outputs: Vec<bool>,
    #[serde(default)]
    pub metadata: GateMetadata,
}

impl Gate {
    #[must_use]
    pub fn new(id: impl Into<GateId>, kind: GateKind) -> Self {
        Self::with_metadata(id, kind, default_metadata(kind))
    }

    #[must_use]
    pub fn with_metadata(id: impl Into<GateId>, kind: GateKind, metadata: GateMetadata) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Position::default(),
            inputs: vec![false; kind.input_arity(&metadata)],
            outputs: vec![false; kind.output_arity(&metadata)],
            metadata,
        }
    }

    #[must_use]
    pub fn and(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::And)
    }

    #[must_use]
    pub fn or(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Or)
    }

    #[must_use]
    pub fn not(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Not)
    }

    #[must_use]
    pub fn xor(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Xor)
    }

    #[must_use]
    pub fn nand(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Nand)
    }

    #[must_use]
    pub fn nor(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Nor)
    }

    /// An externally toggled source gate holding `value`.
    #[must_use]
    pub fn input(id: impl Into<GateId>, value: bool) -> Self {
        let mut gate = Self::new(id, GateKind::Input);
        gate.outputs[0] = value;
        gate
    }

    #[must_use]
    pub fn output(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Output)
    }

    #[must_use]
    pub fn mux(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::Mux)
    }

    #[must_use]
    pub fn clock(id: impl Into<GateId>, frequency_hz: f64) -> Self {
        Self::with_metadata(
            id,
            GateKind::Clock,
            GateMetadata::Clock {
                is_running: true,
                frequency_hz,
                start_time: None,
            },
        )
    }

    #[must_use]
    pub fn d_flip_flop(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::DFlipFlop)
    }

    #[must_use]
    pub fn sr_latch(id: impl Into<GateId>) -> Self {
        Self::new(id, GateKind::SrLatch)
    }

    #[must_use]
    pub fn binary_counter(id: impl Into<GateId>, width: usize) -> Self {
        Self::with_metadata(
            id,
            GateKind::BinaryCounter,
            GateMetadata::Counter {
                value: 0,
                width: width.max(1),
                prev_clock: false,
            },
        )
    }

    #[must_use]
    pub fn custom(id: impl Into<GateId>, definition: Option<CustomGateDefinition>) -> Self {
        Self::with_metadata(id, GateKind::Custom, GateMetadata::Custom { definition })
    }

    /// The gate's primary (pin 0) output.
    pub fn primary_output(&self) -> bool {
        self.outputs.first().copied().unwrap_or(false)
    }

    /// Externally driven value of an `Input` gate; meaningless for others.
    pub fn set_input_value(&mut self, value: bool) {
        if self.outputs.is_empty() {
            self.outputs.push(value);
        } else {
            self.outputs[0] = value;
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

fn default_metadata(kind: GateKind) -> GateMetadata {
    match kind {
        GateKind::Clock => GateMetadata::Clock {
            is_running: true,
            frequency_hz: 1.0,
            start_time: None,
        },
        GateKind::DFlipFlop => GateMetadata::FlipFlop {
            q: false,
            q_bar: true,
            prev_clock: false,
        },
        GateKind::SrLatch => GateMetadata::Latch {
            q: false,
            q_bar: true,
        },
        GateKind::BinaryCounter => GateMetadata::Counter {
            value: 0,
            width: DEFAULT_COUNTER_WIDTH,
            prev_clock: false,
        },
        GateKind::Custom => GateMetadata::Custom { definition: None },
        _ => GateMetadata::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_follows_kind() {
        assert_eq!(Gate::and("a").inputs.len(), 2);
        assert_eq!(Gate::not("n").inputs.len(), 1);
        assert_eq!(Gate::mux("m").inputs.len(), 3);
        assert_eq!(Gate::clock("c", 1.0).inputs.len(), 0);
        assert_eq!(Gate::d_flip_flop("ff").outputs.len(), 2);
        assert_eq!(Gate::binary_counter("ctr", 4).outputs.len(), 4);
    }

    #[test]
    fn input_gate_holds_its_value() {
        let mut gate = Gate::input("a", true);
        assert!(gate.primary_output());
        gate.set_input_value(false);
        assert!(!gate.primary_output());
    }

    #[test]
    fn unknown_kind_string_is_rejected_at_the_serde_boundary() {
        assert!(serde_json::from_str::<GateKind>("\"QUANTUM\"").is_err());
    }

    #[test]
    fn kind_serialization_uses_editor_names() {
        assert_eq!(
            serde_json::to_string(&GateKind::DFlipFlop).unwrap(),
            "\"D_FF\""
        );
        assert_eq!(
            serde_json::to_string(&GateKind::BinaryCounter).unwrap(),
            "\"BINARY_COUNTER\""
        );
    }
}
