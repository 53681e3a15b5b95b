//! Deterministic evaluation engine for an interactive logic-circuit
//! playground.
//!
//! The engine takes a plain `{gates, wires}` circuit value plus an
//! evaluation configuration and computes every gate's outputs and every
//! wire's active state at a point in time. Combinational gates, sequential
//! elements (flip-flops, latches, counters), feedback loops, and clock
//! oscillators are all handled; evaluation is a pure function of the input
//! snapshot and the supplied timestamp, so identical inputs always produce
//! bit-identical results.
//!
//! Rendering, placement geometry, persistence, and lesson content are
//! collaborators on the other side of this crate's boundary: they feed in
//! serializable circuit values and consume the immutable snapshots (and
//! [`Transition`] diffs) that evaluation returns.

pub mod core;
pub mod eval;
pub mod logging;
pub mod time;

pub use crate::core::{
    circuit::{Circuit, Transition},
    custom::{CustomGateBody, CustomGateDefinition},
    gate::{Gate, GateId, GateKind, GateMetadata, Position},
    wire::{PinRef, Wire, WireId, OUTPUT_PIN},
};
pub use eval::{
    evaluate_gate, validate, DependencyGraph, Endpoint, Error, EvalConfig, Evaluation,
    EvaluationStats, GateEvaluation, Warning, MAX_CONVERGENCE_PASSES, MAX_CUSTOM_DEPTH,
};
pub use logging::init_tracing;
pub use time::{EvaluationContext, FixedTime, SteppedTime, SystemClock, TimeProvider};
