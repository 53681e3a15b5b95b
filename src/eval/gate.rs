use crate::{
    core::{
        custom::{CustomGateBody, CustomGateDefinition},
        gate::{Gate, GateKind, GateMetadata, DEFAULT_COUNTER_WIDTH},
    },
    eval::{
        circuit::{evaluate_at_depth, EvalConfig},
        error::{Error, Warning},
    },
    time::EvaluationContext,
};

/// Result of evaluating a single gate: the new output pin values plus the
/// gate-local state the circuit evaluator must persist into the gate record
/// before the next call. The function itself is stateless per call; all
/// memory lives in [`GateMetadata`].
#[derive(Clone, Debug, PartialEq)]
pub struct GateEvaluation {
    pub outputs: Vec<bool>,
    pub metadata: Option<GateMetadata>,
    /// Diagnostics raised inside a custom gate's sub-circuit; the circuit
    /// evaluator folds these into the top-level warning list so nested
    /// faults stay visible to the caller.
    pub warnings: Vec<Warning>,
}

impl GateEvaluation {
    fn pure(outputs: Vec<bool>) -> Self {
        Self {
            outputs,
            metadata: None,
            warnings: Vec::new(),
        }
    }

    /// The gate's primary (pin 0) output.
    pub fn primary_output(&self) -> bool {
        self.outputs.first().copied().unwrap_or(false)
    }
}

/// Pure per-gate evaluation. `inputs` are the resolved signal values in pin
/// order; pins beyond the slice read as low, uniformly for every kind.
/// Combinational kinds are plain boolean functions; sequential kinds read
/// their stored state from `gate.metadata` and report the replacement state.
///
/// Time comes exclusively from `ctx`; this function never consults the wall
/// clock, which is what makes evaluation reproducible under test.
pub fn evaluate_gate(
    gate: &Gate,
    inputs: &[bool],
    ctx: &EvaluationContext,
    config: &EvalConfig,
    depth: usize,
) -> Result<GateEvaluation, Error> {
    let input = |pin: usize| inputs.get(pin).copied().unwrap_or(false);

    // Short slices pad up to the declared arity; extra pins beyond it are
    // still honored so the boolean kinds stay n-ary.
    let span = gate.kind.input_arity(&gate.metadata).max(inputs.len());

    match gate.kind {
        GateKind::And => Ok(GateEvaluation::pure(vec![
            span > 0 && (0..span).map(input).all(|v| v),
        ])),
        GateKind::Or => Ok(GateEvaluation::pure(vec![(0..span).map(input).any(|v| v)])),
        GateKind::Not => Ok(GateEvaluation::pure(vec![!input(0)])),
        GateKind::Xor => Ok(GateEvaluation::pure(vec![
            (0..span).map(input).filter(|&v| v).count() % 2 == 1,
        ])),
        GateKind::Nand => Ok(GateEvaluation::pure(vec![
            !(span > 0 && (0..span).map(input).all(|v| v)),
        ])),
        GateKind::Nor => Ok(GateEvaluation::pure(vec![
            !(0..span).map(input).any(|v| v),
        ])),
        GateKind::Input => Ok(GateEvaluation::pure(vec![gate.primary_output()])),
        GateKind::Output => Ok(GateEvaluation::pure(vec![input(0)])),
        GateKind::Mux => {
            // Pin order: I0, I1, Select.
            let selected = if input(2) { input(1) } else { input(0) };
            Ok(GateEvaluation::pure(vec![selected]))
        }
        GateKind::Clock => Ok(evaluate_clock(gate, ctx)),
        GateKind::DFlipFlop => Ok(evaluate_flip_flop(gate, input(0), input(1))),
        GateKind::SrLatch => Ok(evaluate_sr_latch(gate, input(0), input(1))),
        GateKind::BinaryCounter => Ok(evaluate_counter(gate, input(0))),
        GateKind::Custom => evaluate_custom(gate, inputs, ctx, config, depth),
    }
}

/// 50% duty cycle square wave. The phase origin is pinned to the first
/// evaluation time and persisted, so a clock placed mid-session starts its
/// cycle there rather than at t=0.
fn evaluate_clock(gate: &Gate, ctx: &EvaluationContext) -> GateEvaluation {
    let (is_running, frequency_hz, start_time) = match gate.metadata {
        GateMetadata::Clock {
            is_running,
            frequency_hz,
            start_time,
        } => (is_running, frequency_hz, start_time),
        _ => (true, 1.0, None),
    };

    let start = start_time.unwrap_or(ctx.current_time);
    let metadata = Some(GateMetadata::Clock {
        is_running,
        frequency_hz,
        start_time: Some(start),
    });

    // A stopped or misconfigured clock never toggles.
    if !is_running || frequency_hz <= 0.0 || !frequency_hz.is_finite() {
        return GateEvaluation {
            outputs: vec![false],
            metadata,
            warnings: Vec::new(),
        };
    }

    let period = 1000.0 / frequency_hz;
    let cycle_position = (ctx.current_time - start).rem_euclid(period) / period;

    GateEvaluation {
        outputs: vec![cycle_position < 0.5],
        metadata,
        warnings: Vec::new(),
    }
}

/// Positive-edge-triggered D flip-flop. Q takes D only on a 0→1 clock
/// transition relative to the stored `prev_clock`; Q̄ is always ¬Q.
fn evaluate_flip_flop(gate: &Gate, d: bool, clk: bool) -> GateEvaluation {
    let (q, prev_clock) = match gate.metadata {
        GateMetadata::FlipFlop { q, prev_clock, .. } => (q, prev_clock),
        _ => (false, false),
    };

    let rising = clk && !prev_clock;
    let q = if rising { d } else { q };

    GateEvaluation {
        outputs: vec![q, !q],
        metadata: Some(GateMetadata::FlipFlop {
            q,
            q_bar: !q,
            prev_clock: clk,
        }),
        warnings: Vec::new(),
    }
}

/// Level-sensitive SR latch. The forbidden S=R=1 input holds both stored
/// outputs unchanged rather than oscillating.
fn evaluate_sr_latch(gate: &Gate, s: bool, r: bool) -> GateEvaluation {
    let (stored_q, stored_q_bar) = match gate.metadata {
        GateMetadata::Latch { q, q_bar } => (q, q_bar),
        _ => (false, true),
    };

    let (q, q_bar) = match (s, r) {
        (true, false) => (true, false),
        (false, true) => (false, true),
        (false, false) => (stored_q, !stored_q),
        (true, true) => (stored_q, stored_q_bar),
    };

    GateEvaluation {
        outputs: vec![q, q_bar],
        metadata: Some(GateMetadata::Latch { q, q_bar }),
        warnings: Vec::new(),
    }
}

/// Rising-edge binary counter, wrapping at 2^width. Output pin i is bit i of
/// the count (Q0 = LSB).
fn evaluate_counter(gate: &Gate, clk: bool) -> GateEvaluation {
    let (value, width, prev_clock) = match gate.metadata {
        GateMetadata::Counter {
            value,
            width,
            prev_clock,
        } => (value, width.max(1), prev_clock),
        _ => (0, DEFAULT_COUNTER_WIDTH, false),
    };

    let mask = if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };

    let value = if clk && !prev_clock {
        value.wrapping_add(1) & mask
    } else {
        value & mask
    };

    GateEvaluation {
        outputs: (0..width).map(|bit| value >> bit & 1 == 1).collect(),
        metadata: Some(GateMetadata::Counter {
            value,
            width,
            prev_clock: clk,
        }),
        warnings: Vec::new(),
    }
}

/// User-defined gate: truth-table lookup, or recursive evaluation of the
/// nested circuit with external pins injected at the mapped `Input` gates
/// and read from the mapped gates' primary outputs.
///
/// Every malformed-definition path reports a typed error; the circuit
/// evaluator downgrades it to an all-false fallback plus a warning so one
/// broken gate never takes the rest of the circuit down.
fn evaluate_custom(
    gate: &Gate,
    inputs: &[bool],
    ctx: &EvaluationContext,
    config: &EvalConfig,
    depth: usize,
) -> Result<GateEvaluation, Error> {
    let def = gate
        .metadata
        .custom_definition()
        .ok_or_else(|| Error::evaluation(&gate.id, "missing custom gate definition"))?;

    if depth >= config.max_depth {
        return Err(Error::evaluation(
            &gate.id,
            format!("custom gate nesting exceeds {} levels", config.max_depth),
        ));
    }

    let pins: Vec<bool> = (0..def.inputs.len())
        .map(|i| inputs.get(i).copied().unwrap_or(false))
        .collect();

    match &def.body {
        CustomGateBody::TruthTable(table) => {
            let key = CustomGateDefinition::encode_inputs(&pins);
            let row = table.get(&key).ok_or_else(|| {
                Error::evaluation(&gate.id, format!("truth table has no row for inputs {key:?}"))
            })?;
            Ok(GateEvaluation::pure(def.decode_outputs(row)))
        }
        CustomGateBody::Subcircuit {
            circuit,
            input_map,
            output_map,
        } => {
            let mut inner = circuit.clone();
            for (pin, gate_id) in input_map.iter().enumerate() {
                let inner_gate = inner.gate_mut(gate_id).ok_or_else(|| {
                    Error::evaluation(
                        &gate.id,
                        format!("input map references missing gate {gate_id}"),
                    )
                })?;
                inner_gate.set_input_value(pins.get(pin).copied().unwrap_or(false));
            }

            let result = evaluate_at_depth(&inner, ctx, config, depth + 1)
                .map_err(|e| Error::evaluation(&gate.id, format!("sub-circuit failed: {e}")))?;

            let outputs = output_map
                .iter()
                .map(|gate_id| {
                    result
                        .circuit
                        .gate(gate_id)
                        .map(|g| g.primary_output())
                        .ok_or_else(|| {
                            Error::evaluation(
                                &gate.id,
                                format!("output map references missing gate {gate_id}"),
                            )
                        })
                })
                .collect::<Result<Vec<bool>, Error>>()?;

            // Surface whatever went wrong inside the sub-circuit.
            Ok(GateEvaluation {
                outputs,
                metadata: None,
                warnings: result.warnings,
            })
        }
    }
}
