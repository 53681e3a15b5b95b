use std::{collections::HashMap, time::Instant};

use bitvec::prelude::*;
use tracing::{debug, warn};

use crate::{
    core::circuit::Circuit,
    eval::{
        error::{Error, Warning},
        gate::{evaluate_gate, GateEvaluation},
        graph::DependencyGraph,
        validate::validate,
    },
    time::EvaluationContext,
};

/// Bounded fixed-point iteration: enough passes to settle latches and mask
/// transient glitches, never an unbounded loop.
pub const MAX_CONVERGENCE_PASSES: usize = 10;

/// Default nesting guard for recursive custom gates.
pub const MAX_CUSTOM_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct EvalConfig {
    /// Run pre-flight structural validation before anything else.
    pub strict_validation: bool,
    /// Attach a per-pass textual trace to the result.
    pub enable_debug: bool,
    /// Upper bound on convergence passes within one call.
    pub max_passes: usize,
    /// Upper bound on custom-gate recursion depth.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
            enable_debug: false,
            max_passes: MAX_CONVERGENCE_PASSES,
            max_depth: MAX_CUSTOM_DEPTH,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvaluationStats {
    /// Gate evaluations performed, summed across convergence passes.
    pub gates_evaluated: usize,
    pub wires_evaluated: usize,
    /// Wall time of this call; diagnostic only, not part of the result's
    /// deterministic surface.
    pub evaluation_time_ms: f64,
    pub cycles_detected: usize,
    /// Convergence passes actually run.
    pub passes: usize,
}

/// Successful evaluation: a fresh circuit snapshot plus diagnostics. The
/// input circuit is never touched.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub circuit: Circuit,
    pub stats: EvaluationStats,
    pub warnings: Vec<Warning>,
    /// Present when [`EvalConfig::enable_debug`] is set.
    pub trace: Option<Vec<String>>,
}

impl Circuit {
    /// Full evaluation pass over the circuit at `ctx.current_time`.
    ///
    /// Gates run in dependency order; inputs whose source has not yet been
    /// evaluated this pass (feedback edges) read the previous-pass value.
    /// Passes repeat until outputs stabilize or the budget runs out, which
    /// converges latches within one call while oscillators keep moving
    /// between calls. Per-gate failures degrade to all-false outputs plus a
    /// warning; only structural validation errors abort the call.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext,
        config: &EvalConfig,
    ) -> Result<Evaluation, Error> {
        evaluate_at_depth(self, ctx, config, 0)
    }

    /// Strict structural check: validation plus cycle rejection. Evaluation
    /// itself tolerates feedback; callers that want to refuse it (e.g. a
    /// combinational-only lesson mode) get the typed error here, stack
    /// included.
    pub fn check(&self) -> Result<Vec<Warning>, Error> {
        let warnings = validate(self)?;
        let graph = DependencyGraph::analyze(self, &self.gate_index());
        if let Some(stack) = graph.cycles.into_iter().next() {
            return Err(Error::CircularDependency { stack });
        }
        Ok(warnings)
    }
}

pub(crate) fn evaluate_at_depth(
    circuit: &Circuit,
    ctx: &EvaluationContext,
    config: &EvalConfig,
    depth: usize,
) -> Result<Evaluation, Error> {
    let started = Instant::now();

    let mut warnings = if config.strict_validation {
        validate(circuit)?
    } else {
        Vec::new()
    };

    let index = circuit.gate_index();
    let graph = DependencyGraph::analyze(circuit, &index);
    for stack in &graph.cycles {
        warn!(stack = %stack.iter().map(|id| id.0.as_str()).collect::<Vec<_>>().join(" -> "),
            "feedback loop; evaluating by convergence");
        warnings.push(Warning::CircularDependency {
            stack: stack.clone(),
        });
    }

    let mut gates = circuit.gates.clone();
    let mut fallen_back = bitvec![0; gates.len()];
    let mut trace = config.enable_debug.then(Vec::new);

    // Last wire into a pin wins, matching duplicate-id policy.
    let mut incoming: HashMap<(usize, usize), usize> = HashMap::new();
    for (wi, wire) in circuit.wires.iter().enumerate() {
        if let Some(&target) = index.get(&*wire.to.gate.0) {
            if index.contains_key(&*wire.from.gate.0) {
                incoming.insert((target, wire.target_pin()), wi);
            }
        }
    }

    let mut stats = EvaluationStats {
        wires_evaluated: circuit.wires.len(),
        cycles_detected: graph.cycles.len(),
        ..EvaluationStats::default()
    };

    for _ in 0..config.max_passes.max(1) {
        let mut changed = 0usize;

        for &gi in &graph.order {
            let arity = gates[gi].kind.input_arity(&gates[gi].metadata);
            let resolved: Vec<bool> = (0..arity)
                .map(|pin| match incoming.get(&(gi, pin)) {
                    Some(&wi) => {
                        let from = &circuit.wires[wi].from;
                        let src = index[&*from.gate.0];
                        // Not-yet-evaluated sources still hold the previous
                        // pass's value here, which is what feedback reads.
                        gates[src]
                            .outputs
                            .get(from.output_index())
                            .copied()
                            .unwrap_or(false)
                    }
                    None => gates[gi].inputs.get(pin).copied().unwrap_or(false),
                })
                .collect();

            let result = match evaluate_gate(&gates[gi], &resolved, ctx, config, depth) {
                Ok(result) => result,
                Err(err) => {
                    if !fallen_back[gi] {
                        fallen_back.set(gi, true);
                        warn!(gate = %gates[gi].id, %err, "gate degraded to fallback");
                        warnings.push(Warning::GateFallback {
                            gate: gates[gi].id.clone(),
                            reason: err.to_string(),
                        });
                    }
                    let pin_count = gates[gi].kind.output_arity(&gates[gi].metadata);
                    GateEvaluation {
                        outputs: vec![false; pin_count],
                        metadata: None,
                        warnings: Vec::new(),
                    }
                }
            };
            stats.gates_evaluated += 1;

            // Nested sub-circuit diagnostics bubble up; custom gates
            // re-evaluate every pass, so dedup keeps one copy of each.
            for warning in result.warnings {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }

            let gate = &mut gates[gi];
            if gate.outputs != result.outputs {
                gate.outputs = result.outputs;
                changed += 1;
            }
            gate.inputs = resolved;
            if let Some(metadata) = result.metadata {
                gate.metadata = metadata;
            }
        }

        stats.passes += 1;
        if let Some(lines) = trace.as_mut() {
            lines.push(format!(
                "pass {}: {} gate output(s) changed",
                stats.passes, changed
            ));
        }
        if changed == 0 {
            break;
        }
    }

    let wires = circuit
        .wires
        .iter()
        .map(|wire| {
            let mut wire = wire.clone();
            wire.is_active = index
                .get(&*wire.from.gate.0)
                .and_then(|&src| gates[src].outputs.get(wire.from.output_index()))
                .copied()
                .unwrap_or(false);
            wire
        })
        .collect();

    stats.evaluation_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    debug!(
        gates = stats.gates_evaluated,
        passes = stats.passes,
        cycles = stats.cycles_detected,
        "evaluation finished"
    );

    Ok(Evaluation {
        circuit: Circuit { gates, wires },
        stats,
        warnings,
        trace,
    })
}
