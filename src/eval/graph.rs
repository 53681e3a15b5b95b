use std::collections::HashMap;

use tracing::debug;

use crate::core::{circuit::Circuit, gate::GateId};

/// Dependency analysis of a circuit: a topological evaluation order plus
/// every feedback loop found along the way.
///
/// The order is a reverse post-order DFS over the gate dependency graph
/// (edge A → B when a wire connects an output of A to an input of B). For
/// acyclic circuits this is a strict topological order. Gates on a cycle
/// still receive exactly one slot; the circuit evaluator resolves their
/// feedback edges against previous-pass values, so a "good enough" order is
/// sufficient there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DependencyGraph {
    /// Gate indices (into `circuit.gates`) in evaluation order.
    pub order: Vec<usize>,
    /// Each detected cycle as the ordered gate-ID stack that closed it,
    /// first and last entries equal.
    pub cycles: Vec<Vec<GateId>>,
}

impl DependencyGraph {
    pub fn analyze(circuit: &Circuit, index: &HashMap<&str, usize>) -> Self {
        let n = circuit.gates.len();

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for wire in &circuit.wires {
            let (Some(&from), Some(&to)) = (
                index.get(&*wire.from.gate.0),
                index.get(&*wire.to.gate.0),
            ) else {
                // Dangling endpoints are validation's concern, not ordering's.
                continue;
            };
            successors[from].push(to);
        }

        let mut walk = Walk {
            circuit,
            successors: &successors,
            state: vec![VisitState::Unvisited; n],
            path: Vec::new(),
            postorder: Vec::new(),
            cycles: Vec::new(),
        };

        for start in 0..n {
            if walk.state[start] == VisitState::Unvisited {
                walk.visit(start);
            }
        }

        walk.postorder.reverse();

        if !walk.cycles.is_empty() {
            debug!(cycles = walk.cycles.len(), "dependency graph has feedback");
        }

        DependencyGraph {
            order: walk.postorder,
            cycles: walk.cycles,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    /// On the active recursion stack.
    Active,
    Done,
}

struct Walk<'c> {
    circuit: &'c Circuit,
    successors: &'c [Vec<usize>],
    state: Vec<VisitState>,
    path: Vec<usize>,
    postorder: Vec<usize>,
    cycles: Vec<Vec<GateId>>,
}

impl Walk<'_> {
    fn visit(&mut self, node: usize) {
        self.state[node] = VisitState::Active;
        self.path.push(node);

        let successors = self.successors;
        for &next in &successors[node] {
            match self.state[next] {
                VisitState::Unvisited => self.visit(next),
                // Back edge: the recursion stack from `next` onward is the loop.
                VisitState::Active => self.record_cycle(next),
                VisitState::Done => {}
            }
        }

        self.path.pop();
        self.state[node] = VisitState::Done;
        self.postorder.push(node);
    }

    fn record_cycle(&mut self, reentry: usize) {
        let start = self
            .path
            .iter()
            .position(|&n| n == reentry)
            .unwrap_or_default();

        let mut stack: Vec<GateId> = self.path[start..]
            .iter()
            .map(|&n| self.circuit.gates[n].id.clone())
            .collect();
        stack.push(self.circuit.gates[reentry].id.clone());
        self.cycles.push(stack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{gate::Gate, wire::Wire};

    fn ids(circuit: &Circuit, order: &[usize]) -> Vec<String> {
        order
            .iter()
            .map(|&i| circuit.gates[i].id.0.clone())
            .collect()
    }

    #[test]
    fn feedforward_chain_orders_upstream_first() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::not("c"))
            .add_gate(Gate::not("b"))
            .add_gate(Gate::input("a", false))
            .add_wire(Wire::connect("w1", "a", "b", 0))
            .add_wire(Wire::connect("w2", "b", "c", 0));

        let graph = DependencyGraph::analyze(&circuit, &circuit.gate_index());
        assert!(graph.cycles.is_empty());

        let order = ids(&circuit, &graph.order);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn two_gate_loop_is_reported_with_both_ids() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::not("a"))
            .add_gate(Gate::not("b"))
            .add_wire(Wire::connect("w1", "a", "b", 0))
            .add_wire(Wire::connect("w2", "b", "a", 0));

        let graph = DependencyGraph::analyze(&circuit, &circuit.gate_index());
        assert_eq!(graph.cycles.len(), 1);

        let stack = &graph.cycles[0];
        assert_eq!(stack.first(), stack.last());
        assert!(stack.iter().any(|id| &**id == "a"));
        assert!(stack.iter().any(|id| &**id == "b"));
    }

    #[test]
    fn three_gate_loop_carries_the_whole_stack() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::not("a"))
            .add_gate(Gate::not("b"))
            .add_gate(Gate::not("c"))
            .add_wire(Wire::connect("w1", "a", "b", 0))
            .add_wire(Wire::connect("w2", "b", "c", 0))
            .add_wire(Wire::connect("w3", "c", "a", 0));

        let graph = DependencyGraph::analyze(&circuit, &circuit.gate_index());
        assert_eq!(graph.cycles.len(), 1);
        let stack = &graph.cycles[0];
        for id in ["a", "b", "c"] {
            assert!(stack.iter().any(|g| &**g == id), "missing {id} in {stack:?}");
        }
    }

    #[test]
    fn dangling_wire_endpoints_are_ignored() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::input("a", false))
            .add_wire(Wire::connect("w1", "a", "ghost", 0));

        let graph = DependencyGraph::analyze(&circuit, &circuit.gate_index());
        assert_eq!(graph.order, vec![0]);
        assert!(graph.cycles.is_empty());
    }

    #[test]
    fn every_gate_appears_exactly_once_even_with_feedback() {
        let mut circuit = Circuit::new();
        circuit
            .add_gate(Gate::nor("a"))
            .add_gate(Gate::nor("b"))
            .add_gate(Gate::input("s", false))
            .add_gate(Gate::input("r", false))
            .add_wire(Wire::connect("w1", "s", "a", 0))
            .add_wire(Wire::connect("w2", "b", "a", 1))
            .add_wire(Wire::connect("w3", "r", "b", 0))
            .add_wire(Wire::connect("w4", "a", "b", 1));

        let graph = DependencyGraph::analyze(&circuit, &circuit.gate_index());
        let mut order = graph.order.clone();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(!graph.cycles.is_empty());
    }
}
