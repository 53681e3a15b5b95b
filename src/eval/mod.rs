pub mod circuit;
pub mod error;
pub mod gate;
pub mod graph;
pub mod validate;

pub use circuit::{EvalConfig, Evaluation, EvaluationStats, MAX_CONVERGENCE_PASSES, MAX_CUSTOM_DEPTH};
pub use error::{Endpoint, Error, Warning};
pub use gate::{evaluate_gate, GateEvaluation};
pub use graph::DependencyGraph;
pub use validate::validate;
