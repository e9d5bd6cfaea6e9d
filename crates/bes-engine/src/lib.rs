//! # bes-engine
//!
//! Reference [`Evaluator`](bes_types::Evaluator) implementation: an empirical
//! performance model for bioelectrochemical systems with the bounded
//! multiplicative noise the optimizer contract expects.

mod evaluator;

pub use evaluator::SimulationEvaluator;
