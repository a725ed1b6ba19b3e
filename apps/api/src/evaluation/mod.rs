// Task evaluation & prioritization engine.
// Pipeline: goal context -> prompt input -> oracle -> aggregator -> evaluation store.
// Ranking reads stored evaluations and never calls the oracle.

pub mod aggregator;
pub mod clarification;
pub mod engine;
pub mod fallback;
pub mod goal_context;
pub mod prompt;
pub mod ranker;
pub mod store;
