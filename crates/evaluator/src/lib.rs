pub mod engine;

pub use engine::{evaluate, evaluate_batch, Evaluation, Transition};
