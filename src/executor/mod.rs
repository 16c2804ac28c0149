// Executor module - turns approved proposals into custody changes

mod transition;

pub use transition::{ExecutionError, ExecutionOutcome, Executor};
