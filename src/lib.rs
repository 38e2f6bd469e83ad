//! Quartermaster: budget- and quota-constrained squad selection over scored candidates.
//!
//! The active path is `data::loader` → `optimizer::SquadSolver` → `optimizer::captain`,
//! with `optimizer::MultiSquadGenerator` repeating solves over a shrinking pool.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod optimizer;
pub mod parallel;
