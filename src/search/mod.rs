//! Candidate generation, fitting, scoring, and progress reporting.

pub mod evaluator;
pub mod fit;
pub mod generator;
pub mod report;
