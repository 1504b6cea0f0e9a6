//! Benchmark support crate for nodal.
//!
//! Provides seeded synthetic flow graphs and parameter types used by the
//! Criterion benchmarks of level extension and scoring.

pub mod error;
pub mod params;
pub mod synthetic;
