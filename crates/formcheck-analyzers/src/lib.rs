//! # FormCheck-Analyzers
//!
//! Real-time exercise-form analysis from streams of 2D body-landmark
//! observations. Each analyzer consumes one landmark frame at a time and
//! emits a structured result: the current movement phase, cumulative rep
//! counts, a per-rep form verdict and a temporally stable feedback
//! message suitable for display or voice at low frame rates.
//!
//! ## Engine shape
//!
//! The per-frame pipeline is deterministic and single-pass: angle
//! computation, EMA smoothing, sticky side selection, hysteresis-based
//! phase detection, debounced form checks, per-rep issue aggregation and
//! priority-locked feedback stabilization. There is no lookahead and no
//! backtracking; results are produced in frame-submission order.
//!
//! Analyzer instances are not thread-safe for concurrent producers: use
//! one instance per independent subject/session.

pub mod analyzer;
pub mod debounce;
pub mod pushup;
pub mod registry;
pub mod side;
pub mod squat;
pub mod stabilizer;
pub mod trajectory;

pub use analyzer::*;
pub use debounce::*;
pub use pushup::*;
pub use registry::*;
pub use side::*;
pub use squat::*;
pub use stabilizer::*;
pub use trajectory::*;
