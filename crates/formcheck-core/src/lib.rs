//! # FormCheck-Core
//!
//! Core types and utilities for the FormCheck real-time exercise-form
//! analysis engine: the body-landmark data model, 2D joint geometry,
//! framing checks and signal smoothing shared by all exercise analyzers.

pub mod error;
pub mod geometry;
pub mod signal;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use signal::*;
pub use types::*;
