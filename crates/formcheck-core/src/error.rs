//! Error types for the FormCheck engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Angle computation was given coincident points. Raised instead of
    /// silently propagating NaN from zero-length vectors; callers treat
    /// the frame as unanalyzable and skip it.
    #[error("degenerate angle: {endpoint} endpoint coincides with the vertex")]
    DegenerateAngle { endpoint: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
