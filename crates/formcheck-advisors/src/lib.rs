//! # FormCheck-Advisors
//!
//! Optional auxiliary advisory services around the per-frame analysis
//! engine: qualitative review of short video clips by an external
//! coaching model, and speech synthesis of stable feedback phrases with
//! an in-memory cache.
//!
//! Both services are latency- and availability-tolerant by design. They
//! consume finished clips or feedback text and must never sit on the
//! per-frame path; rep counting continues whether or not an advisor is
//! configured or reachable.

pub mod advisor;
pub mod clip;
pub mod critic;
pub mod prompts;
pub mod speech;

pub use advisor::{AdvisorError, AdvisorResult};
pub use clip::*;
pub use critic::*;
pub use speech::*;
