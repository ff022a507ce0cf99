//! The analyzer interface and its per-frame result type.

use formcheck_core::{
    ExerciseKind, FeedbackLevel, LandmarkFrame, Point2D, Side, Viewport,
};
use serde::{Deserialize, Serialize};

/// Phase of a repetitive movement cycle. For push-ups `Up` means arms
/// extended and `Bottom` means chest low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepPhase {
    Up,
    Descending,
    Bottom,
    Ascending,
}

impl RepPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepPhase::Up => "up",
            RepPhase::Descending => "descending",
            RepPhase::Bottom => "bottom",
            RepPhase::Ascending => "ascending",
        }
    }

    /// True while the subject is actively performing a rep rather than
    /// idling at the top.
    pub fn is_active(&self) -> bool {
        matches!(self, RepPhase::Descending | RepPhase::Bottom | RepPhase::Ascending)
    }
}

/// Whether the current frame reaches sufficient depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthStatus {
    Good,
    High,
}

/// Structured per-frame analysis output relayed downstream (UI,
/// telemetry, speech).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Smoothed primary joint angle in degrees (knee or elbow)
    pub primary_angle: i32,
    /// Smoothed alignment angle in degrees (back or body line)
    pub secondary_angle: i32,
    pub phase: RepPhase,
    pub rep_count: u32,
    pub valid_reps: u32,
    pub invalid_reps: u32,
    /// Temporally stable feedback text
    pub feedback: String,
    pub feedback_level: FeedbackLevel,
    /// Whether this frame's form was acceptable
    pub good_form: bool,
    pub depth_status: DepthStatus,
    /// Depth-visualization line: where the tracked joint must reach
    pub target_depth_y: f64,
    /// Depth-visualization line: where the tracked joint currently is
    pub current_depth_y: f64,
    /// Recent positions of the reference joint, oldest first
    pub trajectory: Vec<Point2D>,
    /// Side of the body currently supplying the landmarks
    pub side: Side,
}

/// A stateful, single-pass exercise analyzer.
///
/// One instance per independent subject/session; every call to
/// [`advance`](ExerciseAnalyzer::advance) runs the frame to completion
/// (smoothing, phase detection, form checks, feedback stabilization)
/// before returning, and results are produced in submission order.
pub trait ExerciseAnalyzer {
    fn exercise(&self) -> ExerciseKind;

    /// Consume one landmark frame and produce the current analysis.
    ///
    /// Returns `None` without mutating rep-counting state when the frame
    /// carries fewer than the 33 topology landmarks, or when the frame's
    /// geometry is degenerate (coincident joints).
    fn advance(&mut self, frame: &LandmarkFrame, viewport: Option<Viewport>)
        -> Option<AnalysisResult>;

    /// Clear phase, counters, smoothers, side lock, debounce counters
    /// and stabilizer state back to initial values. Configuration is
    /// untouched.
    fn reset(&mut self);
}
