//! Squat analyzer: knee-angle driven rep state machine with back
//! alignment, knee-travel and depth form checks.

use formcheck_core::{
    calculate_angle, is_full_body_in_frame, line_deviation, AngleSmoother, ExerciseKind,
    LandmarkFrame, PoseLandmark, Result, Side, Timestamp, Viewport,
};

use crate::analyzer::{AnalysisResult, DepthStatus, ExerciseAnalyzer, RepPhase};
use crate::debounce::DebounceCounter;
use crate::side::SideSelector;
use crate::stabilizer::{FeedbackStabilizer, StabilizerConfig, WarningKind};
use crate::trajectory::TrajectoryBuffer;

const INITIAL_FEEDBACK: &str = "Start Squats";
const GOOD_REP: &str = "Good rep!";
const DEPTH_NEXT_REP: &str = "Squat deeper next rep";
const CHECK_FORM: &str = "Check form";
const GOOD_DEPTH: &str = "Good depth! Drive up!";

/// Messages announcing a completed discrete event; these bypass the
/// stabilizer's candidate gate.
const COMPLETION_MESSAGES: &[&str] = &[GOOD_REP, DEPTH_NEXT_REP, CHECK_FORM, GOOD_DEPTH];

/// Warnings the squat checks can emit, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquatWarning {
    NotInFrame,
    BackSevere,
    KneeTravel,
    BackMild,
    Deeper,
    Lockout,
}

impl WarningKind for SquatWarning {
    const ALL: &'static [Self] = &[
        SquatWarning::NotInFrame,
        SquatWarning::BackSevere,
        SquatWarning::KneeTravel,
        SquatWarning::BackMild,
        SquatWarning::Deeper,
        SquatWarning::Lockout,
    ];

    const PRIORITY: &'static [Self] = &[
        SquatWarning::NotInFrame,
        SquatWarning::BackSevere,
        SquatWarning::KneeTravel,
        SquatWarning::BackMild,
        SquatWarning::Deeper,
        SquatWarning::Lockout,
    ];

    fn message(&self) -> &'static str {
        match self {
            SquatWarning::NotInFrame => "Get your full body in frame",
            SquatWarning::BackSevere => "Keep your back straight!",
            SquatWarning::KneeTravel => "Don't push knees past toes!",
            SquatWarning::BackMild => "Chest up",
            SquatWarning::Deeper => "Squat deeper",
            SquatWarning::Lockout => "Stand all the way up",
        }
    }
}

/// Immutable squat tuning. Angles in degrees, times in seconds,
/// counters in frames.
#[derive(Debug, Clone)]
pub struct SquatConfig {
    /// Above this while descending the rep is considered aborted
    pub knee_extended: f64,
    /// Hysteresis boundary: below starts a rep, back above closes it
    pub knee_lockout: f64,
    /// At or below counts as sufficient depth
    pub knee_deep: f64,
    /// At or below, sustained, promotes to the bottom phase
    pub knee_bottom: f64,
    /// Rising past `knee_deep + ascend_margin` leaves the bottom
    pub ascend_margin: f64,
    /// Lower bound of the incomplete-lockout nudge band
    pub lockout_nudge_floor: f64,
    /// Back angle below this raises the soft "chest up" advisory
    pub back_warning: f64,
    /// Back angle below this raises the hard alignment warning
    pub back_bad: f64,
    /// Normalized knee deviation from the ankle-hip line that counts as
    /// forward travel
    pub knee_travel_threshold: f64,
    pub min_visibility: f64,
    pub min_rep_interval_secs: f64,
    pub min_deep_frames: u32,
    pub smooth_alpha: f64,
    pub side_sticky_frames: u32,
    pub warn_frames_back: u32,
    pub warn_frames_knee: u32,
    pub warn_frames_deeper: u32,
    pub warn_frames_lockout: u32,
    pub warn_frames_framing: u32,
    pub framing_margin: f64,
    pub trajectory_capacity: usize,
    pub stabilizer: StabilizerConfig,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            knee_extended: 160.0,
            knee_lockout: 150.0,
            knee_deep: 100.0,
            knee_bottom: 95.0,
            ascend_margin: 10.0,
            lockout_nudge_floor: 120.0,
            back_warning: 65.0,
            back_bad: 50.0,
            knee_travel_threshold: 0.08,
            min_visibility: 0.50,
            min_rep_interval_secs: 0.8,
            min_deep_frames: 2,
            smooth_alpha: 0.35,
            side_sticky_frames: 5,
            warn_frames_back: 6,
            warn_frames_knee: 8,
            warn_frames_deeper: 8,
            warn_frames_lockout: 6,
            warn_frames_framing: 4,
            framing_margin: 0.03,
            trajectory_capacity: 30,
            stabilizer: StabilizerConfig::default(),
        }
    }
}

impl SquatConfig {
    pub fn validate(&self) -> Result<()> {
        use formcheck_core::Error;

        if !(0.0 < self.knee_bottom
            && self.knee_bottom <= self.knee_deep
            && self.knee_deep < self.knee_lockout
            && self.knee_lockout < self.knee_extended
            && self.knee_extended <= 180.0)
        {
            return Err(Error::Config(
                "knee thresholds must satisfy 0 < bottom <= deep < lockout < extended <= 180"
                    .into(),
            ));
        }
        if self.ascend_margin <= 0.0 {
            return Err(Error::Config("ascend margin must be positive".into()));
        }
        if self.back_bad >= self.back_warning {
            return Err(Error::Config(
                "hard back threshold must be stricter than the advisory one".into(),
            ));
        }
        if self.knee_travel_threshold <= 0.0 {
            return Err(Error::Config("knee travel threshold must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(Error::Config("minimum visibility must be within [0, 1]".into()));
        }
        if self.min_rep_interval_secs < 0.0 {
            return Err(Error::Config("rep interval must be non-negative".into()));
        }
        if self.min_deep_frames == 0 || self.side_sticky_frames == 0 {
            return Err(Error::Config("frame counts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Stages: up -> descending -> bottom -> ascending -> up.
pub struct SquatAnalyzer {
    config: SquatConfig,

    phase: RepPhase,
    rep_count: u32,
    valid_reps: u32,
    invalid_reps: u32,
    /// Latest rep-event message, fed to the stabilizer as the default
    event_feedback: &'static str,

    knee_smoother: AngleSmoother,
    back_smoother: AngleSmoother,
    trajectory: TrajectoryBuffer,
    side: SideSelector,

    last_rep_time: Option<Timestamp>,
    deep_frames: u32,
    rep_issues: Vec<SquatWarning>,
    rep_had_good_depth: bool,

    back_severe: DebounceCounter,
    back_mild: DebounceCounter,
    knee_travel: DebounceCounter,
    deeper: DebounceCounter,
    lockout: DebounceCounter,
    framing: DebounceCounter,

    stabilizer: FeedbackStabilizer<SquatWarning>,
}

impl SquatAnalyzer {
    pub fn with_config(config: SquatConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            knee_smoother: AngleSmoother::new(config.smooth_alpha)?,
            back_smoother: AngleSmoother::new(config.smooth_alpha)?,
            trajectory: TrajectoryBuffer::new(config.trajectory_capacity)?,
            side: SideSelector::new(config.side_sticky_frames),
            stabilizer: FeedbackStabilizer::new(
                INITIAL_FEEDBACK,
                COMPLETION_MESSAGES,
                config.stabilizer.clone(),
            )?,
            phase: RepPhase::Up,
            rep_count: 0,
            valid_reps: 0,
            invalid_reps: 0,
            event_feedback: INITIAL_FEEDBACK,
            last_rep_time: None,
            deep_frames: 0,
            rep_issues: Vec::new(),
            rep_had_good_depth: false,
            back_severe: DebounceCounter::new(),
            back_mild: DebounceCounter::new(),
            knee_travel: DebounceCounter::new(),
            deeper: DebounceCounter::new(),
            lockout: DebounceCounter::new(),
            framing: DebounceCounter::new(),
            config,
        })
    }

    pub fn config(&self) -> &SquatConfig {
        &self.config
    }

    fn side_visibility(frame: &LandmarkFrame, side: Side) -> Option<f64> {
        let subset = match side {
            Side::Left => [
                PoseLandmark::LeftShoulder,
                PoseLandmark::LeftHip,
                PoseLandmark::LeftKnee,
                PoseLandmark::LeftAnkle,
            ],
            Side::Right => [
                PoseLandmark::RightShoulder,
                PoseLandmark::RightHip,
                PoseLandmark::RightKnee,
                PoseLandmark::RightAnkle,
            ],
        };
        let mut sum = 0.0;
        for landmark in subset {
            sum += frame.visibility(landmark)?;
        }
        Some(sum / subset.len() as f64)
    }

    fn record_issues(&mut self, candidates: &[SquatWarning], frame_good_form: bool) {
        if frame_good_form {
            return;
        }
        for &warning in candidates {
            // Guidance nudges and framing advice are not form defects.
            if matches!(
                warning,
                SquatWarning::Deeper | SquatWarning::Lockout | SquatWarning::NotInFrame
            ) {
                continue;
            }
            if !self.rep_issues.contains(&warning) {
                self.rep_issues.push(warning);
            }
        }
    }

    fn begin_rep(&mut self) {
        self.rep_issues.clear();
        self.rep_had_good_depth = false;
        self.deep_frames = 0;
        self.back_severe.clear();
        self.back_mild.clear();
        self.knee_travel.clear();
        self.deeper.clear();
        self.lockout.clear();
    }
}

impl Default for SquatAnalyzer {
    fn default() -> Self {
        Self::with_config(SquatConfig::default()).expect("default squat configuration is valid")
    }
}

impl ExerciseAnalyzer for SquatAnalyzer {
    fn exercise(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn advance(&mut self, frame: &LandmarkFrame, viewport: Option<Viewport>)
        -> Option<AnalysisResult>
    {
        if !frame.is_complete() {
            return None;
        }

        let left_vis = Self::side_visibility(frame, Side::Left)?;
        let right_vis = Self::side_visibility(frame, Side::Right)?;
        let side = self.side.update(left_vis, right_vis);
        let side_vis = match side {
            Side::Left => left_vis,
            Side::Right => right_vis,
        };

        let (shoulder, hip, knee, ankle) = match side {
            Side::Left => (
                frame.point(PoseLandmark::LeftShoulder)?,
                frame.point(PoseLandmark::LeftHip)?,
                frame.point(PoseLandmark::LeftKnee)?,
                frame.point(PoseLandmark::LeftAnkle)?,
            ),
            Side::Right => (
                frame.point(PoseLandmark::RightShoulder)?,
                frame.point(PoseLandmark::RightHip)?,
                frame.point(PoseLandmark::RightKnee)?,
                frame.point(PoseLandmark::RightAnkle)?,
            ),
        };

        let low_confidence = side_vis < self.config.min_visibility;

        let raw_knee = calculate_angle(hip, knee, ankle).ok()?;
        let raw_back = calculate_angle(shoulder, hip, knee).ok()?;

        let knee_angle = self.knee_smoother.update(raw_knee);
        let back_angle = self.back_smoother.update(raw_back);

        self.trajectory.push(hip);

        let is_deep_enough = knee_angle <= self.config.knee_deep;
        let now = frame.timestamp;

        let mut candidates: Vec<SquatWarning> = Vec::new();
        let mut frame_good_form = true;

        let actively_squatting = self.phase.is_active();

        // 1. Back alignment, two tiers with separate debounce counters.
        if actively_squatting {
            if back_angle < self.config.back_bad {
                self.back_severe.raise();
            } else {
                self.back_severe.decay(2);
            }
            if back_angle < self.config.back_warning {
                self.back_mild.raise();
            } else {
                self.back_mild.decay(2);
            }

            // Candidacy follows the counters, not the instantaneous
            // angle, so one clean frame cannot drop a latched warning
            // out of the candidate set while its counter is charged.
            if self.back_severe.count() >= self.config.warn_frames_back {
                candidates.push(SquatWarning::BackSevere);
                if back_angle < self.config.back_bad {
                    frame_good_form = false;
                }
            } else if self.back_mild.count() >= self.config.warn_frames_back {
                candidates.push(SquatWarning::BackMild);
            }
        } else {
            self.back_severe.decay(1);
            self.back_mild.decay(1);
        }

        // 2. Forward knee travel past the toes, measured as normalized
        //    perpendicular deviation from the ankle-hip line. Only the
        //    horizontal direction matching the active side counts; the
        //    opposite direction is harmless.
        if actively_squatting {
            let violating = match line_deviation(ankle, hip, knee) {
                Some(dev) => {
                    let forward = match side {
                        Side::Right => knee.x > ankle.x,
                        Side::Left => knee.x < ankle.x,
                    };
                    forward && dev.deviation > self.config.knee_travel_threshold
                }
                None => false,
            };
            if violating {
                self.knee_travel.raise();
            } else {
                self.knee_travel.decay(2);
            }
            if self.knee_travel.count() >= self.config.warn_frames_knee {
                candidates.push(SquatWarning::KneeTravel);
                frame_good_form = false;
            }
        } else {
            self.knee_travel.decay(1);
        }

        // 3. Framing advice. Advisory only; never gates rep counting.
        match viewport {
            Some(vp) => {
                if is_full_body_in_frame(frame, vp, self.config.framing_margin, ExerciseKind::Squat)
                {
                    self.framing.decay(2);
                } else {
                    self.framing.raise();
                }
            }
            None => self.framing.decay(1),
        }
        if self.framing.count() >= self.config.warn_frames_framing {
            candidates.push(SquatWarning::NotInFrame);
        }

        // State machine with hysteresis bands.
        match self.phase {
            RepPhase::Up => {
                if knee_angle < self.config.knee_lockout {
                    self.phase = RepPhase::Descending;
                    self.begin_rep();
                    tracing::debug!("squat descending at knee angle {:.1}", knee_angle);
                }
            }
            RepPhase::Descending => {
                self.record_issues(&candidates, frame_good_form);

                if knee_angle <= self.config.knee_bottom {
                    self.deep_frames += 1;
                    self.deeper.clear();
                } else {
                    self.deep_frames = self.deep_frames.saturating_sub(1);
                    // Hovering short of depth while clearly in the rep.
                    if knee_angle < self.config.knee_lockout {
                        self.deeper.raise();
                    }
                }

                if is_deep_enough {
                    self.rep_had_good_depth = true;
                }

                if self.deeper.count() >= self.config.warn_frames_deeper
                    && !is_deep_enough
                    && !candidates.contains(&SquatWarning::Deeper)
                {
                    candidates.push(SquatWarning::Deeper);
                }

                if self.deep_frames >= self.config.min_deep_frames {
                    self.phase = RepPhase::Bottom;
                    self.event_feedback = GOOD_DEPTH;
                    tracing::debug!("squat bottom reached at knee angle {:.1}", knee_angle);
                }

                if knee_angle > self.config.knee_extended {
                    // Stood back up without completing: aborted rep.
                    self.phase = RepPhase::Up;
                    self.deep_frames = 0;
                    self.deeper.clear();
                }
            }
            RepPhase::Bottom => {
                self.record_issues(&candidates, frame_good_form);

                if is_deep_enough {
                    self.rep_had_good_depth = true;
                }

                if knee_angle > self.config.knee_deep + self.config.ascend_margin {
                    self.phase = RepPhase::Ascending;
                }
            }
            RepPhase::Ascending => {
                self.record_issues(&candidates, frame_good_form);

                if knee_angle < self.config.knee_lockout
                    && knee_angle > self.config.lockout_nudge_floor
                {
                    self.lockout.raise();
                } else {
                    self.lockout.decay(1);
                }
                if self.lockout.count() >= self.config.warn_frames_lockout
                    && !candidates.contains(&SquatWarning::Lockout)
                {
                    candidates.push(SquatWarning::Lockout);
                }

                if knee_angle >= self.config.knee_lockout {
                    let gate_open = self
                        .last_rep_time
                        .map_or(true, |t| now.secs_since(t) >= self.config.min_rep_interval_secs);

                    if gate_open && !low_confidence {
                        self.rep_count += 1;
                        self.last_rep_time = Some(now);

                        let valid = self.rep_issues.is_empty() && self.rep_had_good_depth;
                        if valid {
                            self.valid_reps += 1;
                            self.event_feedback = GOOD_REP;
                        } else {
                            self.invalid_reps += 1;
                            self.event_feedback = if !self.rep_had_good_depth {
                                DEPTH_NEXT_REP
                            } else if let Some(first) = self.rep_issues.first() {
                                first.message()
                            } else {
                                CHECK_FORM
                            };
                        }
                        tracing::debug!(
                            "squat rep completed: total={} valid={} invalid={}",
                            self.rep_count,
                            self.valid_reps,
                            self.invalid_reps
                        );
                    }

                    self.phase = RepPhase::Up;
                    self.deep_frames = 0;
                }
            }
        }

        let counters = [
            (SquatWarning::NotInFrame, self.framing.count()),
            (SquatWarning::BackSevere, self.back_severe.count()),
            (SquatWarning::KneeTravel, self.knee_travel.count()),
            (SquatWarning::BackMild, self.back_mild.count()),
            (SquatWarning::Deeper, self.deeper.count()),
            (SquatWarning::Lockout, self.lockout.count()),
        ];
        let default_text = self.event_feedback;
        let (feedback, feedback_level) = self.stabilizer.update(
            &candidates,
            |w| counters.iter().find(|(k, _)| *k == w).map_or(0, |(_, c)| *c),
            frame_good_form,
            default_text,
            now,
        );

        Some(AnalysisResult {
            primary_angle: knee_angle as i32,
            secondary_angle: back_angle as i32,
            phase: self.phase,
            rep_count: self.rep_count,
            valid_reps: self.valid_reps,
            invalid_reps: self.invalid_reps,
            feedback: feedback.to_string(),
            feedback_level,
            good_form: frame_good_form,
            depth_status: if is_deep_enough {
                DepthStatus::Good
            } else {
                DepthStatus::High
            },
            target_depth_y: knee.y,
            current_depth_y: hip.y,
            trajectory: self.trajectory.snapshot(),
            side,
        })
    }

    fn reset(&mut self) {
        self.phase = RepPhase::Up;
        self.rep_count = 0;
        self.valid_reps = 0;
        self.invalid_reps = 0;
        self.event_feedback = INITIAL_FEEDBACK;
        self.knee_smoother.reset();
        self.back_smoother.reset();
        self.trajectory.clear();
        self.side.reset();
        self.last_rep_time = None;
        self.deep_frames = 0;
        self.rep_issues.clear();
        self.rep_had_good_depth = false;
        self.back_severe.clear();
        self.back_mild.clear();
        self.knee_travel.clear();
        self.deeper.clear();
        self.lockout.clear();
        self.framing.clear();
        self.stabilizer.reset();
    }
}
