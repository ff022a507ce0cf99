//! Push-up analyzer: elbow-angle driven rep state machine with body-line
//! alignment, hip-pike and depth form checks.

use formcheck_core::{
    calculate_angle, is_full_body_in_frame, line_deviation, AngleSmoother, ExerciseKind,
    LandmarkFrame, PoseLandmark, Result, Side, Timestamp, Viewport,
};

use crate::analyzer::{AnalysisResult, DepthStatus, ExerciseAnalyzer, RepPhase};
use crate::debounce::DebounceCounter;
use crate::side::SideSelector;
use crate::stabilizer::{FeedbackStabilizer, StabilizerConfig, WarningKind};
use crate::trajectory::TrajectoryBuffer;

const INITIAL_FEEDBACK: &str = "Start Push-ups";
const GOOD_REP: &str = "Good rep!";
const DEPTH_NEXT_REP: &str = "Lower chest more next rep";
const CHECK_FORM: &str = "Check form";
const GOOD_DEPTH: &str = "Good depth! Push up!";

const COMPLETION_MESSAGES: &[&str] = &[GOOD_REP, DEPTH_NEXT_REP, CHECK_FORM, GOOD_DEPTH];

/// Warnings the push-up checks can emit, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushupWarning {
    NotInFrame,
    BodySevere,
    HipPike,
    BodyMild,
    Deeper,
    Lockout,
}

impl WarningKind for PushupWarning {
    const ALL: &'static [Self] = &[
        PushupWarning::NotInFrame,
        PushupWarning::BodySevere,
        PushupWarning::HipPike,
        PushupWarning::BodyMild,
        PushupWarning::Deeper,
        PushupWarning::Lockout,
    ];

    const PRIORITY: &'static [Self] = &[
        PushupWarning::NotInFrame,
        PushupWarning::BodySevere,
        PushupWarning::HipPike,
        PushupWarning::BodyMild,
        PushupWarning::Deeper,
        PushupWarning::Lockout,
    ];

    fn message(&self) -> &'static str {
        match self {
            PushupWarning::NotInFrame => "Get your full body in frame",
            PushupWarning::BodySevere => "Keep body straight!",
            PushupWarning::HipPike => "Don't pike hips up!",
            PushupWarning::BodyMild => "Tighten your core",
            PushupWarning::Deeper => "Lower your chest more",
            PushupWarning::Lockout => "Full lockout at top",
        }
    }
}

/// Immutable push-up tuning. Angles in degrees, times in seconds,
/// counters in frames.
#[derive(Debug, Clone)]
pub struct PushupConfig {
    /// Above this = fully extended (top reset while descending)
    pub elbow_extended: f64,
    /// Hysteresis boundary: below starts a rep, back above confirms
    /// lockout and closes it
    pub elbow_lockout: f64,
    /// At or below counts as deep enough
    pub elbow_deep: f64,
    /// At or below, sustained, promotes to the bottom phase
    pub elbow_bottom: f64,
    /// Rising past `elbow_deep + ascend_margin` leaves the bottom
    pub ascend_margin: f64,
    /// Lower bound of the incomplete-lockout nudge band
    pub lockout_nudge_floor: f64,
    /// Body-line angle below this raises the mild sag advisory
    pub body_warning: f64,
    /// Body-line angle below this raises the hard sag warning
    pub body_bad: f64,
    /// Normalized hip deviation above the shoulder-ankle line that
    /// counts as piking
    pub pike_threshold: f64,
    /// Vertical slack before the hip counts as "above" the body line
    pub pike_epsilon: f64,
    pub min_visibility: f64,
    pub min_rep_interval_secs: f64,
    pub min_deep_frames: u32,
    pub smooth_alpha: f64,
    pub side_sticky_frames: u32,
    pub warn_frames_body: u32,
    pub warn_frames_pike: u32,
    pub warn_frames_deeper: u32,
    pub warn_frames_lockout: u32,
    pub warn_frames_framing: u32,
    pub framing_margin: f64,
    pub trajectory_capacity: usize,
    pub stabilizer: StabilizerConfig,
}

impl Default for PushupConfig {
    fn default() -> Self {
        Self {
            elbow_extended: 155.0,
            elbow_lockout: 145.0,
            elbow_deep: 100.0,
            elbow_bottom: 95.0,
            ascend_margin: 10.0,
            lockout_nudge_floor: 120.0,
            body_warning: 160.0,
            body_bad: 150.0,
            pike_threshold: 0.06,
            pike_epsilon: 2.0,
            min_visibility: 0.50,
            min_rep_interval_secs: 0.8,
            min_deep_frames: 2,
            smooth_alpha: 0.55,
            side_sticky_frames: 5,
            warn_frames_body: 6,
            warn_frames_pike: 8,
            warn_frames_deeper: 8,
            warn_frames_lockout: 6,
            warn_frames_framing: 4,
            framing_margin: 0.03,
            trajectory_capacity: 30,
            stabilizer: StabilizerConfig::default(),
        }
    }
}

impl PushupConfig {
    pub fn validate(&self) -> Result<()> {
        use formcheck_core::Error;

        if !(0.0 < self.elbow_bottom
            && self.elbow_bottom <= self.elbow_deep
            && self.elbow_deep < self.elbow_lockout
            && self.elbow_lockout < self.elbow_extended
            && self.elbow_extended <= 180.0)
        {
            return Err(Error::Config(
                "elbow thresholds must satisfy 0 < bottom <= deep < lockout < extended <= 180"
                    .into(),
            ));
        }
        if self.ascend_margin <= 0.0 {
            return Err(Error::Config("ascend margin must be positive".into()));
        }
        if self.body_bad >= self.body_warning {
            return Err(Error::Config(
                "hard body threshold must be stricter than the advisory one".into(),
            ));
        }
        if self.pike_threshold <= 0.0 {
            return Err(Error::Config("pike threshold must be positive".into()));
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

/// Stages: up (arms extended) -> descending -> bottom (chest low) ->
/// ascending -> up.
pub struct PushupAnalyzer {
    config: PushupConfig,

    phase: RepPhase,
    rep_count: u32,
    valid_reps: u32,
    invalid_reps: u32,
    event_feedback: &'static str,

    elbow_smoother: AngleSmoother,
    body_smoother: AngleSmoother,
    trajectory: TrajectoryBuffer,
    side: SideSelector,

    last_rep_time: Option<Timestamp>,
    deep_frames: u32,
    rep_issues: Vec<PushupWarning>,
    rep_had_good_depth: bool,

    body_severe: DebounceCounter,
    body_mild: DebounceCounter,
    pike: DebounceCounter,
    deeper: DebounceCounter,
    lockout: DebounceCounter,
    framing: DebounceCounter,

    stabilizer: FeedbackStabilizer<PushupWarning>,
}

impl PushupAnalyzer {
    pub fn with_config(config: PushupConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            elbow_smoother: AngleSmoother::new(config.smooth_alpha)?,
            body_smoother: AngleSmoother::new(config.smooth_alpha)?,
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
            body_severe: DebounceCounter::new(),
            body_mild: DebounceCounter::new(),
            pike: DebounceCounter::new(),
            deeper: DebounceCounter::new(),
            lockout: DebounceCounter::new(),
            framing: DebounceCounter::new(),
            config,
        })
    }

    pub fn config(&self) -> &PushupConfig {
        &self.config
    }

    fn side_visibility(frame: &LandmarkFrame, side: Side) -> Option<f64> {
        let subset = match side {
            Side::Left => [
                PoseLandmark::LeftShoulder,
                PoseLandmark::LeftElbow,
                PoseLandmark::LeftWrist,
                PoseLandmark::LeftHip,
                PoseLandmark::LeftAnkle,
            ],
            Side::Right => [
                PoseLandmark::RightShoulder,
                PoseLandmark::RightElbow,
                PoseLandmark::RightWrist,
                PoseLandmark::RightHip,
                PoseLandmark::RightAnkle,
            ],
        };
        let mut sum = 0.0;
        for landmark in subset {
            sum += frame.visibility(landmark)?;
        }
        Some(sum / subset.len() as f64)
    }

    fn record_issues(&mut self, candidates: &[PushupWarning], frame_good_form: bool) {
        if frame_good_form {
            return;
        }
        for &warning in candidates {
            if matches!(
                warning,
                PushupWarning::Deeper | PushupWarning::Lockout | PushupWarning::NotInFrame
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
        self.body_severe.clear();
        self.body_mild.clear();
        self.pike.clear();
        self.deeper.clear();
        self.lockout.clear();
    }
}

impl Default for PushupAnalyzer {
    fn default() -> Self {
        Self::with_config(PushupConfig::default()).expect("default push-up configuration is valid")
    }
}

impl ExerciseAnalyzer for PushupAnalyzer {
    fn exercise(&self) -> ExerciseKind {
        ExerciseKind::Pushup
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

        let (shoulder, elbow, wrist, hip, ankle) = match side {
            Side::Left => (
                frame.point(PoseLandmark::LeftShoulder)?,
                frame.point(PoseLandmark::LeftElbow)?,
                frame.point(PoseLandmark::LeftWrist)?,
                frame.point(PoseLandmark::LeftHip)?,
                frame.point(PoseLandmark::LeftAnkle)?,
            ),
            Side::Right => (
                frame.point(PoseLandmark::RightShoulder)?,
                frame.point(PoseLandmark::RightElbow)?,
                frame.point(PoseLandmark::RightWrist)?,
                frame.point(PoseLandmark::RightHip)?,
                frame.point(PoseLandmark::RightAnkle)?,
            ),
        };

        let low_confidence = side_vis < self.config.min_visibility;

        let raw_elbow = calculate_angle(shoulder, elbow, wrist).ok()?;
        let raw_body = calculate_angle(shoulder, hip, ankle).ok()?;

        let elbow_angle = self.elbow_smoother.update(raw_elbow);
        let body_angle = self.body_smoother.update(raw_body);

        self.trajectory.push(shoulder);

        let is_deep_enough = elbow_angle <= self.config.elbow_deep;
        let now = frame.timestamp;

        let mut candidates: Vec<PushupWarning> = Vec::new();
        let mut frame_good_form = true;

        let actively_pushing = self.phase.is_active();

        // 1. Body alignment, two-tier sag detection.
        if actively_pushing {
            if body_angle < self.config.body_bad {
                self.body_severe.raise();
            } else {
                self.body_severe.decay(2);
            }
            if body_angle < self.config.body_warning {
                self.body_mild.raise();
            } else {
                self.body_mild.decay(2);
            }

            // Candidacy follows the counters, not the instantaneous
            // angle, so one clean frame cannot drop a latched warning
            // out of the candidate set while its counter is charged.
            if self.body_severe.count() >= self.config.warn_frames_body {
                candidates.push(PushupWarning::BodySevere);
                if body_angle < self.config.body_bad {
                    frame_good_form = false;
                }
            } else if self.body_mild.count() >= self.config.warn_frames_body {
                candidates.push(PushupWarning::BodyMild);
            }
        } else {
            self.body_severe.decay(1);
            self.body_mild.decay(1);
        }

        // 2. Hip pike: perpendicular deviation of the hip from the
        //    shoulder-ankle body axis, flagged only when the hips are
        //    above the line (smaller image y than the projection foot).
        if actively_pushing {
            let violating = match line_deviation(shoulder, ankle, hip) {
                Some(dev) => {
                    let hip_above_line = hip.y < dev.foot.y - self.config.pike_epsilon;
                    hip_above_line && dev.deviation > self.config.pike_threshold
                }
                None => false,
            };
            if violating {
                self.pike.raise();
            } else {
                self.pike.decay(2);
            }
            if self.pike.count() >= self.config.warn_frames_pike {
                candidates.push(PushupWarning::HipPike);
                frame_good_form = false;
            }
        } else {
            self.pike.decay(1);
        }

        // 3. Framing advice. Advisory only; never gates rep counting.
        match viewport {
            Some(vp) => {
                if is_full_body_in_frame(
                    frame,
                    vp,
                    self.config.framing_margin,
                    ExerciseKind::Pushup,
                ) {
                    self.framing.decay(2);
                } else {
                    self.framing.raise();
                }
            }
            None => self.framing.decay(1),
        }
        if self.framing.count() >= self.config.warn_frames_framing {
            candidates.push(PushupWarning::NotInFrame);
        }

        match self.phase {
            RepPhase::Up => {
                if elbow_angle < self.config.elbow_lockout {
                    self.phase = RepPhase::Descending;
                    self.begin_rep();
                    tracing::debug!("push-up descending at elbow angle {:.1}", elbow_angle);
                }
            }
            RepPhase::Descending => {
                self.record_issues(&candidates, frame_good_form);

                if elbow_angle <= self.config.elbow_bottom {
                    self.deep_frames += 1;
                    self.deeper.clear();
                } else {
                    self.deep_frames = self.deep_frames.saturating_sub(1);
                    if elbow_angle < self.config.elbow_lockout {
                        self.deeper.raise();
                    }
                }

                if is_deep_enough {
                    self.rep_had_good_depth = true;
                }

                if self.deeper.count() >= self.config.warn_frames_deeper
                    && !is_deep_enough
                    && !candidates.contains(&PushupWarning::Deeper)
                {
                    candidates.push(PushupWarning::Deeper);
                }

                if self.deep_frames >= self.config.min_deep_frames {
                    self.phase = RepPhase::Bottom;
                    self.event_feedback = GOOD_DEPTH;
                    tracing::debug!("push-up bottom reached at elbow angle {:.1}", elbow_angle);
                }

                if elbow_angle > self.config.elbow_extended {
                    // Pushed back up without going deep: aborted rep.
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

                if elbow_angle > self.config.elbow_deep + self.config.ascend_margin {
                    self.phase = RepPhase::Ascending;
                }
            }
            RepPhase::Ascending => {
                self.record_issues(&candidates, frame_good_form);

                if elbow_angle < self.config.elbow_lockout
                    && elbow_angle > self.config.lockout_nudge_floor
                {
                    self.lockout.raise();
                } else {
                    self.lockout.decay(1);
                }
                if self.lockout.count() >= self.config.warn_frames_lockout
                    && !candidates.contains(&PushupWarning::Lockout)
                {
                    candidates.push(PushupWarning::Lockout);
                }

                if elbow_angle >= self.config.elbow_lockout {
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
                            "push-up rep completed: total={} valid={} invalid={}",
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
            (PushupWarning::NotInFrame, self.framing.count()),
            (PushupWarning::BodySevere, self.body_severe.count()),
            (PushupWarning::HipPike, self.pike.count()),
            (PushupWarning::BodyMild, self.body_mild.count()),
            (PushupWarning::Deeper, self.deeper.count()),
            (PushupWarning::Lockout, self.lockout.count()),
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
            primary_angle: elbow_angle as i32,
            secondary_angle: body_angle as i32,
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
            // Chest must travel to the floor plane where the hands are.
            target_depth_y: wrist.y,
            current_depth_y: shoulder.y,
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
        self.elbow_smoother.reset();
        self.body_smoother.reset();
        self.trajectory.clear();
        self.side.reset();
        self.last_rep_time = None;
        self.deep_frames = 0;
        self.rep_issues.clear();
        self.rep_had_good_depth = false;
        self.body_severe.clear();
        self.body_mild.clear();
        self.pike.clear();
        self.deeper.clear();
        self.lockout.clear();
        self.framing.clear();
        self.stabilizer.reset();
    }
}
