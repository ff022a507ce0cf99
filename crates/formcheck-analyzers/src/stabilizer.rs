//! Priority-based, debounced, latched feedback selection shared by all
//! exercise analyzers.
//!
//! A per-frame form classifier is noisy: conditions flicker on and off
//! at the boundary and several warnings often qualify at once. The
//! stabilizer turns that stream into a message a human can actually read
//! by (a) locking onto one active warning until its debounce counter
//! confirms it resolved, (b) requiring consecutive identical candidate
//! frames before promoting a new message, and (c) letting discrete
//! rep-completion messages bypass the gate entirely.

use formcheck_core::{Error, FeedbackLevel, Result, Timestamp};

/// Closed enumeration of the warnings an exercise can emit.
///
/// Priority and candidacy are resolved over the enum rather than by
/// runtime string matching, so the priority table is checked for
/// completeness at construction time.
pub trait WarningKind: Copy + Eq + std::fmt::Debug + 'static {
    /// Every kind the exercise's checks can emit.
    const ALL: &'static [Self];

    /// Priority order, highest first. Must cover [`Self::ALL`].
    const PRIORITY: &'static [Self];

    /// Display message for this warning.
    fn message(&self) -> &'static str;
}

/// Tuning for the stabilization policy
#[derive(Debug, Clone)]
pub struct StabilizerConfig {
    /// Consecutive identical candidate frames required for promotion
    pub candidate_threshold: u32,
    /// Minimum time the stable message is held before the relaxed
    /// (two-frame) promotion path opens up, in seconds
    pub hold_time_secs: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            candidate_threshold: 5,
            hold_time_secs: 2.5,
        }
    }
}

/// The feedback channel's state machine. One instance per analyzer.
#[derive(Debug, Clone)]
pub struct FeedbackStabilizer<W: WarningKind + 'static> {
    config: StabilizerConfig,
    initial_text: &'static str,
    /// Messages representing a completed discrete event (rep outcomes);
    /// promoted immediately, bypassing the candidate gate.
    completion_messages: &'static [&'static str],

    stable_text: &'static str,
    stable_level: FeedbackLevel,
    stable_since: Timestamp,
    candidate_text: &'static str,
    candidate_count: u32,
    active_warning: Option<W>,
}

impl<W: WarningKind + 'static> FeedbackStabilizer<W> {
    pub fn new(
        initial_text: &'static str,
        completion_messages: &'static [&'static str],
        config: StabilizerConfig,
    ) -> Result<Self> {
        if config.candidate_threshold == 0 {
            return Err(Error::Config(
                "candidate threshold must be at least 1".into(),
            ));
        }
        if config.hold_time_secs <= 0.0 {
            return Err(Error::Config(format!(
                "feedback hold time must be positive, got {}",
                config.hold_time_secs
            )));
        }
        for kind in W::ALL {
            if !W::PRIORITY.contains(kind) {
                return Err(Error::Config(format!(
                    "warning priority table is missing {kind:?}"
                )));
            }
        }

        Ok(Self {
            config,
            initial_text,
            completion_messages,
            stable_text: initial_text,
            stable_level: FeedbackLevel::Success,
            stable_since: Timestamp::from_nanos(0),
            candidate_text: "",
            candidate_count: 0,
            active_warning: None,
        })
    }

    pub fn reset(&mut self) {
        self.stable_text = self.initial_text;
        self.stable_level = FeedbackLevel::Success;
        self.stable_since = Timestamp::from_nanos(0);
        self.candidate_text = "";
        self.candidate_count = 0;
        self.active_warning = None;
    }

    /// Process one frame's worth of feedback signals.
    ///
    /// `candidates` is the warning list in detection order, `counter_of`
    /// maps a warning to its current debounce counter value and
    /// `default_text` is the message shown when no warning qualifies
    /// (the analyzer's latest rep-event message).
    pub fn update<F>(
        &mut self,
        candidates: &[W],
        counter_of: F,
        frame_good_form: bool,
        default_text: &'static str,
        now: Timestamp,
    ) -> (&'static str, FeedbackLevel)
    where
        F: Fn(W) -> u32,
    {
        // Release the lock once the locked warning's counter has decayed
        // to zero; until then a momentary good frame keeps it latched.
        if let Some(active) = self.active_warning {
            if counter_of(active) == 0 {
                self.active_warning = None;
            }
        }

        let mut chosen: Option<W> = None;
        if !candidates.is_empty() {
            if let Some(active) = self.active_warning {
                if candidates.contains(&active) {
                    chosen = Some(active);
                }
            }
            if chosen.is_none() {
                chosen = W::PRIORITY
                    .iter()
                    .copied()
                    .find(|w| candidates.contains(w))
                    .or(Some(candidates[0]));
                self.active_warning = chosen;
            }
        }

        let (desired_text, desired_level) = match chosen {
            Some(warning) => {
                let level = if frame_good_form {
                    FeedbackLevel::Warning
                } else {
                    FeedbackLevel::Error
                };
                (warning.message(), level)
            }
            None => {
                self.active_warning = None;
                (default_text, FeedbackLevel::Success)
            }
        };

        let is_completion = self.completion_messages.contains(&desired_text);

        if desired_text == self.candidate_text {
            self.candidate_count += 1;
        } else {
            self.candidate_text = desired_text;
            self.candidate_count = 1;
        }

        let held_for = now.secs_since(self.stable_since);
        let should_update = is_completion
            || self.candidate_count >= self.config.candidate_threshold
            || (held_for >= self.config.hold_time_secs && self.candidate_count >= 2);

        if should_update && desired_text != self.stable_text {
            self.stable_text = desired_text;
            self.stable_level = desired_level;
            self.stable_since = now;
        }

        (self.stable_text, self.stable_level)
    }

    pub fn feedback(&self) -> (&'static str, FeedbackLevel) {
        (self.stable_text, self.stable_level)
    }

    pub fn active_warning(&self) -> Option<W> {
        self.active_warning
    }

    pub fn stable_since(&self) -> Timestamp {
        self.stable_since
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestWarning {
        High,
        Low,
    }

    impl WarningKind for TestWarning {
        const ALL: &'static [Self] = &[TestWarning::High, TestWarning::Low];
        const PRIORITY: &'static [Self] = &[TestWarning::High, TestWarning::Low];

        fn message(&self) -> &'static str {
            match self {
                TestWarning::High => "fix the big thing",
                TestWarning::Low => "fix the small thing",
            }
        }
    }

    const COMPLETIONS: &[&str] = &["Good rep!"];

    fn stabilizer() -> FeedbackStabilizer<TestWarning> {
        FeedbackStabilizer::new("Start", COMPLETIONS, StabilizerConfig::default()).unwrap()
    }

    fn at(frame: i64) -> Timestamp {
        // 10 fps
        Timestamp::from_nanos(frame * 100_000_000)
    }

    #[test]
    fn test_short_lived_candidate_never_surfaces() {
        let mut s = stabilizer();
        for i in 0..4 {
            let (text, _) = s.update(&[TestWarning::Low], |_| 1, true, "keep going", at(i));
            assert_eq!(text, "Start");
        }
    }

    #[test]
    fn test_sustained_candidate_promotes_on_threshold() {
        let mut s = stabilizer();
        for i in 0..4 {
            s.update(&[TestWarning::Low], |_| 1, true, "keep going", at(i));
        }
        let (text, level) = s.update(&[TestWarning::Low], |_| 1, true, "keep going", at(4));
        assert_eq!(text, "fix the small thing");
        assert_eq!(level, FeedbackLevel::Warning);
    }

    #[test]
    fn test_bad_form_frame_escalates_level() {
        let mut s = stabilizer();
        for i in 0..5 {
            s.update(&[TestWarning::High], |_| 1, false, "keep going", at(i));
        }
        let (_, level) = s.feedback();
        assert_eq!(level, FeedbackLevel::Error);
    }

    #[test]
    fn test_locked_warning_resists_higher_priority_candidate() {
        let mut s = stabilizer();
        // Lock onto Low first.
        for i in 0..5 {
            s.update(&[TestWarning::Low], |_| 1, true, "keep going", at(i));
        }
        assert_eq!(s.active_warning(), Some(TestWarning::Low));

        // High joins the candidate set, but the lock holds.
        s.update(&[TestWarning::High, TestWarning::Low], |_| 1, true, "keep going", at(5));
        assert_eq!(s.active_warning(), Some(TestWarning::Low));
    }

    #[test]
    fn test_lock_releases_only_when_counter_reaches_zero() {
        let mut s = stabilizer();
        for i in 0..5 {
            s.update(&[TestWarning::Low], |_| 1, true, "keep going", at(i));
        }

        // A competing higher-priority candidate cannot displace the
        // locked warning while its counter is nonzero.
        s.update(
            &[TestWarning::High, TestWarning::Low],
            |w| if w == TestWarning::Low { 1 } else { 3 },
            true,
            "keep going",
            at(5),
        );
        assert_eq!(s.active_warning(), Some(TestWarning::Low));

        // Once the counter reaches zero the lock releases and the
        // priority order decides again.
        s.update(
            &[TestWarning::High, TestWarning::Low],
            |w| if w == TestWarning::Low { 0 } else { 3 },
            true,
            "keep going",
            at(6),
        );
        assert_eq!(s.active_warning(), Some(TestWarning::High));
    }

    #[test]
    fn test_completion_message_bypasses_gate() {
        let mut s = stabilizer();
        let (text, level) = s.update(&[], |_| 0, true, "Good rep!", at(0));
        assert_eq!(text, "Good rep!");
        assert_eq!(level, FeedbackLevel::Success);
    }

    #[test]
    fn test_hold_time_path_allows_two_frame_update() {
        let mut s = stabilizer();
        // Promote a completion message at t=0.1s, which refreshes the
        // stable timestamp.
        s.update(&[], |_| 0, true, "Good rep!", at(1));

        // Within the hold window, two frames of a new candidate are not
        // enough.
        s.update(&[TestWarning::Low], |_| 1, true, "Good rep!", at(2));
        let (text, _) = s.update(&[TestWarning::Low], |_| 1, true, "Good rep!", at(3));
        assert_eq!(text, "Good rep!");

        // Break the candidate streak, then come back after the hold time
        // has elapsed: a second consecutive frame is now enough even
        // though the full threshold was never reached.
        s.update(&[], |_| 0, true, "Good rep!", at(4));
        let later = Timestamp::from_nanos(3_000_000_000);
        let (text, _) = s.update(&[TestWarning::Low], |_| 1, true, "Good rep!", later);
        assert_eq!(text, "Good rep!");
        let (text, _) = s.update(
            &[TestWarning::Low],
            |_| 1,
            true,
            "Good rep!",
            Timestamp::from_nanos(3_100_000_000),
        );
        assert_eq!(text, "fix the small thing");
    }

    #[test]
    fn test_noop_frames_do_not_refresh_timestamp() {
        let mut s = stabilizer();
        s.update(&[], |_| 0, true, "Good rep!", at(1));
        let since = s.stable_since();

        s.update(&[], |_| 0, true, "Good rep!", at(2));
        assert_eq!(s.stable_since(), since);
    }

    #[test]
    fn test_reset_restores_initial_message() {
        let mut s = stabilizer();
        s.update(&[], |_| 0, true, "Good rep!", at(1));
        s.reset();
        assert_eq!(s.feedback(), ("Start", FeedbackLevel::Success));
        assert_eq!(s.active_warning(), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = StabilizerConfig {
            candidate_threshold: 0,
            hold_time_secs: 2.5,
        };
        assert!(FeedbackStabilizer::<TestWarning>::new("Start", COMPLETIONS, bad).is_err());
    }
}
