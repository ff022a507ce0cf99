//! Sticky left/right side-of-body selection.

use formcheck_core::Side;

/// Chooses which side of the body supplies the angle landmarks, based on
/// per-side mean visibility, with hysteresis so a noisy 50/50 visibility
/// split cannot make the side oscillate frame to frame.
#[derive(Debug, Clone)]
pub struct SideSelector {
    sticky_frames: u32,
    current: Option<Side>,
    switch_count: u32,
}

impl SideSelector {
    pub fn new(sticky_frames: u32) -> Self {
        Self {
            sticky_frames,
            current: None,
            switch_count: 0,
        }
    }

    /// Feed this frame's per-side mean visibility scores and get the
    /// side to use. The first frame adopts the preferred side
    /// immediately; afterwards a switch only happens once the other side
    /// has been preferred for `sticky_frames` consecutive frames.
    pub fn update(&mut self, left_vis: f64, right_vis: f64) -> Side {
        let preferred = if right_vis >= left_vis {
            Side::Right
        } else {
            Side::Left
        };

        match self.current {
            None => {
                self.current = Some(preferred);
                self.switch_count = 0;
                preferred
            }
            Some(current) if preferred != current => {
                self.switch_count += 1;
                if self.switch_count >= self.sticky_frames {
                    self.current = Some(preferred);
                    self.switch_count = 0;
                    preferred
                } else {
                    current
                }
            }
            Some(current) => {
                self.switch_count = 0;
                current
            }
        }
    }

    pub fn current(&self) -> Option<Side> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.switch_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_adopts_immediately() {
        let mut selector = SideSelector::new(5);
        assert_eq!(selector.update(0.9, 0.1), Side::Left);
        assert_eq!(selector.current(), Some(Side::Left));
    }

    #[test]
    fn test_ties_prefer_right() {
        let mut selector = SideSelector::new(5);
        assert_eq!(selector.update(0.5, 0.5), Side::Right);
    }

    #[test]
    fn test_alternating_preference_never_switches() {
        let mut selector = SideSelector::new(5);
        selector.update(0.1, 0.9); // adopt right

        for _ in 0..20 {
            assert_eq!(selector.update(0.9, 0.1), Side::Right);
            assert_eq!(selector.update(0.1, 0.9), Side::Right);
        }
    }

    #[test]
    fn test_switch_happens_on_exactly_the_nth_frame() {
        let mut selector = SideSelector::new(5);
        selector.update(0.1, 0.9); // adopt right

        for _ in 0..4 {
            assert_eq!(selector.update(0.9, 0.1), Side::Right);
        }
        assert_eq!(selector.update(0.9, 0.1), Side::Left);
    }

    #[test]
    fn test_matching_preference_clears_pending_switch() {
        let mut selector = SideSelector::new(5);
        selector.update(0.1, 0.9); // adopt right

        for _ in 0..4 {
            selector.update(0.9, 0.1);
        }
        // One right-preferring frame resets the pending switch counter.
        selector.update(0.1, 0.9);
        for _ in 0..4 {
            assert_eq!(selector.update(0.9, 0.1), Side::Right);
        }
    }

    #[test]
    fn test_reset_clears_side_lock() {
        let mut selector = SideSelector::new(5);
        selector.update(0.1, 0.9);
        selector.reset();
        assert_eq!(selector.current(), None);
        assert_eq!(selector.update(0.9, 0.1), Side::Left);
    }
}
