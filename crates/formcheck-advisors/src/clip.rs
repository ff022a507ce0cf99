//! Bounded buffering of encoded frames for clip review.

use std::collections::VecDeque;

use formcheck_core::ExerciseKind;

use crate::advisor::{AdvisorError, AdvisorResult};

/// Buffer sizing for clip capture
#[derive(Debug, Clone)]
pub struct ClipBufferConfig {
    /// Seconds of video to retain
    pub buffer_seconds: u32,
    /// Capture frame rate the buffer is sized for
    pub fps: u32,
}

impl Default for ClipBufferConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 2,
            fps: 30,
        }
    }
}

/// A finished clip handed to a [`FormCritic`](crate::critic::FormCritic)
#[derive(Debug, Clone)]
pub struct FrameClip {
    pub exercise: ExerciseKind,
    pub fps: u32,
    /// Encoded (e.g. JPEG) frames, oldest first
    pub frames: Vec<Vec<u8>>,
}

impl FrameClip {
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.fps as f64
    }
}

/// Circular buffer holding the most recent encoded frames. Oldest frames
/// are evicted once `buffer_seconds * fps` are held.
#[derive(Debug)]
pub struct ClipBuffer {
    frames: VecDeque<Vec<u8>>,
    capacity: usize,
    fps: u32,
}

impl ClipBuffer {
    pub fn new(config: ClipBufferConfig) -> Self {
        let capacity = (config.buffer_seconds * config.fps).max(1) as usize;
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            fps: config.fps,
        }
    }

    pub fn push(&mut self, frame: Vec<u8>) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Snapshot the buffered frames into a clip. Requires at least one
    /// second of footage to be worth reviewing.
    pub fn clip(&self, exercise: ExerciseKind) -> AdvisorResult<FrameClip> {
        let required = self.fps as usize;
        if self.frames.len() < required {
            return Err(AdvisorError::InsufficientFrames {
                required,
                available: self.frames.len(),
            });
        }
        Ok(FrameClip {
            exercise,
            fps: self.fps,
            frames: self.frames.iter().cloned().collect(),
        })
    }
}

impl Default for ClipBuffer {
    fn default() -> Self {
        Self::new(ClipBufferConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_buffer_is_rejected() {
        let mut buffer = ClipBuffer::new(ClipBufferConfig {
            buffer_seconds: 2,
            fps: 10,
        });
        for i in 0..5u8 {
            buffer.push(vec![i]);
        }
        let err = buffer.clip(ExerciseKind::Squat).unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::InsufficientFrames { required: 10, available: 5 }
        ));
    }

    #[test]
    fn test_eviction_keeps_most_recent_frames() {
        let mut buffer = ClipBuffer::new(ClipBufferConfig {
            buffer_seconds: 1,
            fps: 3,
        });
        for i in 0..5u8 {
            buffer.push(vec![i]);
        }
        assert_eq!(buffer.len(), 3);

        let clip = buffer.clip(ExerciseKind::Pushup).unwrap();
        assert_eq!(clip.frames, vec![vec![2], vec![3], vec![4]]);
        assert!((clip.duration_secs() - 1.0).abs() < 1e-9);
    }
}
