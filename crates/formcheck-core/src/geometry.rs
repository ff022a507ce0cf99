//! 2D joint geometry: angle computation, line-deviation projection and
//! the full-body framing gate.

use crate::error::{Error, Result};
use crate::types::{ExerciseKind, LandmarkFrame, Point2D, PoseLandmark, Viewport};

/// Landmarks that must be visible for the body to count as "in frame":
/// head, shoulders, hips, knees, ankles. Fingers and toes are excluded
/// since they routinely leave the frame without the body being cut off.
pub const KEY_LANDMARKS: [PoseLandmark; 9] = [
    PoseLandmark::Nose,
    PoseLandmark::LeftShoulder,
    PoseLandmark::RightShoulder,
    PoseLandmark::LeftHip,
    PoseLandmark::RightHip,
    PoseLandmark::LeftKnee,
    PoseLandmark::RightKnee,
    PoseLandmark::LeftAnkle,
    PoseLandmark::RightAnkle,
];

const COINCIDENT_EPSILON: f64 = 1e-9;

/// Angle at vertex `b` between rays `b->a` and `b->c`, in degrees,
/// always within [0, 180].
///
/// Fails with [`Error::DegenerateAngle`] when either endpoint coincides
/// with the vertex; the arctangent of a zero-length vector carries no
/// directional information.
pub fn calculate_angle(a: Point2D, b: Point2D, c: Point2D) -> Result<f64> {
    if a.distance_to(&b) < COINCIDENT_EPSILON {
        return Err(Error::DegenerateAngle { endpoint: "first" });
    }
    if c.distance_to(&b) < COINCIDENT_EPSILON {
        return Err(Error::DegenerateAngle { endpoint: "third" });
    }

    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut angle = radians.to_degrees().abs();

    if angle > 180.0 {
        angle = 360.0 - angle;
    }

    Ok(angle)
}

/// Perpendicular deviation of a mid joint from the segment between two
/// end joints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDeviation {
    /// Projection parameter along the segment, clamped to [0, 1]
    pub t: f64,
    /// Foot of the (clamped) projection on the segment
    pub foot: Point2D,
    /// Distance from the mid joint to the foot, normalized by segment
    /// length so it is independent of resolution and orientation
    pub deviation: f64,
}

/// Project `mid` onto the segment `start -> end` and measure its
/// normalized perpendicular deviation. Returns `None` for a degenerate
/// (near zero-length) segment.
pub fn line_deviation(start: Point2D, end: Point2D, mid: Point2D) -> Option<LineDeviation> {
    let s = start.to_nalgebra();
    let e = end.to_nalgebra();
    let m = mid.to_nalgebra();

    let axis = e - s;
    let length_sq = axis.norm_squared();
    if length_sq < COINCIDENT_EPSILON * COINCIDENT_EPSILON {
        return None;
    }

    let t = ((m - s).dot(&axis) / length_sq).clamp(0.0, 1.0);
    let foot = s + axis * t;
    let deviation = (m - foot).norm() / length_sq.sqrt();

    Some(LineDeviation {
        t,
        foot: Point2D::from_nalgebra(foot),
        deviation,
    })
}

/// Returns true when the full body (head, torso, legs) is inside the
/// viewport. Works facing the camera or sideways, and is deliberately
/// permissive: it only rejects obvious cut-off or implausible framing.
/// Rep counting never depends on this; it drives advisory feedback only.
pub fn is_full_body_in_frame(
    frame: &LandmarkFrame,
    viewport: Viewport,
    margin: f64,
    exercise: ExerciseKind,
) -> bool {
    if !frame.is_complete() {
        return false;
    }
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return false;
    }

    let (w, h) = (viewport.width, viewport.height);
    let x_min = margin * w;
    let x_max = (1.0 - margin) * w;
    let y_min = margin * h;
    let y_max = (1.0 - margin) * h;

    let mut xs = Vec::with_capacity(KEY_LANDMARKS.len());
    let mut ys = Vec::with_capacity(KEY_LANDMARKS.len());
    for landmark in KEY_LANDMARKS {
        let p = match frame.point(landmark) {
            Some(p) => p,
            None => return false,
        };
        if p.x < x_min || p.x > x_max || p.y < y_min || p.y > y_max {
            return false;
        }
        xs.push(p.x);
        ys.push(p.y);
    }

    // Reject a single joint cluster filling the frame.
    let x_span = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_span = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let min_span = 0.15 * w.min(h);
    if x_span < min_span && y_span < min_span {
        return false;
    }

    if exercise == ExerciseKind::Squat {
        // Standing exercise: require a minimal vertical head-to-ankle
        // extent and a plausible vertical arrangement.
        let head_y = match frame.point(PoseLandmark::Nose) {
            Some(p) => p.y,
            None => return false,
        };
        let ankle_y = match (
            frame.point(PoseLandmark::LeftAnkle),
            frame.point(PoseLandmark::RightAnkle),
        ) {
            (Some(l), Some(r)) => l.y.max(r.y),
            _ => return false,
        };
        if ankle_y - head_y < 0.15 * h {
            return false;
        }
        if head_y > h * 2.0 / 3.0 && ankle_y > h / 3.0 {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, Timestamp};

    #[test]
    fn test_collinear_points_measure_180() {
        let angle = calculate_angle(
            Point2D::new(-1.0, 0.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
        )
        .unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_angle_measures_90() {
        let angle = calculate_angle(
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_is_rotation_and_translation_invariant() {
        // A 90-degree configuration rotated and translated arbitrarily
        // must still measure 90 degrees.
        let theta: f64 = 0.7;
        let (sin, cos) = theta.sin_cos();
        let rotate = |p: Point2D| Point2D::new(
            p.x * cos - p.y * sin + 13.0,
            p.x * sin + p.y * cos - 42.0,
        );

        let angle = calculate_angle(
            rotate(Point2D::new(1.0, 0.0)),
            rotate(Point2D::new(0.0, 0.0)),
            rotate(Point2D::new(0.0, 1.0)),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflex_angle_reflected_into_range() {
        // Rays at +170 and -170 degrees: raw arctangent difference is
        // 340, which must reflect to 20.
        let a = Point2D::new(170f64.to_radians().cos(), 170f64.to_radians().sin());
        let c = Point2D::new((-170f64).to_radians().cos(), (-170f64).to_radians().sin());
        let angle = calculate_angle(a, Point2D::new(0.0, 0.0), c).unwrap();
        assert!((angle - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_angle_is_an_error() {
        let p = Point2D::new(1.0, 1.0);
        let result = calculate_angle(p, p, Point2D::new(2.0, 2.0));
        assert!(matches!(result, Err(Error::DegenerateAngle { .. })));
    }

    #[test]
    fn test_line_deviation_on_segment() {
        let dev = line_deviation(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(5.0, 0.0),
        )
        .unwrap();
        assert!((dev.t - 0.5).abs() < 1e-9);
        assert!(dev.deviation.abs() < 1e-9);
    }

    #[test]
    fn test_line_deviation_perpendicular_normalized() {
        let dev = line_deviation(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(5.0, 2.0),
        )
        .unwrap();
        assert!((dev.deviation - 0.2).abs() < 1e-9);
        assert!((dev.foot.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_deviation_clamps_projection() {
        let dev = line_deviation(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(15.0, 0.0),
        )
        .unwrap();
        assert!((dev.t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_deviation_degenerate_segment() {
        let p = Point2D::new(3.0, 3.0);
        assert!(line_deviation(p, p, Point2D::new(0.0, 0.0)).is_none());
    }

    fn standing_frame() -> LandmarkFrame {
        // Upright figure centered in a 640x480 viewport.
        let mut landmarks = vec![Landmark::new(320.0, 240.0, 0.9); 33];
        landmarks[PoseLandmark::Nose as usize] = Landmark::new(320.0, 60.0, 0.9);
        landmarks[PoseLandmark::LeftShoulder as usize] = Landmark::new(300.0, 140.0, 0.9);
        landmarks[PoseLandmark::RightShoulder as usize] = Landmark::new(340.0, 140.0, 0.9);
        landmarks[PoseLandmark::LeftHip as usize] = Landmark::new(305.0, 250.0, 0.9);
        landmarks[PoseLandmark::RightHip as usize] = Landmark::new(335.0, 250.0, 0.9);
        landmarks[PoseLandmark::LeftKnee as usize] = Landmark::new(305.0, 340.0, 0.9);
        landmarks[PoseLandmark::RightKnee as usize] = Landmark::new(335.0, 340.0, 0.9);
        landmarks[PoseLandmark::LeftAnkle as usize] = Landmark::new(305.0, 430.0, 0.9);
        landmarks[PoseLandmark::RightAnkle as usize] = Landmark::new(335.0, 430.0, 0.9);
        LandmarkFrame::new(Timestamp::from_nanos(0), landmarks)
    }

    #[test]
    fn test_full_body_in_frame() {
        let frame = standing_frame();
        let viewport = Viewport::new(640.0, 480.0);
        assert!(is_full_body_in_frame(&frame, viewport, 0.03, ExerciseKind::Squat));
    }

    #[test]
    fn test_body_cut_off_at_margin() {
        let mut frame = standing_frame();
        frame.landmarks[PoseLandmark::LeftAnkle as usize] = Landmark::new(305.0, 478.0, 0.9);
        let viewport = Viewport::new(640.0, 480.0);
        assert!(!is_full_body_in_frame(&frame, viewport, 0.03, ExerciseKind::Squat));
    }

    #[test]
    fn test_incomplete_frame_is_never_in_frame() {
        let frame = LandmarkFrame::new(
            Timestamp::from_nanos(0),
            vec![Landmark::new(320.0, 240.0, 0.9); 10],
        );
        let viewport = Viewport::new(640.0, 480.0);
        assert!(!is_full_body_in_frame(&frame, viewport, 0.03, ExerciseKind::Squat));
    }
}
