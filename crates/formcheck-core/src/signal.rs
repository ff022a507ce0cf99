//! Signal smoothing for noisy per-frame angle measurements.

use crate::error::{Error, Result};

/// Exponential moving average for a single angle signal.
///
/// Seeded by the first sample so there is no warm-up bias; `reset`
/// returns it to the unseeded state. Higher `alpha` tracks faster and
/// suits lower frame rates; lower `alpha` smooths harder.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    alpha: f64,
    value: Option<f64>,
}

impl AngleSmoother {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::Config(format!(
                "smoothing factor must be in (0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha, value: None })
    }

    pub fn update(&mut self, raw: f64) -> f64 {
        let next = match self.value {
            None => raw,
            Some(value) => self.alpha * raw + (1.0 - self.alpha) * value,
        };
        self.value = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_seeds_exactly() {
        let mut smoother = AngleSmoother::new(0.35).unwrap();
        assert!((smoother.update(123.4) - 123.4).abs() < 1e-12);
    }

    #[test]
    fn test_converges_monotonically_to_constant() {
        let mut smoother = AngleSmoother::new(0.35).unwrap();
        smoother.update(180.0);

        let mut prev = 180.0;
        for _ in 0..50 {
            let next = smoother.update(90.0);
            assert!(next < prev, "EMA must decrease toward the constant");
            assert!(next >= 90.0);
            prev = next;
        }
        assert!((prev - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_reset_reseeds_without_bias() {
        let mut smoother = AngleSmoother::new(0.5).unwrap();
        smoother.update(180.0);
        smoother.update(170.0);
        smoother.reset();
        assert!(smoother.value().is_none());
        assert!((smoother.update(42.0) - 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        assert!(AngleSmoother::new(0.0).is_err());
        assert!(AngleSmoother::new(-0.1).is_err());
        assert!(AngleSmoother::new(1.5).is_err());
        assert!(AngleSmoother::new(1.0).is_ok());
    }
}
