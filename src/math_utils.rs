// src/math_utils.rs
use statrs::statistics::Statistics;

pub struct Timer {
    start_time: std::time::Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}

/// Sample mean and unbiased sample variance
pub fn mean_variance(samples: &[f64]) -> (f64, f64) {
    (samples.mean(), samples.variance())
}

/// Convergence order observed when the step shrinks by `ratio` and the error
/// drops from `coarse_error` to `fine_error`
pub fn observed_order(coarse_error: f64, fine_error: f64, ratio: f64) -> f64 {
    (coarse_error.abs() / fine_error.abs()).ln() / ratio.ln()
}

/// Richardson estimate of the order from three solutions computed with steps
/// `h`, `h/ratio`, `h/ratio²`, no exact solution needed
pub fn richardson_order(coarse: f64, medium: f64, fine: f64, ratio: f64) -> f64 {
    observed_order(coarse - medium, medium - fine, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_variance() {
        let (mean, variance) = mean_variance(&[1.0, 2.0, 3.0, 4.0]);
        assert!((mean - 2.5).abs() < 1e-15);
        assert!((variance - 5.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_orders() {
        // error ∝ h²
        assert!((observed_order(4e-2, 1e-2, 2.0) - 2.0).abs() < 1e-12);

        // y(h) = 1 + h, step halved twice
        assert!((richardson_order(1.4, 1.2, 1.1, 2.0) - 1.0).abs() < 1e-12);
    }
}
