use rand::Rng;
use std::f64::consts::PI;

/// Normal variates via the Box-Muller transform.
///
/// Both uniform draws are re-rolled while exactly zero so `ln(u)` is never
/// evaluated at the singularity. Every call consumes two fresh uniforms, so
/// successive samples are independent.
pub struct GaussianSampler<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> GaussianSampler<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        GaussianSampler { rng }
    }

    /// Draw from N(mean, std_dev²).
    pub fn sample(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u = self.open_unit();
        let v = self.open_unit();
        let z = (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos();
        mean + z * std_dev
    }

    /// Uniform in (0, 1).
    fn open_unit(&mut self) -> f64 {
        loop {
            let x: f64 = self.rng.gen();
            if x != 0.0 {
                return x;
            }
        }
    }

    /// Uniform in [0, 1), for event checks that share the sampler's stream.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_moments_match_parameters() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sampler = GaussianSampler::new(&mut rng);
        let n = 50_000;
        let samples: Vec<f64> = (0..n).map(|_| sampler.sample(110.0, 10.0)).collect();

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

        assert!((mean - 110.0).abs() < 0.3, "mean drifted: {:.3}", mean);
        assert!((var.sqrt() - 10.0).abs() < 0.3, "std dev drifted: {:.3}", var.sqrt());
    }

    #[test]
    fn zero_std_dev_returns_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sampler = GaussianSampler::new(&mut rng);
        for _ in 0..100 {
            assert_eq!(sampler.sample(42.0, 0.0), 42.0);
        }
    }

    #[test]
    fn samples_are_always_finite() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut sampler = GaussianSampler::new(&mut rng);
        for _ in 0..100_000 {
            assert!(sampler.sample(0.0, 15.0).is_finite());
        }
    }

    #[test]
    fn consecutive_samples_are_uncorrelated() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut sampler = GaussianSampler::new(&mut rng);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| sampler.sample(0.0, 1.0)).collect();
        let lag1: f64 = xs.windows(2).map(|w| w[0] * w[1]).sum::<f64>() / (n - 1) as f64;
        assert!(lag1.abs() < 0.05, "lag-1 correlation too high: {:.4}", lag1);
    }
}
