use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::{ParamGen, RandErr, Result, param_gen::Quota};

/// Draws parameters from a probability distribution until its quota runs out.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: R,
    distribution: D,
    quota: Quota,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a generator drawing at most `limit` values of `distribution` with `rng`.
    pub fn new(rng: R, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            quota: Quota::new(limit),
        }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// Draws weights uniformly from `[low, high)`, the classic perceptron initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `low` - The inclusive lower bound.
    /// * `high` - The exclusive upper bound.
    ///
    /// # Returns
    /// An error unless `low < high`.
    pub fn uniform(rng: R, limit: usize, low: f32, high: f32) -> Result<Self> {
        if !(low < high) {
            return Err(RandErr::EmptyRange { low, high });
        }

        Ok(Self::new(rng, Uniform::new(low, high)?, limit))
    }

    /// Draws weights uniformly from `[low, high]`.
    ///
    /// # Returns
    /// An error unless `low <= high`.
    pub fn uniform_inclusive(rng: R, limit: usize, low: f32, high: f32) -> Result<Self> {
        if !(low <= high) {
            return Err(RandErr::EmptyRange { low, high });
        }

        Ok(Self::new(rng, Uniform::new_inclusive(low, high)?, limit))
    }

    /// Xavier (Glorot) uniform initialization for a layer with `fan_in` inputs and `fan_out`
    /// outputs: values in `±sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(rng: R, limit: usize, fan_in: usize, fan_out: usize) -> Result<Self> {
        let bound = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, limit, -bound, bound)
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let granted = self.quota.take(n)?;
        let values = (&self.distribution).sample_iter(&mut self.rng);

        Some(values.take(granted).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn uniform_weights_stay_in_range() {
        let mut param_gen = RandParamGen::uniform(rng(), 50, -1., 1.).unwrap();
        let weights = param_gen.sample(50).unwrap();

        assert_eq!(weights.len(), 50);
        assert!(weights.iter().all(|w| (-1. ..1.).contains(w)));
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn quota_is_shared_across_samples() {
        let mut param_gen = RandParamGen::uniform(rng(), 4, 0., 1.).unwrap();

        assert_eq!(param_gen.sample(3).map(|s| s.len()), Some(3));
        assert_eq!(param_gen.sample(3).map(|s| s.len()), Some(1));
        assert_eq!(param_gen.sample(3), None);
    }

    #[test]
    fn seeds_fix_the_weights() {
        let a = RandParamGen::uniform(rng(), 5, -2., 2.).unwrap().sample(5);
        let b = RandParamGen::uniform(rng(), 5, -2., 2.).unwrap().sample(5);

        assert_eq!(a, b);
    }

    #[test]
    fn empty_ranges_are_rejected() {
        for (low, high) in [(1., 1.), (2., 1.), (f32::NAN, 1.)] {
            assert!(matches!(
                RandParamGen::uniform(rng(), 1, low, high),
                Err(RandErr::EmptyRange { .. })
            ));
        }

        assert!(RandParamGen::uniform_inclusive(rng(), 1, 1., 1.).is_ok());
    }

    #[test]
    fn xavier_bound_follows_the_fans() {
        // sqrt(6 / (2 + 4)) == 1
        let mut param_gen = RandParamGen::xavier_uniform(rng(), 100, 2, 4).unwrap();

        assert!(param_gen.sample(100).unwrap().iter().all(|w| w.abs() < 1.));
    }
}
