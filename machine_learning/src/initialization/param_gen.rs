use crate::MlErr;

/// A `ParamGen` generates values for the initial state of the model's parameters.
pub trait ParamGen {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// The sampled values, or `None` once the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;

    /// Overwrites every value of `params` with newly sampled ones.
    ///
    /// # Returns
    /// An error if the generator got exhausted before filling the whole slice.
    fn fill(&mut self, params: &mut [f32]) -> crate::Result<()> {
        let expected = params.len();
        let mut filled = 0;

        while filled < expected {
            match self.sample(expected - filled) {
                Some(sample) if !sample.is_empty() => {
                    params[filled..filled + sample.len()].copy_from_slice(&sample);
                    filled += sample.len();
                }
                _ => {
                    return Err(MlErr::ParamGenExhausted {
                        got: filled,
                        expected,
                    });
                }
            }
        }

        Ok(())
    }
}

/// How many more values a generator may yield.
#[derive(Debug, Clone, Copy)]
pub(super) struct Quota(usize);

impl Quota {
    pub(super) fn new(limit: usize) -> Self {
        Self(limit)
    }

    /// Takes up to `n` values out of the quota.
    ///
    /// # Returns
    /// The amount actually granted, `None` if nothing was left.
    pub(super) fn take(&mut self, n: usize) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }

        let granted = n.min(self.0);
        self.0 -= granted;
        Some(granted)
    }
}
