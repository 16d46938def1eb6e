use super::{ParamGen, param_gen::Quota};

/// Yields the same value until its quota runs out, useful to get predictable weights.
#[derive(Debug, Clone)]
pub struct ConstParamGen {
    value: f32,
    quota: Quota,
}

impl ConstParamGen {
    /// Creates a generator yielding `value` at most `limit` times.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            quota: Quota::new(limit),
        }
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let granted = self.quota.take(n)?;
        Some(vec![self.value; granted])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MlErr;

    #[test]
    fn zero_limit_yields_nothing() {
        assert_eq!(ConstParamGen::new(0.5, 0).sample(3), None);
    }

    #[test]
    fn samples_are_cut_at_the_limit() {
        let mut param_gen = ConstParamGen::new(-0.25, 5);

        assert_eq!(param_gen.sample(2), Some(vec![-0.25; 2]));
        assert_eq!(param_gen.sample(4), Some(vec![-0.25; 3]));
        assert_eq!(param_gen.sample(1), None);
    }

    #[test]
    fn fills_a_whole_layer() {
        let mut weights = [0.; 6];
        ConstParamGen::new(0.1, 6).fill(&mut weights).unwrap();

        assert!(weights.iter().all(|&w| w == 0.1));
    }

    #[test]
    fn short_generators_fail_to_fill() {
        let mut weights = [0.; 4];
        let err = ConstParamGen::new(2., 3).fill(&mut weights).unwrap_err();

        assert!(matches!(
            err,
            MlErr::ParamGenExhausted {
                got: 3,
                expected: 4
            }
        ));
    }
}
