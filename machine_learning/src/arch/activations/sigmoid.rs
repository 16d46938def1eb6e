#[derive(Clone, Debug)]
pub struct Sigmoid {
    amp: f32,
}

impl Sigmoid {
    pub fn new(amp: f32) -> Self {
        Self { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        self.amp / (1. + (-z).exp())
    }

    pub fn df(&self, z: f32) -> f32 {
        let amp = self.amp;

        (amp * (-z).exp()) / ((-z).exp() + 1.).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sigmoid_at_zero() {
        let s = Sigmoid::new(1.);
        assert_eq!(s.f(0.), 0.5);
        assert_eq!(s.df(0.), 0.25);
    }

    #[test]
    fn derivative_matches_f_times_one_minus_f() {
        let s = Sigmoid::new(1.);

        for z in [-4., -1.5, -0.1, 0.3, 2., 5.] {
            let f = s.f(z);
            assert!((s.df(z) - f * (1. - f)).abs() < 1e-6, "z = {z}");
        }
    }

    #[test]
    fn amplitude_scales_output() {
        let s = Sigmoid::new(2.);
        assert_eq!(s.f(0.), 1.);
        assert!((s.f(50.) - 2.).abs() < 1e-6);
    }
}
