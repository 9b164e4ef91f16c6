/// A scalar nonlinearity applied elementwise to a layer's weighted sums.
///
/// `derivative` is always evaluated at the pre-activation value `z`, never at `compute(z)`.
pub trait Activation {
    fn compute(&self, z: f64) -> f64;

    fn derivative(&self, z: f64) -> f64;
}

/// The logistic sigmoid σ(z) = 1 / (1 + e^-z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn compute(&self, z: f64) -> f64 {
        1.0 / (1.0 + f64::exp(-z))
    }

    // σ'(z) = σ(z)(1 - σ(z)). The exponential saturates on its own at extreme magnitudes, which
    // drives this towards 0.0 rather than producing NaN.
    fn derivative(&self, z: f64) -> f64 {
        let s = self.compute(z);
        s * (1.0 - s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_is_one_half_at_zero() {
        assert_relative_eq!(Sigmoid.compute(0.0), 0.5);
        assert_relative_eq!(Sigmoid.derivative(0.0), 0.25);
    }

    #[test]
    fn sigmoid_saturates_without_nan() {
        assert_relative_eq!(Sigmoid.compute(1000.0), 1.0);
        assert_relative_eq!(Sigmoid.compute(-1000.0), 0.0);
        assert_eq!(Sigmoid.derivative(1000.0), 0.0);
        assert_eq!(Sigmoid.derivative(-1000.0), 0.0);
    }

    #[test]
    fn sigmoid_derivative_matches_finite_difference() {
        let h = 1e-6;
        for z in [-4.0, -1.5, -0.3, 0.0, 0.7, 2.0, 5.0] {
            let numeric = (Sigmoid.compute(z + h) - Sigmoid.compute(z - h)) / (2.0 * h);
            assert_relative_eq!(Sigmoid.derivative(z), numeric, epsilon = 1e-8);
        }
    }
}
