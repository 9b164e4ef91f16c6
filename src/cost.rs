use ndarray::{Array1, ArrayView1, Zip};

// Activations are pulled into [EPSILON, 1 - EPSILON] wherever the cross-entropy cost divides by
// or takes the logarithm of a(1 - a).
const EPSILON: f64 = 1e-12;

/// A cost function over the output layer.
pub trait Cost {
    /// The per-neuron error signal ∂C/∂a for the given output activation and expected output.
    /// Backpropagation multiplies this by σ'(z) to get the output layer's delta.
    fn delta(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> Array1<f64>;

    /// The cost of a single example, used for reporting only.
    fn value(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> f64;
}

/// C = ½‖a - y‖².
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadraticCost;

impl Cost for QuadraticCost {
    fn delta(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> Array1<f64> {
        &activation - &expected
    }

    fn value(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> f64 {
        0.5 * (&activation - &expected).mapv(|d| d * d).sum()
    }
}

/// C = -Σ [y ln a + (1 - y) ln(1 - a)].
///
/// Its delta divides out the sigmoid derivative, so the output layer's error reduces to `a - y`
/// once backpropagation multiplies σ'(z) back in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossEntropyCost;

impl Cost for CrossEntropyCost {
    fn delta(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> Array1<f64> {
        Zip::from(&activation)
            .and(&expected)
            .map_collect(|&a, &y| {
                let a = a.clamp(EPSILON, 1.0 - EPSILON);
                (a - y) / (a * (1.0 - a))
            })
    }

    fn value(&self, activation: ArrayView1<f64>, expected: ArrayView1<f64>) -> f64 {
        Zip::from(&activation)
            .and(&expected)
            .fold(0.0, |total, &a, &y| {
                let a = a.clamp(EPSILON, 1.0 - EPSILON);
                total - (y * a.ln() + (1.0 - y) * (1.0 - a).ln())
            })
    }
}
