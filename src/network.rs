use crate::{
    activation::{Activation, Sigmoid},
    cost::{Cost, QuadraticCost},
    error::NetworkError,
};
use ndarray::{Array, Array1, Array2, ArrayView1, Axis};
use ndarray_rand::{RandomExt, rand::Rng, rand_distr::StandardNormal};
use serde::{Deserialize, Serialize};

/// A single training pair. `expected` is the perfect activation of the output layer, e.g. a
/// one-hot encoding of the true class.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub input: Array1<f64>,
    pub expected: Array1<f64>,
}

impl Example {
    pub fn new(input: Array1<f64>, expected: Array1<f64>) -> Example {
        Example { input, expected }
    }

    /// Builds an example whose expected output has `classes` entries, all 0.0 except the one at
    /// `label`, which is 1.0.
    pub fn one_hot(input: Array1<f64>, label: usize, classes: usize) -> Example {
        let expected = Array::from_shape_fn(classes, |i| if i == label { 1.0 } else { 0.0 });
        Example { input, expected }
    }

    /// The index of the largest expected activation, i.e. the class of a one-hot example.
    pub fn label(&self) -> usize {
        argmax(self.expected.view())
    }
}

/// How freshly constructed weights are drawn. Biases are always drawn from a standard normal
/// distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Every weight drawn from N(0, 1).
    StandardNormal,
    /// Every weight drawn from N(0, 1) and divided by the square root of its neuron's fan-in,
    /// which keeps the weighted sums of wide layers out of the sigmoid's flat tails.
    #[default]
    FanInScaled,
}

/// The biases and weights of every non-input layer.
///
/// For layer `i` (counting from the first hidden layer as 0), `biases[i]` has one entry per
/// neuron in that layer and `weights[i]` is a `[size x previous_size]` matrix whose row `j` holds
/// the incoming weights of neuron `j`. Gradients share this type, so their shapes mirror the
/// parameters by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub(crate) biases: Vec<Array1<f64>>,
    pub(crate) weights: Vec<Array2<f64>>,
}

impl Parameters {
    /// Draws every parameter independently from the given random source.
    pub fn random<R: Rng + ?Sized>(sizes: &[usize], init: InitPolicy, rng: &mut R) -> Parameters {
        let biases: Vec<Array1<f64>> = sizes
            .iter()
            .skip(1)
            .map(|&size| Array::random_using(size, StandardNormal, rng))
            .collect();
        let weights = sizes
            .iter()
            .zip(sizes.iter().skip(1))
            .map(|(&previous_size, &size)| {
                let mut weight: Array2<f64> =
                    Array::random_using((size, previous_size), StandardNormal, rng);
                if init == InitPolicy::FanInScaled {
                    let scale = (previous_size as f64).sqrt();
                    weight.mapv_inplace(|w| w / scale);
                }
                weight
            })
            .collect();

        Parameters { biases, weights }
    }

    /// All biases and weights set to zero. Used for gradient accumulators.
    pub fn zeros(sizes: &[usize]) -> Parameters {
        Parameters {
            biases: sizes.iter().skip(1).map(|&size| Array1::zeros(size)).collect(),
            weights: sizes
                .iter()
                .zip(sizes.iter().skip(1))
                .map(|(&previous_size, &size)| Array2::zeros((size, previous_size)))
                .collect(),
        }
    }

    pub fn biases(&self) -> &[Array1<f64>] {
        &self.biases
    }

    pub fn weights(&self) -> &[Array2<f64>] {
        &self.weights
    }

    /// Number of non-input layers.
    pub fn layers(&self) -> usize {
        self.biases.len()
    }

    /// Whether every bias vector and weight matrix has the same dimensions as in `other`.
    pub fn same_shape(&self, other: &Parameters) -> bool {
        self.layers() == other.layers()
            && self
                .biases
                .iter()
                .zip(&other.biases)
                .all(|(a, b)| a.raw_dim() == b.raw_dim())
            && self
                .weights
                .iter()
                .zip(&other.weights)
                .all(|(a, b)| a.raw_dim() == b.raw_dim())
    }

    // self += other, layer by layer.
    pub(crate) fn accumulate(&mut self, other: &Parameters) {
        for (bias, other_bias) in self.biases.iter_mut().zip(&other.biases) {
            *bias += other_bias;
        }
        for (weight, other_weight) in self.weights.iter_mut().zip(&other.weights) {
            *weight += other_weight;
        }
    }

    // self += alpha * other, layer by layer.
    pub(crate) fn scaled_add(&mut self, alpha: f64, other: &Parameters) {
        for (bias, other_bias) in self.biases.iter_mut().zip(&other.biases) {
            bias.scaled_add(alpha, other_bias);
        }
        for (weight, other_weight) in self.weights.iter_mut().zip(&other.weights) {
            weight.scaled_add(alpha, other_weight);
        }
    }
}

/// The intermediate state of one forward pass: the weighted sums `z` of every non-input layer and
/// the activations of every layer, the input included as activation 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationTrace {
    zs: Vec<Array1<f64>>,
    activations: Vec<Array1<f64>>,
}

impl ActivationTrace {
    /// One entry per non-input layer.
    pub fn weighted_sums(&self) -> &[Array1<f64>] {
        &self.zs
    }

    /// One entry per layer, starting with the input.
    pub fn activations(&self) -> &[Array1<f64>] {
        &self.activations
    }

    pub fn output(&self) -> &Array1<f64> {
        // A trace always holds at least the input activation.
        &self.activations[self.activations.len() - 1]
    }

    pub fn into_output(mut self) -> Array1<f64> {
        self.activations.pop().unwrap_or_default()
    }
}

/// A fully-connected feed-forward network.
///
/// The activation and cost functions are injected at construction time as type parameters, so
/// calls to them are statically dispatched.
#[derive(Debug, Clone)]
pub struct Network<A = Sigmoid, C = QuadraticCost> {
    sizes: Vec<usize>,
    pub(crate) parameters: Parameters,
    activation: A,
    cost: C,
}

impl Network {
    /// A sigmoid network with quadratic cost and fan-in scaled random weights.
    pub fn new<R: Rng + ?Sized>(sizes: Vec<usize>, rng: &mut R) -> Result<Network, NetworkError> {
        Network::with_functions(sizes, InitPolicy::default(), Sigmoid, QuadraticCost, rng)
    }
}

impl<A: Activation, C: Cost> Network<A, C> {
    pub fn with_functions<R: Rng + ?Sized>(
        sizes: Vec<usize>,
        init: InitPolicy,
        activation: A,
        cost: C,
        rng: &mut R,
    ) -> Result<Network<A, C>, NetworkError> {
        validate_topology(&sizes)?;
        Ok(Network {
            parameters: Parameters::random(&sizes, init, rng),
            sizes,
            activation,
            cost,
        })
    }

    /// A network whose biases and weights are all zero. Every neuron of such a network outputs
    /// σ(0) regardless of its input, so it is only useful as a fixed point for testing.
    pub fn zeroed(sizes: Vec<usize>, activation: A, cost: C) -> Result<Network<A, C>, NetworkError> {
        validate_topology(&sizes)?;
        Ok(Network {
            parameters: Parameters::zeros(&sizes),
            sizes,
            activation,
            cost,
        })
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// Calculates the activations of the output layer, given the activations of the input layer.
    pub fn feedforward(&self, input: &Array1<f64>) -> Result<Array1<f64>, NetworkError> {
        self.feedforward_trace(input).map(ActivationTrace::into_output)
    }

    /// Like [`Network::feedforward`], but keeps every layer's weighted sums and activations for
    /// backpropagation.
    pub fn feedforward_trace(&self, input: &Array1<f64>) -> Result<ActivationTrace, NetworkError> {
        self.check_input(input)?;
        Ok(self.trace(input.view()))
    }

    // The forward pass proper. Callers must have checked the input size.
    pub(crate) fn trace(&self, input: ArrayView1<f64>) -> ActivationTrace {
        let layers = self.parameters.layers();
        let mut zs = Vec::with_capacity(layers);
        let mut activations = Vec::with_capacity(layers + 1);

        // Each layer computes a' = σ(w.a + b). The previous activation is pushed before being
        // replaced, so the last one is pushed after the loop.
        let mut activation = input.to_owned();
        for (bias, weight) in self.parameters.biases.iter().zip(&self.parameters.weights) {
            let z = weight.dot(&activation) + bias;
            activations.push(activation);
            activation = z.mapv(|z| self.activation.compute(z));
            zs.push(z);
        }
        activations.push(activation);

        ActivationTrace { zs, activations }
    }

    /// Computes the gradient of the cost of a single example with respect to every bias and
    /// weight, given the trace of that example's forward pass.
    ///
    /// This only reads the network, so gradients for different examples can be computed
    /// independently and summed afterwards.
    pub fn backpropagate(&self, example: &Example, trace: &ActivationTrace) -> Parameters {
        let layers = self.parameters.layers();
        let zs = trace.weighted_sums();
        let activations = trace.activations();
        let mut gradients = Parameters::zeros(&self.sizes);

        // Output layer: δ = ∇ₐC ⊙ σ'(z).
        let mut delta = self
            .cost
            .delta(activations[layers].view(), example.expected.view())
            * &zs[layers - 1].mapv(|z| self.activation.derivative(z));

        // Walk the layers from the output back to the first hidden layer. On entry to each
        // iteration, delta holds the error of the layer after `layer`, except on the very first
        // iteration where it already holds the output layer's own error, computed above because
        // it needs the cost function rather than a weight matrix. Every other layer pulls the
        // error back through the transposed weights of the layer after it (w[l+1]ᵀ.δ), then
        // scales it by σ'(z) of its own weighted sums.
        for layer in (0..layers).rev() {
            if layer + 1 < layers {
                delta = self.parameters.weights[layer + 1].t().dot(&delta)
                    * &zs[layer].mapv(|z| self.activation.derivative(z));
            }

            // ∂C/∂w[j][k] = δ[j] * a[k], where a is the activation feeding into this layer. Note
            // that activations[layer] is the *previous* layer's output, since activations[0] is
            // the input itself.
            gradients.weights[layer] = outer(delta.view(), activations[layer].view());
            gradients.biases[layer] = delta.clone();
        }

        gradients
    }

    /// The index of the most activated output neuron.
    pub fn predict(&self, input: &Array1<f64>) -> Result<usize, NetworkError> {
        let output = self.feedforward(input)?;
        Ok(argmax(output.view()))
    }

    /// Counts the examples whose prediction matches the largest entry of their expected output.
    pub fn evaluate(&self, examples: &[Example]) -> Result<usize, NetworkError> {
        let mut correct = 0;
        for example in examples {
            if self.predict(&example.input)? == example.label() {
                correct += 1;
            }
        }
        Ok(correct)
    }

    /// The mean cost over `examples`, or 0.0 when there are none.
    pub fn total_cost(&self, examples: &[Example]) -> Result<f64, NetworkError> {
        if examples.is_empty() {
            return Ok(0.0);
        }

        let mut total = 0.0;
        for example in examples {
            self.check_example(example)?;
            let output = self.trace(example.input.view()).into_output();
            total += self.cost.value(output.view(), example.expected.view());
        }
        Ok(total / examples.len() as f64)
    }

    pub(crate) fn check_example(&self, example: &Example) -> Result<(), NetworkError> {
        self.check_input(&example.input)?;
        if example.expected.len() != self.output_size() {
            return Err(NetworkError::InvalidExpectedSize {
                expected: self.output_size(),
                actual: example.expected.len(),
            });
        }
        Ok(())
    }

    fn check_input(&self, input: &Array1<f64>) -> Result<(), NetworkError> {
        if input.len() != self.input_size() {
            return Err(NetworkError::InvalidInputSize {
                expected: self.input_size(),
                actual: input.len(),
            });
        }
        Ok(())
    }
}

fn validate_topology(sizes: &[usize]) -> Result<(), NetworkError> {
    if sizes.len() < 2 {
        return Err(NetworkError::InvalidTopology(format!(
            "need an input and an output layer, got {} layer(s)",
            sizes.len()
        )));
    }
    if let Some(layer) = sizes.iter().position(|&size| size == 0) {
        return Err(NetworkError::InvalidTopology(format!(
            "layer {layer} has no neurons"
        )));
    }
    Ok(())
}

// [n] x [m] -> [n x m], row j being column[j] * row.
fn outer(column: ArrayView1<f64>, row: ArrayView1<f64>) -> Array2<f64> {
    column.insert_axis(Axis(1)).dot(&row.insert_axis(Axis(0)))
}

fn argmax(values: ArrayView1<f64>) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index)
        .unwrap_or(0)
}
