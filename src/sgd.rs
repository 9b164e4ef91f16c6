use crate::{
    activation::Activation,
    cost::Cost,
    error::NetworkError,
    network::{Example, Network, Parameters},
};
use log::{debug, trace};
use ndarray_rand::rand::{Rng, seq::SliceRandom};
use std::num::NonZeroUsize;

/// Splits `items` into consecutive batches of `batch_size`. The final batch absorbs the
/// remainder, so there are `max(1, len / batch_size)` batches for a non-empty slice and the last
/// one holds `batch_size + len % batch_size` items (or everything, when `len < batch_size`).
pub fn partition<T>(items: &[T], batch_size: NonZeroUsize) -> Vec<&[T]> {
    let batch_size = batch_size.get();
    let count = items.len() / batch_size;

    // With fewer than two full batches' worth of items there is nothing to split: everything
    // (if anything) goes into a single batch.
    if count <= 1 {
        return if items.is_empty() { Vec::new() } else { vec![items] };
    }

    // Cut the slice just after the first count - 1 full batches. The front part divides exactly
    // into batches of batch_size, so chunks_exact leaves no remainder behind, while the back part
    // is one full batch plus whatever did not divide evenly. Only slices of the original are
    // handed out, so no example is copied.
    let (regular, last) = items.split_at((count - 1) * batch_size);
    let mut batches: Vec<&[T]> = regular.chunks_exact(batch_size).collect();
    batches.push(last);
    batches
}

impl<A: Activation, C: Cost> Network<A, C> {
    /// Runs one epoch of mini-batch stochastic gradient descent.
    ///
    /// The examples are shuffled in place with `rng`, split into batches by [`partition`], and
    /// the network's biases and weights are moved against the batch's mean gradient once per
    /// batch. Every example is checked against the network's input and output sizes before
    /// anything is shuffled or updated, so an error leaves the network untouched.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        examples: &mut [Example],
        batch_size: NonZeroUsize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        for example in examples.iter() {
            self.check_example(example)?;
        }

        examples.shuffle(rng);

        // partition only needs a shared view of the examples, so the mutable slice is reborrowed
        // immutably here and stays readable (e.g. for its length) while the batches are alive.
        let batches = partition(examples, batch_size);
        debug!(
            "training on {} examples in {} batches, learning rate {learning_rate}",
            examples.len(),
            batches.len()
        );

        for (index, batch) in batches.into_iter().enumerate() {
            let gradients = self.batch_gradients(batch);
            self.apply_gradients(&gradients, learning_rate, batch.len());
            trace!("batch {index}: applied {} examples", batch.len());
        }

        Ok(())
    }

    // Sums the gradients of every example in the batch. Each example's forward and backward pass
    // only reads the parameters, writing into its own gradient before it is added to the total.
    fn batch_gradients(&self, batch: &[Example]) -> Parameters {
        let mut nabla = Parameters::zeros(self.sizes());
        for example in batch {
            let trace = self.trace(example.input.view());
            nabla.accumulate(&self.backpropagate(example, &trace));
        }
        nabla
    }

    // Gradient descent step averaged over the actual size of the batch:
    // p -= (learning_rate / batch_len) * nabla.
    fn apply_gradients(&mut self, nabla: &Parameters, learning_rate: f64, batch_len: usize) {
        self.parameters.scaled_add(-learning_rate / batch_len as f64, nabla);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{activation::Sigmoid, cost::QuadraticCost};
    use approx::assert_relative_eq;
    use ndarray::array;
    use ndarray_rand::rand::{SeedableRng, rngs::StdRng};

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn remainder_is_absorbed_by_last_batch() {
        let items: Vec<_> = (0..23).collect();
        let batches = partition(&items, size(10));

        let lengths: Vec<_> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(lengths, [10, 13]);
        assert_eq!(batches.concat(), items);
    }

    #[test]
    fn exact_multiple_gives_full_batches() {
        let items: Vec<_> = (0..30).collect();
        let lengths: Vec<_> = partition(&items, size(10)).iter().map(|b| b.len()).collect();
        assert_eq!(lengths, [10, 10, 10]);
    }

    #[test]
    fn fewer_items_than_batch_size_gives_one_batch() {
        let items = [1, 2, 3];
        assert_eq!(partition(&items, size(10)), vec![&items[..]]);
        assert_eq!(partition(&items, size(3)), vec![&items[..]]);
    }

    #[test]
    fn batch_count_and_last_batch_size() {
        for (len, batch_size) in [(1, 1), (7, 2), (19, 4), (100, 7), (11, 5)] {
            let items: Vec<_> = (0..len).collect();
            let batches = partition(&items, size(batch_size));

            assert_eq!(batches.len(), len / batch_size);
            assert_eq!(batches.last().unwrap().len(), batch_size + len % batch_size);
            assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), len);
        }
    }

    #[test]
    fn empty_slice_gives_no_batches() {
        let items: [u8; 0] = [];
        assert!(partition(&items, size(4)).is_empty());
    }

    #[test]
    fn training_on_nothing_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = Network::new(vec![2, 2], &mut rng).unwrap();
        let before = network.parameters().clone();

        network.train(&mut [], size(5), 3.0, &mut rng).unwrap();
        assert_eq!(network.parameters(), &before);
    }

    #[test]
    fn update_uses_actual_batch_size() {
        // Two identical examples in one batch must move the parameters exactly as far as one
        // example on its own.
        let example = Example::new(array![1.0, 0.5], array![1.0]);
        let mut rng = StdRng::seed_from_u64(3);

        let mut single = Network::zeroed(vec![2, 1], Sigmoid, QuadraticCost).unwrap();
        single.train(&mut [example.clone()], size(1), 2.0, &mut rng).unwrap();

        let mut double = Network::zeroed(vec![2, 1], Sigmoid, QuadraticCost).unwrap();
        double
            .train(&mut [example.clone(), example], size(2), 2.0, &mut rng)
            .unwrap();

        let single_weights = &single.parameters().weights()[0];
        let double_weights = &double.parameters().weights()[0];
        for (&a, &b) in single_weights.iter().zip(double_weights) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        assert_relative_eq!(
            single.parameters().biases()[0][0],
            double.parameters().biases()[0][0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn single_step_matches_hand_computed_update() {
        // a = σ(0) = 0.5, δ = (0.5 - 0.0) * 0.25 = 0.125, so b' = -lr * δ and w' = -lr * δ * x.
        let mut network = Network::zeroed(vec![1, 1], Sigmoid, QuadraticCost).unwrap();
        let mut examples = [Example::new(array![2.0], array![0.0])];

        network
            .train(&mut examples, size(1), 4.0, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_relative_eq!(network.parameters().biases()[0][0], -0.5);
        assert_relative_eq!(network.parameters().weights()[0][[0, 0]], -1.0);
    }

    #[test]
    fn invalid_example_leaves_network_untouched() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut network = Network::new(vec![2, 3, 1], &mut rng).unwrap();
        let before = network.parameters().clone();
        let mut examples = vec![
            Example::new(array![0.1, 0.2], array![1.0]),
            Example::new(array![0.1, 0.2, 0.3], array![1.0]),
        ];
        let order = examples.clone();

        let result = network.train(&mut examples, size(1), 1.0, &mut rng);
        assert_eq!(
            result,
            Err(NetworkError::InvalidInputSize {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(network.parameters(), &before);
        assert_eq!(examples, order);

        let mut examples = vec![Example::new(array![0.1, 0.2], array![1.0, 0.0])];
        let result = network.train(&mut examples, size(1), 1.0, &mut rng);
        assert_eq!(
            result,
            Err(NetworkError::InvalidExpectedSize {
                expected: 1,
                actual: 2
            })
        );
    }
}
