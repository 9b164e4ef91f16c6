use approx::assert_relative_eq;
use digit_network::{
    CrossEntropyCost, Example, InitPolicy, Network, NetworkError, QuadraticCost, Sigmoid,
};
use ndarray::array;
use ndarray_rand::rand::{SeedableRng, rngs::StdRng};
use std::num::NonZeroUsize;

fn batch(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn and_examples() -> Vec<Example> {
    vec![
        Example::new(array![0.0, 0.0], array![0.0]),
        Example::new(array![0.0, 1.0], array![0.0]),
        Example::new(array![1.0, 0.0], array![0.0]),
        Example::new(array![1.0, 1.0], array![1.0]),
    ]
}

#[test]
fn repeated_training_on_one_example_decreases_output_every_time() {
    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = Network::new(vec![2, 3, 1], &mut rng).unwrap();
        let mut examples = vec![Example::new(array![0.9, 0.9], array![0.0])];

        let mut previous = network.feedforward(&examples[0].input).unwrap()[0];
        for step in 0..100 {
            network.train(&mut examples, batch(1), 5.0, &mut rng).unwrap();
            let output = network.feedforward(&examples[0].input).unwrap()[0];

            assert!(
                output < previous,
                "seed {seed}, step {step}: {output} is not below {previous}"
            );
            previous = output;
        }
    }
}

#[test]
fn shuffling_is_a_permutation() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut network = Network::new(vec![1, 2, 1], &mut rng).unwrap();
    let original: Vec<_> = (0..20)
        .map(|i| Example::new(array![i as f64], array![0.5]))
        .collect();
    let mut examples = original.clone();

    network.train(&mut examples, batch(3), 0.1, &mut rng).unwrap();
    assert_ne!(examples, original);

    examples.sort_by(|a, b| a.input[0].total_cmp(&b.input[0]));
    assert_eq!(examples, original);
}

#[test]
fn same_seed_trains_the_same_network() {
    let run = || {
        let mut rng = StdRng::seed_from_u64(99);
        let mut network = Network::new(vec![2, 4, 1], &mut rng).unwrap();
        let mut examples = and_examples();
        for _ in 0..10 {
            network.train(&mut examples, batch(2), 1.0, &mut rng).unwrap();
        }
        network.parameters().clone()
    };

    assert_eq!(run(), run());
}

#[test]
fn learns_logical_and_with_quadratic_cost() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut network = Network::new(vec![2, 4, 1], &mut rng).unwrap();
    let mut examples = and_examples();
    let initial_cost = network.total_cost(&examples).unwrap();

    for _ in 0..3000 {
        network.train(&mut examples, batch(4), 3.0, &mut rng).unwrap();
    }

    assert!(network.total_cost(&examples).unwrap() < initial_cost);
    for example in &examples {
        let output = network.feedforward(&example.input).unwrap()[0];
        assert_relative_eq!(output, example.expected[0], epsilon = 0.2);
    }
}

#[test]
fn learns_logical_and_with_cross_entropy_cost() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut network = Network::with_functions(
        vec![2, 4, 1],
        InitPolicy::StandardNormal,
        Sigmoid,
        CrossEntropyCost,
        &mut rng,
    )
    .unwrap();
    let mut examples = and_examples();

    for _ in 0..1000 {
        network.train(&mut examples, batch(4), 1.0, &mut rng).unwrap();
    }

    for example in &examples {
        let output = network.feedforward(&example.input).unwrap()[0];
        assert_relative_eq!(output, example.expected[0], epsilon = 0.2);
    }
}

#[test]
fn classifies_one_hot_examples_by_argmax() {
    // Three well separated clusters, one per class.
    let centres = [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let mut examples: Vec<_> = centres
        .iter()
        .enumerate()
        .flat_map(|(label, centre)| {
            [-0.05, 0.0, 0.05].into_iter().map(move |offset| {
                Example::one_hot(array![centre[0] + offset, centre[1] - offset], label, 3)
            })
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(8);
    let mut network = Network::new(vec![2, 6, 3], &mut rng).unwrap();
    for _ in 0..2000 {
        network.train(&mut examples, batch(3), 2.0, &mut rng).unwrap();
    }

    assert_eq!(network.evaluate(&examples), Ok(examples.len()));
}

#[test]
fn zeroed_network_output_is_constant() {
    let network = Network::zeroed(vec![4, 3, 2], Sigmoid, QuadraticCost).unwrap();

    let a = network.feedforward(&array![1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = network.feedforward(&array![-1.0, 0.0, 0.5, 8.0]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, array![0.5, 0.5]);
}

#[test]
fn wrong_input_size_is_an_error_not_a_panic() {
    let mut rng = StdRng::seed_from_u64(0);
    let network = Network::new(vec![784, 30, 10], &mut rng).unwrap();

    assert_eq!(
        network.feedforward(&array![0.0, 1.0]),
        Err(NetworkError::InvalidInputSize {
            expected: 784,
            actual: 2
        })
    );
    assert_eq!(
        network.predict(&array![0.0]),
        Err(NetworkError::InvalidInputSize {
            expected: 784,
            actual: 1
        })
    );
}
