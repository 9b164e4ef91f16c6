//! A fully-connected feed-forward network for handwritten digit classification, trained with
//! mini-batch stochastic gradient descent and backpropagation.
//!
//! The numeric core lives in [`network`] and [`sgd`]; [`mnist`] and [`config`] are the dataset
//! reader and driver configuration used by the `digit-network` binary.

pub mod activation;
pub mod config;
pub mod cost;
pub mod error;
pub mod mnist;
pub mod network;
pub mod sgd;

pub use activation::{Activation, Sigmoid};
pub use cost::{Cost, CrossEntropyCost, QuadraticCost};
pub use error::{ConfigError, MnistError, NetworkError};
pub use network::{ActivationTrace, Example, InitPolicy, Network, Parameters};
