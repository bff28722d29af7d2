//! Fully connected value network on `burn`.
//!
//! Layout is `9 -> hidden... -> 9`, ReLU on hidden layers, linear output,
//! trained one sample at a time on mean squared error with Adam.

use crate::approximator::{ActionValueApproximator, ActionValues, Weights};
use crate::board::CELLS;
use crate::encoding::EncodedState;
use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Param};
use burn::nn::loss::{MseLoss, Reduction};
use burn::nn::{Linear, Relu};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::Rng;
use serde::{Deserialize, Serialize};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

const ADAM_EPS: f32 = 1e-7;

/// Q-value network: one `Linear` per layer, ReLU between them.
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    layers: Vec<Linear<B>>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    pub hidden_layers: Vec<usize>,
}

/// One exported layer, `weights` row-major in `[inputs, outputs]` order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseWeights {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Network parameters as read from the module record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub layers: Vec<DenseWeights>,
}

pub struct NetworkApproximator {
    network: QNetwork<TrainBackend>,
    optimizer: OptimizerAdaptor<Adam, QNetwork<TrainBackend>, TrainBackend>,
    learning_rate: f64,
    device: <TrainBackend as Backend>::Device,
}

fn dense<B: Backend>(layer: &DenseWeights, device: &B::Device) -> Linear<B> {
    let weight = Tensor::<B, 2>::from_data(
        TensorData::new(layer.weights.clone(), [layer.inputs, layer.outputs]),
        device,
    );
    let bias = Tensor::<B, 1>::from_data(TensorData::new(layer.bias.clone(), [layer.outputs]), device);
    Linear {
        weight: Param::from_tensor(weight),
        bias: Some(Param::from_tensor(bias)),
    }
}

impl QNetworkConfig {
    /// He-uniform weights drawn from `rng`, zero bias.
    pub fn init<B: Backend, R: Rng + ?Sized>(&self, rng: &mut R, device: &B::Device) -> QNetwork<B> {
        let mut sizes = vec![CELLS];
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(CELLS);
        let layers = sizes
            .windows(2)
            .map(|pair| {
                let (inputs, outputs) = (pair[0], pair[1]);
                let limit = (6.0 / inputs as f32).sqrt();
                let layer = DenseWeights {
                    inputs,
                    outputs,
                    weights: (0..inputs * outputs).map(|_| rng.gen_range(-limit..limit)).collect(),
                    bias: vec![0.0; outputs],
                };
                dense(&layer, device)
            })
            .collect();
        QNetwork {
            layers,
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    pub fn from_weights(weights: &NetworkWeights, device: &B::Device) -> Self {
        QNetwork {
            layers: weights.layers.iter().map(|layer| dense(layer, device)).collect(),
            relu: Relu::new(),
        }
    }

    /// `[batch, 9]` codes to `[batch, 9]` action-values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = input;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if i < last {
                x = self.relu.forward(x);
            }
        }
        x
    }

    /// Parameters copied out of the module record.
    pub fn export(self) -> NetworkWeights {
        let record = self.into_record();
        let layers = record
            .layers
            .into_iter()
            .map(|layer| {
                let weight = layer.weight.val().into_data();
                let (inputs, outputs) = (weight.shape[0], weight.shape[1]);
                let bias = match layer.bias {
                    Some(bias) => bias.val().into_data().iter::<f32>().collect(),
                    None => vec![0.0; outputs],
                };
                DenseWeights {
                    inputs,
                    outputs,
                    weights: weight.iter::<f32>().collect(),
                    bias,
                }
            })
            .collect();
        NetworkWeights { layers }
    }
}

fn row<B: Backend>(values: Vec<f32>, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(values, [1, CELLS]), device)
}

impl NetworkApproximator {
    pub fn new<R: Rng + ?Sized>(hidden: &[usize], learning_rate: f32, rng: &mut R) -> Self {
        let device: <TrainBackend as Backend>::Device = Default::default();
        let network = QNetworkConfig::new(hidden.to_vec()).init::<TrainBackend, _>(rng, &device);
        Self::from_network(network, learning_rate, device)
    }

    /// Restores exported parameters with a fresh optimizer.
    pub fn from_weights(weights: &NetworkWeights, learning_rate: f32) -> Self {
        let device: <TrainBackend as Backend>::Device = Default::default();
        let network = QNetwork::<TrainBackend>::from_weights(weights, &device);
        Self::from_network(network, learning_rate, device)
    }

    fn from_network(
        network: QNetwork<TrainBackend>,
        learning_rate: f32,
        device: <TrainBackend as Backend>::Device,
    ) -> Self {
        NetworkApproximator {
            network,
            optimizer: AdamConfig::new().with_epsilon(ADAM_EPS).init(),
            learning_rate: learning_rate as f64,
            device,
        }
    }

    /// Single Adam step toward `target`, returning the loss before the step.
    pub fn fit(&mut self, state: &EncodedState, target: &ActionValues) -> f32 {
        let input = row::<TrainBackend>(state.codes.to_vec(), &self.device);
        let target = row::<TrainBackend>(target.to_vec(), &self.device);
        let prediction = self.network.forward(input);
        let loss = MseLoss::new().forward(prediction, target, Reduction::Mean);
        let loss_value: f32 = loss.clone().into_scalar();

        let grads = GradientsParams::from_grads(loss.backward(), &self.network);
        self.network = self
            .optimizer
            .step(self.learning_rate, self.network.clone(), grads);
        loss_value
    }
}

impl ActionValueApproximator for NetworkApproximator {
    fn predict(&self, state: &EncodedState) -> ActionValues {
        let input = row::<InferBackend>(state.codes.to_vec(), &self.device);
        self.network
            .valid()
            .forward(input)
            .into_data()
            .iter::<f32>()
            .collect()
    }

    fn update(&mut self, state: &EncodedState, target: &ActionValues) {
        self.fit(state, target);
    }

    fn weights(&self) -> Weights {
        Weights::Network(self.network.valid().export())
    }
}
