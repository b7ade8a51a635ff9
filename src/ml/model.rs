use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::data::batch::FlowBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct VelocityMlpConfig {
    #[config(default = 2)]
    pub input_dim:  usize,
    #[config(default = 1)]
    pub time_dim:   usize,
    #[config(default = 128)]
    pub hidden_dim: usize,
}

/// Number of hidden → hidden layers between the input and output projections.
const HIDDEN_BLOCKS: usize = 3;

impl VelocityMlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> VelocityMlp<B> {
        let input = LinearConfig::new(self.input_dim + self.time_dim, self.hidden_dim).init(device);
        let hidden: Vec<Linear<B>> = (0..HIDDEN_BLOCKS)
            .map(|_| LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device))
            .collect();
        let output = LinearConfig::new(self.hidden_dim, self.input_dim).init(device);
        VelocityMlp {
            input, hidden, output,
            input_dim: self.input_dim,
            time_dim:  self.time_dim,
        }
    }
}

/// Swish(x) = sigmoid(x) * x
pub fn swish<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    burn::tensor::activation::sigmoid(x.clone()) * x
}

/// Five linear layers with Swish between them:
/// (in+time → h) → 3 × (h → h) → (h → in).
#[derive(Module, Debug)]
pub struct VelocityMlp<B: Backend> {
    pub input:     Linear<B>,
    pub hidden:    Vec<Linear<B>>,
    pub output:    Linear<B>,
    pub input_dim: usize,
    pub time_dim:  usize,
}

impl<B: Backend> VelocityMlp<B> {
    /// x: [batch, input_dim], t: [batch] → velocity [batch, input_dim]
    pub fn forward(&self, x: Tensor<B, 2>, t: Tensor<B, 1>) -> Tensor<B, 2> {
        let [batch, _] = x.dims();
        let x = x.reshape([batch, self.input_dim]);
        let t = t.reshape([batch, self.time_dim]);

        let mut h = swish(self.input.forward(Tensor::cat(vec![x, t], 1)));
        for layer in &self.hidden {
            h = swish(layer.forward(h));
        }
        self.output.forward(h)
    }

    /// Same as `forward`, with one scalar time shared by the whole batch.
    pub fn forward_at(&self, x: Tensor<B, 2>, t: f32) -> Tensor<B, 2> {
        let [batch, _] = x.dims();
        let t = Tensor::<B, 1>::full([batch], t, &x.device());
        self.forward(x, t)
    }

    /// Flow-matching regression loss: mean((v(x_t, t) - dx_t)²)
    pub fn forward_loss(&self, batch: FlowBatch<B>) -> Tensor<B, 1> {
        let pred = self.forward(batch.x_t, batch.t);
        MseLoss::new().forward(pred, batch.dx_t, Reduction::Mean)
    }
}
