use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use tch::Tensor;
use crate::neural::constants::{HARD_SIGMOID_OFFSET, HARD_SIGMOID_SLOPE, LEAKY_RELU_SLOPE};
use crate::neural::error::NetError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Activation {
    #[default]
    Relu,
    LeakyRelu,
    Tanh,
    Sigmoid,
    HardSigmoid,
    Swish,
    HardSwish,
}

impl Activation {
    pub const ALL: [Activation; 7] = [
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::HardSigmoid,
        Activation::Swish,
        Activation::HardSwish,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::LeakyRelu => "lrelu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::HardSigmoid => "hard_sigmoid",
            Activation::Swish => "swish",
            Activation::HardSwish => "hard_swish",
        }
    }

    pub fn apply(self, x: &Tensor) -> Tensor {
        match self {
            Activation::Relu => x.relu(),
            Activation::LeakyRelu => x.clamp_min(0.0) + x.clamp_max(0.0) * LEAKY_RELU_SLOPE,
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => x.sigmoid(),
            Activation::HardSigmoid => hard_sigmoid(x),
            Activation::Swish => x * x.sigmoid(),
            Activation::HardSwish => x.hardswish(),
        }
    }
}

/// Piecewise linear sigmoid approximation: `clamp(0.2 * x + 0.5, 0, 1)`.
pub fn hard_sigmoid(x: &Tensor) -> Tensor {
    (x * HARD_SIGMOID_SLOPE + HARD_SIGMOID_OFFSET).clamp(0.0, 1.0)
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Activation::ALL
            .into_iter()
            .find(|act| act.name() == s)
            .ok_or(NetError::UnknownActivation(s))
    }
}

impl TryFrom<String> for Activation {
    type Error = NetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Activation> for String {
    fn from(act: Activation) -> Self {
        act.name().to_string()
    }
}
