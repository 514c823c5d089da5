pub mod activation;
pub mod combined_policy_value_network;
pub mod config;
pub mod constants;
pub mod error;
pub mod mix_conv;
pub mod policy_head;
pub mod residual_block;
pub mod rise_net;
pub mod se_layer;
pub mod stem;
pub mod summary;
pub mod training;
pub mod training_utils;
pub mod utils;
pub mod value_head;

pub use config::{BlockConfig, RiseConfig};
pub use error::{NetError, Result};
pub use rise_net::{NetOutput, RiseNet};
