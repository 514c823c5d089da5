use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Block {block} has no kernels")]
    EmptyKernelList { block: String },

    #[error("Block {block} uses even kernel size {kernel}, only odd kernels keep the board size")]
    EvenKernel { block: String, kernel: i64 },

    #[error("{block}: {channels} channels cannot be split into {splits} equal groups")]
    IndivisibleChannels { block: String, channels: i64, splits: usize },

    #[error("Unknown activation type: {0}")]
    UnknownActivation(String),

    #[error("Input shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<i64>, actual: Vec<i64> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Torch error: {0}")]
    Tch(#[from] tch::TchError),
}

pub type Result<T> = std::result::Result<T, NetError>;

impl NetError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        NetError::InvalidConfig { message: message.into() }
    }
}
