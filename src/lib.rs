pub mod logger;
pub mod neural;
