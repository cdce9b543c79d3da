mod app;
mod bench;
mod config;
mod transport;
mod validation;

pub use app::{AppError, AppResult};
pub use bench::{BenchError, BenchResult, Phase};
pub use config::ConfigError;
pub use transport::{TransportError, TransportResult};
pub use validation::ValidationError;
