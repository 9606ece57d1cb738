pub mod assert;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod sleeper;
pub mod waiter;

pub use engine::Engine;
pub use errors::EngineError;
pub use metrics::MetricsHub;
