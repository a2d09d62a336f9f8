//! Healthboard engine: backend HTTP client, timers and effect execution.
mod buster;
mod client;
mod engine;
mod settings;
mod types;

pub use buster::CacheBuster;
pub use client::{DashboardApi, ReqwestApi};
pub use engine::EngineHandle;
pub use settings::ApiSettings;
pub use types::{EngineError, EngineEvent};
