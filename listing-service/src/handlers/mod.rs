//! HTTP handlers for the listing service.

pub mod assets;
pub mod generate;
pub mod health;

pub use assets::{asset_preflight, fetch_asset};
pub use generate::generate_copy;
pub use health::{health_check, metrics_endpoint, readiness_check};
