pub mod asset;
pub mod generation;

pub use asset::{AssetQuery, AssetRef};
pub use generation::{FieldValue, GenerationRequest, GenerationResponse};
