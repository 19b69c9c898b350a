pub mod asset_resolver;
pub mod copywriter;
pub mod metrics;
pub mod providers;
pub mod storage;

pub use asset_resolver::{AssetResolver, AssetSource, ResolveError, ResolvedAsset};
pub use copywriter::Copywriter;
pub use self::metrics::{get_metrics, init_metrics};
pub use storage::{FetchedObject, ObjectStore, StorageError, SupabaseStorage};
