mod asset_index;
mod sync;

pub use asset_index::{AssetIndex, AssetObject, RESOURCES_URL};
pub use sync::{AssetReport, AssetSynchronizer};
