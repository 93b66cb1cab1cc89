pub mod bucketing;
pub mod features;
pub mod kmeans;

pub use bucketing::combo_index;
pub use bucketing::BucketConfig;
pub use bucketing::Bucketer;
pub use bucketing::StreetModel;
pub use features::Context;
