pub mod compact;
pub mod delta;
pub mod dense;
pub mod discount;
pub mod store;

pub use compact::CompactStore;
pub use delta::DeltaRecord;
pub use delta::Deltas;
pub use dense::averaged;
pub use dense::matching;
pub use dense::uniform;
pub use dense::DenseStore;
pub use discount::Discount;
pub use store::Store;
