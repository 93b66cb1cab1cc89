pub mod pool;

pub use pool::BatchOutcome;
pub use pool::Job;
pub use pool::Pool;
pub use pool::Reply;
pub use pool::Report;
