pub mod metrics;
pub mod rng;
pub mod solver;
pub mod trainer;

pub use metrics::Sample;
pub use metrics::Window;
pub use solver::IterationStats;
pub use solver::Solver;
pub use solver::SolverConfig;
pub use trainer::Trainer;
pub use trainer::TrainerConfig;
