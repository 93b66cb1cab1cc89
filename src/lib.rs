pub mod abstraction;
pub mod cards;
pub mod encoder;
pub mod error;
pub mod gameplay;
pub mod mccfr;
pub mod profile;
pub mod resolve;
pub mod save;
pub mod schedule;
pub mod workers;

pub use error::Error;

/// dimensional analysis types
pub type Chips = i32;
pub type Equity = f32;
pub type Utility = f32;
pub type Probability = f32;

// table geometry
pub const STACK: Chips = 200;
pub const B_BLIND: Chips = 2;
pub const S_BLIND: Chips = 1;
pub const MAX_N: usize = 6;
pub const MAX_RAISE_REPEATS: usize = 4;

// card abstraction parameters
pub const BUCKETS: [usize; 4] = [24, 80, 80, 64];
pub const PREFLOP_COMBOS: usize = 169;
pub const FEATURES_PREFLOP: usize = 10;
pub const FEATURES_POSTFLOP: usize = 34;
pub const KMEANS_TRAINING_ITERATIONS: usize = 24;
pub const EQUITY_SAMPLES_LOOKUP: usize = 256;

// regret bounds. the floor sits just below the pruning threshold so that
// deeply-negative infosets survive the clamp long enough to be pruned.
pub const REGRET_FLOOR: f64 = -3.1e8;
pub const PRUNE_THRESHOLD: f64 = -3.0e8;

// dcfr discount exponents
pub const DCFR_ALPHA: f64 = 1.0;
pub const DCFR_BETA: f64 = 1.0;
pub const DCFR_GAMMA: f64 = 2.0;
pub const DISCOUNT_INTERVAL: usize = 1_000;

// linear strategy weighting
pub const LINEAR_ALPHA: f64 = 1.0;

// coordinator timing
pub const WORKER_TIMEOUT_SECS: u64 = 300;
pub const DRAIN_GRACE_MS: u64 = 3;
pub const DRAIN_RECV_MS: u64 = 5;
pub const DRAIN_BACKOFF_MS: u64 = 2;
pub const DRAIN_ATTEMPTS: usize = 3;

// subgame resolving
pub const SUBGAME_MAX_DEPTH: usize = 4;
pub const KL_LAMBDA: [f32; 3] = [0.30, 0.50, 0.70];
pub const KL_OOP_BONUS: f32 = 0.10;
pub const KL_CLIP_MIN: f32 = 1e-6;
pub const KL_EPSILON: f32 = 1e-9;
pub const GATE_WIDTH_BB: [f32; 3] = [0.20, 0.16, 0.12];
pub const FALLBACK_TARGET: f32 = 0.05;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// progress bar
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_secs(60);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan}";
    let style = indicatif::ProgressStyle::with_template(style).expect("valid template");
    let progress = indicatif::ProgressBar::new(n as u64);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// initialize combined terminal + file logging
pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
