use super::features;
use super::features::Context;
use super::kmeans;
use crate::cards::equity::uniform_range;
use crate::cards::Board;
use crate::cards::Card;
use crate::cards::Deck;
use crate::cards::Hole;
use crate::cards::Street;
use crate::gameplay::MenuTable;
use crate::Equity;
use crate::BUCKETS;
use crate::FEATURES_POSTFLOP;
use crate::PREFLOP_COMBOS;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// everything that identifies a card abstraction before fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    pub clusters: [usize; 4],
    pub players: usize,
    pub seed: u64,
    pub samples: usize,
    pub equity_samples: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            clusters: BUCKETS,
            players: 2,
            seed: 0,
            samples: 20_000,
            equity_samples: crate::EQUITY_SAMPLES_LOOKUP,
        }
    }
}

impl BucketConfig {
    /// small enough to fit inside a unit test
    pub fn tiny() -> Self {
        Self {
            clusters: [6, 8, 8, 6],
            players: 2,
            seed: 42,
            samples: 48,
            equity_samples: 16,
        }
    }
}

/// one fitted postflop street: cluster centers in z-scored space plus
/// the normalization that produced that space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreetModel {
    centers: Vec<Vec<f32>>,
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl StreetModel {
    fn normalize(&self, raw: &[f32]) -> Vec<f32> {
        raw.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(x, (m, s))| (x - m) / s.max(1e-6))
            .collect()
    }
    pub fn assign(&self, raw: &[f32]) -> usize {
        kmeans::nearest(&self.centers, &self.normalize(raw))
    }
    pub fn k(&self) -> usize {
        self.centers.len()
    }
}

/// the fitted card abstraction: a direct preflop table over the 169
/// strategically-unique combos, and one k-means model per postflop
/// street. deterministic lookups, stable across processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucketer {
    config: BucketConfig,
    menus: MenuTable,
    preflop: Vec<u8>,
    preflop_equity: Vec<Equity>,
    models: [StreetModel; 3],
}

impl Bucketer {
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }
    pub fn menus(&self) -> &MenuTable {
        &self.menus
    }
    pub fn k(&self, street: Street) -> usize {
        match street {
            Street::Pref => self.config.clusters[0],
            s => self.models[s as usize - 1].k(),
        }
    }

    /// fit the whole abstraction from scratch. preflop is an equity
    /// quantile table; each postflop street is Lloyd's over z-scored
    /// feature vectors of sampled (hole, board) pairs.
    pub fn fit(config: BucketConfig) -> Self {
        log::info!("fitting preflop equity table ({} combos)", PREFLOP_COMBOS);
        let preflop_equity = Self::preflop_equities(&config);
        let preflop = Self::preflop_table(&config, &preflop_equity);
        let models = [Street::Flop, Street::Turn, Street::Rive].map(|street| {
            log::info!(
                "clustering {} ({} samples, k={})",
                street,
                config.samples,
                config.clusters[street as usize]
            );
            Self::fit_street(&config, street)
        });
        Self {
            config,
            menus: MenuTable::default(),
            preflop,
            preflop_equity,
            models,
        }
    }

    fn preflop_equities(config: &BucketConfig) -> Vec<Equity> {
        (0..PREFLOP_COMBOS as u64)
            .into_par_iter()
            .map(|combo| {
                let hole = combo_hole(combo as usize);
                let ref mut rng = SmallRng::seed_from_u64(config.seed ^ (0xC0FFEE + combo));
                let range = uniform_range(&hole.cards());
                crate::cards::equity(&hole, &range, &Board::empty(), config.equity_samples.max(64), rng)
            })
            .collect()
    }

    fn preflop_table(config: &BucketConfig, equities: &[Equity]) -> Vec<u8> {
        let k = config.clusters[0].min(PREFLOP_COMBOS);
        let mut order = (0..PREFLOP_COMBOS).collect::<Vec<_>>();
        order.sort_by(|&a, &b| equities[a].partial_cmp(&equities[b]).expect("not NaN"));
        let mut table = vec![0u8; PREFLOP_COMBOS];
        for (rank, combo) in order.into_iter().enumerate() {
            table[combo] = (rank * k / PREFLOP_COMBOS) as u8;
        }
        table
    }

    fn fit_street(config: &BucketConfig, street: Street) -> StreetModel {
        let raw = (0..config.samples as u64)
            .into_par_iter()
            .map(|i| {
                let ref mut rng =
                    SmallRng::seed_from_u64(config.seed ^ (street as u64) << 32 ^ i);
                let mut deck = Deck::without(&[]);
                let cards = deck.deal(2, rng);
                let hole = Hole::from((cards[0], cards[1]));
                let board = Board::from(deck.deal(street.n_observed(), rng));
                features::postflop(&hole, &board, &Context::default(), config.equity_samples, rng)
                    .to_vec()
            })
            .collect::<Vec<_>>();
        let (mean, std) = moments(&raw);
        let points = raw
            .iter()
            .map(|p| {
                p.iter()
                    .zip(mean.iter().zip(std.iter()))
                    .map(|(x, (m, s))| (x - m) / s.max(1e-6))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let ref mut rng = SmallRng::seed_from_u64(config.seed ^ (street as u64) << 16);
        let centers = kmeans::fit(
            &points,
            config.clusters[street as usize],
            crate::KMEANS_TRAINING_ITERATIONS,
            rng,
        );
        StreetModel { centers, mean, std }
    }

    /// pure function of (hole, board, street)
    pub fn bucket_of(&self, hole: &Hole, board: &Board, street: Street) -> usize {
        self.bucket_in_context(hole, board, street, &Context::default())
    }

    /// runtime variant carrying live table context. the context only
    /// moves the context-dependent feature dimensions.
    pub fn bucket_in_context(
        &self,
        hole: &Hole,
        board: &Board,
        street: Street,
        ctx: &Context,
    ) -> usize {
        match street {
            Street::Pref => self.preflop[combo_index(hole)] as usize,
            street => {
                // lookup rng is derived from the cards so repeated calls
                // agree across processes and platforms
                let ref mut rng = SmallRng::seed_from_u64(stable_seed(hole, board, street));
                let raw = features::postflop(hole, board, ctx, self.config.equity_samples, rng);
                self.models[street as usize - 1].assign(&raw)
            }
        }
    }

    /// SHA-256 over the integer configuration, the menu table, and the
    /// bit-exact fitted centers. stored in every checkpoint; loading
    /// refuses on mismatch.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        for k in self.config.clusters {
            hasher.update((k as u64).to_le_bytes());
        }
        hasher.update((self.config.players as u64).to_le_bytes());
        hasher.update(self.config.seed.to_le_bytes());
        hasher.update((self.config.samples as u64).to_le_bytes());
        hasher.update((self.config.equity_samples as u64).to_le_bytes());
        for field in self.menus.digest_fields() {
            hasher.update(field.to_le_bytes());
        }
        hasher.update(&self.preflop);
        for e in self.preflop_equity.iter() {
            hasher.update(e.to_bits().to_le_bytes());
        }
        for model in self.models.iter() {
            for row in model.centers.iter().chain([&model.mean, &model.std]) {
                for x in row.iter() {
                    hasher.update(x.to_bits().to_le_bytes());
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// human-readable integer parameters, quoted in mismatch diagnostics
    pub fn describe(&self) -> String {
        format!(
            "clusters={:?} players={} seed={} samples={}",
            self.config.clusters, self.config.players, self.config.seed, self.config.samples,
        )
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::Error> {
        let bytes = bincode::serialize(self)?;
        crate::save::atomic::write_atomic(path, &bytes)?;
        log::info!("saved abstraction to {} ({})", path.display(), self.hash());
        Ok(())
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::Error> {
        let bytes = std::fs::read(path)
            .map_err(|_| crate::Error::MissingBuckets(path.display().to_string()))?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

/// canonical index of a preflop combo in the 13x13 grid: suited hands
/// above the diagonal, offsuit below, pairs on it
pub fn combo_index(hole: &Hole) -> usize {
    let h = hole.hi().rank() as usize;
    let l = hole.lo().rank() as usize;
    if hole.suited() {
        h * 13 + l
    } else {
        l * 13 + h
    }
}

/// a representative concrete holding for a combo index
fn combo_hole(index: usize) -> Hole {
    use crate::cards::Rank;
    use crate::cards::Suit;
    let row = index / 13;
    let col = index % 13;
    let (hi, lo, suited) = if row > col {
        (row, col, true)
    } else {
        (col, row, false)
    };
    let a = Card::from((Rank::from(hi as u8), Suit::S));
    let b = Card::from((Rank::from(lo as u8), if suited { Suit::S } else { Suit::H }));
    Hole::from((a, b))
}

fn moments(points: &[Vec<f32>]) -> (Vec<f32>, Vec<f32>) {
    let d = FEATURES_POSTFLOP;
    let n = points.len() as f64;
    let mut mean = vec![0f64; d];
    for p in points {
        for (m, x) in mean.iter_mut().zip(p.iter()) {
            *m += *x as f64 / n;
        }
    }
    let mut var = vec![0f64; d];
    for p in points {
        for ((v, m), x) in var.iter_mut().zip(mean.iter()).zip(p.iter()) {
            *v += (*x as f64 - m) * (*x as f64 - m) / n;
        }
    }
    (
        mean.into_iter().map(|m| m as f32).collect(),
        var.into_iter().map(|v| (v.sqrt()) as f32).collect(),
    )
}

fn stable_seed(hole: &Hole, board: &Board, street: Street) -> u64 {
    let mut seed = 0xcbf29ce484222325u64;
    for card in hole.cards().iter().chain(board.cards().iter()) {
        seed = seed.wrapping_mul(0x100000001b3) ^ u8::from(*card) as u64;
    }
    seed.wrapping_mul(0x100000001b3) ^ street as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> Bucketer {
        Bucketer::fit(BucketConfig::tiny())
    }

    #[test]
    fn combo_index_covers_the_grid() {
        let mut seen = vec![false; PREFLOP_COMBOS];
        for i in 0..PREFLOP_COMBOS {
            let hole = combo_hole(i);
            let back = combo_index(&hole);
            assert_eq!(back, i);
            seen[back] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn buckets_are_in_range_and_deterministic() {
        let bucketer = fitted();
        let hole: Hole = "AsKs".parse().unwrap();
        let board = Board::from(
            ["Qs", "7d", "2c"].iter().map(|c| c.parse::<Card>().unwrap()).collect::<Vec<_>>(),
        );
        for street in [Street::Pref, Street::Flop] {
            let board = if street == Street::Pref { Board::empty() } else { board };
            let a = bucketer.bucket_of(&hole, &board, street);
            let b = bucketer.bucket_of(&hole, &board, street);
            assert_eq!(a, b);
            assert!(a < bucketer.k(street));
        }
    }

    #[test]
    fn aces_outrank_deuces_preflop() {
        let bucketer = fitted();
        let aces = bucketer.bucket_of(&"AsAh".parse().unwrap(), &Board::empty(), Street::Pref);
        let deuces = bucketer.bucket_of(&"2s2h".parse().unwrap(), &Board::empty(), Street::Pref);
        assert!(aces > deuces, "aces bucket {} deuces bucket {}", aces, deuces);
    }

    #[test]
    fn hash_tracks_configuration() {
        let a = fitted();
        let mut config = BucketConfig::tiny();
        config.seed = 43;
        let b = Bucketer::fit(config);
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a.hash());
    }
}
