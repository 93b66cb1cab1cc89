use super::kl::KlStats;
use super::kl::KlSummary;
use super::leaf::LeafEvaluator;
use super::subgame::Anchor;
use super::subgame::Subgame;
use super::subgame::SubgameParams;
use crate::abstraction::Bucketer;
use crate::abstraction::Context;
use crate::encoder::History;
use crate::gameplay::AbstractAction;
use crate::gameplay::Game;
use crate::gameplay::TableState;
use crate::profile::Store;
use crate::save::Policy;
use crate::Error;
use crate::Probability;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// the blueprint the resolver anchors to: either an exported policy
/// artifact or a raw regret store from a checkpoint
pub enum BlueprintSource {
    Policy(Policy),
    Store(Store),
}

impl Anchor for BlueprintSource {
    fn strategy(&mut self, key: &str, menu: &[AbstractAction]) -> Vec<Probability> {
        match self {
            Self::Store(store) => store.average_strategy(key, menu),
            Self::Policy(policy) => match policy.lookup(key) {
                None => crate::profile::uniform(menu.len()),
                Some(row) => {
                    let raw = menu
                        .iter()
                        .map(|action| {
                            row.iter()
                                .find(|(a, _)| a == action)
                                .map(|(_, p)| *p)
                                .unwrap_or(0.0)
                        })
                        .collect::<Vec<_>>();
                    let total = raw.iter().sum::<f32>();
                    if total <= 0.0 {
                        crate::profile::uniform(menu.len())
                    } else {
                        raw.into_iter().map(|p| p / total).collect()
                    }
                }
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub time_budget_ms: u64,
    pub min_iterations: usize,
    pub params_lookahead: usize,
    pub max_depth: usize,
    pub board_samples: usize,
    pub lambda: [f32; 3],
    pub oop_bonus: f32,
    pub clip_min: f32,
    pub epsilon0: f32,
    pub kl_threshold: f32,
    pub seed: u64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 80,
            min_iterations: 50,
            params_lookahead: 1,
            max_depth: crate::SUBGAME_MAX_DEPTH,
            board_samples: 0,
            lambda: crate::KL_LAMBDA,
            oop_bonus: crate::KL_OOP_BONUS,
            clip_min: crate::KL_CLIP_MIN,
            epsilon0: crate::KL_EPSILON,
            kl_threshold: 0.5,
            seed: 0,
        }
    }
}

/// everything the resolver hands back downstream: the chosen action
/// plus the full decision trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub action: String,
    pub probabilities: Vec<(String, Probability)>,
    pub trace: Trace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub compute_ms: u64,
    pub iterations: usize,
    pub fallback: bool,
    pub subgame_nodes: usize,
    pub kl: Vec<KlSummary>,
}

/// one resolve request: the observed table, the abstract line so far,
/// and per-seat bucket beliefs for the unseen hands
pub struct ResolveRequest {
    pub table: TableState,
    pub history: History,
    pub beliefs: Vec<Vec<(usize, f32)>>,
}

impl ResolveRequest {
    pub fn new(table: TableState) -> Self {
        Self {
            table,
            history: History::default(),
            beliefs: Vec::new(),
        }
    }
}

/// depth-limited re-solving around the blueprint. every resolve call is
/// the state machine: build, iterate under budget, extract or fall back.
pub struct Resolver {
    blueprint: BlueprintSource,
    bucketer: Arc<Bucketer>,
    leaf: LeafEvaluator,
    config: ResolveConfig,
    calls: usize,
    fallbacks: usize,
}

impl Resolver {
    pub fn new(
        blueprint: BlueprintSource,
        bucketer: Arc<Bucketer>,
        leaf: LeafEvaluator,
        config: ResolveConfig,
    ) -> Self {
        Self {
            blueprint,
            bucketer,
            leaf,
            config,
            calls: 0,
            fallbacks: 0,
        }
    }

    /// monitored metric: resolves that degraded to the blueprint
    pub fn fallback_rate(&self) -> f32 {
        if self.calls == 0 {
            0.0
        } else {
            self.fallbacks as f32 / self.calls as f32
        }
    }

    pub fn resolve(&mut self, request: &ResolveRequest) -> Result<Resolution, Error> {
        request.table.validate()?;
        self.calls += 1;
        let began = Instant::now();
        let game = reconstruct(&request.table)?;
        let menu = self.bucketer.menus().menu(&game);
        let key = self.root_key(&request.table, &request.history)?;
        let anchor_probs = self.blueprint.strategy(&key, &menu);

        // any failure inside the search degrades to the blueprint
        match self.search(&game, request, began) {
            Ok((probs, iterations, subgame_nodes, kl)) => {
                let compute_ms = began.elapsed().as_millis() as u64;
                Ok(resolution(&menu, probs, compute_ms, iterations, false, subgame_nodes, kl))
            }
            Err(reason) => {
                self.fallbacks += 1;
                log::warn!("resolve fell back to blueprint at {}: {}", key, reason);
                let compute_ms = began.elapsed().as_millis() as u64;
                Ok(resolution(&menu, anchor_probs, compute_ms, 0, true, 0, Vec::new()))
            }
        }
    }

    fn search(
        &mut self,
        game: &Game,
        request: &ResolveRequest,
        began: Instant,
    ) -> Result<(Vec<Probability>, usize, usize, Vec<KlSummary>), String> {
        let params = SubgameParams {
            lookahead_streets: self.config.params_lookahead,
            max_depth: self.config.max_depth,
            board_samples: if game.street() == crate::cards::Street::Rive {
                0
            } else {
                self.config.board_samples
            },
            lambda: self.config.lambda,
            oop_bonus: self.config.oop_bonus,
            clip_min: self.config.clip_min,
            epsilon0: self.config.epsilon0,
        };
        let beliefs = self.default_beliefs(game, &request.beliefs);
        let ref mut rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(self.calls as u64));
        let mut subgame = Subgame::build(
            *game,
            request.table.hero,
            &request.history,
            &self.bucketer,
            &mut self.blueprint,
            beliefs,
            &params,
            rng,
        );
        let budget = Duration::from_millis(self.config.time_budget_ms);
        let mut stats = KlStats::new(self.config.kl_threshold);
        let mut iterations = 0;
        while began.elapsed() < budget {
            subgame.iterate(&params, &self.leaf, &mut stats, rng);
            iterations += 1;
        }
        if iterations < self.config.min_iterations {
            return Err(format!(
                "budget elapsed after {} of {} minimum iterations",
                iterations, self.config.min_iterations,
            ));
        }
        Ok((
            subgame.root_average(),
            iterations,
            subgame.len(),
            stats.summaries(),
        ))
    }

    fn root_key(&self, table: &TableState, history: &History) -> Result<String, Error> {
        let board = table.board_cards()?;
        let ctx = Context {
            spr: table.spr,
            in_position: table.in_position,
            effective_stack: table.effective_stack,
        };
        Ok(crate::encoder::encode_game(
            &self.bucketer,
            &table.hero_hole,
            &board,
            table.street,
            history,
            &ctx,
        )
        .0)
    }

    /// absent beliefs default to uniform over the street's buckets
    fn default_beliefs(&self, game: &Game, given: &[Vec<(usize, f32)>]) -> Vec<Vec<(usize, f32)>> {
        let k = self.bucketer.k(game.street());
        (0..game.n())
            .map(|seat| match given.get(seat) {
                Some(belief) if !belief.is_empty() => belief.clone(),
                _ => (0..k).map(|b| (b, 1.0 / k as f32)).collect(),
            })
            .collect()
    }
}

/// rebuild the live decision as a Game rooted at the hero's action
fn reconstruct(table: &TableState) -> Result<Game, Error> {
    let board = table.board_cards()?;
    let n = table.stacks.len();
    let mut holes = vec![None; n];
    holes[table.hero] = Some(table.hero_hole);
    let to_match = table
        .wagers
        .get(table.hero)
        .copied()
        .unwrap_or(0)
        .checked_add(table.to_call)
        .ok_or_else(|| Error::MalformedTable("wager overflow".to_string()))?;
    Ok(Game::reconstruct(
        &table.stacks,
        table.pot,
        board,
        &holes,
        table.hero,
        to_match,
        &table.wagers,
    ))
}

fn resolution(
    menu: &[AbstractAction],
    probs: Vec<Probability>,
    compute_ms: u64,
    iterations: usize,
    fallback: bool,
    subgame_nodes: usize,
    kl: Vec<KlSummary>,
) -> Resolution {
    let best = probs
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("not NaN"))
        .map(|(i, _)| i)
        .unwrap_or(0);
    Resolution {
        action: menu[best].token(),
        probabilities: menu
            .iter()
            .map(|a| a.token())
            .zip(probs)
            .collect(),
        trace: Trace {
            compute_ms,
            iterations,
            fallback,
            subgame_nodes,
            kl,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;
    use crate::cards::Street;
    use crate::gameplay::Position;

    fn table() -> TableState {
        TableState {
            pot: 12,
            stacks: vec![194, 194],
            wagers: vec![0, 0],
            positions: vec![Position::BTN, Position::BB],
            hero: 0,
            hero_hole: "AsKs".parse().unwrap(),
            board: vec!["Qs".into(), "7d".into(), "2c".into()],
            street: Street::Flop,
            to_call: 0,
            legal_amounts: vec![],
            effective_stack: 194,
            spr: 16.2,
            in_position: true,
        }
    }

    fn resolver(config: ResolveConfig) -> Resolver {
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        Resolver::new(
            BlueprintSource::Store(Store::dense()),
            bucketer,
            LeafEvaluator::Blueprint,
            config,
        )
    }

    #[test]
    fn resolves_within_budget() {
        let mut resolver = resolver(ResolveConfig {
            time_budget_ms: 120,
            min_iterations: 5,
            ..ResolveConfig::default()
        });
        let out = resolver.resolve(&ResolveRequest::new(table())).unwrap();
        assert!(!out.trace.fallback, "{:?}", out.trace);
        assert!(out.trace.iterations >= 5);
        assert!(out.trace.subgame_nodes > 1);
        let total = out.probabilities.iter().map(|(_, p)| p).sum::<f32>();
        assert!((total - 1.0).abs() < 1e-4);
        assert_eq!(resolver.fallback_rate(), 0.0);
    }

    #[test]
    fn impossible_minimum_falls_back_to_blueprint() {
        let mut resolver = resolver(ResolveConfig {
            time_budget_ms: 5,
            min_iterations: usize::MAX,
            ..ResolveConfig::default()
        });
        let out = resolver.resolve(&ResolveRequest::new(table())).unwrap();
        assert!(out.trace.fallback);
        assert!(resolver.fallback_rate() > 0.0);
        // the fallback is still a usable distribution over the menu
        let total = out.probabilities.iter().map(|(_, p)| p).sum::<f32>();
        assert!((total - 1.0).abs() < 1e-4);
    }

    /// the KL anchor: a large lambda keeps the resolve near the
    /// blueprint, lambda zero lets it wander
    #[test]
    fn anchor_strength_orders_divergence() {
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        let divergence_at = |lambda: f32| {
            let mut resolver = Resolver::new(
                BlueprintSource::Store(Store::dense()),
                bucketer.clone(),
                LeafEvaluator::Blueprint,
                ResolveConfig {
                    time_budget_ms: 150,
                    min_iterations: 10,
                    lambda: [lambda; 3],
                    oop_bonus: 0.0,
                    ..ResolveConfig::default()
                },
            );
            let out = resolver.resolve(&ResolveRequest::new(table())).unwrap();
            assert!(!out.trace.fallback);
            let probs = out.probabilities.iter().map(|(_, p)| *p).collect::<Vec<_>>();
            // anchor here is uniform (empty store): KL to uniform
            let uniform = 1.0 / probs.len() as f32;
            probs
                .iter()
                .map(|p| p * ((p + 1e-9) / (uniform + 1e-9)).ln())
                .sum::<f32>()
        };
        let free = divergence_at(0.0);
        let anchored = divergence_at(25.0);
        assert!(
            anchored <= free + 1e-3,
            "anchored {} should not exceed free {}",
            anchored,
            free,
        );
        assert!(free.is_finite() && anchored >= -1e-3);
    }
}
