use super::rng;
use crate::abstraction::Bucketer;
use crate::abstraction::Context;
use crate::cards::Street;
use crate::encoder::History;
use crate::gameplay::AbstractAction;
use crate::gameplay::Game;
use crate::gameplay::Turn;
use crate::profile::Discount;
use crate::profile::Store;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub players: usize,
    pub epsilon: f32,
    pub prune_threshold: f64,
    pub linear_alpha: f64,
    pub discount: Discount,
    /// discounting is scheduled by whoever owns the canonical store:
    /// the solver itself when single-threaded, the coordinator when a
    /// worker pool is running
    pub apply_discounts: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            players: 2,
            epsilon: 0.06,
            prune_threshold: crate::PRUNE_THRESHOLD,
            linear_alpha: crate::LINEAR_ALPHA,
            discount: Discount::default(),
            apply_discounts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IterationStats {
    pub nodes: usize,
    pub discovered: usize,
}

/// one outcome-sampling MCCFR playout per iteration. the updating
/// player is t mod n; opponents and chance contribute exactly one
/// sampled continuation; the updating player's sampled action carries
/// the 1/q importance correction into the regret update.
pub struct Solver<'a> {
    store: &'a mut Store,
    bucketer: &'a Bucketer,
    config: &'a SolverConfig,
}

impl<'a> Solver<'a> {
    pub fn new(store: &'a mut Store, bucketer: &'a Bucketer, config: &'a SolverConfig) -> Self {
        Self {
            store,
            bucketer,
            config,
        }
    }

    /// run exactly the given global iteration index
    pub fn iterate(&mut self, t: usize, rng: &mut SmallRng) -> IterationStats {
        if self.config.apply_discounts && self.config.discount.due(t) {
            let d = self.config.discount;
            self.store
                .discount(d.regret_factor(t), d.strategy_factor(t));
        }
        let before = self.store.len();
        let mut stats = IterationStats::default();
        let updating = t % self.config.players;
        let root = Game::root(self.config.players);
        self.walk(root, History::default(), updating, t, rng, &mut stats.nodes);
        stats.discovered = self.store.len() - before;
        stats
    }

    /// convenience wrapper used by single-threaded callers
    pub fn run(&mut self, from: usize, count: usize, seed: u64) -> IterationStats {
        let mut total = IterationStats::default();
        for t in from..from + count {
            let ref mut rng = rng::iteration(seed, t as u64);
            let stats = self.iterate(t, rng);
            total.nodes += stats.nodes;
            total.discovered += stats.discovered;
        }
        total
    }

    fn walk(
        &mut self,
        game: Game,
        history: History,
        updating: usize,
        t: usize,
        rng: &mut SmallRng,
        nodes: &mut usize,
    ) -> f64 {
        *nodes += 1;
        match game.turn() {
            Turn::Terminal => game.payoff(updating) as f64,
            Turn::Chance => self.walk(game.deal(rng), history, updating, t, rng, nodes),
            Turn::Choice(actor) => self.decide(game, history, actor, updating, t, rng, nodes),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn decide(
        &mut self,
        game: Game,
        history: History,
        actor: usize,
        updating: usize,
        t: usize,
        rng: &mut SmallRng,
        nodes: &mut usize,
    ) -> f64 {
        let street = game.street();
        let ref menu = self.bucketer.menus().menu(&game);
        let key = self.key(&game, actor, street, &history);
        let strategy = self.store.get_strategy(&key, menu);

        if actor != updating {
            let i = sample(&strategy, rng);
            return self.follow(&game, &history, menu[i], street, updating, t, rng, nodes);
        }

        // Pluribus-style negative-regret pruning: when every action is
        // hopeless, spend one sampled continuation and learn nothing
        if self.store.all_below(&key, self.config.prune_threshold) {
            let i = sample(&strategy, rng);
            return self.follow(&game, &history, menu[i], street, updating, t, rng, nodes);
        }

        let n = menu.len();
        let eps = self.config.epsilon;
        let explore = rng.random::<f32>() < eps;
        let i = if explore {
            rng.random_range(0..n)
        } else {
            sample(&strategy, rng)
        };
        // effective sampling probability of the chosen action under the
        // epsilon-uniform mixture
        let q = (eps / n as f32 + (1.0 - eps) * strategy[i]).max(f32::MIN_POSITIVE) as f64;

        let value = self.follow(&game, &history, menu[i], street, updating, t, rng, nodes);
        let corrected = value / q;
        let baseline = strategy[i] as f64 * corrected;
        for (j, action) in menu.iter().enumerate() {
            let gain = if j == i { corrected - baseline } else { -baseline };
            self.store.update_regret(&key, menu, action, gain, 1.0);
        }
        let weight = ((t + 1) as f64).powf(self.config.linear_alpha);
        self.store.add_strategy(&key, menu, &strategy, weight);
        baseline
    }

    #[allow(clippy::too_many_arguments)]
    fn follow(
        &mut self,
        game: &Game,
        history: &History,
        action: AbstractAction,
        street: Street,
        updating: usize,
        t: usize,
        rng: &mut SmallRng,
        nodes: &mut usize,
    ) -> f64 {
        let concrete = self.bucketer.menus().concretize(game, action);
        let mut history = history.clone();
        history.push(street, action);
        self.walk(game.act(concrete), history, updating, t, rng, nodes)
    }

    fn key(&self, game: &Game, actor: usize, street: Street, history: &History) -> String {
        let ctx = Context {
            spr: game.spr(),
            in_position: game.in_position(actor),
            effective_stack: game.effective_stack(),
        };
        crate::encoder::encode_game(
            self.bucketer,
            &game.hole(actor),
            &game.board(),
            street,
            history,
            &ctx,
        )
        .0
    }
}

/// sample an index from a probability vector
fn sample(probs: &[f32], rng: &mut SmallRng) -> usize {
    let mut roll = rng.random::<f32>();
    for (i, p) in probs.iter().enumerate() {
        roll -= p;
        if roll <= 0.0 {
            return i;
        }
    }
    probs.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;

    fn fixture() -> (Store, Bucketer, SolverConfig) {
        (
            Store::dense(),
            Bucketer::fit(BucketConfig::tiny()),
            SolverConfig {
                discount: Discount {
                    interval: 64,
                    ..Discount::default()
                },
                ..SolverConfig::default()
            },
        )
    }

    #[test]
    fn iterations_populate_the_store() {
        let (mut store, bucketer, config) = fixture();
        let stats = Solver::new(&mut store, &bucketer, &config).run(0, 128, 7);
        assert!(store.len() > 0, "no infosets discovered");
        assert!(stats.nodes > 128, "playouts must visit interior nodes");
    }

    #[test]
    fn strategies_remain_distributions_throughout() {
        let (mut store, bucketer, config) = fixture();
        Solver::new(&mut store, &bucketer, &config).run(0, 256, 11);
        for (_, actions, probs) in store.export() {
            assert_eq!(actions.len(), probs.len());
            assert!(probs.iter().all(|p| *p >= 0.0));
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn playouts_replay_deterministically() {
        let (mut a, bucketer, config) = fixture();
        Solver::new(&mut a, &bucketer, &config).run(0, 32, 13);
        let mut b = Store::dense();
        Solver::new(&mut b, &bucketer, &config).run(0, 32, 13);
        let mut lhs = a.export();
        let mut rhs = b.export();
        lhs.sort_by(|x, y| x.0.cmp(&y.0));
        rhs.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(lhs, rhs);
    }

    /// pruned infosets burn one continuation and learn nothing
    #[test]
    fn deep_negative_regret_is_pruned() {
        let (mut store, bucketer, config) = fixture();
        Solver::new(&mut store, &bucketer, &config).run(0, 16, 3);
        let keys = store.export().into_iter().map(|(k, _, _)| k).collect::<Vec<_>>();
        for (key, actions, _) in store.export() {
            for action in actions.iter() {
                store.update_regret(&key, &actions, action, crate::REGRET_FLOOR, 1.0);
            }
        }
        for key in keys.iter() {
            assert!(store.all_below(key, config.prune_threshold), "{}", key);
        }
        // pruned infosets take no further regret updates, so the floor holds
        Solver::new(&mut store, &bucketer, &config).run(16, 32, 3);
        for key in keys.iter() {
            assert!(store.all_below(key, config.prune_threshold), "{}", key);
        }
    }
}
