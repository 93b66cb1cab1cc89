use super::kl;
use super::kl::KlStats;
use super::leaf::LeafEvaluator;
use super::leaf::LeafQuery;
use crate::abstraction::Bucketer;
use crate::abstraction::Context;
use crate::cards::Street;
use crate::encoder::History;
use crate::gameplay::AbstractAction;
use crate::gameplay::Game;
use crate::gameplay::Turn;
use crate::profile::matching;
use crate::Chips;
use crate::Probability;
use crate::Utility;
use rand::rngs::SmallRng;

/// a depth-limited lookahead rooted at the live decision. nodes live in
/// a flat arena addressed by index; children are shared structure, not
/// allocations on the hot path. leaf prices are memoized per node, and
/// hero buckets per (street, board), so iteration cost is a tree sweep.
pub struct Subgame {
    nodes: Vec<SubNode>,
    beliefs: Vec<Vec<(usize, f32)>>,
    hero: usize,
    leaf_cache: Vec<Option<Utility>>,
    bucket_cache: std::collections::HashMap<(Street, crate::cards::Board), usize>,
    equity_cache: std::collections::HashMap<(Street, crate::cards::Board), f32>,
}

pub struct SubNode {
    pub game: Game,
    pub kind: SubKind,
}

pub enum SubKind {
    Decision {
        seat: usize,
        street: Street,
        in_position: bool,
        children: Vec<usize>,
        menu: Vec<AbstractAction>,
        blueprint: Vec<Probability>,
        regrets: Vec<f32>,
        strategy_sum: Vec<f32>,
    },
    Chance {
        children: Vec<usize>,
    },
    /// hand ended by folds: exact chips, no cards needed
    Fold {
        utility: Utility,
    },
    /// depth limit or showdown: priced by the leaf evaluator
    Leaf {
        pot: Chips,
        invested: Chips,
        street: Street,
    },
}

/// how far the resolve strategy may look ahead and how it anchors
#[derive(Debug, Clone)]
pub struct SubgameParams {
    pub lookahead_streets: usize,
    /// decision-ply budget from the root; deeper choices become leaves
    pub max_depth: usize,
    pub board_samples: usize,
    pub lambda: [f32; 3],
    pub oop_bonus: f32,
    pub clip_min: f32,
    pub epsilon0: f32,
}

impl Default for SubgameParams {
    fn default() -> Self {
        Self {
            lookahead_streets: 1,
            max_depth: crate::SUBGAME_MAX_DEPTH,
            board_samples: 0,
            lambda: crate::KL_LAMBDA,
            oop_bonus: crate::KL_OOP_BONUS,
            clip_min: crate::KL_CLIP_MIN,
            epsilon0: crate::KL_EPSILON,
        }
    }
}

/// blueprint probabilities for a given infoset key, however the caller
/// stores its blueprint
pub trait Anchor {
    fn strategy(&mut self, key: &str, menu: &[AbstractAction]) -> Vec<Probability>;
}

impl Subgame {
    /// grow the arena breadth-first from the live decision. hero nodes
    /// key off the hero's cards; opponent nodes blend the blueprint
    /// over their belief-weighted buckets. warm start copies blueprint
    /// regret-matching probabilities into the initial regret arrays.
    pub fn build(
        root: Game,
        hero: usize,
        history: &History,
        bucketer: &Bucketer,
        anchor: &mut dyn Anchor,
        beliefs: Vec<Vec<(usize, f32)>>,
        params: &SubgameParams,
        rng: &mut SmallRng,
    ) -> Self {
        let mut subgame = Self {
            nodes: Vec::new(),
            beliefs,
            hero,
            leaf_cache: Vec::new(),
            bucket_cache: std::collections::HashMap::new(),
            equity_cache: std::collections::HashMap::new(),
        };
        subgame.grow(root, history.clone(), 0, 0, bucketer, anchor, params, rng);
        subgame.leaf_cache = vec![None; subgame.nodes.len()];
        subgame
    }

    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        game: Game,
        history: History,
        boundaries: usize,
        depth: usize,
        bucketer: &Bucketer,
        anchor: &mut dyn Anchor,
        params: &SubgameParams,
        rng: &mut SmallRng,
    ) -> usize {
        let index = self.nodes.len();
        // reserve the slot so children index past it
        self.nodes.push(SubNode {
            game,
            kind: SubKind::Fold { utility: 0.0 },
        });
        let kind = match game.turn() {
            Turn::Terminal if game.live() == 1 => SubKind::Fold {
                utility: game.payoff(self.hero),
            },
            Turn::Terminal => SubKind::Leaf {
                pot: game.pot(),
                invested: game.seat(self.hero).spent(),
                street: game.street(),
            },
            Turn::Chance => {
                if boundaries < params.lookahead_streets {
                    let m = params.board_samples.max(1);
                    let children = (0..m)
                        .map(|_| {
                            let next = game.deal(rng);
                            self.grow(
                                next,
                                history.clone(),
                                boundaries + 1,
                                depth,
                                bucketer,
                                anchor,
                                params,
                                rng,
                            )
                        })
                        .collect();
                    SubKind::Chance { children }
                } else {
                    SubKind::Leaf {
                        pot: game.pot(),
                        invested: game.seat(self.hero).spent(),
                        street: game.street(),
                    }
                }
            }
            Turn::Choice(_) if depth >= params.max_depth => SubKind::Leaf {
                pot: game.pot(),
                invested: game.seat(self.hero).spent(),
                street: game.street(),
            },
            Turn::Choice(seat) => {
                let street = game.street();
                let menu = bucketer.menus().menu(&game);
                let in_position = game.in_position(seat);
                let blueprint = if seat == self.hero {
                    let bucket = self.hero_bucket(&game, seat, street, in_position, bucketer);
                    let key = crate::encoder::encode(bucket, street, &history).0;
                    anchor.strategy(&key, &menu)
                } else {
                    self.blended(seat, street, &history, &menu, anchor)
                };
                let children = menu
                    .iter()
                    .map(|action| {
                        let concrete = bucketer.menus().concretize(&game, *action);
                        let mut extended = history.clone();
                        extended.push(street, *action);
                        self.grow(
                            game.act(concrete),
                            extended,
                            boundaries,
                            depth + 1,
                            bucketer,
                            anchor,
                            params,
                            rng,
                        )
                    })
                    .collect();
                SubKind::Decision {
                    seat,
                    street,
                    in_position,
                    children,
                    regrets: blueprint.clone(),
                    strategy_sum: vec![0.0; menu.len()],
                    blueprint,
                    menu,
                }
            }
        };
        self.nodes[index].kind = kind;
        index
    }

    /// hero equity against a uniform range, shared by every leaf on the
    /// same board
    fn hero_equity(
        &mut self,
        street: Street,
        board: crate::cards::Board,
        hero: crate::cards::Hole,
        rng: &mut SmallRng,
    ) -> f32 {
        if let Some(equity) = self.equity_cache.get(&(street, board)) {
            return *equity;
        }
        let mut blocked = hero.cards().to_vec();
        blocked.extend(board.cards());
        let range = crate::cards::uniform_range(&blocked);
        let equity = crate::cards::equity(&hero, &range, &board, 64, rng);
        self.equity_cache.insert((street, board), equity);
        equity
    }

    /// the hero's bucket is a function of (street, board) inside one
    /// subgame, so it is computed once per pairing
    fn hero_bucket(
        &mut self,
        game: &Game,
        seat: usize,
        street: Street,
        in_position: bool,
        bucketer: &Bucketer,
    ) -> usize {
        if let Some(bucket) = self.bucket_cache.get(&(street, game.board())) {
            return *bucket;
        }
        let ctx = Context {
            spr: game.spr(),
            in_position,
            effective_stack: game.effective_stack(),
        };
        let bucket = bucketer.bucket_in_context(&game.hole(seat), &game.board(), street, &ctx);
        self.bucket_cache.insert((street, game.board()), bucket);
        bucket
    }

    /// belief-weighted blueprint for a seat whose cards we cannot see
    fn blended(
        &self,
        seat: usize,
        street: Street,
        history: &History,
        menu: &[AbstractAction],
        anchor: &mut dyn Anchor,
    ) -> Vec<Probability> {
        let belief = self.beliefs.get(seat).filter(|b| !b.is_empty());
        let Some(belief) = belief else {
            return crate::profile::uniform(menu.len());
        };
        let mut blended = vec![0.0f32; menu.len()];
        let mut total = 0.0f32;
        for (bucket, weight) in belief.iter() {
            let key = crate::encoder::encode(*bucket, street, history).0;
            let probs = anchor.strategy(&key, menu);
            for (b, p) in blended.iter_mut().zip(probs.iter()) {
                *b += weight * p;
            }
            total += weight;
        }
        if total <= 0.0 {
            crate::profile::uniform(menu.len())
        } else {
            blended.into_iter().map(|p| p / total).collect()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_menu(&self) -> &[AbstractAction] {
        match &self.nodes[0].kind {
            SubKind::Decision { menu, .. } => menu,
            _ => panic!("subgame roots at a decision"),
        }
    }

    /// averaged strategy across iterations at the root
    pub fn root_average(&self) -> Vec<Probability> {
        match &self.nodes[0].kind {
            SubKind::Decision { strategy_sum, .. } => crate::profile::averaged(
                &strategy_sum.iter().map(|x| *x as f64).collect::<Vec<_>>(),
            ),
            _ => panic!("subgame roots at a decision"),
        }
    }

    /// one vanilla CFR sweep with the KL anchor folded into every
    /// decision's counterfactual values
    pub fn iterate(
        &mut self,
        params: &SubgameParams,
        leaf: &LeafEvaluator,
        stats: &mut KlStats,
        rng: &mut SmallRng,
    ) {
        self.cfr(0, 1.0, 1.0, params, leaf, stats, rng);
    }

    #[allow(clippy::too_many_arguments)]
    fn cfr(
        &mut self,
        index: usize,
        reach_hero: f32,
        reach_villain: f32,
        params: &SubgameParams,
        leaf: &LeafEvaluator,
        stats: &mut KlStats,
        rng: &mut SmallRng,
    ) -> Utility {
        match &self.nodes[index].kind {
            SubKind::Fold { utility } => *utility,
            SubKind::Leaf {
                pot,
                invested,
                street,
            } => {
                if let Some(value) = self.leaf_cache[index] {
                    return value;
                }
                let (pot, invested, street) = (*pot, *invested, *street);
                let board = self.nodes[index].game.board();
                let hero = self.nodes[index].game.hole(self.hero);
                let hero_equity = self.hero_equity(street, board, hero, rng);
                let query = LeafQuery {
                    board: &board,
                    street,
                    pot,
                    hero_invested: invested,
                    hero,
                    hero_equity,
                    ranges: &self.beliefs,
                };
                let value = leaf.evaluate(&query);
                self.leaf_cache[index] = Some(value);
                value
            }
            SubKind::Chance { children } => {
                let children = children.clone();
                let n = children.len() as f32;
                children
                    .into_iter()
                    .map(|c| self.cfr(c, reach_hero, reach_villain, params, leaf, stats, rng))
                    .sum::<Utility>()
                    / n
            }
            SubKind::Decision {
                seat,
                street,
                in_position,
                children,
                regrets,
                blueprint,
                ..
            } => {
                let (seat, street, in_position) = (*seat, *street, *in_position);
                let children = children.clone();
                let blueprint = blueprint.clone();
                let sigma = matching(&regrets.iter().map(|r| *r as f64).collect::<Vec<_>>());
                let is_hero = seat == self.hero;

                let utilities = children
                    .iter()
                    .zip(sigma.iter())
                    .map(|(&child, &p)| {
                        let (rh, rv) = if is_hero {
                            (reach_hero * p, reach_villain)
                        } else {
                            (reach_hero, reach_villain * p)
                        };
                        self.cfr(child, rh, rv, params, leaf, stats, rng)
                    })
                    .collect::<Vec<_>>();

                // per-action anchor penalty; summed under sigma it is
                // exactly the KL cost subtracted from the node value
                let weight = kl::lambda(street, in_position, &params.lambda, params.oop_bonus);
                let penalties = sigma
                    .iter()
                    .zip(blueprint.iter())
                    .map(|(p, q)| {
                        weight
                            * ((p + params.epsilon0) / (q.max(params.clip_min) + params.epsilon0))
                                .ln()
                    })
                    .collect::<Vec<_>>();
                let penalized = utilities
                    .iter()
                    .zip(penalties.iter())
                    .map(|(u, pen)| u - pen)
                    .collect::<Vec<_>>();
                let value = sigma
                    .iter()
                    .zip(penalized.iter())
                    .map(|(p, u)| p * u)
                    .sum::<Utility>();
                stats.push(
                    street,
                    in_position,
                    kl::divergence(&sigma, &blueprint, params.clip_min, params.epsilon0),
                );

                let counterfactual = if is_hero { reach_villain } else { reach_hero };
                let own = if is_hero { reach_hero } else { reach_villain };
                let SubKind::Decision {
                    regrets,
                    strategy_sum,
                    ..
                } = &mut self.nodes[index].kind
                else {
                    unreachable!()
                };
                for (i, u) in penalized.iter().enumerate() {
                    // the aggregate villain plays to minimize hero value
                    let gain = if is_hero { u - value } else { value - u };
                    regrets[i] = (regrets[i] + counterfactual * gain).max(0.0);
                }
                for (i, p) in sigma.iter().enumerate() {
                    strategy_sum[i] += own * p;
                }
                value
            }
        }
    }
}
