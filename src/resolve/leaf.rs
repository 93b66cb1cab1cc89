use crate::cards::Board;
use crate::cards::Hole;
use crate::cards::Street;
use crate::Chips;
use crate::Equity;
use crate::Utility;
use crate::B_BLIND;

/// what a depth-limit leaf looks like to an evaluator: public cards
/// plus bucketed range beliefs for every seat. the hero's monte-carlo
/// equity on this board is computed (and cached) by the subgame, since
/// every leaf on one board shares it.
pub struct LeafQuery<'a> {
    pub board: &'a Board,
    pub street: Street,
    pub pot: Chips,
    pub hero_invested: Chips,
    pub hero: Hole,
    pub hero_equity: Equity,
    pub ranges: &'a [Vec<(usize, f32)>],
}

/// an oracle's answer: mean utility in big blinds, and optionally the
/// width of its prediction interval for the rejection gate
#[derive(Debug, Clone, Copy)]
pub struct Estimate {
    pub value: Utility,
    pub confidence: Option<f32>,
}

/// plug-in leaf evaluator contract: pure estimation, never panics,
/// always returns something the resolver can act on.
pub trait Oracle: Send + Sync {
    fn estimate(&self, query: &LeafQuery) -> Estimate;
}

/// the closed set of leaf evaluators. the blueprint variant prices a
/// leaf at equity-share of the pot; an oracle variant may abstain via
/// the gate, in which case the blueprint price is used instead.
pub enum LeafEvaluator {
    Blueprint,
    Oracle(Box<dyn Oracle>),
}

impl LeafEvaluator {
    pub fn evaluate(&self, query: &LeafQuery) -> Utility {
        match self {
            Self::Blueprint => blueprint_value(query),
            Self::Oracle(oracle) => {
                let estimate = oracle.estimate(query);
                match estimate.confidence {
                    Some(width) if width > gate_width(query.street) => {
                        // uncertain prediction: abstain and fall back
                        blueprint_value(query)
                    }
                    _ => estimate.value,
                }
            }
        }
    }
}

/// street-dependent prediction-interval width above which an oracle's
/// answer is rejected
fn gate_width(street: Street) -> f32 {
    match street {
        Street::Pref | Street::Flop => crate::GATE_WIDTH_BB[0],
        Street::Turn => crate::GATE_WIDTH_BB[1],
        Street::Rive => crate::GATE_WIDTH_BB[2],
    }
}

/// equity share of the pot minus what the hero already put in, in bb.
/// a cheap stand-in for averaged blueprint continuations at the leaf.
fn blueprint_value(query: &LeafQuery) -> Utility {
    (query.hero_equity * query.pot as f32 - query.hero_invested as f32) / B_BLIND as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Confident(f32);
    impl Oracle for Confident {
        fn estimate(&self, _: &LeafQuery) -> Estimate {
            Estimate {
                value: self.0,
                confidence: Some(0.01),
            }
        }
    }

    struct Unsure;
    impl Oracle for Unsure {
        fn estimate(&self, _: &LeafQuery) -> Estimate {
            Estimate {
                value: 999.0,
                confidence: Some(10.0),
            }
        }
    }

    fn query(board: &Board, equity: f32) -> LeafQuery {
        LeafQuery {
            board,
            street: Street::Flop,
            pot: 20,
            hero_invested: 10,
            hero: "AsAh".parse().unwrap(),
            hero_equity: equity,
            ranges: &[],
        }
    }

    fn flop() -> Board {
        Board::from(
            ["Qs", "7d", "2c"]
                .iter()
                .map(|c| c.parse().unwrap())
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn confident_oracle_is_trusted() {
        let board = flop();
        let v = LeafEvaluator::Oracle(Box::new(Confident(1.5))).evaluate(&query(&board, 0.8));
        assert_eq!(v, 1.5);
    }

    #[test]
    fn unsure_oracle_is_gated_to_the_blueprint_price() {
        let board = flop();
        let gated = LeafEvaluator::Oracle(Box::new(Unsure)).evaluate(&query(&board, 0.8));
        assert!(gated < 100.0, "the 999 estimate must be rejected");
        // pot share of 0.8 * 20 minus the 10 invested, in big blinds
        assert!((gated - 3.0).abs() < 1e-6);
    }

    #[test]
    fn pricing_is_monotone_in_equity() {
        let board = flop();
        let strong = LeafEvaluator::Blueprint.evaluate(&query(&board, 0.85));
        let weak = LeafEvaluator::Blueprint.evaluate(&query(&board, 0.25));
        assert!(strong > weak);
    }
}
