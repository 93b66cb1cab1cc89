use super::board::Board;
use super::card::Card;
use super::deck::sample_future_board;
use super::evaluator::rank_7card;
use super::hole::Hole;
use super::street::Street;
use crate::Probability;
use rand::rngs::SmallRng;
use rand::Rng;

/// a weighted set of villain holdings
pub type Range = Vec<(Hole, Probability)>;

/// every holding not colliding with the blockers, uniformly weighted
pub fn uniform_range(blockers: &[Card]) -> Range {
    let live = (0u8..52)
        .map(Card::from)
        .filter(|c| !blockers.contains(c))
        .collect::<Vec<_>>();
    let mut range = Vec::new();
    for i in 0..live.len() {
        for j in (i + 1)..live.len() {
            range.push((Hole::from((live[i], live[j])), 1.0));
        }
    }
    range
}

/// monte-carlo equity of the hero holding against a weighted range,
/// from a partial board. deterministic given the rng.
pub fn equity(
    hero: &Hole,
    villain: &Range,
    board: &Board,
    n_samples: usize,
    rng: &mut SmallRng,
) -> Probability {
    let mut blocked = hero.cards().to_vec();
    blocked.extend(board.cards());
    let live = villain
        .iter()
        .filter(|(hole, _)| !hole.cards().iter().any(|c| blocked.contains(c)))
        .collect::<Vec<_>>();
    if live.is_empty() {
        return 0.5;
    }
    let total = live.iter().map(|(_, w)| *w).sum::<Probability>();
    let mut won = 0f64;
    for _ in 0..n_samples {
        let (ref theirs, _) = *pick_weighted(&live, total, rng);
        let mut excluded = hero.cards().to_vec();
        excluded.extend_from_slice(&theirs.cards());
        let runout = sample_future_board(board, &excluded, Street::Rive, rng);
        let ours = rank_7card(hero, &runout);
        let them = rank_7card(theirs, &runout);
        won += match ours.cmp(&them) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        };
    }
    (won / n_samples as f64) as Probability
}

fn pick_weighted<'a>(
    live: &[&'a (Hole, Probability)],
    total: Probability,
    rng: &mut SmallRng,
) -> &'a (Hole, Probability) {
    let mut roll = rng.random::<f32>() * total;
    for entry in live {
        roll -= entry.1;
        if roll <= 0.0 {
            return entry;
        }
    }
    live.last().expect("nonempty range")
}
