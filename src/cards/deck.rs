use super::board::Board;
use super::card::Card;
use super::street::Street;
use rand::rngs::SmallRng;
use rand::Rng;

/// a deck with some cards removed. all sampling is uniform without
/// replacement and threaded through an explicit rng.
#[derive(Debug, Clone)]
pub struct Deck {
    remaining: Vec<Card>,
}

impl Deck {
    /// full 52-card deck minus the exclusions
    pub fn without(excluded: &[Card]) -> Self {
        Self {
            remaining: (0u8..52)
                .map(Card::from)
                .filter(|c| !excluded.contains(c))
                .collect(),
        }
    }
    pub fn n(&self) -> usize {
        self.remaining.len()
    }
    pub fn draw(&mut self, rng: &mut SmallRng) -> Card {
        assert!(!self.remaining.is_empty(), "deck exhausted");
        self.remaining.swap_remove(rng.random_range(0..self.remaining.len()))
    }
    pub fn deal(&mut self, n: usize, rng: &mut SmallRng) -> Vec<Card> {
        (0..n).map(|_| self.draw(rng)).collect()
    }
}

/// complete a partial board out to the target street, uniformly at random,
/// never colliding with the current board or the excluded cards.
pub fn sample_future_board(
    board: &Board,
    excluded: &[Card],
    target: Street,
    rng: &mut SmallRng,
) -> Board {
    assert!(target.n_observed() >= board.n(), "target behind board");
    let mut blocked = board.cards();
    blocked.extend_from_slice(excluded);
    let mut deck = Deck::without(&blocked);
    let mut future = *board;
    for card in deck.deal(target.n_observed() - board.n(), rng) {
        future.push(card);
    }
    future
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn no_duplicates_in_runout() {
        let ref mut rng = SmallRng::seed_from_u64(42);
        let board = Board::from(vec!["2c".parse().unwrap(), "7d".parse().unwrap(), "Jh".parse().unwrap()]);
        let excluded = ["As".parse().unwrap(), "Ks".parse().unwrap()];
        for _ in 0..256 {
            let full = sample_future_board(&board, &excluded, Street::Rive, rng);
            let mut cards = full.cards();
            cards.extend_from_slice(&excluded);
            let n = cards.len();
            cards.sort();
            cards.dedup();
            assert_eq!(cards.len(), n);
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let board = Board::empty();
        let a = sample_future_board(&board, &[], Street::Flop, &mut SmallRng::seed_from_u64(7));
        let b = sample_future_board(&board, &[], Street::Flop, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a.cards(), b.cards());
    }
}
