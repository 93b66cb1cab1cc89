use super::card::Card;
use super::street::Street;
use serde::Deserialize;
use serde::Serialize;

/// community cards. empty preflop, then 3, 4, 5. the street is a pure
/// function of how many cards have been dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Board {
    cards: [Option<Card>; 5],
    n: usize,
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn push(&mut self, card: Card) {
        assert!(self.n < 5, "board full");
        self.cards[self.n] = Some(card);
        self.n += 1;
    }
    pub fn contains(&self, card: &Card) -> bool {
        self.cards().iter().any(|c| c == card)
    }
    pub fn cards(&self) -> Vec<Card> {
        self.cards.iter().take(self.n).map(|c| c.expect("dealt")).collect()
    }
    pub fn street(&self) -> Street {
        match self.n {
            0 => Street::Pref,
            3 => Street::Flop,
            4 => Street::Turn,
            5 => Street::Rive,
            _ => panic!("board between streets"),
        }
    }
}

impl From<Vec<Card>> for Board {
    fn from(cards: Vec<Card>) -> Self {
        let mut board = Self::empty();
        for card in cards {
            board.push(card);
        }
        board
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for card in self.cards() {
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_tracks_deal() {
        let mut board = Board::empty();
        assert_eq!(board.street(), Street::Pref);
        for card in ["2c", "7d", "Jh"] {
            board.push(card.parse().unwrap());
        }
        assert_eq!(board.street(), Street::Flop);
        board.push("Qs".parse().unwrap());
        assert_eq!(board.street(), Street::Turn);
        board.push("3c".parse().unwrap());
        assert_eq!(board.street(), Street::Rive);
    }
}
