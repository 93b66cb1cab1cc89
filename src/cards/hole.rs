use super::card::Card;
use serde::Deserialize;
use serde::Serialize;

/// two private cards, stored high-card-first so equal holdings compare equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hole(Card, Card);

impl Hole {
    pub fn hi(&self) -> Card {
        self.0
    }
    pub fn lo(&self) -> Card {
        self.1
    }
    pub fn cards(&self) -> [Card; 2] {
        [self.0, self.1]
    }
    pub fn contains(&self, card: &Card) -> bool {
        self.0 == *card || self.1 == *card
    }
    pub fn suited(&self) -> bool {
        self.0.suit() == self.1.suit()
    }
    pub fn paired(&self) -> bool {
        self.0.rank() == self.1.rank()
    }
    /// rank gap between the two cards, 0 for pairs
    pub fn gap(&self) -> u8 {
        self.0.rank() as u8 - self.1.rank() as u8
    }
}

impl From<(Card, Card)> for Hole {
    fn from((a, b): (Card, Card)) -> Self {
        if a >= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl std::str::FromStr for Hole {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 {
            return Err(crate::Error::MalformedTable(format!("bad hole {}", s)));
        }
        Ok(Self::from((s[..2].parse::<Card>()?, s[2..].parse::<Card>()?)))
    }
}

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

impl crate::Arbitrary for Hole {
    fn random() -> Self {
        use rand::seq::SliceRandom;
        let mut deck = (0u8..52).collect::<Vec<_>>();
        deck.shuffle(&mut rand::rng());
        Self::from((Card::from(deck[0]), Card::from(deck[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        let a = Hole::from(("As".parse().unwrap(), "Kd".parse().unwrap()));
        let b = Hole::from(("Kd".parse().unwrap(), "As".parse().unwrap()));
        assert_eq!(a, b);
        assert_eq!(a.hi().to_string(), "As");
    }

    #[test]
    fn gap_and_texture() {
        let hole: Hole = "AsKs".parse().unwrap();
        assert!(hole.suited());
        assert!(!hole.paired());
        assert_eq!(hole.gap(), 1);
    }
}
