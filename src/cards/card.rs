use super::rank::Rank;
use super::suit::Suit;
use serde::Deserialize;
use serde::Serialize;

/// a single card. totally ordered by rank then suit, which keeps every
/// card collection in the codebase canonically sortable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn suit(&self) -> Suit {
        self.suit
    }
}

// u8 isomorphism
impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        (c.rank as u8) * 4 + (c.suit as u8)
    }
}
impl From<u8> for Card {
    fn from(n: u8) -> Self {
        Self {
            rank: Rank::from(n / 4),
            suit: Suit::from(n % 4),
        }
    }
}
impl From<(Rank, Suit)> for Card {
    fn from((rank, suit): (Rank, Suit)) -> Self {
        Self { rank, suit }
    }
}

// u64 bitmask isomorphism
impl From<Card> for u64 {
    fn from(c: Card) -> u64 {
        1 << u8::from(c)
    }
}

impl std::str::FromStr for Card {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let rank = chars
            .next()
            .ok_or_else(|| crate::Error::MalformedTable(format!("bad card {}", s)))?;
        let suit = chars
            .next()
            .ok_or_else(|| crate::Error::MalformedTable(format!("bad card {}", s)))?;
        Ok(Self {
            rank: Rank::try_from(rank)?,
            suit: Suit::try_from(suit)?,
        })
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl crate::Arbitrary for Card {
    fn random() -> Self {
        use rand::Rng;
        Self::from(rand::rng().random_range(0u8..52))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijective_u8() {
        assert!((0u8..52).all(|n| n == u8::from(Card::from(n))));
    }

    #[test]
    fn parse_display_roundtrip() {
        for n in 0u8..52 {
            let card = Card::from(n);
            assert_eq!(card, card.to_string().parse().unwrap());
        }
    }

    #[test]
    fn ordered_by_rank_then_suit() {
        let low: Card = "2c".parse().unwrap();
        let mid: Card = "2s".parse().unwrap();
        let high: Card = "Ac".parse().unwrap();
        assert!(low < mid);
        assert!(mid < high);
    }
}
