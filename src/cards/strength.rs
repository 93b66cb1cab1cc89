use super::rank::Rank;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Class {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    Trips = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    Quads = 7,
    StraightFlush = 8,
}

/// total order over 5-of-7-card hands, packed into a u32:
/// hand class in the high bits, then up to five tiebreak ranks in
/// descending significance. equal values are genuine ties (split pots).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Strength(u32);

impl Strength {
    pub fn new(class: Class, kickers: &[Rank]) -> Self {
        assert!(kickers.len() <= 5);
        let mut value = (class as u32) << 20;
        for (i, rank) in kickers.iter().enumerate() {
            value |= (*rank as u32) << (16 - 4 * i);
        }
        Self(value)
    }
    pub fn class(&self) -> Class {
        match self.0 >> 20 {
            0 => Class::HighCard,
            1 => Class::OnePair,
            2 => Class::TwoPair,
            3 => Class::Trips,
            4 => Class::Straight,
            5 => Class::Flush,
            6 => Class::FullHouse,
            7 => Class::Quads,
            8 => Class::StraightFlush,
            _ => panic!("class out of range"),
        }
    }
}

impl From<Strength> for u32 {
    fn from(s: Strength) -> Self {
        s.0
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.class() {
            Class::HighCard => write!(f, "high card"),
            Class::OnePair => write!(f, "one pair"),
            Class::TwoPair => write!(f, "two pair"),
            Class::Trips => write!(f, "three of a kind"),
            Class::Straight => write!(f, "straight"),
            Class::Flush => write!(f, "flush"),
            Class::FullHouse => write!(f, "full house"),
            Class::Quads => write!(f, "four of a kind"),
            Class::StraightFlush => write!(f, "straight flush"),
        }
    }
}
