use crate::Chips;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// pot-normalized odds for a given bet size
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Odds(pub Chips, pub Chips);

impl From<Odds> for Probability {
    fn from(odds: Odds) -> Self {
        odds.0 as Probability / odds.1 as Probability
    }
}

impl Odds {
    /// the full pot-fraction menu. subsets of this grid form the
    /// street- and position-dependent menus.
    pub const GRID: [Self; 8] = [
        Self(1, 4), // 0.25
        Self(1, 3), // 0.33
        Self(1, 2), // 0.50
        Self(2, 3), // 0.66
        Self(3, 4), // 0.75
        Self(1, 1), // 1.00
        Self(3, 2), // 1.50
        Self(2, 1), // 2.00
    ];

    /// integer percent, truncated. this is the digit part of the action
    /// token, so 1/3 -> 33 and 2/3 -> 66 exactly.
    pub fn percent(&self) -> Chips {
        self.0 * 100 / self.1
    }

    pub fn from_percent(pct: Chips) -> Option<Self> {
        Self::GRID.iter().copied().find(|o| o.percent() == pct)
    }
}

impl std::fmt::Display for Odds {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.percent())
    }
}

impl crate::Arbitrary for Odds {
    fn random() -> Self {
        use rand::prelude::IndexedRandom;
        let ref mut rng = rand::rng();
        Self::GRID.choose(rng).copied().expect("GRID is nonempty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_truncates_thirds() {
        assert_eq!(Odds(1, 3).percent(), 33);
        assert_eq!(Odds(2, 3).percent(), 66);
        assert_eq!(Odds(3, 2).percent(), 150);
    }

    #[test]
    fn percent_roundtrip() {
        for odds in Odds::GRID {
            assert_eq!(Some(odds), Odds::from_percent(odds.percent()));
        }
    }
}
