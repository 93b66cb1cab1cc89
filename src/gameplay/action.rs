use super::odds::Odds;
use crate::Chips;
use serde::Deserialize;
use serde::Serialize;

/// the discretized action space. bets are pot fractions from the fixed
/// grid; the back-mapper in `menu` turns them into legal chip amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbstractAction {
    Fold,
    CheckCall,
    Bet(Odds),
    AllIn,
}

impl AbstractAction {
    /// compact token used inside infoset keys: F, C, B25..B200, A
    pub fn token(&self) -> String {
        match self {
            Self::Fold => "F".to_string(),
            Self::CheckCall => "C".to_string(),
            Self::Bet(odds) => format!("B{}", odds.percent()),
            Self::AllIn => "A".to_string(),
        }
    }

    pub fn from_token(s: &str) -> Result<Self, crate::Error> {
        match s {
            "F" => Ok(Self::Fold),
            "C" => Ok(Self::CheckCall),
            "A" => Ok(Self::AllIn),
            _ => {
                let pct = s
                    .strip_prefix('B')
                    .and_then(|d| d.parse::<Chips>().ok())
                    .ok_or_else(|| crate::Error::MalformedKey(format!("bad action token {}", s)))?;
                Odds::from_percent(pct)
                    .map(Self::Bet)
                    .ok_or_else(|| crate::Error::MalformedKey(format!("bad bet fraction {}", s)))
            }
        }
    }

    pub fn is_aggro(&self) -> bool {
        matches!(self, Self::Bet(_) | Self::AllIn)
    }
}

/// the process-wide action table. the compact regret store indexes
/// actions through this fixed enumeration rather than storing them.
pub struct ActionTable;

impl ActionTable {
    pub const N: usize = 2 + Odds::GRID.len() + 1;

    pub fn all() -> Vec<AbstractAction> {
        let mut all = vec![AbstractAction::Fold, AbstractAction::CheckCall];
        all.extend(Odds::GRID.iter().copied().map(AbstractAction::Bet));
        all.push(AbstractAction::AllIn);
        all
    }

    pub fn index(action: &AbstractAction) -> u32 {
        match action {
            AbstractAction::Fold => 0,
            AbstractAction::CheckCall => 1,
            AbstractAction::Bet(odds) => {
                2 + Odds::GRID
                    .iter()
                    .position(|o| o == odds)
                    .expect("bet from the grid") as u32
            }
            AbstractAction::AllIn => 2 + Odds::GRID.len() as u32,
        }
    }

    pub fn at(index: u32) -> AbstractAction {
        match index {
            0 => AbstractAction::Fold,
            1 => AbstractAction::CheckCall,
            i if (i as usize) < 2 + Odds::GRID.len() => {
                AbstractAction::Bet(Odds::GRID[i as usize - 2])
            }
            i if i as usize == 2 + Odds::GRID.len() => AbstractAction::AllIn,
            _ => panic!("action index out of range"),
        }
    }
}

impl std::fmt::Display for AbstractAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        for action in ActionTable::all() {
            assert_eq!(action, AbstractAction::from_token(&action.token()).unwrap());
        }
    }

    #[test]
    fn table_is_bijective() {
        for action in ActionTable::all() {
            assert_eq!(action, ActionTable::at(ActionTable::index(&action)));
        }
        assert_eq!(ActionTable::all().len(), ActionTable::N);
    }

    #[test]
    fn expected_tokens() {
        assert_eq!(AbstractAction::Bet(Odds(1, 2)).token(), "B50");
        assert_eq!(AbstractAction::Bet(Odds(2, 3)).token(), "B66");
        assert_eq!(AbstractAction::Fold.token(), "F");
        assert_eq!(AbstractAction::AllIn.token(), "A");
    }
}
