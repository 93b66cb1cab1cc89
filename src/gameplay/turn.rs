use serde::Deserialize;
use serde::Serialize;

/// whose move it is at a node of the game tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Chance,
    Choice(usize),
    Terminal,
}

impl Turn {
    pub fn is_chance(&self) -> bool {
        matches!(self, Self::Chance)
    }
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice(_))
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
    pub fn position(&self) -> usize {
        match self {
            Self::Choice(x) => *x,
            _ => panic!("no position at chance or terminal"),
        }
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Chance => write!(f, "chance"),
            Self::Choice(x) => write!(f, "seat {}", x),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}
