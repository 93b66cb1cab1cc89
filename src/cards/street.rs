use serde::Deserialize;
use serde::Serialize;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Street {
    Pref = 0,
    Flop = 1,
    Turn = 2,
    Rive = 3,
}

impl Street {
    pub const fn all() -> &'static [Self; 4] {
        &[Self::Pref, Self::Flop, Self::Turn, Self::Rive]
    }
    pub const fn next(&self) -> Self {
        match self {
            Self::Pref => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::Rive,
            Self::Rive => panic!("terminal"),
        }
    }
    /// community cards on the board once this street is open
    pub const fn n_observed(&self) -> usize {
        match self {
            Self::Pref => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::Rive => 5,
        }
    }
    /// community cards revealed by the transition into the next street
    pub const fn n_revealed(&self) -> usize {
        match self {
            Self::Pref => 3,
            Self::Flop => 1,
            Self::Turn => 1,
            Self::Rive => panic!("terminal"),
        }
    }
    /// uppercase token used inside infoset keys
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Pref => "PREFLOP",
            Self::Flop => "FLOP",
            Self::Turn => "TURN",
            Self::Rive => "RIVER",
        }
    }
    pub fn from_token(s: &str) -> Result<Self, crate::Error> {
        match s {
            "PREFLOP" => Ok(Self::Pref),
            "FLOP" => Ok(Self::Flop),
            "TURN" => Ok(Self::Turn),
            "RIVER" => Ok(Self::Rive),
            _ => Err(crate::Error::MalformedKey(format!("bad street {}", s))),
        }
    }
}

impl From<usize> for Street {
    fn from(n: usize) -> Self {
        match n {
            0 => Self::Pref,
            1 => Self::Flop,
            2 => Self::Turn,
            3 => Self::Rive,
            _ => panic!("street out of range"),
        }
    }
}

impl std::fmt::Display for Street {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Pref => write!(f, "preflop"),
            Self::Flop => write!(f, "flop"),
            Self::Turn => write!(f, "turn"),
            Self::Rive => write!(f, "river"),
        }
    }
}

impl crate::Arbitrary for Street {
    fn random() -> Self {
        use rand::Rng;
        Self::from(rand::rng().random_range(0usize..4))
    }
}
