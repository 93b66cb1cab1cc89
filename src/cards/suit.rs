use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    C = 0,
    D = 1,
    H = 2,
    S = 3,
}

impl Suit {
    pub const fn all() -> &'static [Self; 4] {
        &[Self::C, Self::D, Self::H, Self::S]
    }
}

impl From<u8> for Suit {
    fn from(n: u8) -> Self {
        match n {
            0 => Self::C,
            1 => Self::D,
            2 => Self::H,
            3 => Self::S,
            _ => panic!("suit out of range"),
        }
    }
}

impl From<Suit> for u8 {
    fn from(s: Suit) -> Self {
        s as u8
    }
}

impl TryFrom<char> for Suit {
    type Error = crate::Error;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_lowercase() {
            'c' => Ok(Self::C),
            'd' => Ok(Self::D),
            'h' => Ok(Self::H),
            's' => Ok(Self::S),
            _ => Err(crate::Error::MalformedTable(format!("bad suit char {}", c))),
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::C => write!(f, "c"),
            Self::D => write!(f, "d"),
            Self::H => write!(f, "h"),
            Self::S => write!(f, "s"),
        }
    }
}
