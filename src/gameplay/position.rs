use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    BTN,
    SB,
    BB,
    UTG,
    MP,
    CO,
}

/// fixed seat -> position table per table size. seat 0 is always the
/// dealer. heads-up uses the button-posts-small-blind convention.
pub fn positions(n: usize) -> &'static [Position] {
    use Position::*;
    match n {
        2 => &[BTN, BB],
        3 => &[BTN, SB, BB],
        4 => &[BTN, SB, BB, UTG],
        5 => &[BTN, SB, BB, UTG, CO],
        6 => &[BTN, SB, BB, UTG, MP, CO],
        _ => panic!("table size out of range"),
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::BTN => write!(f, "BTN"),
            Self::SB => write!(f, "SB"),
            Self::BB => write!(f, "BB"),
            Self::UTG => write!(f, "UTG"),
            Self::MP => write!(f, "MP"),
            Self::CO => write!(f, "CO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_size_has_a_row() {
        for n in 2..=6 {
            assert_eq!(positions(n).len(), n);
            assert_eq!(positions(n)[0], Position::BTN);
        }
    }

    #[test]
    fn heads_up_has_no_small_blind_seat() {
        assert_eq!(positions(2), &[Position::BTN, Position::BB]);
    }
}
