use super::position::Position;
use crate::cards::Board;
use crate::cards::Hole;
use crate::cards::Street;
use crate::Chips;
use serde::Deserialize;
use serde::Serialize;

/// the upstream boundary record. vision / OCR / harness layers produce
/// one of these per decision; the core consumes it and never looks
/// further upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableState {
    pub pot: Chips,
    pub stacks: Vec<Chips>,
    pub wagers: Vec<Chips>,
    pub positions: Vec<Position>,
    pub hero: usize,
    pub hero_hole: Hole,
    pub board: Vec<String>,
    pub street: Street,
    pub to_call: Chips,
    pub legal_amounts: Vec<Chips>,
    pub effective_stack: Chips,
    pub spr: f32,
    pub in_position: bool,
}

impl TableState {
    pub fn board_cards(&self) -> Result<Board, crate::Error> {
        let cards = self
            .board
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<_>, _>>()?;
        let board = Board::from(cards);
        if board.street() != self.street {
            return Err(crate::Error::MalformedTable(format!(
                "board has {} cards but street is {}",
                board.n(),
                self.street,
            )));
        }
        Ok(board)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.stacks.len() != self.positions.len() {
            return Err(crate::Error::MalformedTable(
                "stacks and positions disagree on seat count".to_string(),
            ));
        }
        if self.hero >= self.stacks.len() {
            return Err(crate::Error::MalformedTable(format!(
                "hero seat {} out of range",
                self.hero,
            )));
        }
        self.board_cards().map(|_| ())
    }
}
