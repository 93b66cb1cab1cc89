use crate::Chips;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Active,
    Folded,
    Shoved,
}

/// one chair at the table. wagers are per-street, spend is whole-hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    stack: Chips,
    wagered: Chips,
    spent: Chips,
    state: State,
    acted: bool,
}

impl From<Chips> for Seat {
    fn from(stack: Chips) -> Self {
        Self {
            stack,
            wagered: 0,
            spent: 0,
            state: State::Active,
            acted: false,
        }
    }
}

impl Seat {
    pub fn stack(&self) -> Chips {
        self.stack
    }
    pub fn wagered(&self) -> Chips {
        self.wagered
    }
    pub fn spent(&self) -> Chips {
        self.spent
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn acted(&self) -> bool {
        self.acted
    }
    pub fn folded(&self) -> bool {
        self.state == State::Folded
    }
    pub fn shoved(&self) -> bool {
        self.state == State::Shoved
    }
    pub fn live(&self) -> bool {
        self.state != State::Folded
    }
    /// still able to make decisions
    pub fn playing(&self) -> bool {
        self.state == State::Active
    }

    pub fn fold(&mut self) {
        self.state = State::Folded;
        self.acted = true;
    }
    pub fn mark_acted(&mut self) {
        self.acted = true;
    }
    pub fn mark_shoved(&mut self) {
        self.state = State::Shoved;
    }
    pub fn reset_acted(&mut self) {
        self.acted = false;
    }
    /// used when reconstructing a live spot: the wager is already in the
    /// pot, so the stack is untouched.
    pub fn set_wagered(&mut self, wagered: Chips) {
        self.wagered = wagered;
        self.spent = wagered;
    }
    pub fn reset_street(&mut self) {
        self.wagered = 0;
        self.acted = false;
    }
    /// move chips from stack to the current wager, going all-in when the
    /// stack cannot cover. returns the chips actually committed.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.wagered += paid;
        self.spent += paid;
        if self.stack == 0 {
            self.state = State::Shoved;
        }
        self.acted = true;
        paid
    }
}
