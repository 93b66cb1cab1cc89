use super::seat::Seat;
use super::showdown;
use super::turn::Turn;
use crate::cards::Board;
use crate::cards::Card;
use crate::cards::Deck;
use crate::cards::Hole;
use crate::cards::Street;
use crate::Chips;
use crate::Utility;
use crate::B_BLIND;
use crate::MAX_N;
use crate::S_BLIND;
use crate::STACK;
use rand::rngs::SmallRng;

/// concrete betting actions, in chips. the solver never sees these
/// directly: it acts through the abstract menu and the back-mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fold,
    Check,
    Call(Chips),
    RaiseTo(Chips),
    Shove,
}

/// the memoryless state of a hand in between actions. seat 0 is the
/// dealer. immutable methods are the rules of the game; `act` and the
/// chance deals are the only mutations.
#[derive(Debug, Clone, Copy)]
pub struct Game {
    n: usize,
    seats: [Seat; MAX_N],
    holes: [Option<Hole>; MAX_N],
    board: Board,
    street: Street,
    pot: Chips,
    to_match: Chips,
    min_raise: Chips,
    actor: usize,
    raises: usize,
    dealt: bool,
}

impl Game {
    /// blinds posted, hole cards not yet dealt. heads-up the dealer
    /// posts the small blind and acts first preflop.
    pub fn root(n: usize) -> Self {
        assert!((2..=MAX_N).contains(&n), "table size out of range");
        let mut game = Self {
            n,
            seats: [Seat::from(STACK); MAX_N],
            holes: [None; MAX_N],
            board: Board::empty(),
            street: Street::Pref,
            pot: 0,
            to_match: 0,
            min_raise: B_BLIND,
            actor: 0,
            raises: 0,
            dealt: false,
        };
        let sb = if n == 2 { 0 } else { 1 };
        let bb = if n == 2 { 1 } else { 2 };
        game.pot += game.seats[sb].commit(S_BLIND);
        game.pot += game.seats[bb].commit(B_BLIND);
        game.to_match = B_BLIND;
        for seat in game.seats.iter_mut() {
            seat.reset_acted();
        }
        game.actor = if n == 2 { 0 } else { 3 % n };
        game
    }

    /// a root with explicit stacks, board, and pot, used by the resolver
    /// to reconstruct a live spot. betting on the current street starts
    /// fresh from the given wager levels.
    pub fn reconstruct(
        stacks: &[Chips],
        pot: Chips,
        board: Board,
        holes: &[Option<Hole>],
        actor: usize,
        to_match: Chips,
        wagered: &[Chips],
    ) -> Self {
        let n = stacks.len();
        assert!((2..=MAX_N).contains(&n), "table size out of range");
        let mut seats = [Seat::from(0); MAX_N];
        let mut all = [None; MAX_N];
        for i in 0..n {
            seats[i] = Seat::from(stacks[i]);
            seats[i].set_wagered(wagered.get(i).copied().unwrap_or(0));
            if seats[i].stack() == 0 {
                seats[i].mark_shoved();
            }
            all[i] = holes.get(i).copied().flatten();
        }
        Self {
            n,
            seats,
            holes: all,
            street: board.street(),
            board,
            pot,
            to_match,
            min_raise: B_BLIND,
            actor,
            raises: 0,
            dealt: true,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }
    pub fn pot(&self) -> Chips {
        self.pot
    }
    pub fn board(&self) -> Board {
        self.board
    }
    pub fn street(&self) -> Street {
        self.street
    }
    pub fn actor(&self) -> usize {
        self.actor
    }
    pub fn raises(&self) -> usize {
        self.raises
    }
    pub fn seat(&self, i: usize) -> &Seat {
        &self.seats[i]
    }
    pub fn hole(&self, i: usize) -> Hole {
        self.holes[i].expect("hole dealt")
    }
    pub fn to_call(&self) -> Chips {
        self.to_match - self.seats[self.actor].wagered()
    }
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }
    pub fn to_match(&self) -> Chips {
        self.to_match
    }

    /// players not folded
    pub fn live(&self) -> usize {
        self.seats.iter().take(self.n).filter(|s| s.live()).count()
    }
    /// players who can still make decisions
    pub fn contenders(&self) -> usize {
        self.seats.iter().take(self.n).filter(|s| s.playing()).count()
    }

    /// the largest stack the actor can actually get paid by
    pub fn effective_stack(&self) -> Chips {
        let hero = self.seats[self.actor].stack();
        let villain = (0..self.n)
            .filter(|&i| i != self.actor)
            .filter(|&i| self.seats[i].live())
            .map(|i| self.seats[i].stack() + self.seats[i].wagered())
            .max()
            .unwrap_or(0);
        hero.min(villain)
    }

    pub fn spr(&self) -> f32 {
        self.effective_stack() as f32 / self.pot.max(1) as f32
    }

    /// postflop betting order is 1, 2, .., n-1, 0; the in-position seat
    /// is the last live seat in that order.
    pub fn in_position(&self, seat: usize) -> bool {
        (1..self.n)
            .chain(std::iter::once(0))
            .filter(|&i| self.seats[i].live())
            .last()
            == Some(seat)
    }

    pub fn turn(&self) -> Turn {
        if !self.dealt {
            Turn::Chance
        } else if self.live() <= 1 {
            Turn::Terminal
        } else if self.betting_closed() {
            match self.street {
                Street::Rive => Turn::Terminal,
                _ => Turn::Chance,
            }
        } else {
            Turn::Choice(self.actor)
        }
    }

    fn betting_closed(&self) -> bool {
        self.seats
            .iter()
            .take(self.n)
            .filter(|s| s.live())
            .all(|s| s.shoved() || (s.acted() && s.wagered() == self.to_match))
    }

    /// resolve the pending chance event: hole cards at the root,
    /// community cards at street boundaries.
    pub fn deal(&self, rng: &mut SmallRng) -> Self {
        let mut next = *self;
        if !next.dealt {
            let mut deck = Deck::without(&[]);
            for i in 0..next.n {
                let cards = deck.deal(2, rng);
                next.holes[i] = Some(Hole::from((cards[0], cards[1])));
            }
            next.dealt = true;
        } else {
            let mut excluded = next.board.cards();
            for hole in next.holes.iter().take(next.n).flatten() {
                excluded.extend_from_slice(&hole.cards());
            }
            let mut deck = Deck::without(&excluded);
            for card in deck.deal(next.street.n_revealed(), rng) {
                next.board.push(card);
            }
            next.open_street();
        }
        next
    }

    /// force specific cards into the pending chance event (subgame
    /// resolving samples its own boards).
    pub fn deal_exact(&self, cards: &[Card]) -> Self {
        let mut next = *self;
        assert!(next.dealt, "hole cards first");
        assert!(cards.len() == next.street.n_revealed());
        for card in cards {
            next.board.push(*card);
        }
        next.open_street();
        next
    }

    fn open_street(&mut self) {
        self.street = self.street.next();
        for seat in self.seats.iter_mut().take(self.n) {
            seat.reset_street();
        }
        self.to_match = 0;
        self.min_raise = B_BLIND;
        self.raises = 0;
        self.actor = self.first_to_act();
        if self.contenders() <= 1 {
            // everyone is all-in; run out the board with no betting
            for seat in self.seats.iter_mut().take(self.n) {
                seat.mark_acted();
            }
        }
    }

    fn first_to_act(&self) -> usize {
        (1..self.n)
            .chain(std::iter::once(0))
            .find(|&i| self.seats[i].playing())
            .unwrap_or(0)
    }

    pub fn act(&self, action: Action) -> Self {
        let mut next = *self;
        let actor = next.actor;
        match action {
            Action::Fold => {
                assert!(next.to_call() > 0, "cannot fold to no bet");
                next.seats[actor].fold();
            }
            Action::Check => {
                assert!(next.to_call() == 0, "cannot check facing a bet");
                next.seats[actor].mark_acted();
            }
            Action::Call(amount) => {
                assert!(amount == next.to_call());
                next.pot += next.seats[actor].commit(amount);
            }
            Action::RaiseTo(target) => {
                let increment = target - next.to_match;
                assert!(increment >= next.min_raise, "raise below minimum");
                let owed = target - next.seats[actor].wagered();
                assert!(owed < next.seats[actor].stack(), "use Shove for all-in");
                next.pot += next.seats[actor].commit(owed);
                next.to_match = target;
                next.min_raise = increment;
                next.raises += 1;
                next.reopen(actor);
            }
            Action::Shove => {
                let target = next.seats[actor].wagered() + next.seats[actor].stack();
                let increment = target - next.to_match;
                next.pot += next.seats[actor].commit(next.seats[actor].stack());
                if increment > 0 {
                    // an undersized all-in raises the price but does not
                    // reopen the action
                    if increment >= next.min_raise {
                        next.min_raise = increment;
                        next.raises += 1;
                        next.reopen(actor);
                    }
                    next.to_match = target;
                }
            }
        }
        next.rotate();
        next
    }

    fn reopen(&mut self, aggressor: usize) {
        for (i, seat) in self.seats.iter_mut().enumerate().take(self.n) {
            if i != aggressor && seat.playing() {
                seat.reset_acted();
            }
        }
    }

    fn rotate(&mut self) {
        if self.betting_closed() {
            return;
        }
        let mut i = self.actor;
        loop {
            i = (i + 1) % self.n;
            if self.seats[i].playing() {
                self.actor = i;
                return;
            }
            assert!(i != self.actor, "no playing seat to rotate to");
        }
    }

    /// net chip result per seat once the hand is over
    pub fn settlements(&self) -> Vec<Chips> {
        assert!(self.turn().is_terminal(), "settle only terminal states");
        showdown::settle(self)
    }

    /// chip delta for one seat, in big blinds
    pub fn payoff(&self, seat: usize) -> Utility {
        self.settlements()[seat] as Utility / B_BLIND as Utility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn dealt(n: usize, seed: u64) -> Game {
        Game::root(n).deal(&mut SmallRng::seed_from_u64(seed))
    }

    #[test]
    fn root_posts_blinds() {
        let game = Game::root(3);
        assert_eq!(game.pot(), S_BLIND + B_BLIND);
        assert_eq!(game.to_match(), B_BLIND);
        assert!(game.turn().is_chance());
    }

    #[test]
    fn heads_up_button_acts_first_preflop() {
        let game = dealt(2, 1);
        assert_eq!(game.turn(), Turn::Choice(0));
    }

    #[test]
    fn utg_acts_first_at_a_full_table() {
        let game = dealt(6, 1);
        assert_eq!(game.turn(), Turn::Choice(3));
    }

    #[test]
    fn fold_ends_heads_up_hand() {
        let game = dealt(2, 1);
        let game = game.act(Action::Fold);
        assert!(game.turn().is_terminal());
        let net = game.settlements();
        assert_eq!(net[0], -S_BLIND);
        assert_eq!(net[1], S_BLIND);
    }

    #[test]
    fn big_blind_keeps_the_option() {
        let game = dealt(2, 1);
        let game = game.act(Action::Call(S_BLIND));
        // BB may still raise or check; betting is not closed
        assert_eq!(game.turn(), Turn::Choice(1));
        let game = game.act(Action::Check);
        assert!(game.turn().is_chance());
    }

    #[test]
    fn raise_reopens_action() {
        let game = dealt(2, 2);
        let game = game.act(Action::Call(S_BLIND));
        let game = game.act(Action::RaiseTo(3 * B_BLIND));
        assert_eq!(game.turn(), Turn::Choice(0));
        let game = game.act(Action::Call(2 * B_BLIND));
        assert!(game.turn().is_chance());
    }

    #[test]
    fn all_in_runs_out_the_board_without_betting() {
        let ref mut rng = SmallRng::seed_from_u64(3);
        let game = dealt(2, 3);
        let game = game.act(Action::Shove);
        let game = game.act(Action::Call(game.to_call()));
        let game = game.deal(rng); // flop
        let game = game.deal(rng); // turn
        let game = game.deal(rng); // river
        assert!(game.turn().is_terminal());
        let net = game.settlements();
        assert_eq!(net.iter().sum::<Chips>(), 0);
    }

    #[test]
    fn pot_is_conserved() {
        let game = dealt(3, 4);
        let game = game.act(Action::RaiseTo(3 * B_BLIND));
        let game = game.act(Action::Fold);
        let game = game.act(Action::Fold);
        assert!(game.turn().is_terminal());
        assert_eq!(game.settlements().iter().sum::<Chips>(), 0);
    }
}
