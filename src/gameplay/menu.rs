use super::action::AbstractAction;
use super::game::Action;
use super::game::Game;
use super::odds::Odds;
use crate::cards::Street;
use crate::Chips;
use crate::MAX_RAISE_REPEATS;
use serde::Deserialize;
use serde::Serialize;

/// the street- and position-dependent bet menus. the table is part of
/// the abstraction identity: its integer content feeds the abstraction
/// hash alongside the bucket counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuTable {
    rows: [[Vec<Odds>; 2]; 4],
}

impl Default for MenuTable {
    fn default() -> Self {
        use Odds as O;
        let pref = vec![O(1, 2), O(2, 3), O(3, 4), O(1, 1), O(3, 2), O(2, 1)];
        let flop_ip = O::GRID.to_vec();
        let flop_oop = vec![O(1, 3), O(1, 2), O(3, 4), O(1, 1), O(3, 2)];
        let turn_ip = vec![O(1, 2), O(3, 4), O(1, 1), O(3, 2)];
        let turn_oop = vec![O(1, 2), O(3, 4), O(1, 1)];
        let rive_ip = vec![O(1, 2), O(1, 1), O(2, 1)];
        let rive_oop = vec![O(1, 2), O(1, 1)];
        Self {
            rows: [
                [pref.clone(), pref],
                [flop_oop, flop_ip],
                [turn_oop, turn_ip],
                [rive_oop, rive_ip],
            ],
        }
    }
}

impl MenuTable {
    fn fractions(&self, street: Street, in_position: bool) -> &[Odds] {
        &self.rows[street as usize][in_position as usize]
    }

    /// flattened integer content, hashed into the abstraction identity
    pub fn digest_fields(&self) -> Vec<Chips> {
        let mut fields = Vec::new();
        for street in self.rows.iter() {
            for row in street.iter() {
                fields.push(row.len() as Chips);
                for odds in row.iter() {
                    fields.push(odds.0);
                    fields.push(odds.1);
                }
            }
        }
        fields
    }

    /// the legal abstract menu at the actor's decision. bets whose legal
    /// chip amounts collide are deduplicated (first fraction wins) so
    /// that back-mapping stays a bijection on the emitted menu.
    pub fn menu(&self, game: &Game) -> Vec<AbstractAction> {
        let actor = game.seat(game.actor());
        let to_call = game.to_call();
        let mut menu = Vec::new();
        if to_call > 0 {
            menu.push(AbstractAction::Fold);
        }
        menu.push(AbstractAction::CheckCall);
        let can_raise = actor.stack() > to_call;
        if can_raise && game.raises() < MAX_RAISE_REPEATS {
            let mut targets = Vec::new();
            for odds in self.fractions(game.street(), game.in_position(game.actor())) {
                if let Action::RaiseTo(target) = self.concretize(game, AbstractAction::Bet(*odds)) {
                    if !targets.contains(&target) {
                        targets.push(target);
                        menu.push(AbstractAction::Bet(*odds));
                    }
                }
            }
        }
        if can_raise && actor.stack() <= 2 * game.pot() {
            menu.push(AbstractAction::AllIn);
        }
        menu
    }

    /// back-map an abstract action to a concrete one: round the
    /// pot-fraction to the nearest chip, force at least a min-raise,
    /// clamp to stack (which converts the bet into a shove).
    pub fn concretize(&self, game: &Game, action: AbstractAction) -> Action {
        let actor = game.seat(game.actor());
        let to_call = game.to_call();
        match action {
            AbstractAction::Fold => Action::Fold,
            AbstractAction::CheckCall if to_call == 0 => Action::Check,
            AbstractAction::CheckCall => Action::Call(to_call),
            AbstractAction::AllIn => Action::Shove,
            AbstractAction::Bet(Odds(num, den)) => {
                let pot_after = game.pot() + to_call;
                let raise = (pot_after * num + den / 2) / den;
                let raise = raise.max(game.min_raise());
                let target = game.to_match() + raise;
                if target - actor.wagered() >= actor.stack() {
                    Action::Shove
                } else {
                    Action::RaiseTo(target)
                }
            }
        }
    }

    /// map a concrete action back onto the abstract menu. for raises the
    /// nearest menu sizing wins, ties to the smaller fraction; this is
    /// the inverse of `concretize` on everything the menu emits.
    pub fn abstracted(&self, game: &Game, concrete: Action) -> AbstractAction {
        let menu = self.menu(game);
        match concrete {
            Action::Fold => AbstractAction::Fold,
            Action::Check | Action::Call(_) => AbstractAction::CheckCall,
            Action::Shove if menu.contains(&AbstractAction::AllIn) => AbstractAction::AllIn,
            Action::Shove => {
                let all_in = game.seat(game.actor()).wagered() + game.seat(game.actor()).stack();
                self.nearest_bet(game, &menu, all_in)
            }
            Action::RaiseTo(target) => self.nearest_bet(game, &menu, target),
        }
    }

    fn nearest_bet(&self, game: &Game, menu: &[AbstractAction], target: Chips) -> AbstractAction {
        menu.iter()
            .copied()
            .filter_map(|a| match (a, self.concretize(game, a)) {
                (AbstractAction::Bet(_), Action::RaiseTo(t)) => Some((a, t)),
                _ => None,
            })
            .min_by_key(|(_, t)| (t - target).abs())
            .map(|(a, _)| a)
            .unwrap_or(AbstractAction::CheckCall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::Rng;
    use rand::SeedableRng;

    /// for every legal abstract action at
    /// many reachable states, concretize then re-abstract is identity.
    #[test]
    fn back_mapping_is_idempotent() {
        let table = MenuTable::default();
        for seed in 0..32u64 {
            let ref mut rng = SmallRng::seed_from_u64(seed);
            let mut game = Game::root(2 + (seed % 5) as usize);
            for _ in 0..64 {
                match game.turn() {
                    crate::gameplay::turn::Turn::Terminal => break,
                    crate::gameplay::turn::Turn::Chance => game = game.deal(rng),
                    crate::gameplay::turn::Turn::Choice(_) => {
                        let menu = table.menu(&game);
                        for action in menu.iter().copied() {
                            let concrete = table.concretize(&game, action);
                            assert_eq!(
                                action,
                                table.abstracted(&game, concrete),
                                "not idempotent at {:?} via {:?}",
                                action,
                                concrete,
                            );
                        }
                        let pick = menu[rng.random_range(0..menu.len())];
                        game = game.act(table.concretize(&game, pick));
                    }
                }
            }
        }
    }

    #[test]
    fn fold_requires_a_bet() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        let table = MenuTable::default();
        let game = Game::root(2).deal(rng);
        let game = game.act(Action::Call(crate::S_BLIND));
        // big blind checks through; no bet to fold to
        let menu = table.menu(&game);
        assert!(!menu.contains(&AbstractAction::Fold));
        assert!(menu.contains(&AbstractAction::CheckCall));
    }

    #[test]
    fn all_in_requires_a_shallow_stack() {
        let ref mut rng = SmallRng::seed_from_u64(6);
        let table = MenuTable::default();
        let game = Game::root(2).deal(rng);
        // 100bb deep at a 3-chip pot: no all-in in the menu
        assert!(!table.menu(&game).contains(&AbstractAction::AllIn));
    }

    #[test]
    fn bets_round_to_legal_raises() {
        let ref mut rng = SmallRng::seed_from_u64(7);
        let table = MenuTable::default();
        let game = Game::root(2).deal(rng);
        for action in table.menu(&game) {
            if let Action::RaiseTo(target) = table.concretize(&game, action) {
                assert!(target - game.to_match() >= game.min_raise());
            }
        }
    }
}
