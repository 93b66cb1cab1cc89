use super::game::Game;
use crate::cards::rank_7card;
use crate::cards::Strength;
use crate::Chips;

/// settle a terminal hand: refund any uncalled wager, then award the
/// pot(s). side pots fall out of the contribution levels of the live
/// seats; odd chips go to the earliest winning seat. returns net chips.
pub fn settle(game: &Game) -> Vec<Chips> {
    let n = game.n();
    let spent = (0..n).map(|i| game.seat(i).spent()).collect::<Vec<_>>();
    let live = (0..n).map(|i| game.seat(i).live()).collect::<Vec<_>>();
    let mut contrib = spent.clone();
    let mut payout = vec![0 as Chips; n];

    // uncalled portion of the largest wager goes back to its owner
    if let Some(top) = (0..n).filter(|&i| live[i]).max_by_key(|&i| contrib[i]) {
        let called = (0..n)
            .filter(|&i| i != top)
            .map(|i| contrib[i])
            .max()
            .unwrap_or(0);
        if contrib[top] > called {
            payout[top] += contrib[top] - called;
            contrib[top] = called;
        }
    }

    let survivors = (0..n).filter(|&i| live[i]).collect::<Vec<_>>();
    if let [winner] = survivors[..] {
        payout[winner] += contrib.iter().sum::<Chips>();
        return net(payout, spent);
    }

    let strengths = (0..n)
        .map(|i| live[i].then(|| rank_7card(&game.hole(i), &game.board())))
        .collect::<Vec<Option<Strength>>>();

    let mut levels = survivors.iter().map(|&i| contrib[i]).collect::<Vec<_>>();
    levels.sort();
    levels.dedup();

    let mut prev = 0;
    let mut awarded = 0;
    let mut last_winners = Vec::new();
    for level in levels {
        let pot = contrib
            .iter()
            .map(|&c| c.min(level) - c.min(prev))
            .sum::<Chips>();
        let eligible = survivors
            .iter()
            .copied()
            .filter(|&i| contrib[i] >= level)
            .collect::<Vec<_>>();
        let best = eligible
            .iter()
            .map(|&i| strengths[i].expect("live seat has a strength"))
            .max()
            .expect("eligible seats at every level");
        let winners = eligible
            .into_iter()
            .filter(|&i| strengths[i] == Some(best))
            .collect::<Vec<_>>();
        let share = pot / winners.len() as Chips;
        let mut odd = pot % winners.len() as Chips;
        for &w in winners.iter() {
            payout[w] += share;
            if odd > 0 {
                payout[w] += 1;
                odd -= 1;
            }
        }
        awarded += pot;
        last_winners = winners;
        prev = level;
    }

    // chips a folder stranded above the top live level (cannot arise in
    // normal play, but the pot must always balance)
    let leftover = contrib.iter().sum::<Chips>() - awarded;
    if leftover > 0 {
        let share = leftover / last_winners.len() as Chips;
        let mut odd = leftover % last_winners.len() as Chips;
        for &w in last_winners.iter() {
            payout[w] += share;
            if odd > 0 {
                payout[w] += 1;
                odd -= 1;
            }
        }
    }
    net(payout, spent)
}

fn net(payout: Vec<Chips>, spent: Vec<Chips>) -> Vec<Chips> {
    payout
        .into_iter()
        .zip(spent)
        .map(|(won, paid)| won - paid)
        .collect()
}
