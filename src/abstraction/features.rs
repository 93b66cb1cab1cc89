use crate::cards::equity::uniform_range;
use crate::cards::evaluator::evaluate;
use crate::cards::rank_7card;
use crate::cards::sample_future_board;
use crate::cards::Board;
use crate::cards::Hole;
use crate::cards::Rank;
use crate::cards::Street;
use crate::Chips;
use crate::FEATURES_POSTFLOP;
use crate::FEATURES_PREFLOP;
use crate::STACK;
use rand::rngs::SmallRng;
use rand::Rng;

/// table context for the dimensions that depend on more than the cards.
/// lookups without a live table use the canonical defaults, which keeps
/// `bucket_of` a pure function of (hole, board, street).
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub spr: f32,
    pub in_position: bool,
    pub effective_stack: Chips,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            spr: 10.0,
            in_position: true,
            effective_stack: STACK,
        }
    }
}

/// preflop feature vector. equity comes from the fitted table.
pub fn preflop(hole: &Hole, equity: f32) -> [f32; FEATURES_PREFLOP] {
    let hi = hole.hi().rank() as u8 as f32;
    let lo = hole.lo().rank() as u8 as f32;
    let gap = hole.gap() as f32;
    let broadway = hole
        .cards()
        .iter()
        .filter(|c| c.rank() >= Rank::Ten)
        .count() as f32;
    [
        equity,
        hole.suited() as u8 as f32,
        hole.paired() as u8 as f32,
        hi / 12.0,
        lo / 12.0,
        gap / 12.0,
        (hole.gap() == 1) as u8 as f32,
        broadway / 2.0,
        (hole.hi().rank() == Rank::Ace) as u8 as f32,
        if hole.paired() { hi / 12.0 } else { 0.0 },
    ]
}

/// postflop feature vector: sampled equity, draws, board texture, and
/// the context buckets. all sampling goes through the caller's rng.
pub fn postflop(
    hole: &Hole,
    board: &Board,
    ctx: &Context,
    n_equity: usize,
    rng: &mut SmallRng,
) -> [f32; FEATURES_POSTFLOP] {
    let street = board.street();
    let (equity, ties) = sampled_equity(hole, board, n_equity, rng);
    let own = {
        let mut cards = board.cards();
        cards.extend_from_slice(&hole.cards());
        evaluate(&cards)
    };
    let board_only = evaluate(&board.cards());
    let board_ranks = board.cards().iter().map(|c| c.rank()).collect::<Vec<_>>();
    let board_top = board_ranks.iter().copied().max().expect("postflop board");
    let suits = suit_counts(hole, board);
    let board_suits = board.cards().iter().map(|c| c.suit() as usize).fold(
        [0u8; 4],
        |mut acc, s| {
            acc[s] += 1;
            acc
        },
    );
    let distinct_suits = board_suits.iter().filter(|&&n| n > 0).count();
    let flush_cards = suits.iter().copied().max().unwrap_or(0);
    let flush_suit = suits.iter().position(|&n| n == flush_cards).expect("suit");
    let hole_in_suit = hole.cards().iter().filter(|c| c.suit() as usize == flush_suit).count();
    let flush_draw = flush_cards == 4 && hole_in_suit >= 1;
    let backdoor = street == Street::Flop && flush_cards == 3 && hole_in_suit >= 1;
    let nut_draw = flush_draw
        && hole
            .cards()
            .iter()
            .any(|c| c.suit() as usize == flush_suit && c.rank() == Rank::Ace);
    let straight_outs = straight_outs(hole, board);
    let overcards = hole
        .cards()
        .iter()
        .filter(|c| c.rank() > board_top)
        .count() as f32;
    let top_pair = hole.cards().iter().any(|c| c.rank() == board_top);
    let under_pair = !top_pair
        && hole
            .cards()
            .iter()
            .any(|c| board_ranks.contains(&c.rank()));
    let straightness = longest_run(&board_ranks) as f32;
    let connectivity = {
        let mut sorted = board_ranks.iter().map(|r| *r as u8).collect::<Vec<_>>();
        sorted.sort();
        sorted.windows(2).filter(|w| w[1] - w[0] == 1).count() as f32
    };
    let paired_board = board_only.class() >= crate::cards::strength::Class::OnePair;
    let high_board = board_ranks.iter().filter(|r| **r >= Rank::Ten).count() as f32;
    let low_board = board_ranks.iter().all(|r| *r <= Rank::Nine);
    let spr_bucket = spr_bucket(ctx.spr);
    let stack_bucket = stack_bucket(ctx.effective_stack);
    [
        equity,
        own.class() as u8 as f32 / 8.0,
        flush_draw as u8 as f32,
        backdoor as u8 as f32,
        (straight_outs >= 2) as u8 as f32,
        (straight_outs == 1) as u8 as f32,
        overcards / 2.0,
        top_pair as u8 as f32,
        under_pair as u8 as f32,
        (own.class() >= crate::cards::strength::Class::Trips) as u8 as f32,
        paired_board as u8 as f32,
        (distinct_suits == 1) as u8 as f32,
        (distinct_suits == 2) as u8 as f32,
        (distinct_suits >= 3) as u8 as f32,
        straightness / 5.0,
        board_top as u8 as f32 / 12.0,
        connectivity / 4.0,
        high_board / 5.0,
        hole.hi().rank() as u8 as f32 / 12.0,
        hole.suited() as u8 as f32,
        hole.paired() as u8 as f32,
        spr_bucket as f32 / 5.0,
        ctx.in_position as u8 as f32,
        stack_bucket as f32 / 5.0,
        street as usize as f32 / 3.0,
        ties,
        nut_draw as u8 as f32,
        distinct_suits as f32 / 4.0,
        hole.gap() as f32 / 12.0,
        low_board as u8 as f32,
        ((distinct_suits == 2) && straightness >= 3.0) as u8 as f32,
        equity * equity,
        equity * spr_bucket as f32 / 5.0,
        1.0,
    ]
}

/// one monte-carlo pass yields both mean equity and the tie rate
fn sampled_equity(hole: &Hole, board: &Board, n: usize, rng: &mut SmallRng) -> (f32, f32) {
    let mut blocked = hole.cards().to_vec();
    blocked.extend(board.cards());
    let range = uniform_range(&blocked);
    let mut won = 0f64;
    let mut tied = 0f64;
    for _ in 0..n.max(1) {
        let (ref theirs, _) = range[rng.random_range(0..range.len())];
        let mut excluded = hole.cards().to_vec();
        excluded.extend_from_slice(&theirs.cards());
        let runout = sample_future_board(board, &excluded, Street::Rive, rng);
        match rank_7card(hole, &runout).cmp(&rank_7card(theirs, &runout)) {
            std::cmp::Ordering::Greater => won += 1.0,
            std::cmp::Ordering::Equal => {
                won += 0.5;
                tied += 1.0;
            }
            std::cmp::Ordering::Less => {}
        }
    }
    ((won / n.max(1) as f64) as f32, (tied / n.max(1) as f64) as f32)
}

fn suit_counts(hole: &Hole, board: &Board) -> [u8; 4] {
    let mut counts = [0u8; 4];
    for card in hole.cards().iter().chain(board.cards().iter()) {
        counts[card.suit() as usize] += 1;
    }
    counts
}

/// distinct ranks that would complete a 5-run through a hole card
fn straight_outs(hole: &Hole, board: &Board) -> usize {
    let mut mask = 0u16;
    for card in hole.cards().iter().chain(board.cards().iter()) {
        mask |= 1 << (card.rank() as u8);
    }
    let hole_mask = hole
        .cards()
        .iter()
        .fold(0u16, |m, c| m | 1 << (c.rank() as u8));
    (0..13u8)
        .filter(|r| mask >> r & 1 == 0)
        .filter(|&r| {
            let filled = mask | 1 << r;
            runs().any(|run| run & hole_mask != 0 && filled & run == run)
        })
        .count()
}

/// all 5-run windows, wheel included
fn runs() -> impl Iterator<Item = u16> {
    const WHEEL: u16 = 0b1_0000_0000_1111;
    (0..9u8)
        .map(|lo| 0b11111u16 << lo)
        .chain(std::iter::once(WHEEL))
}

fn longest_run(ranks: &[Rank]) -> usize {
    let mask = ranks.iter().fold(0u16, |m, r| m | 1 << (*r as u8));
    let mask = mask | (mask >> 12 & 1); // ace plays low
    let mut best = 0;
    let mut run = 0;
    for i in 0..13 {
        if mask >> i & 1 == 1 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

fn spr_bucket(spr: f32) -> usize {
    match spr {
        s if s < 1.0 => 0,
        s if s < 2.0 => 1,
        s if s < 4.0 => 2,
        s if s < 8.0 => 3,
        s if s < 16.0 => 4,
        _ => 5,
    }
}

fn stack_bucket(stack: Chips) -> usize {
    match stack {
        s if s < 20 => 0,
        s if s < 50 => 1,
        s if s < 100 => 2,
        s if s < 150 => 3,
        s if s < 250 => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::cards::Card;

    fn board(cards: &[&str]) -> Board {
        Board::from(cards.iter().map(|c| c.parse::<Card>().unwrap()).collect::<Vec<_>>())
    }

    #[test]
    fn preflop_has_the_right_arity() {
        let hole: Hole = "AsKs".parse().unwrap();
        let f = preflop(&hole, 0.67);
        assert_eq!(f.len(), FEATURES_PREFLOP);
        assert_eq!(f[1], 1.0); // suited
        assert_eq!(f[2], 0.0); // not paired
    }

    #[test]
    fn flush_draw_is_detected() {
        let hole: Hole = "AsKs".parse().unwrap();
        let f = postflop(
            &hole,
            &board(&["Qs", "7s", "2d"]),
            &Context::default(),
            8,
            &mut SmallRng::seed_from_u64(1),
        );
        assert_eq!(f[2], 1.0, "flush draw");
        assert_eq!(f[26], 1.0, "nut flush draw");
    }

    #[test]
    fn open_ender_counts_two_outs() {
        let hole: Hole = "9h8h".parse().unwrap();
        assert_eq!(straight_outs(&hole, &board(&["7s", "6d", "2c"])), 2);
    }

    #[test]
    fn gutshot_counts_one_out() {
        let hole: Hole = "9h8h".parse().unwrap();
        assert_eq!(straight_outs(&hole, &board(&["6s", "5d", "Ac"])), 1);
    }
}
