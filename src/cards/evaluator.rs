use super::board::Board;
use super::card::Card;
use super::hole::Hole;
use super::rank::Rank;
use super::strength::Class;
use super::strength::Strength;

/// total order over 7-card holdings. pure function of its inputs, with
/// deterministic tie-breaks baked into the Strength packing.
pub fn rank_7card(hole: &Hole, board: &Board) -> Strength {
    let mut cards = board.cards();
    cards.extend_from_slice(&hole.cards());
    assert!(cards.len() == 7, "showdown requires a full board");
    evaluate(&cards)
}

/// evaluate any 5..=7 cards
pub fn evaluate(cards: &[Card]) -> Strength {
    let mut rank_counts = [0u8; 13];
    let mut suit_counts = [0u8; 4];
    let mut suit_masks = [0u16; 4];
    for card in cards {
        rank_counts[card.rank() as usize] += 1;
        suit_counts[card.suit() as usize] += 1;
        suit_masks[card.suit() as usize] |= 1 << (card.rank() as u8);
    }
    let rank_mask = suit_masks.iter().fold(0u16, |m, s| m | s);

    // straight flush
    if let Some(suit) = suit_counts.iter().position(|&n| n >= 5) {
        if let Some(hi) = straight_high(suit_masks[suit]) {
            return Strength::new(Class::StraightFlush, &[hi]);
        }
    }
    // quads
    if let Some(quad) = highest_with_count(&rank_counts, 4) {
        let kicker = descending(&rank_counts)
            .into_iter()
            .find(|r| *r != quad)
            .expect("seven cards span two ranks");
        return Strength::new(Class::Quads, &[quad, kicker]);
    }
    // full house. a second trips counts as the pair.
    let trips = pairs_of(&rank_counts, 3);
    let pairs = pairs_of(&rank_counts, 2);
    if let Some(&top) = trips.first() {
        let under = trips
            .get(1)
            .copied()
            .into_iter()
            .chain(pairs.first().copied())
            .max();
        if let Some(under) = under {
            return Strength::new(Class::FullHouse, &[top, under]);
        }
    }
    // flush
    if let Some(suit) = suit_counts.iter().position(|&n| n >= 5) {
        let ranks = mask_descending(suit_masks[suit]);
        return Strength::new(Class::Flush, &ranks[..5]);
    }
    // straight
    if let Some(hi) = straight_high(rank_mask) {
        return Strength::new(Class::Straight, &[hi]);
    }
    // trips
    if let Some(&top) = trips.first() {
        let kickers = descending(&rank_counts)
            .into_iter()
            .filter(|r| *r != top)
            .take(2)
            .collect::<Vec<_>>();
        return Strength::new(Class::Trips, &[&[top][..], &kickers[..]].concat());
    }
    // two pair
    if pairs.len() >= 2 {
        let kicker = descending(&rank_counts)
            .into_iter()
            .find(|r| *r != pairs[0] && *r != pairs[1])
            .expect("seven cards span three ranks");
        return Strength::new(Class::TwoPair, &[pairs[0], pairs[1], kicker]);
    }
    // one pair
    if let Some(&top) = pairs.first() {
        let kickers = descending(&rank_counts)
            .into_iter()
            .filter(|r| *r != top)
            .take(3)
            .collect::<Vec<_>>();
        return Strength::new(Class::OnePair, &[&[top][..], &kickers[..]].concat());
    }
    // high card
    let ranks = descending(&rank_counts);
    Strength::new(Class::HighCard, &ranks[..5.min(ranks.len())])
}

/// highest rank of a 5-run in the mask, including the wheel
fn straight_high(mask: u16) -> Option<Rank> {
    const RUN: u16 = 0b11111;
    for hi in (4..13usize).rev() {
        if mask >> (hi - 4) & RUN == RUN {
            return Some(Rank::from(hi as u8));
        }
    }
    const WHEEL: u16 = 0b1_0000_0000_1111;
    if mask & WHEEL == WHEEL {
        return Some(Rank::Five);
    }
    None
}

fn highest_with_count(counts: &[u8; 13], n: u8) -> Option<Rank> {
    (0..13usize)
        .rev()
        .find(|&r| counts[r] == n)
        .map(|r| Rank::from(r as u8))
}

/// ranks with exactly the given multiplicity, high to low
fn pairs_of(counts: &[u8; 13], n: u8) -> Vec<Rank> {
    (0..13usize)
        .rev()
        .filter(|&r| counts[r] == n)
        .map(|r| Rank::from(r as u8))
        .collect()
}

/// distinct ranks present, high to low
fn descending(counts: &[u8; 13]) -> Vec<Rank> {
    (0..13usize)
        .rev()
        .filter(|&r| counts[r] > 0)
        .map(|r| Rank::from(r as u8))
        .collect()
}

fn mask_descending(mask: u16) -> Vec<Rank> {
    (0..13u8)
        .rev()
        .filter(|r| mask >> r & 1 == 1)
        .map(Rank::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(s: &[&str]) -> Vec<Card> {
        s.iter().map(|c| c.parse().unwrap()).collect()
    }

    #[test]
    fn classes_are_ordered() {
        let quads = evaluate(&cards(&["As", "Ah", "Ad", "Ac", "2s", "3d", "4h"]));
        let house = evaluate(&cards(&["Ks", "Kh", "Kd", "2c", "2s", "3d", "4h"]));
        let flush = evaluate(&cards(&["As", "Ks", "8s", "5s", "2s", "3d", "4h"]));
        let straight = evaluate(&cards(&["As", "Kh", "Qd", "Jc", "Ts", "3d", "4h"]));
        assert!(quads > house);
        assert!(house > flush);
        assert!(flush > straight);
    }

    #[test]
    fn wheel_is_lowest_straight() {
        let wheel = evaluate(&cards(&["As", "2h", "3d", "4c", "5s", "9d", "Jh"]));
        let six_high = evaluate(&cards(&["2h", "3d", "4c", "5s", "6s", "9d", "Jh"]));
        assert_eq!(wheel.class(), Class::Straight);
        assert!(six_high > wheel);
    }

    #[test]
    fn steel_wheel_is_a_straight_flush() {
        let hand = evaluate(&cards(&["As", "2s", "3s", "4s", "5s", "9d", "Jh"]));
        assert_eq!(hand.class(), Class::StraightFlush);
    }

    #[test]
    fn kickers_break_pair_ties() {
        let ace_kicker = evaluate(&cards(&["Ks", "Kh", "Ad", "9c", "5s", "3d", "2h"]));
        let queen_kicker = evaluate(&cards(&["Kd", "Kc", "Qd", "9h", "5c", "3s", "2d"]));
        assert!(ace_kicker > queen_kicker);
    }

    #[test]
    fn double_trips_make_a_full_house() {
        let hand = evaluate(&cards(&["Ks", "Kh", "Kd", "2c", "2s", "2d", "4h"]));
        assert_eq!(hand.class(), Class::FullHouse);
    }

    #[test]
    fn identical_boards_tie() {
        let a = evaluate(&cards(&["As", "Kh", "Qd", "Jc", "Ts", "3d", "4h"]));
        let b = evaluate(&cards(&["Ad", "Ks", "Qh", "Jd", "Tc", "3s", "4c"]));
        assert_eq!(a, b);
    }
}
