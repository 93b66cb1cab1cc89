use super::history::History;
use crate::abstraction::Bucketer;
use crate::abstraction::Context;
use crate::cards::Board;
use crate::cards::Hole;
use crate::cards::Street;

/// the sole identity the regret store knows about:
/// `v2:<STREET>:<bucket>:<history>`
/// deterministic across processes, platforms, and training runs.
pub fn encode(bucket: usize, street: Street, history: &History) -> (String, Street) {
    (
        format!("v2:{}:{}:{}", street.token(), bucket, history.serialize()),
        street,
    )
}

/// bucket the live cards and encode in one step
pub fn encode_game(
    bucketer: &Bucketer,
    hole: &Hole,
    board: &Board,
    street: Street,
    history: &History,
    ctx: &Context,
) -> (String, Street) {
    let bucket = bucketer.bucket_in_context(hole, board, street, ctx);
    encode(bucket, street, history)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub street: Street,
    pub bucket: usize,
    pub history: History,
}

/// inverse of `encode`. keys without the `v2:` prefix and keys with the
/// dotted-action history form are accepted for backward compatibility.
pub fn parse(key: &str) -> Result<Parsed, crate::Error> {
    let body = key.strip_prefix("v2:").unwrap_or(key);
    let mut parts = body.splitn(3, ':');
    let street = parts
        .next()
        .ok_or_else(|| crate::Error::MalformedKey(key.to_string()))
        .and_then(Street::from_token)?;
    let bucket = parts
        .next()
        .and_then(|b| b.parse::<usize>().ok())
        .ok_or_else(|| crate::Error::MalformedKey(key.to_string()))?;
    let history = History::parse(parts.next().unwrap_or(""))?;
    Ok(Parsed {
        street,
        bucket,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::AbstractAction;
    use crate::gameplay::Odds;

    /// the worked example from the key format definition
    #[test]
    fn turn_bucket_42_line() {
        let mut history = History::default();
        for action in [
            AbstractAction::CheckCall,
            AbstractAction::Bet(Odds(1, 2)),
            AbstractAction::CheckCall,
        ] {
            history.push(Street::Pref, action);
        }
        for action in [
            AbstractAction::CheckCall,
            AbstractAction::Bet(Odds(3, 4)),
            AbstractAction::CheckCall,
        ] {
            history.push(Street::Flop, action);
        }
        history.push(Street::Turn, AbstractAction::Bet(Odds(1, 1)));
        let (key, street) = encode(42, Street::Turn, &history);
        assert_eq!(key, "v2:TURN:42:PREFLOP:C-B50-C|FLOP:C-B75-C|TURN:B100");
        assert_eq!(street, Street::Turn);
    }

    #[test]
    fn roundtrip_recovers_street_and_bucket() {
        let mut history = History::default();
        history.push(Street::Pref, AbstractAction::Fold);
        let (key, _) = encode(7, Street::Pref, &history);
        let parsed = parse(&key).unwrap();
        assert_eq!(parsed.street, Street::Pref);
        assert_eq!(parsed.bucket, 7);
        assert_eq!(parsed.history, history);
    }

    #[test]
    fn legacy_unprefixed_keys_parse() {
        let parsed = parse("FLOP:13:PREFLOP:C-C").unwrap();
        assert_eq!(parsed.street, Street::Flop);
        assert_eq!(parsed.bucket, 13);
    }

    #[test]
    fn legacy_dotted_keys_parse() {
        let parsed = parse("v2:FLOP:13:PREFLOP:C.B50.C").unwrap();
        assert_eq!(parsed.history.at(Street::Pref).len(), 3);
    }

    #[test]
    fn empty_history_is_fine() {
        let (key, _) = encode(0, Street::Pref, &History::default());
        assert_eq!(key, "v2:PREFLOP:0:");
        assert_eq!(parse(&key).unwrap().bucket, 0);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse("v2:NOPE:1:").is_err());
        assert!(parse("v2:FLOP:notanumber:").is_err());
        assert!(parse("").is_err());
    }
}
