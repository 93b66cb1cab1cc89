use crate::cards::Street;
use crate::gameplay::AbstractAction;
use std::collections::BTreeMap;

/// the abstract betting line, grouped by street. streets serialize in
/// canonical order with `-` between tokens and `|` between streets:
/// `PREFLOP:C-B50-C|FLOP:C-B75-C`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct History(BTreeMap<Street, Vec<AbstractAction>>);

impl History {
    pub fn push(&mut self, street: Street, action: AbstractAction) {
        self.0.entry(street).or_default().push(action);
    }
    pub fn at(&self, street: Street) -> &[AbstractAction] {
        self.0.get(&street).map(|v| &v[..]).unwrap_or(&[])
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn streets(&self) -> impl Iterator<Item = (&Street, &Vec<AbstractAction>)> {
        self.0.iter()
    }

    pub fn serialize(&self) -> String {
        self.0
            .iter()
            .map(|(street, actions)| {
                format!(
                    "{}:{}",
                    street.token(),
                    actions
                        .iter()
                        .map(|a| a.token())
                        .collect::<Vec<_>>()
                        .join("-"),
                )
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    /// inverse of `serialize`. the legacy dotted-action form
    /// (`PREFLOP:C.B50.C`) is accepted for old keys.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let mut history = Self::default();
        if s.is_empty() {
            return Ok(history);
        }
        for segment in s.split('|') {
            let (street, actions) = segment
                .split_once(':')
                .ok_or_else(|| crate::Error::MalformedKey(format!("bad history segment {}", segment)))?;
            let street = Street::from_token(street)?;
            if actions.is_empty() {
                continue;
            }
            let sep = if actions.contains('.') { '.' } else { '-' };
            for token in actions.split(sep) {
                history.push(street, AbstractAction::from_token(token)?);
            }
        }
        Ok(history)
    }
}

impl std::fmt::Display for History {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Odds;

    fn line() -> History {
        let mut history = History::default();
        history.push(Street::Pref, AbstractAction::CheckCall);
        history.push(Street::Pref, AbstractAction::Bet(Odds(1, 2)));
        history.push(Street::Pref, AbstractAction::CheckCall);
        history.push(Street::Flop, AbstractAction::CheckCall);
        history.push(Street::Flop, AbstractAction::Bet(Odds(3, 4)));
        history.push(Street::Flop, AbstractAction::CheckCall);
        history.push(Street::Turn, AbstractAction::Bet(Odds(1, 1)));
        history
    }

    #[test]
    fn canonical_serialization() {
        assert_eq!(
            line().serialize(),
            "PREFLOP:C-B50-C|FLOP:C-B75-C|TURN:B100",
        );
    }

    #[test]
    fn roundtrip() {
        let history = line();
        assert_eq!(history, History::parse(&history.serialize()).unwrap());
    }

    #[test]
    fn dotted_legacy_form_parses() {
        let dotted = "PREFLOP:C.B50.C|FLOP:C.B75.C|TURN:B100";
        assert_eq!(line(), History::parse(dotted).unwrap());
    }

    #[test]
    fn streets_emit_in_order_regardless_of_insertion() {
        let mut history = History::default();
        history.push(Street::Turn, AbstractAction::Fold);
        history.push(Street::Pref, AbstractAction::CheckCall);
        assert_eq!(history.serialize(), "PREFLOP:C|TURN:F");
    }
}
