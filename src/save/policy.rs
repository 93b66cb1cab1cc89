use super::atomic;
use super::checkpoint::Metadata;
use crate::gameplay::AbstractAction;
use crate::profile::Store;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// the exported average policy: infoset key to a list of
/// (action token, probability), plus the metadata block that gates
/// compatibility. this is the blueprint artifact the resolver ships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub meta: Metadata,
    pub strategies: BTreeMap<String, Vec<(String, Probability)>>,
}

impl Policy {
    pub fn from_store(store: &mut Store, meta: Metadata) -> Self {
        let strategies = store
            .export()
            .into_iter()
            .map(|(key, actions, probs)| {
                (
                    key,
                    actions
                        .iter()
                        .map(|a| a.token())
                        .zip(probs)
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        Self { meta, strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// decode the action tokens back into the abstract menu
    pub fn lookup(&self, key: &str) -> Option<Vec<(AbstractAction, Probability)>> {
        self.strategies.get(key).map(|row| {
            row.iter()
                .map(|(token, p)| {
                    (
                        AbstractAction::from_token(token).expect("tokens written by export"),
                        *p,
                    )
                })
                .collect()
        })
    }

    pub fn save_json(&self, path: &Path, gzip: bool) -> Result<(), crate::Error> {
        let json = serde_json::to_vec(self)?;
        atomic::write_atomic_maybe_gz(path, &json, gzip)?;
        log::info!(
            "exported policy with {} infosets to {}",
            self.len(),
            path.display(),
        );
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, crate::Error> {
        let bytes = atomic::read_transparent(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// the resolver accepts either the JSON export or the raw main
    /// checkpoint file; the bincode header and the JSON brace disagree
    /// on the first byte, which is all the sniffing we need
    pub fn load_any(path: &Path) -> Result<Self, crate::Error> {
        let bytes = atomic::read_transparent(path)?;
        if bytes.first() == Some(&b'{') {
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            Ok(bincode::deserialize(&bytes)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Discount;

    fn meta() -> Metadata {
        Metadata {
            iteration: 10,
            epsilon: 0.1,
            elapsed_secs: 1,
            abstraction_hash: "h".to_string(),
            abstraction_params: String::new(),
            players: 2,
            rng_seed: 0,
            backend: "dense".to_string(),
            discount: Discount::default(),
        }
    }

    fn sample() -> Policy {
        let mut store = Store::dense();
        let actions = vec![
            AbstractAction::Fold,
            AbstractAction::CheckCall,
            AbstractAction::AllIn,
        ];
        store.add_strategy("v2:TURN:3:", &actions, &[0.1, 0.6, 0.3], 1.0);
        Policy::from_store(&mut store, meta())
    }

    #[test]
    fn lookup_decodes_tokens() {
        let policy = sample();
        let row = policy.lookup("v2:TURN:3:").unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row[1].0, AbstractAction::CheckCall);
        assert!((row[1].1 - 0.6).abs() < 1e-6);
        assert!(policy.lookup("v2:TURN:4:").is_none());
    }

    #[test]
    fn json_roundtrip_gzipped_or_not() {
        let dir = tempfile::tempdir().unwrap();
        let policy = sample();
        for gzip in [false, true] {
            let path = dir.path().join(format!("policy-{}.json", gzip));
            policy.save_json(&path, gzip).unwrap();
            let back = Policy::load_json(&path).unwrap();
            assert_eq!(back.len(), policy.len());
            let any = Policy::load_any(&path).unwrap();
            assert_eq!(any.len(), policy.len());
        }
    }

    #[test]
    fn bincode_main_file_loads_as_policy() {
        let dir = tempfile::tempdir().unwrap();
        let policy = sample();
        let path = dir.path().join("checkpoint_iter10.pkl");
        super::super::atomic::write_atomic(&path, &bincode::serialize(&policy).unwrap()).unwrap();
        let back = Policy::load_any(&path).unwrap();
        assert_eq!(back.len(), policy.len());
    }
}
