use super::atomic;
use super::policy::Policy;
use crate::profile::Discount;
use crate::profile::Store;
use crate::Error;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// everything a checkpoint knows about itself. stored twice: inside the
/// main state file and again as a separately-readable JSON sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub iteration: usize,
    pub epsilon: f32,
    pub elapsed_secs: u64,
    pub abstraction_hash: String,
    pub abstraction_params: String,
    pub players: usize,
    pub rng_seed: u64,
    pub backend: String,
    pub discount: Discount,
}

/// a checkpoint is three sibling files; it is complete iff all exist
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub main: PathBuf,
    pub metadata: PathBuf,
    pub regrets: PathBuf,
}

impl Artifacts {
    pub fn at(dir: &Path, iteration: usize) -> Self {
        Self {
            main: dir.join(format!("checkpoint_iter{}.pkl", iteration)),
            metadata: dir.join(format!("checkpoint_iter{}_metadata.json", iteration)),
            regrets: dir.join(format!("checkpoint_iter{}_regrets.pkl", iteration)),
        }
    }
    pub fn complete(&self) -> bool {
        self.main.exists() && self.metadata.exists() && self.regrets.exists()
    }
    pub fn missing(&self) -> Vec<String> {
        [&self.main, &self.metadata, &self.regrets]
            .into_iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect()
    }
}

/// write all three artifacts atomically: regrets and policy first, the
/// metadata sidecar last, so a crash can only ever leave an incomplete
/// (and therefore skipped) checkpoint.
pub fn save(
    dir: &Path,
    store: &mut Store,
    meta: &Metadata,
    gzip_json: bool,
) -> Result<Artifacts, Error> {
    let artifacts = Artifacts::at(dir, meta.iteration);
    let regrets = store.snapshot()?;
    atomic::write_atomic(&artifacts.regrets, &regrets)?;
    let policy = Policy::from_store(store, meta.clone());
    atomic::write_atomic(&artifacts.main, &bincode::serialize(&policy)?)?;
    let json = serde_json::to_vec_pretty(meta)?;
    atomic::write_atomic_maybe_gz(&artifacts.metadata, &json, gzip_json)?;
    log::info!(
        "checkpoint saved at iteration {} under {}",
        meta.iteration,
        dir.display(),
    );
    Ok(artifacts)
}

/// list candidate checkpoints, newest first, filtered to complete ones.
/// incomplete candidates are logged and skipped, never accepted.
pub fn complete_checkpoints(dir: &Path) -> Vec<usize> {
    let mut iterations = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return iterations,
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(n) = name
            .strip_prefix("checkpoint_iter")
            .and_then(|s| s.strip_suffix("_metadata.json"))
            .and_then(|s| s.parse::<usize>().ok())
        else {
            continue;
        };
        let artifacts = Artifacts::at(dir, n);
        if artifacts.complete() {
            iterations.push(n);
        } else {
            log::warn!(
                "skipping incomplete checkpoint {} (missing {:?})",
                n,
                artifacts.missing(),
            );
        }
    }
    iterations.sort_unstable_by(|a, b| b.cmp(a));
    iterations
}

/// read one checkpoint's metadata without touching the heavy files
pub fn read_metadata(dir: &Path, iteration: usize) -> Result<Metadata, Error> {
    let artifacts = Artifacts::at(dir, iteration);
    if !artifacts.metadata.exists() {
        return Err(Error::CheckpointIncomplete(
            artifacts.metadata.display().to_string(),
        ));
    }
    let bytes = atomic::read_transparent(&artifacts.metadata)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// load a checkpoint, refusing on any compatibility mismatch. program
/// state is untouched on failure: nothing is mutated until every
/// validation has passed.
pub fn load(
    dir: &Path,
    iteration: usize,
    expect_hash: &str,
    expect_params: &str,
    expect_players: usize,
) -> Result<(Store, Metadata), Error> {
    let artifacts = Artifacts::at(dir, iteration);
    if let Some(missing) = artifacts.missing().first() {
        return Err(Error::CheckpointIncomplete(missing.clone()));
    }
    let meta = read_metadata(dir, iteration)?;
    if meta.abstraction_hash != expect_hash {
        return Err(Error::AbstractionMismatch {
            current: format!("{} [{}]", expect_hash, expect_params),
            stored: format!("{} [{}]", meta.abstraction_hash, meta.abstraction_params),
            detail: "refusing to mix abstractions".to_string(),
        });
    }
    if meta.players != expect_players {
        return Err(Error::PlayerCountMismatch {
            current: expect_players,
            stored: meta.players,
        });
    }
    let bytes = std::fs::read(&artifacts.regrets)?;
    let store = Store::restore(&bytes)?;
    Ok((store, meta))
}

/// resume from the most recent complete checkpoint, or fail explicitly
pub fn resume(
    dir: &Path,
    expect_hash: &str,
    expect_params: &str,
    expect_players: usize,
) -> Result<(Store, Metadata), Error> {
    let latest = complete_checkpoints(dir)
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoCheckpoint(dir.display().to_string()))?;
    log::info!("resuming from checkpoint at iteration {}", latest);
    load(dir, latest, expect_hash, expect_params, expect_players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::AbstractAction;

    fn meta(iteration: usize) -> Metadata {
        Metadata {
            iteration,
            epsilon: 0.06,
            elapsed_secs: 10,
            abstraction_hash: "abc123".to_string(),
            abstraction_params: "clusters=[24, 80, 80, 64] players=2".to_string(),
            players: 2,
            rng_seed: 7,
            backend: "dense".to_string(),
            discount: Discount::default(),
        }
    }

    fn store_with_data() -> Store {
        let mut store = Store::dense();
        let actions = vec![AbstractAction::Fold, AbstractAction::CheckCall];
        store.update_regret("v2:PREFLOP:1:", &actions, &actions[1], 2.0, 1.0);
        store.add_strategy("v2:PREFLOP:1:", &actions, &[0.25, 0.75], 1.0);
        store
    }

    #[test]
    fn roundtrip_and_resume() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_data();
        save(dir.path(), &mut store, &meta(100), false).unwrap();
        save(dir.path(), &mut store, &meta(200), true).unwrap();
        let (mut back, m) = resume(dir.path(), "abc123", "", 2).unwrap();
        assert_eq!(m.iteration, 200);
        let actions = vec![AbstractAction::Fold, AbstractAction::CheckCall];
        let probs = back.get_strategy("v2:PREFLOP:1:", &actions);
        assert_eq!(probs[1], 1.0);
    }

    #[test]
    fn incomplete_checkpoints_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_data();
        save(dir.path(), &mut store, &meta(100), false).unwrap();
        save(dir.path(), &mut store, &meta(200), false).unwrap();
        // break the newest one
        std::fs::remove_file(Artifacts::at(dir.path(), 200).regrets).unwrap();
        let (_, m) = resume(dir.path(), "abc123", "", 2).unwrap();
        assert_eq!(m.iteration, 100, "must fall back to the complete one");
    }

    #[test]
    fn hash_mismatch_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_data();
        save(dir.path(), &mut store, &meta(100), false).unwrap();
        let err = resume(dir.path(), "different", "", 2).unwrap_err();
        assert!(matches!(err, Error::AbstractionMismatch { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn player_count_mismatch_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_data();
        save(dir.path(), &mut store, &meta(100), false).unwrap();
        let err = resume(dir.path(), "abc123", "", 6).unwrap_err();
        assert!(matches!(err, Error::PlayerCountMismatch { .. }));
    }

    #[test]
    fn empty_logdir_fails_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let err = resume(dir.path(), "abc123", "", 2).unwrap_err();
        assert!(matches!(err, Error::NoCheckpoint(_)));
    }

    #[test]
    fn missing_file_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_data();
        save(dir.path(), &mut store, &meta(100), false).unwrap();
        std::fs::remove_file(Artifacts::at(dir.path(), 100).main).unwrap();
        let err = load(dir.path(), 100, "abc123", "", 2).unwrap_err();
        match err {
            Error::CheckpointIncomplete(name) => assert!(name.contains("checkpoint_iter100.pkl")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
