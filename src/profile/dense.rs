use super::delta::DeltaRecord;
use super::delta::Deltas;
use crate::gameplay::AbstractAction;
use crate::Probability;
use crate::REGRET_FLOOR;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// human-inspectable backend: one map per infoset from action to an
/// (f64 regret, f64 strategy mass) pair, kept in first-observed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseRecord {
    pub actions: Vec<AbstractAction>,
    pub regrets: Vec<f64>,
    pub strategy: Vec<f64>,
    synced_regret: f64,
    synced_strategy: f64,
}

impl DenseRecord {
    fn new(actions: &[AbstractAction], r_cum: f64, s_cum: f64) -> Self {
        Self {
            actions: actions.to_vec(),
            regrets: vec![0.0; actions.len()],
            strategy: vec![0.0; actions.len()],
            synced_regret: r_cum,
            synced_strategy: s_cum,
        }
    }
    /// bring pending lazy discounts up to date
    fn sync(&mut self, r_cum: f64, s_cum: f64) {
        let rf = r_cum / self.synced_regret;
        if rf != 1.0 {
            for r in self.regrets.iter_mut() {
                *r = (*r * rf).max(REGRET_FLOOR);
            }
            self.synced_regret = r_cum;
        }
        let sf = s_cum / self.synced_strategy;
        if sf != 1.0 {
            for s in self.strategy.iter_mut() {
                *s = (*s * sf).max(0.0);
            }
            self.synced_strategy = s_cum;
        }
    }
    fn slot(&mut self, action: &AbstractAction) -> usize {
        match self.actions.iter().position(|a| a == action) {
            Some(i) => i,
            None => {
                self.actions.push(*action);
                self.regrets.push(0.0);
                self.strategy.push(0.0);
                self.actions.len() - 1
            }
        }
    }
    fn regret_of(&self, action: &AbstractAction) -> f64 {
        self.actions
            .iter()
            .position(|a| a == action)
            .map(|i| self.regrets[i])
            .unwrap_or(0.0)
    }
    fn strategy_of(&self, action: &AbstractAction) -> f64 {
        self.actions
            .iter()
            .position(|a| a == action)
            .map(|i| self.strategy[i])
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseStore {
    records: BTreeMap<String, DenseRecord>,
    r_cum: f64,
    s_cum: f64,
    #[serde(skip)]
    journal: Option<HashMap<String, (Vec<f64>, Vec<f64>)>>,
}

impl Default for DenseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseStore {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            r_cum: 1.0,
            s_cum: 1.0,
            journal: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// regret matching+: probabilities proportional to positive regret,
    /// uniform when nothing is positive. absent records are uniform and
    /// are NOT created by this read.
    pub fn get_strategy(&mut self, key: &str, actions: &[AbstractAction]) -> Vec<Probability> {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        match self.records.get_mut(key) {
            None => uniform(actions.len()),
            Some(record) => {
                record.sync(r_cum, s_cum);
                matching(&actions.iter().map(|a| record.regret_of(a)).collect::<Vec<_>>())
            }
        }
    }

    /// pruning test: the record exists and every action is deep below
    /// the threshold
    pub fn all_below(&mut self, key: &str, threshold: f64) -> bool {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        match self.records.get_mut(key) {
            None => false,
            Some(record) => {
                record.sync(r_cum, s_cum);
                record.regrets.iter().all(|r| *r < threshold)
            }
        }
    }

    pub fn update_regret(
        &mut self,
        key: &str,
        actions: &[AbstractAction],
        action: &AbstractAction,
        regret: f64,
        weight: f64,
    ) {
        let record = self.touch(key, actions);
        let i = record.slot(action);
        record.regrets[i] = (record.regrets[i] + weight * regret).max(REGRET_FLOOR);
    }

    pub fn add_strategy(
        &mut self,
        key: &str,
        actions: &[AbstractAction],
        probs: &[Probability],
        weight: f64,
    ) {
        let record = self.touch(key, actions);
        for (action, p) in actions.iter().zip(probs.iter()) {
            let i = record.slot(action);
            record.strategy[i] += weight * *p as f64;
        }
    }

    /// normalized strategy mass; uniform when the infoset has never been
    /// visited on behalf of its acting player
    pub fn average_strategy(&mut self, key: &str, actions: &[AbstractAction]) -> Vec<Probability> {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        match self.records.get_mut(key) {
            None => uniform(actions.len()),
            Some(record) => {
                record.sync(r_cum, s_cum);
                averaged(&actions.iter().map(|a| record.strategy_of(a)).collect::<Vec<_>>())
            }
        }
    }

    pub fn discount(&mut self, regret_factor: f64, strategy_factor: f64) {
        assert!(regret_factor > 0.0 && strategy_factor >= 0.0);
        self.r_cum *= regret_factor;
        self.s_cum *= strategy_factor;
    }

    pub fn reset_regrets(&mut self) {
        let r_cum = self.r_cum;
        for record in self.records.values_mut() {
            record.regrets.iter_mut().for_each(|r| *r = 0.0);
            record.synced_regret = r_cum;
        }
    }

    /// apply every pending lazy discount so the tables are numerically
    /// current (always done before a snapshot)
    pub fn materialize(&mut self) {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        for record in self.records.values_mut() {
            record.sync(r_cum, s_cum);
        }
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &DenseRecord)> {
        self.records.iter()
    }

    // delta journaling for the parallel coordinator

    pub fn begin_deltas(&mut self) {
        self.journal = Some(HashMap::new());
    }

    fn touch(&mut self, key: &str, actions: &[AbstractAction]) -> &mut DenseRecord {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        let record = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| DenseRecord::new(actions, r_cum, s_cum));
        record.sync(r_cum, s_cum);
        if let Some(journal) = self.journal.as_mut() {
            journal
                .entry(key.to_string())
                .or_insert_with(|| (record.regrets.clone(), record.strategy.clone()));
        }
        record
    }

    pub fn take_deltas(&mut self) -> Deltas {
        let mut deltas = Deltas::default();
        if let Some(journal) = self.journal.take() {
            for (key, (base_r, base_s)) in journal {
                let record = self.records.get(&key).expect("journaled record exists");
                let regrets = record
                    .regrets
                    .iter()
                    .enumerate()
                    .map(|(i, r)| r - base_r.get(i).copied().unwrap_or(0.0))
                    .collect();
                let strategy = record
                    .strategy
                    .iter()
                    .enumerate()
                    .map(|(i, s)| s - base_s.get(i).copied().unwrap_or(0.0))
                    .collect();
                deltas.records.insert(
                    key,
                    DeltaRecord {
                        actions: record.actions.clone(),
                        regrets,
                        strategy,
                    },
                );
            }
        }
        deltas.compact()
    }

    /// merge a worker's deltas by summation
    pub fn merge(&mut self, deltas: &Deltas) {
        for (key, delta) in deltas.records.iter() {
            let record = self.touch(key, &delta.actions);
            for (action, (dr, ds)) in delta
                .actions
                .iter()
                .zip(delta.regrets.iter().zip(delta.strategy.iter()))
            {
                let i = record.slot(action);
                record.regrets[i] = (record.regrets[i] + dr).max(REGRET_FLOOR);
                record.strategy[i] = (record.strategy[i] + ds).max(0.0);
            }
        }
    }
}

/// regret matching+ on a regret vector
pub fn matching(regrets: &[f64]) -> Vec<Probability> {
    let positive = regrets.iter().map(|r| r.max(0.0)).collect::<Vec<_>>();
    let total = positive.iter().sum::<f64>();
    if total <= 0.0 {
        uniform(regrets.len())
    } else {
        positive.into_iter().map(|r| (r / total) as Probability).collect()
    }
}

/// normalize accumulated strategy mass
pub fn averaged(strategy: &[f64]) -> Vec<Probability> {
    let total = strategy.iter().sum::<f64>();
    if total <= 0.0 {
        uniform(strategy.len())
    } else {
        strategy.iter().map(|s| (s / total) as Probability).collect()
    }
}

pub fn uniform(n: usize) -> Vec<Probability> {
    vec![1.0 / n.max(1) as Probability; n]
}
