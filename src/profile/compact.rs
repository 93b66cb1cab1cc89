use super::delta::DeltaRecord;
use super::delta::Deltas;
use super::dense::averaged;
use super::dense::matching;
use super::dense::uniform;
use crate::gameplay::AbstractAction;
use crate::gameplay::ActionTable;
use crate::Probability;
use crate::REGRET_FLOOR;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// memory-lean backend: parallel arrays of 32-bit action indices into
/// the process-wide action table and 32-bit floats. precision loss is
/// negligible for MCCFR, where values only matter relative to siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactRecord {
    pub actions: Vec<u32>,
    pub regrets: Vec<f32>,
    pub strategy: Vec<f32>,
    synced_regret: f64,
    synced_strategy: f64,
}

impl CompactRecord {
    fn new(actions: &[AbstractAction], r_cum: f64, s_cum: f64) -> Self {
        Self {
            actions: actions.iter().map(ActionTable::index).collect(),
            regrets: vec![0.0; actions.len()],
            strategy: vec![0.0; actions.len()],
            synced_regret: r_cum,
            synced_strategy: s_cum,
        }
    }
    fn sync(&mut self, r_cum: f64, s_cum: f64) {
        let rf = (r_cum / self.synced_regret) as f32;
        if rf != 1.0 {
            for r in self.regrets.iter_mut() {
                *r = (*r * rf).max(REGRET_FLOOR as f32);
            }
            self.synced_regret = r_cum;
        }
        let sf = (s_cum / self.synced_strategy) as f32;
        if sf != 1.0 {
            for s in self.strategy.iter_mut() {
                *s = (*s * sf).max(0.0);
            }
            self.synced_strategy = s_cum;
        }
    }
    fn slot(&mut self, action: &AbstractAction) -> usize {
        let index = ActionTable::index(action);
        match self.actions.iter().position(|a| *a == index) {
            Some(i) => i,
            None => {
                self.actions.push(index);
                self.regrets.push(0.0);
                self.strategy.push(0.0);
                self.actions.len() - 1
            }
        }
    }
    fn regret_of(&self, action: &AbstractAction) -> f64 {
        let index = ActionTable::index(action);
        self.actions
            .iter()
            .position(|a| *a == index)
            .map(|i| self.regrets[i] as f64)
            .unwrap_or(0.0)
    }
    fn strategy_of(&self, action: &AbstractAction) -> f64 {
        let index = ActionTable::index(action);
        self.actions
            .iter()
            .position(|a| *a == index)
            .map(|i| self.strategy[i] as f64)
            .unwrap_or(0.0)
    }
    pub fn action_list(&self) -> Vec<AbstractAction> {
        self.actions.iter().map(|i| ActionTable::at(*i)).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactStore {
    records: HashMap<String, CompactRecord>,
    r_cum: f64,
    s_cum: f64,
    #[serde(skip)]
    journal: Option<HashMap<String, (Vec<f32>, Vec<f32>)>>,
}

impl Default for CompactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactStore {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
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

    pub fn all_below(&mut self, key: &str, threshold: f64) -> bool {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        match self.records.get_mut(key) {
            None => false,
            Some(record) => {
                record.sync(r_cum, s_cum);
                record.regrets.iter().all(|r| (*r as f64) < threshold)
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
        record.regrets[i] =
            ((record.regrets[i] as f64 + weight * regret).max(REGRET_FLOOR)) as f32;
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
            record.strategy[i] = (record.strategy[i] as f64 + weight * *p as f64) as f32;
        }
    }

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

    pub fn materialize(&mut self) {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        for record in self.records.values_mut() {
            record.sync(r_cum, s_cum);
        }
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &CompactRecord)> {
        self.records.iter()
    }

    pub fn begin_deltas(&mut self) {
        self.journal = Some(HashMap::new());
    }

    fn touch(&mut self, key: &str, actions: &[AbstractAction]) -> &mut CompactRecord {
        let (r_cum, s_cum) = (self.r_cum, self.s_cum);
        let record = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| CompactRecord::new(actions, r_cum, s_cum));
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
                    .map(|(i, r)| (*r - base_r.get(i).copied().unwrap_or(0.0)) as f64)
                    .collect();
                let strategy = record
                    .strategy
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (*s - base_s.get(i).copied().unwrap_or(0.0)) as f64)
                    .collect();
                deltas.records.insert(
                    key,
                    DeltaRecord {
                        actions: record.action_list(),
                        regrets,
                        strategy,
                    },
                );
            }
        }
        deltas.compact()
    }

    pub fn merge(&mut self, deltas: &Deltas) {
        for (key, delta) in deltas.records.iter() {
            let record = self.touch(key, &delta.actions);
            for (action, (dr, ds)) in delta
                .actions
                .iter()
                .zip(delta.regrets.iter().zip(delta.strategy.iter()))
            {
                let i = record.slot(action);
                record.regrets[i] = ((record.regrets[i] as f64 + dr).max(REGRET_FLOOR)) as f32;
                record.strategy[i] = ((record.strategy[i] as f64 + ds).max(0.0)) as f32;
            }
        }
    }
}
