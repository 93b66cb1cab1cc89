use crate::gameplay::AbstractAction;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// the difference a worker's slice made to its local tables: plain data,
/// commutative under summation, so merge order never matters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deltas {
    pub records: HashMap<String, DeltaRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub actions: Vec<AbstractAction>,
    pub regrets: Vec<f64>,
    pub strategy: Vec<f64>,
}

impl Deltas {
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    /// drop all-zero rows so the channel carries only real work
    pub fn compact(mut self) -> Self {
        self.records.retain(|_, r| {
            r.regrets.iter().any(|x| *x != 0.0) || r.strategy.iter().any(|x| *x != 0.0)
        });
        self
    }
}
