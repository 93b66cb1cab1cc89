use super::compact::CompactStore;
use super::delta::Deltas;
use super::dense::DenseStore;
use crate::gameplay::AbstractAction;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// the two regret-store backends behind one interface. a closed set of
/// variants with exhaustive dispatch: which one to run is a deployment
/// decision, not a correctness concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Store {
    Dense(DenseStore),
    Compact(CompactStore),
}

impl Store {
    pub fn dense() -> Self {
        Self::Dense(DenseStore::new())
    }
    pub fn compact() -> Self {
        Self::Compact(CompactStore::new())
    }
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Dense(_) => "dense",
            Self::Compact(_) => "compact",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Dense(s) => s.len(),
            Self::Compact(s) => s.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::Dense(s) => s.contains(key),
            Self::Compact(s) => s.contains(key),
        }
    }

    /// current strategy by regret matching+, aligned with `actions`
    pub fn get_strategy(&mut self, key: &str, actions: &[AbstractAction]) -> Vec<Probability> {
        match self {
            Self::Dense(s) => s.get_strategy(key, actions),
            Self::Compact(s) => s.get_strategy(key, actions),
        }
    }

    pub fn all_below(&mut self, key: &str, threshold: f64) -> bool {
        match self {
            Self::Dense(s) => s.all_below(key, threshold),
            Self::Compact(s) => s.all_below(key, threshold),
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
        match self {
            Self::Dense(s) => s.update_regret(key, actions, action, regret, weight),
            Self::Compact(s) => s.update_regret(key, actions, action, regret, weight),
        }
    }

    pub fn add_strategy(
        &mut self,
        key: &str,
        actions: &[AbstractAction],
        probs: &[Probability],
        weight: f64,
    ) {
        match self {
            Self::Dense(s) => s.add_strategy(key, actions, probs, weight),
            Self::Compact(s) => s.add_strategy(key, actions, probs, weight),
        }
    }

    pub fn average_strategy(&mut self, key: &str, actions: &[AbstractAction]) -> Vec<Probability> {
        match self {
            Self::Dense(s) => s.average_strategy(key, actions),
            Self::Compact(s) => s.average_strategy(key, actions),
        }
    }

    /// schedule a lazy per-infoset multiplication of both tables
    pub fn discount(&mut self, regret_factor: f64, strategy_factor: f64) {
        match self {
            Self::Dense(s) => s.discount(regret_factor, strategy_factor),
            Self::Compact(s) => s.discount(regret_factor, strategy_factor),
        }
    }

    /// zero all regrets, emulating a CFR+ reset
    pub fn reset_regrets(&mut self) {
        match self {
            Self::Dense(s) => s.reset_regrets(),
            Self::Compact(s) => s.reset_regrets(),
        }
    }

    /// serialize with all pending discounts materialized
    pub fn snapshot(&mut self) -> Result<Vec<u8>, crate::Error> {
        match self {
            Self::Dense(s) => s.materialize(),
            Self::Compact(s) => s.materialize(),
        }
        Ok(bincode::serialize(self)?)
    }

    pub fn restore(bytes: &[u8]) -> Result<Self, crate::Error> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// export rows: (key, actions in record order, average strategy)
    pub fn export(&mut self) -> Vec<(String, Vec<AbstractAction>, Vec<Probability>)> {
        match self {
            Self::Dense(s) => {
                s.materialize();
                s.records()
                    .map(|(key, record)| {
                        (
                            key.clone(),
                            record.actions.clone(),
                            super::dense::averaged(&record.strategy),
                        )
                    })
                    .collect()
            }
            Self::Compact(s) => {
                s.materialize();
                s.records()
                    .map(|(key, record)| {
                        (
                            key.clone(),
                            record.action_list(),
                            super::dense::averaged(
                                &record.strategy.iter().map(|x| *x as f64).collect::<Vec<_>>(),
                            ),
                        )
                    })
                    .collect()
            }
        }
    }

    // delta journaling

    pub fn begin_deltas(&mut self) {
        match self {
            Self::Dense(s) => s.begin_deltas(),
            Self::Compact(s) => s.begin_deltas(),
        }
    }
    pub fn take_deltas(&mut self) -> Deltas {
        match self {
            Self::Dense(s) => s.take_deltas(),
            Self::Compact(s) => s.take_deltas(),
        }
    }
    pub fn merge(&mut self, deltas: &Deltas) {
        match self {
            Self::Dense(s) => s.merge(deltas),
            Self::Compact(s) => s.merge(deltas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Odds;

    fn menu() -> Vec<AbstractAction> {
        vec![
            AbstractAction::Fold,
            AbstractAction::CheckCall,
            AbstractAction::Bet(Odds(1, 2)),
        ]
    }

    fn both() -> [Store; 2] {
        [Store::dense(), Store::compact()]
    }

    #[test]
    fn absent_records_are_uniform_and_not_created() {
        for mut store in both() {
            let probs = store.get_strategy("v2:FLOP:1:", &menu());
            assert_eq!(probs, vec![1.0 / 3.0; 3]);
            assert_eq!(store.len(), 0);
        }
    }

    #[test]
    fn regret_matching_is_a_distribution_and_uniform_iff_nonpositive() {
        for mut store in both() {
            let ref actions = menu();
            store.update_regret("k", actions, &actions[0], -5.0, 1.0);
            store.update_regret("k", actions, &actions[1], -1.0, 1.0);
            assert_eq!(store.get_strategy("k", actions), vec![1.0 / 3.0; 3]);
            store.update_regret("k", actions, &actions[1], 4.0, 1.0);
            store.update_regret("k", actions, &actions[2], 1.0, 1.0);
            let probs = store.get_strategy("k", actions);
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            assert_eq!(probs[0], 0.0);
            assert!((probs[1] - 0.75).abs() < 1e-6);
            assert!((probs[2] - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn strategy_sums_stay_nonnegative() {
        for mut store in both() {
            let ref actions = menu();
            store.add_strategy("k", actions, &[0.2, 0.5, 0.3], 2.0);
            store.discount(0.9, 0.5);
            store.add_strategy("k", actions, &[1.0, 0.0, 0.0], 1.0);
            let avg = store.average_strategy("k", actions);
            assert!(avg.iter().all(|p| *p >= 0.0));
            assert!((avg.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
    }

    /// lazy discounting must be indistinguishable from eager discounting
    #[test]
    fn lazy_discount_equals_eager() {
        for mut store in both() {
            let ref actions = menu();
            store.update_regret("k", actions, &actions[1], 10.0, 1.0);
            store.discount(0.5, 0.25);
            // no touch in between: the discount is still pending
            store.update_regret("k", actions, &actions[1], 1.0, 1.0);
            let probs = store.get_strategy("k", actions);
            // eager: 10 * 0.5 + 1 = 6 on action 1, all others zero
            assert_eq!(probs[1], 1.0);
            let bytes = store.snapshot().unwrap();
            let mut back = Store::restore(&bytes).unwrap();
            assert_eq!(back.get_strategy("k", actions), probs);
        }
    }

    #[test]
    fn reset_regrets_zeroes_but_keeps_strategy() {
        for mut store in both() {
            let ref actions = menu();
            store.update_regret("k", actions, &actions[2], 8.0, 1.0);
            store.add_strategy("k", actions, &[0.0, 0.0, 1.0], 1.0);
            store.reset_regrets();
            assert_eq!(store.get_strategy("k", actions), vec![1.0 / 3.0; 3]);
            let avg = store.average_strategy("k", actions);
            assert_eq!(avg[2], 1.0);
        }
    }

    #[test]
    fn regret_floor_clamps() {
        for mut store in both() {
            let ref actions = menu();
            store.update_regret("k", actions, &actions[0], -1e12, 1.0);
            assert!(store.all_below("k", crate::PRUNE_THRESHOLD) == false);
            store.update_regret("k", actions, &actions[1], -1e12, 1.0);
            store.update_regret("k", actions, &actions[2], -1e12, 1.0);
            assert!(store.all_below("k", crate::PRUNE_THRESHOLD));
        }
    }

    #[test]
    fn deltas_are_new_minus_snapshot_and_merge_by_summation() {
        for (mut local, mut main) in [(Store::dense(), Store::dense()), (Store::compact(), Store::compact())] {
            let ref actions = menu();
            local.update_regret("seen", actions, &actions[1], 3.0, 1.0);
            local.begin_deltas();
            local.update_regret("seen", actions, &actions[1], 2.0, 1.0);
            local.update_regret("new", actions, &actions[0], 7.0, 1.0);
            local.add_strategy("new", actions, &[1.0, 0.0, 0.0], 1.0);
            let deltas = local.take_deltas();
            // pre-batch history is not part of the delta
            assert_eq!(deltas.len(), 2);
            main.merge(&deltas);
            main.merge(&deltas);
            // merged twice: sums double
            let probs = main.get_strategy("seen", actions);
            assert_eq!(probs[1], 1.0);
            let probs = main.get_strategy("new", actions);
            assert_eq!(probs[0], 1.0);
        }
    }

    #[test]
    fn merge_order_is_irrelevant() {
        let ref actions = menu();
        let mut a = Store::dense();
        a.begin_deltas();
        a.update_regret("x", actions, &actions[0], 1.0, 1.0);
        let da = a.take_deltas();
        let mut b = Store::dense();
        b.begin_deltas();
        b.update_regret("x", actions, &actions[1], 2.0, 1.0);
        b.update_regret("y", actions, &actions[2], 3.0, 1.0);
        let db = b.take_deltas();

        let mut ab = Store::dense();
        ab.merge(&da);
        ab.merge(&db);
        let mut ba = Store::dense();
        ba.merge(&db);
        ba.merge(&da);
        assert_eq!(ab.get_strategy("x", actions), ba.get_strategy("x", actions));
        assert_eq!(ab.get_strategy("y", actions), ba.get_strategy("y", actions));
        assert_eq!(ab.len(), ba.len());
    }

    /// the all-zero-regret division by zero is absorbed, never raised
    #[test]
    fn zero_mass_falls_back_to_uniform() {
        for mut store in both() {
            let ref actions = menu();
            store.add_strategy("k", actions, &[0.0, 0.0, 0.0], 1.0);
            assert_eq!(store.average_strategy("k", actions), vec![1.0 / 3.0; 3]);
        }
    }
}
