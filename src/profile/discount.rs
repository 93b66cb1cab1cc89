use serde::Deserialize;
use serde::Serialize;

/// DCFR-style discount schedule. factors are accumulated globally by
/// the store and applied lazily per record, so the per-iteration cost
/// is two multiplications instead of a full-table sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Discount {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub interval: usize,
}

impl Default for Discount {
    fn default() -> Self {
        Self {
            alpha: crate::DCFR_ALPHA,
            beta: crate::DCFR_BETA,
            gamma: crate::DCFR_GAMMA,
            interval: crate::DISCOUNT_INTERVAL,
        }
    }
}

impl Discount {
    pub fn due(&self, t: usize) -> bool {
        t > 0 && t % self.interval == 0
    }
    pub fn regret_factor(&self, t: usize) -> f64 {
        let x = t as f64 / (t as f64 + 1.0);
        x.powf(self.alpha) * x.powf(self.beta)
    }
    pub fn strategy_factor(&self, t: usize) -> f64 {
        let x = t as f64 / (t as f64 + 1.0);
        x.powf(self.gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_are_contractive() {
        let d = Discount::default();
        for t in 1..100 {
            assert!(d.regret_factor(t) < 1.0);
            assert!(d.regret_factor(t) > 0.0);
            assert!(d.strategy_factor(t) < 1.0);
        }
    }

    #[test]
    fn due_respects_the_interval() {
        let d = Discount {
            interval: 10,
            ..Discount::default()
        };
        assert!(!d.due(0));
        assert!(!d.due(5));
        assert!(d.due(10));
        assert!(d.due(20));
    }
}
