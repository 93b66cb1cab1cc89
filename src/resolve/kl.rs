use crate::cards::Street;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// the KL-to-blueprint penalty at one decision: how far the resolve
/// strategy has wandered from its anchor
pub fn divergence(
    current: &[Probability],
    blueprint: &[Probability],
    clip_min: f32,
    epsilon0: f32,
) -> f32 {
    current
        .iter()
        .zip(blueprint.iter())
        .map(|(p, q)| p * ((p + epsilon0) / (q.max(clip_min) + epsilon0)).ln())
        .sum()
}

/// street- and position-dependent anchor weight
pub fn lambda(street: Street, in_position: bool, weights: &[f32; 3], oop_bonus: f32) -> f32 {
    let base = match street {
        Street::Pref | Street::Flop => weights[0],
        Street::Turn => weights[1],
        Street::Rive => weights[2],
    };
    if in_position {
        base
    } else {
        base + oop_bonus
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KlSummary {
    pub street: String,
    pub in_position: bool,
    pub count: usize,
    pub avg: f32,
    pub p50: f32,
    pub p90: f32,
    pub p99: f32,
    pub frac_above: f32,
}

/// per-street / per-position accumulator over one resolve call
#[derive(Debug, Clone, Default)]
pub struct KlStats {
    cells: HashMap<(Street, bool), Vec<f32>>,
    threshold: f32,
}

impl KlStats {
    pub fn new(threshold: f32) -> Self {
        Self {
            cells: HashMap::new(),
            threshold,
        }
    }

    pub fn push(&mut self, street: Street, in_position: bool, value: f32) {
        self.cells.entry((street, in_position)).or_default().push(value);
    }

    pub fn summaries(&self) -> Vec<KlSummary> {
        let mut out = Vec::new();
        for ((street, ip), values) in self.cells.iter() {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).expect("not NaN"));
            let n = sorted.len();
            let pick = |q: f32| sorted[((n - 1) as f32 * q) as usize];
            out.push(KlSummary {
                street: street.to_string(),
                in_position: *ip,
                count: n,
                avg: sorted.iter().sum::<f32>() / n as f32,
                p50: pick(0.50),
                p90: pick(0.90),
                p99: pick(0.99),
                frac_above: sorted.iter().filter(|v| **v > self.threshold).count() as f32
                    / n as f32,
            });
        }
        out.sort_by(|a, b| (a.street.clone(), a.in_position).cmp(&(b.street.clone(), b.in_position)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_is_zero_at_the_anchor() {
        let p = vec![0.5, 0.3, 0.2];
        let d = divergence(&p, &p, 1e-6, 1e-9);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn divergence_grows_away_from_the_anchor() {
        let anchor = vec![0.5, 0.3, 0.2];
        let near = vec![0.45, 0.35, 0.2];
        let far = vec![0.05, 0.05, 0.9];
        assert!(divergence(&near, &anchor, 1e-6, 1e-9) < divergence(&far, &anchor, 1e-6, 1e-9));
    }

    #[test]
    fn clip_bounds_the_log_term() {
        let p = vec![1.0, 0.0];
        let q = vec![0.0, 1.0];
        let d = divergence(&p, &q, 1e-6, 1e-9);
        assert!(d.is_finite());
    }

    #[test]
    fn oop_pays_the_bonus() {
        let w = crate::KL_LAMBDA;
        assert_eq!(lambda(Street::Flop, true, &w, 0.1), 0.30);
        assert!((lambda(Street::Flop, false, &w, 0.1) - 0.40).abs() < 1e-6);
        assert_eq!(lambda(Street::Rive, true, &w, 0.1), 0.70);
    }

    #[test]
    fn summaries_report_percentiles() {
        let mut stats = KlStats::new(0.5);
        for i in 0..100 {
            stats.push(Street::Flop, true, i as f32 / 100.0);
        }
        let s = &stats.summaries()[0];
        assert_eq!(s.count, 100);
        assert!((s.p50 - 0.49).abs() < 0.02);
        assert!((s.frac_above - 0.49).abs() < 0.02);
    }
}
