use serde::Deserialize;
use serde::Serialize;

/// one scheduled exploration change: at iteration `at`, move to `epsilon`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub at: usize,
    pub epsilon: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub initial: f32,
    pub base: Vec<Transition>,
    pub target_ips: f32,
    /// minimum infosets discovered per 1000 iterations
    pub min_growth: f32,
    pub early_ratio: f32,
    pub extend_ratio: f32,
    pub force_ratio: f32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial: 0.12,
            base: vec![
                Transition {
                    at: 100_000,
                    epsilon: 0.06,
                },
                Transition {
                    at: 1_000_000,
                    epsilon: 0.02,
                },
            ],
            target_ips: 35.0,
            min_growth: 10.0,
            early_ratio: 0.1,
            extend_ratio: 0.2,
            force_ratio: 0.3,
        }
    }
}

/// machine-performance-aware progression through a base epsilon
/// schedule. fast machines transition early, slow machines get slack,
/// and the force bound guarantees monotonic progress no matter what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveEpsilon {
    config: ScheduleConfig,
    next: usize,
    current: f32,
}

impl AdaptiveEpsilon {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            current: config.initial,
            config,
            next: 0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// resume support: fast-forward past transitions already taken
    pub fn seek(&mut self, iteration: usize, epsilon: f32) {
        self.current = epsilon;
        while self
            .config
            .base
            .get(self.next)
            .map(|t| t.at <= iteration)
            .unwrap_or(false)
        {
            self.next += 1;
        }
    }

    /// the decision table. returns the new epsilon when a transition
    /// fires, advancing the schedule.
    pub fn decide(&mut self, iteration: usize, ips: f32, growth: f32) -> Option<f32> {
        let transition = *self.config.base.get(self.next)?;
        let t = transition.at as f32;
        let earliest = t * (1.0 - self.config.early_ratio);
        let latest = t * (1.0 + self.config.extend_ratio);
        let i = iteration as f32;

        let met = ips >= 0.9 * self.config.target_ips && growth >= self.config.min_growth;
        let strongly = ips >= self.config.target_ips && growth >= 2.0 * self.config.min_growth;

        let fire = if i < earliest {
            false
        } else if i < t {
            strongly
        } else if i < latest {
            met
        } else {
            // latest and beyond, force bound included: unconditional
            true
        };
        if fire {
            self.next += 1;
            self.current = transition.epsilon;
            log::info!(
                "epsilon transition to {} at iteration {} (scheduled {})",
                transition.epsilon,
                iteration,
                transition.at,
            );
            Some(transition.epsilon)
        } else {
            None
        }
    }
}
