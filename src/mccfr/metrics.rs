use std::collections::VecDeque;
use std::time::Duration;

/// one logging interval worth of observed training throughput
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub iterations: usize,
    pub discovered: usize,
    pub elapsed: Duration,
}

/// sliding window over recent logging intervals. the adaptive epsilon
/// scheduler reads its iteration rate and infoset discovery rate here.
#[derive(Debug, Clone)]
pub struct Window {
    samples: VecDeque<Sample>,
    cap: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Window {
    pub fn new(cap: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// iterations per second across the window
    pub fn ips(&self) -> f32 {
        let iters = self.samples.iter().map(|s| s.iterations).sum::<usize>();
        let secs = self
            .samples
            .iter()
            .map(|s| s.elapsed.as_secs_f32())
            .sum::<f32>();
        if secs <= 0.0 {
            0.0
        } else {
            iters as f32 / secs
        }
    }

    /// infosets discovered per 1000 iterations across the window
    pub fn growth(&self) -> f32 {
        let iters = self.samples.iter().map(|s| s.iterations).sum::<usize>();
        let found = self.samples.iter().map(|s| s.discovered).sum::<usize>();
        if iters == 0 {
            0.0
        } else {
            found as f32 * 1000.0 / iters as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_across_the_window() {
        let mut window = Window::new(4);
        for _ in 0..6 {
            window.push(Sample {
                iterations: 100,
                discovered: 5,
                elapsed: Duration::from_secs(2),
            });
        }
        // only the last 4 samples are retained: 400 iters over 8 secs
        assert_eq!(window.ips(), 50.0);
        assert_eq!(window.growth(), 50.0);
    }

    #[test]
    fn empty_window_reads_zero() {
        let window = Window::default();
        assert_eq!(window.ips(), 0.0);
        assert_eq!(window.growth(), 0.0);
    }
}
