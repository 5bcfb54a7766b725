use log::debug;
use rand::Rng;
use rand_distr::{Distribution, weighted::WeightedIndex};

use crate::{LoaderErr, Result};

/// Weighted batch selection, fed with a training signal per batch.
pub trait PrioritySampler {
    /// Creates a sampler over `num_batches` batch ids.
    fn create(num_batches: usize) -> Self
    where
        Self: Sized;

    /// Draws a batch id, `power` controls how sharply the draw concentrates on heavy batches.
    fn sample<R: Rng + ?Sized>(&mut self, power: f64, rng: &mut R) -> Result<usize>;

    /// The amount of epochs observed so far, starting at 1.
    fn epoch(&self) -> usize;

    /// Records the latest training signal of a batch.
    fn record(&mut self, batch_id: usize, signal: f64);
}

/// A `PrioritySampler` drawing proportionally to `weight ^ power`, where a batch's weight is
/// its last recorded signal. Draws are uniform while every weight is zero.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    weights: Vec<f64>,
    seen: Vec<bool>,
    unseen: usize,
    epoch: usize,
}

impl WeightedSampler {
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl PrioritySampler for WeightedSampler {
    fn create(num_batches: usize) -> Self {
        Self {
            weights: vec![1.0; num_batches],
            seen: vec![false; num_batches],
            unseen: num_batches,
            epoch: 1,
        }
    }

    fn sample<R: Rng + ?Sized>(&mut self, power: f64, rng: &mut R) -> Result<usize> {
        if !power.is_finite() || power < 0.0 {
            return Err(LoaderErr::Sampling(format!(
                "priority power must be finite and non-negative, got {power}"
            )));
        }

        if self.weights.is_empty() {
            return Err(LoaderErr::Sampling("no batches to sample from".into()));
        }

        let max = self.weights.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            debug!("every priority weight is zero, drawing uniformly");
            return Ok(rng.random_range(0..self.weights.len()));
        }

        // Scaled into [0, 1] first so that `powf` can't overflow, the heaviest batch maps to 1.
        let powered = self.weights.iter().map(|w| (w / max).powf(power));
        let dist = WeightedIndex::new(powered).map_err(|e| LoaderErr::Sampling(e.to_string()))?;
        Ok(dist.sample(rng))
    }

    fn epoch(&self) -> usize {
        self.epoch
    }

    fn record(&mut self, batch_id: usize, signal: f64) {
        let Some(weight) = self.weights.get_mut(batch_id) else {
            debug!("ignoring signal for unknown batch {batch_id}");
            return;
        };

        *weight = if signal.is_finite() { signal.max(0.0) } else { 0.0 };

        if !self.seen[batch_id] {
            self.seen[batch_id] = true;
            self.unseen -= 1;
        }

        if self.unseen == 0 {
            self.epoch += 1;
            self.seen.fill(false);
            self.unseen = self.seen.len();
            debug!("priority sampler entering epoch {}", self.epoch);
        }
    }
}
