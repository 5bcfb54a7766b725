mod priority;

use log::trace;
use rand::Rng;

pub use priority::{PrioritySampler, WeightedSampler};

use crate::{LoaderErr, Result, config::SamplingPolicy, plan::AccessOrder};

/// Chooses the batch to serve on every call.
///
/// Owns the sweep cursor and the last sampled id, so every loader instance carries its own
/// sampling state.
#[derive(Debug, Clone)]
pub struct Selector {
    policy: SamplingPolicy,
    current_batch: Option<usize>,
    current_sampled_id: Option<usize>,
}

impl Selector {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self {
            policy,
            current_batch: None,
            current_sampled_id: None,
        }
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// The last sweep position handed out, `None` before the first call.
    pub fn current_batch(&self) -> Option<usize> {
        self.current_batch
    }

    /// The last batch id handed out, `None` before the first call.
    pub fn current_sampled_id(&self) -> Option<usize> {
        self.current_sampled_id
    }

    /// Picks the next batch id according to the policy.
    ///
    /// # Arguments
    /// * `order` - The access order of the plan.
    /// * `priority` - The priority sampler, only consulted by the priority policy.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// The chosen batch id or an error if the plan is empty or the priority draw failed.
    pub fn select<P, R>(
        &mut self,
        order: &AccessOrder,
        priority: &mut P,
        rng: &mut R,
    ) -> Result<usize>
    where
        P: PrioritySampler,
        R: Rng + ?Sized,
    {
        if order.is_empty() {
            return Err(LoaderErr::Sampling("the batch plan is empty".into()));
        }

        let batch_id = match self.policy {
            SamplingPolicy::Sequential => self.advance(order)?,
            SamplingPolicy::Random => rng.random_range(0..order.len()),
            SamplingPolicy::Priority { power } if priority.epoch() > 1 => {
                priority.sample(power, rng)?
            }
            SamplingPolicy::Priority { .. } => self.advance(order)?,
        };

        trace!("{:?} selected batch {batch_id}", self.policy);
        self.current_sampled_id = Some(batch_id);
        Ok(batch_id)
    }

    /// Moves the cursor one position forward, wrapping around, and resolves it.
    fn advance(&mut self, order: &AccessOrder) -> Result<usize> {
        let next = match self.current_batch {
            Some(pos) => (pos + 1) % order.len(),
            None => 0,
        };

        let batch_id = order.resolve(next).ok_or_else(|| {
            LoaderErr::Sampling(format!("sweep position {next} is outside the access order"))
        })?;
        self.current_batch = Some(next);
        Ok(batch_id)
    }
}
