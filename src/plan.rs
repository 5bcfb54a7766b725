use std::num::NonZeroUsize;

use log::{info, warn};
use rand::{Rng, seq::SliceRandom};

use crate::{LoaderErr, Result, resolver::ConfigId};

/// A contiguous, inclusive range `start..=end` of a configuration's expanded samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDescriptor {
    pub config: ConfigId,
    pub start: usize,
    pub end: usize,
}

impl BatchDescriptor {
    /// The amount of samples in the batch.
    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Every batch of an epoch, built once and never modified.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    batches: Vec<BatchDescriptor>,
}

impl BatchPlan {
    /// Splits the configurations' expanded samples into batches that never cross a
    /// configuration boundary.
    ///
    /// Configurations are walked in the given order. Whenever the next batch doesn't fit in the
    /// remainder of the current configuration the walk moves on to the next one, wrapping back
    /// to the first, until `total / batch_size` batches were emitted.
    ///
    /// # Arguments
    /// * `counts` - Each configuration with its expanded sample count, in planning order.
    /// * `batch_size` - The amount of samples per batch.
    /// * `strict` - Fail if any configuration's count is not a multiple of `batch_size`.
    ///
    /// # Returns
    /// The plan, or an error if the total is not divisible by `batch_size`, a configuration
    /// is misaligned in strict mode or no configuration can hold a single batch.
    pub fn build(
        counts: &[(ConfigId, usize)],
        batch_size: NonZeroUsize,
        strict: bool,
    ) -> Result<Self> {
        let batch_size = batch_size.get();
        let total: usize = counts.iter().map(|(_, n)| n).sum();

        if total % batch_size != 0 {
            return Err(LoaderErr::Divisibility { total, batch_size });
        }

        for (id, n) in counts {
            let rem = n % batch_size;
            if rem == 0 {
                continue;
            }

            if strict {
                return Err(LoaderErr::MisalignedConfig {
                    config: id.to_string(),
                    samples: *n,
                    batch_size,
                });
            }

            warn!("the last {rem} sample(s) of {id} will never be part of a batch");
        }

        if !counts.iter().any(|&(_, n)| n >= batch_size) {
            return Err(LoaderErr::InvalidConfig(format!(
                "no configuration holds a full batch of {batch_size} samples"
            )));
        }

        let num_batches = total / batch_size;
        let mut batches = Vec::with_capacity(num_batches);
        let mut current = 0;
        let mut offset = 0;

        for _ in 0..num_batches {
            while offset + batch_size > counts[current].1 {
                current = (current + 1) % counts.len();
                offset = 0;
            }

            batches.push(BatchDescriptor {
                config: counts[current].0.clone(),
                start: offset,
                end: offset + batch_size - 1,
            });
            offset += batch_size;
        }

        info!(
            "planned {num_batches} batch(es) of {batch_size} over {} config(s)",
            counts.len()
        );
        Ok(Self { batches })
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, batch_id: usize) -> Option<&BatchDescriptor> {
        self.batches.get(batch_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchDescriptor> {
        self.batches.iter()
    }
}

/// The order in which a sequential sweep visits the plan, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessOrder(Vec<usize>);

impl AccessOrder {
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut order: Vec<_> = (0..len).collect();
        order.shuffle(rng);
        Self(order)
    }

    /// The batch id visited at sweep position `pos`, `None` past the end of the sweep.
    pub fn resolve(&self, pos: usize) -> Option<usize> {
        self.0.get(pos).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}
