use std::collections::{BTreeSet, HashMap};

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    LoaderErr, Result,
    assembler::{Assembler, Batch},
    config::{Device, LoaderConfig},
    error::check,
    memory,
    plan::{AccessOrder, BatchDescriptor, BatchPlan},
    resolver::{self, ConfigId},
    sampling::{PrioritySampler, Selector, WeightedSampler},
    store::{ConfigRecord, DatasetStore},
};

/// Serves fixed-size training batches out of a dataset of unevenly sized configurations.
///
/// Everything is decided at construction: which configurations take part, how their samples
/// are split into batches and the order of a sequential sweep. Afterwards only the sampling
/// cursor moves, so a loader is meant to be driven by a single caller.
pub struct TrajectoryLoader<P: PrioritySampler = WeightedSampler> {
    configs: Vec<ConfigId>,
    records: HashMap<ConfigId, ConfigRecord>,
    plan: BatchPlan,
    order: AccessOrder,
    selector: Selector,
    priority: P,
    assembler: Assembler,
    device: Device,
    rng: StdRng,
}

impl TrajectoryLoader<WeightedSampler> {
    /// Creates a new `TrajectoryLoader` with the default priority sampler.
    ///
    /// # Arguments
    /// * `config` - The loader's configuration.
    /// * `store` - The store the dataset is loaded from.
    ///
    /// # Returns
    /// The loader or an error if the config is invalid, the dataset can't be loaded or the
    /// resolved configurations can't be split into batches.
    pub fn new<S: DatasetStore + ?Sized>(config: LoaderConfig, store: &S) -> Result<Self> {
        Self::with_sampler(config, store)
    }
}

impl<P: PrioritySampler> TrajectoryLoader<P> {
    /// Creates a new `TrajectoryLoader` using `P` as its priority sampler.
    ///
    /// # Arguments
    /// * `config` - The loader's configuration.
    /// * `store` - The store the dataset is loaded from.
    ///
    /// # Returns
    /// The loader or an error if the config is invalid, the dataset can't be loaded or the
    /// resolved configurations can't be split into batches.
    pub fn with_sampler<S>(config: LoaderConfig, store: &S) -> Result<Self>
    where
        S: DatasetStore + ?Sized,
    {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut loaded = store.load(&config.dataset_name)?;
        info!(
            "dataset {} has {} config(s)",
            config.dataset_name,
            loaded.len()
        );

        let available: BTreeSet<_> = loaded.keys().cloned().collect();
        let configs = resolver::resolve(
            &config.specified_configs,
            &available,
            config.shuffle,
            &mut rng,
        )?;

        let mut records = HashMap::with_capacity(configs.len());
        for id in &configs {
            let record = loaded.remove(id).ok_or_else(|| {
                LoaderErr::ConfigMismatch(format!("{id} was resolved but is not in the dataset"))
            })?;

            check("particle count", record.num_particles(), id.particles())?;
            check("goo count", record.goos().count(), id.goos())?;
            check("window length", record.window(), config.window_size.get())?;
            records.insert(id.clone(), record);
        }
        let unused = loaded.len();
        memory::release(format_args!("{unused} unused config(s)"), loaded);

        let counts: Vec<_> = configs
            .iter()
            .map(|id| (id.clone(), records[id].expanded_len()))
            .collect();
        for (id, n) in &counts {
            debug!("{id} expands to {n} sample(s)");
        }

        let plan = BatchPlan::build(&counts, config.batch_size, config.strict_alignment)?;
        let order = if config.shuffle {
            AccessOrder::shuffled(plan.len(), &mut rng)
        } else {
            AccessOrder::identity(plan.len())
        };

        let assembler = Assembler::new(config.num_past, config.window_size, config.relative)?;

        Ok(Self {
            configs,
            records,
            priority: P::create(plan.len()),
            plan,
            order,
            selector: Selector::new(config.sampling),
            assembler,
            device: config.device,
            rng,
        })
    }

    /// Picks the next batch according to the sampling policy and assembles it.
    pub fn next_batch(&mut self) -> Result<Batch> {
        let batch_id = self
            .selector
            .select(&self.order, &mut self.priority, &mut self.rng)?;

        self.batch(batch_id)
    }

    /// Assembles the batch `batch_id` of the plan.
    ///
    /// # Returns
    /// The batch or an error if `batch_id` is out of range or the assembly failed.
    pub fn batch(&self, batch_id: usize) -> Result<Batch> {
        let BatchDescriptor { config, start, end } =
            self.plan.get(batch_id).ok_or(LoaderErr::ShapeInvariant {
                what: "batch id",
                got: batch_id,
                expected: self.plan.len(),
            })?;

        self.assemble(config, *start, *end)
    }

    /// Assembles the samples `start..=end` of `config`.
    pub fn assemble(&self, config: &ConfigId, start: usize, end: usize) -> Result<Batch> {
        let record = self.records.get(config).ok_or_else(|| {
            LoaderErr::ConfigMismatch(format!("{config} is not part of this loader"))
        })?;

        let batch = self.assembler.assemble(config, record, start, end)?;
        Ok(batch.into_device(self.device))
    }

    /// Feeds the training signal of a batch to the priority sampler.
    pub fn record_signal(&mut self, batch_id: usize, signal: f64) {
        self.priority.record(batch_id, signal);
    }

    pub fn configs(&self) -> &[ConfigId] {
        &self.configs
    }

    pub fn plan(&self) -> &BatchPlan {
        &self.plan
    }

    pub fn order(&self) -> &AccessOrder {
        &self.order
    }

    pub fn num_batches(&self) -> usize {
        self.plan.len()
    }

    pub fn priority(&self) -> &P {
        &self.priority
    }

    /// The last batch id handed out by `next_batch`.
    pub fn current_sampled_id(&self) -> Option<usize> {
        self.selector.current_sampled_id()
    }
}
