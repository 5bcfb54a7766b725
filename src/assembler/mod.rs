mod batch;
mod context;

use std::num::NonZeroUsize;

use log::trace;
use ndarray::{Array2, Array3, Array4, ArrayView3, ArrayView4, Axis, Order, concatenate, s};

pub use batch::Batch;
pub use context::{Context, PaddedContext};

use crate::{
    LoaderErr, Result,
    config::{FEATURES, MAX_CONTEXT},
    error::check,
    memory,
    resolver::ConfigId,
    store::{ConfigRecord, Goos},
};

/// Turns a configuration's raw trajectories into per-particle training samples.
///
/// Every particle of every source example becomes a sample of its own: its trajectory is the
/// input/target and everything else in the scene (the other particles and the goos) is its
/// context. Samples are ordered by particle first, so the `k`-th sample is particle
/// `k / examples` of example `k % examples`.
#[derive(Debug, Clone, Copy)]
pub struct Assembler {
    num_past: usize,
    window: usize,
    relative: bool,
}

impl Assembler {
    /// Creates a new `Assembler`.
    ///
    /// # Arguments
    /// * `num_past` - The amount of leading timesteps used as input.
    /// * `window` - The amount of timesteps per trajectory window.
    /// * `relative` - Whether the targets are expressed relative to the last past position.
    ///
    /// # Returns
    /// The assembler or an error if `num_past` doesn't leave any future timesteps.
    pub fn new(num_past: NonZeroUsize, window: NonZeroUsize, relative: bool) -> Result<Self> {
        if num_past >= window {
            return Err(LoaderErr::InvalidConfig(format!(
                "num_past ({num_past}) must be smaller than the window ({window})"
            )));
        }

        Ok(Self {
            num_past: num_past.get(),
            window: window.get(),
            relative,
        })
    }

    pub fn num_future(&self) -> usize {
        self.window - self.num_past
    }

    /// Assembles the samples `start..=end` of a configuration.
    ///
    /// The whole configuration is expanded on every call and only then restricted to the
    /// requested range.
    ///
    /// # Arguments
    /// * `config` - The configuration's identifier.
    /// * `record` - The configuration's tensors.
    /// * `start` - The first sample, inclusive.
    /// * `end` - The last sample, inclusive.
    ///
    /// # Returns
    /// The batch or an error if any shape invariant doesn't hold.
    pub fn assemble(
        &self,
        config: &ConfigId,
        record: &ConfigRecord,
        start: usize,
        end: usize,
    ) -> Result<Batch> {
        let particles = record.particles();
        let (examples, num_particles, window, features) = particles.dim();

        check("particle features", features, FEATURES)?;
        check("window length", window, self.window)?;
        check("particle count", num_particles, config.particles())?;
        check("goo count", record.goos().count(), config.goos())?;

        let samples = examples * num_particles;
        if start > end || end >= samples {
            return Err(LoaderErr::ShapeInvariant {
                what: "batch end",
                got: end,
                expected: samples.saturating_sub(1),
            });
        }

        let (this, others) = expand_particles(particles.view())?;
        check("expanded samples", this.dim().0, samples)?;

        let goos = broadcast_goos(record.goos(), num_particles, window)?;
        let PaddedContext {
            tensor: context,
            padding,
        } = context::pad(config, &others, &goos, samples, window)?;
        memory::release(format_args!("unpadded context of {config}"), (others, goos));

        check("context width", context.dim().1, MAX_CONTEXT)?;
        check("mask real objects", record.mask_real_count()?, MAX_CONTEXT - padding)?;

        let past = self.num_past;
        let this_past = this.slice(s![.., ..past, ..]);
        let this_future = this.slice(s![.., past.., ..]);
        let context_past = context.slice(s![.., .., ..past, ..]);
        let context_future = context.slice(s![.., .., past.., ..]);

        check("past length", this_past.dim().1, past)?;
        check("future length", this_future.dim().1, self.num_future())?;
        check("context past length", context_past.dim().2, past)?;
        check("context future length", context_future.dim().2, self.num_future())?;

        let y = if self.relative {
            let last = this_past.slice(s![.., past - 1..past, ..]);
            &this_future - &last
        } else {
            this_future.to_owned()
        };

        let this_x = flatten_steps(this_past.slice(s![start..=end, .., ..]))?;
        let y_flat = flatten_steps(y.slice(s![start..=end, .., ..]))?;
        let context_x = flatten_object_steps(context_past.slice(s![start..=end, .., .., ..]))?;
        let context_future =
            flatten_object_steps(context_future.slice(s![start..=end, .., .., ..]))?;

        trace!(
            "assembled {config}[{start}..={end}] out of {samples} sample(s), {padding} padding slot(s)"
        );
        memory::release(format_args!("expanded tensors of {config}"), (this, context, y));

        Ok(Batch::new(
            this_x,
            context_x,
            y_flat,
            record.mask().clone(),
            config.clone(),
            start,
            end,
            context_future,
        ))
    }
}

/// Splits the trajectories into one group per particle.
///
/// # Arguments
/// * `particles` - The trajectories, `(examples, particles, window, features)`.
///
/// # Returns
/// The particle of interest of every sample, `(examples * particles, window, features)`, and
/// the remaining particles of every sample, `(examples * particles, particles - 1, window,
/// features)`.
fn expand_particles(particles: ArrayView4<f32>) -> Result<(Array3<f32>, Context)> {
    let num_particles = particles.dim().1;

    let this: Vec<_> = (0..num_particles)
        .map(|i| particles.index_axis(Axis(1), i))
        .collect();
    let this = concatenate(Axis(0), &this)?;

    if num_particles == 1 {
        return Ok((this, Context::Empty));
    }

    let others: Vec<Array4<f32>> = (0..num_particles)
        .map(|i| {
            let rest: Vec<_> = (0..num_particles).filter(|&j| j != i).collect();
            particles.select(Axis(1), &rest)
        })
        .collect();
    let others: Vec<_> = others.iter().map(|o| o.view()).collect();
    let others = concatenate(Axis(0), &others)?;

    Ok((this, Context::Present(others)))
}

/// Repeats the static goos once per particle group and once per timestep.
///
/// # Returns
/// The goos of every sample, `(examples * particles, goos, window, features)`.
fn broadcast_goos(goos: &Goos, num_particles: usize, window: usize) -> Result<Context> {
    let Some(goos) = goos.view() else {
        return Ok(Context::Empty);
    };

    let tiled = concatenate(Axis(0), &vec![goos; num_particles])?;
    let (samples, count, features) = tiled.dim();

    let over_time = tiled
        .insert_axis(Axis(2))
        .broadcast((samples, count, window, features))
        .ok_or(LoaderErr::ShapeInvariant {
            what: "goo broadcast window",
            got: 1,
            expected: window,
        })?
        .to_owned();

    Ok(Context::Present(over_time))
}

/// `(samples, steps, features)` into `(samples, steps * features)`.
fn flatten_steps(x: ArrayView3<f32>) -> Result<Array2<f32>> {
    let (samples, steps, features) = x.dim();
    Ok(x.to_shape(((samples, steps * features), Order::RowMajor))?.into_owned())
}

/// `(samples, objects, steps, features)` into `(samples, objects, steps * features)`.
fn flatten_object_steps(x: ArrayView4<f32>) -> Result<Array3<f32>> {
    let (samples, objects, steps, features) = x.dim();
    let shape = (samples, objects, steps * features);
    Ok(x.to_shape((shape, Order::RowMajor))?.into_owned())
}

#[cfg(test)]
mod tests {
    use ndarray::Array1;

    use super::*;

    const EXAMPLES: usize = 4;
    const WINDOW: usize = 5;
    const PAST: usize = 2;

    /// Every value encodes where it comes from: `e * 1000 + p * 100 + t * 10 + f`.
    fn particles(num_particles: usize) -> Array4<f32> {
        Array4::from_shape_fn(
            (EXAMPLES, num_particles, WINDOW, FEATURES),
            |(e, p, t, f)| (e * 1000 + p * 100 + t * 10 + f) as f32,
        )
    }

    /// Goo values are negative so they can't be mistaken for particles.
    fn goos(count: usize) -> Goos {
        Goos::Present(Array3::from_shape_fn((EXAMPLES, count, FEATURES), |(e, g, f)| {
            -((e * 100 + g * 10 + f) as f32) - 1.0
        }))
    }

    fn mask(real: usize) -> Array1<f32> {
        let mut mask = Array1::zeros(MAX_CONTEXT);
        mask[real] = 1.0;
        mask
    }

    fn assembler(relative: bool) -> Assembler {
        Assembler::new(
            NonZeroUsize::new(PAST).unwrap(),
            NonZeroUsize::new(WINDOW).unwrap(),
            relative,
        )
        .unwrap()
    }

    fn record(num_particles: usize, num_goos: usize) -> (ConfigId, ConfigRecord) {
        let goos = if num_goos == 0 { Goos::Absent } else { goos(num_goos) };
        let real = num_particles - 1 + num_goos;
        let record = ConfigRecord::new(particles(num_particles), goos, mask(real)).unwrap();
        (ConfigId::new("worldm1", num_particles, num_goos), record)
    }

    #[test]
    fn two_particles_without_goos() {
        let (id, record) = record(2, 0);
        let batch = assembler(false).assemble(&id, &record, 0, 7).unwrap();

        assert_eq!(batch.this_x.dim(), (8, PAST * FEATURES));
        assert_eq!(batch.y.dim(), (8, (WINDOW - PAST) * FEATURES));
        assert_eq!(batch.context_x.dim(), (8, MAX_CONTEXT, PAST * FEATURES));
        assert_eq!(
            batch.context_future.dim(),
            (8, MAX_CONTEXT, (WINDOW - PAST) * FEATURES)
        );

        for k in 0..8 {
            let (p, e) = (k / EXAMPLES, k % EXAMPLES);
            let other = 1 - p;

            for t in 0..PAST {
                for f in 0..FEATURES {
                    let col = t * FEATURES + f;
                    let base = (e * 1000 + t * 10 + f) as f32;
                    assert_eq!(batch.this_x[[k, col]], base + (p * 100) as f32);
                    assert_eq!(batch.context_x[[k, 0, col]], base + (other * 100) as f32);
                }
            }

            for f in 0..FEATURES {
                let first_future = (e * 1000 + p * 100 + PAST * 10 + f) as f32;
                assert_eq!(batch.y[[k, f]], first_future);
            }
        }

        // one real object, nine padding slots
        assert!(batch.context_x.slice(s![.., 1.., ..]).iter().all(|&v| v == 0.0));
        assert!(
            batch
                .context_future
                .slice(s![.., 1.., ..])
                .iter()
                .all(|&v| v == 0.0)
        );
    }

    #[test]
    fn goos_follow_the_other_particles_and_repeat_over_time() {
        let (id, record) = record(3, 2);
        let batch = assembler(false).assemble(&id, &record, 0, 11).unwrap();

        for k in 0..12 {
            let e = k % EXAMPLES;
            for slot in 0..2 {
                for t in 0..PAST {
                    for f in 0..FEATURES {
                        let goo = -((e * 100 + slot * 10 + f) as f32) - 1.0;
                        assert_eq!(batch.context_x[[k, 2 + slot, t * FEATURES + f]], goo);
                    }
                }
            }
        }

        assert!(batch.context_x.slice(s![.., 4.., ..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn lone_particle_gets_pure_padding() {
        let (id, record) = record(1, 0);
        let batch = assembler(false).assemble(&id, &record, 0, 3).unwrap();

        assert_eq!(batch.context_x.dim(), (4, MAX_CONTEXT, PAST * FEATURES));
        assert!(batch.context_x.iter().all(|&v| v == 0.0));
        assert!(batch.context_future.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn only_goos() {
        let (id, record) = record(1, 3);
        let batch = assembler(false).assemble(&id, &record, 0, 3).unwrap();

        assert!(batch.context_x.slice(s![.., ..3, ..]).iter().all(|&v| v < 0.0));
        assert!(batch.context_x.slice(s![.., 3.., ..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn slices_the_requested_range() {
        let (id, record) = record(2, 1);
        let full = assembler(false).assemble(&id, &record, 0, 7).unwrap();
        let part = assembler(false).assemble(&id, &record, 4, 7).unwrap();

        assert_eq!(part.len(), 4);
        assert_eq!((part.start, part.end), (4, 7));
        assert_eq!(part.this_x, full.this_x.slice(s![4..8, ..]));
        assert_eq!(part.context_x, full.context_x.slice(s![4..8, .., ..]));
        assert_eq!(part.y, full.y.slice(s![4..8, ..]));
        assert_eq!(&part.mask, record.mask());
    }

    #[test]
    fn relative_targets_add_back_to_absolute() {
        let (id, record) = record(2, 1);
        let absolute = assembler(false).assemble(&id, &record, 0, 7).unwrap();
        let relative = assembler(true).assemble(&id, &record, 0, 7).unwrap();

        assert_eq!(relative.this_x, absolute.this_x);
        assert_eq!(relative.context_future, absolute.context_future);

        let last_past = relative.this_x.slice(s![.., (PAST - 1) * FEATURES..]);
        for step in 0..WINDOW - PAST {
            let (lo, hi) = (step * FEATURES, (step + 1) * FEATURES);
            let rebuilt = &relative.y.slice(s![.., lo..hi]) + &last_past;
            assert_eq!(rebuilt, absolute.y.slice(s![.., lo..hi]));
        }
    }

    #[test]
    fn mask_must_match_real_objects() {
        let (id, _) = record(2, 1);
        let wrong = ConfigRecord::new(particles(2), goos(1), mask(1)).unwrap();

        assert!(matches!(
            assembler(false).assemble(&id, &wrong, 0, 3),
            Err(LoaderErr::ShapeInvariant {
                what: "mask real objects",
                got: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn too_many_objects_overflow() {
        let particles = Array4::zeros((1, 6, WINDOW, FEATURES));
        let record = ConfigRecord::new(particles, goos_for(1, 6), mask(0)).unwrap();
        let id = ConfigId::new("worldm1", 6, 6);

        assert!(matches!(
            assembler(false).assemble(&id, &record, 0, 5),
            Err(LoaderErr::PaddingOverflow { real: 11, .. })
        ));
    }

    fn goos_for(examples: usize, count: usize) -> Goos {
        Goos::Present(Array3::ones((examples, count, FEATURES)))
    }

    #[test]
    fn rejects_out_of_range_and_wrong_window() {
        let (id, record) = record(2, 0);
        assert!(assembler(false).assemble(&id, &record, 4, 8).is_err());
        assert!(assembler(false).assemble(&id, &record, 5, 4).is_err());

        let short = Assembler::new(
            NonZeroUsize::new(1).unwrap(),
            NonZeroUsize::new(3).unwrap(),
            false,
        )
        .unwrap();
        assert!(matches!(
            short.assemble(&id, &record, 0, 3),
            Err(LoaderErr::ShapeInvariant {
                what: "window length",
                ..
            })
        ));
    }

    #[test]
    fn rejects_past_covering_the_window() {
        let n = NonZeroUsize::new(5).unwrap();
        assert!(Assembler::new(n, n, false).is_err());
    }
}
