use ndarray::{Array1, Array3, Array4, ArrayView3};

use crate::{
    Result,
    config::{FEATURES, MAX_CONTEXT},
    error::check,
};

/// The static goo descriptors of a configuration, `(examples, goos, features)`.
///
/// Configurations without goos carry `Absent` rather than an empty tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Goos {
    Absent,
    Present(Array3<f32>),
}

impl Goos {
    /// Wraps a goo tensor, mapping a tensor without goos to `Absent`.
    pub fn from_tensor(goos: Array3<f32>) -> Self {
        if goos.is_empty() {
            Self::Absent
        } else {
            Self::Present(goos)
        }
    }

    /// The amount of goos per example.
    pub fn count(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Present(goos) => goos.dim().1,
        }
    }

    pub fn view(&self) -> Option<ArrayView3<'_, f32>> {
        match self {
            Self::Absent => None,
            Self::Present(goos) => Some(goos.view()),
        }
    }
}

/// Everything the dataset store holds for a single configuration.
#[derive(Debug, Clone)]
pub struct ConfigRecord {
    particles: Array4<f32>,
    goos: Goos,
    mask: Array1<f32>,
}

impl ConfigRecord {
    /// Creates a new `ConfigRecord`.
    ///
    /// # Arguments
    /// * `particles` - The trajectories, `(examples, particles, window, features)`.
    /// * `goos` - The goo descriptors.
    /// * `mask` - The context-count mask.
    ///
    /// # Returns
    /// The record or an error if the tensors disagree on their shapes.
    pub fn new(particles: Array4<f32>, goos: Goos, mask: Array1<f32>) -> Result<Self> {
        let (examples, _, _, features) = particles.dim();
        let goos = match goos {
            Goos::Present(g) => Goos::from_tensor(g),
            Goos::Absent => Goos::Absent,
        };

        check("particle features", features, FEATURES)?;
        check("mask length", mask.len(), MAX_CONTEXT)?;

        if let Goos::Present(ref g) = goos {
            let (goo_examples, _, goo_features) = g.dim();
            check("goo examples", goo_examples, examples)?;
            check("goo features", goo_features, FEATURES)?;
        }

        Ok(Self {
            particles,
            goos,
            mask,
        })
    }

    pub fn particles(&self) -> &Array4<f32> {
        &self.particles
    }

    pub fn goos(&self) -> &Goos {
        &self.goos
    }

    pub fn mask(&self) -> &Array1<f32> {
        &self.mask
    }

    pub fn examples(&self) -> usize {
        self.particles.dim().0
    }

    pub fn num_particles(&self) -> usize {
        self.particles.dim().1
    }

    pub fn window(&self) -> usize {
        self.particles.dim().2
    }

    /// The amount of per-particle samples this record expands to.
    pub fn expanded_len(&self) -> usize {
        self.examples() * self.num_particles()
    }

    /// The amount of real context objects the mask claims, i.e. the index of its single one.
    ///
    /// # Returns
    /// The count or an error if the mask is not one-hot.
    pub fn mask_real_count(&self) -> Result<usize> {
        let ones: Vec<_> = self
            .mask
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1.0)
            .map(|(i, _)| i)
            .collect();

        let zeros = self.mask.iter().filter(|&&v| v == 0.0).count();
        check("mask one-hot entries", ones.len(), 1)?;
        check("mask zero entries", zeros, MAX_CONTEXT - 1)?;

        Ok(ones[0])
    }
}
