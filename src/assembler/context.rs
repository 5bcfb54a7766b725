use ndarray::{Array4, ArrayView4, Axis, concatenate};

use crate::{
    LoaderErr, Result,
    config::{FEATURES, MAX_CONTEXT},
    error::check,
    resolver::ConfigId,
};

/// Part of a particle's context, `(samples, objects, window, features)`.
///
/// A configuration with a single particle has no other particles and one without goos has no
/// goos, both are `Empty` rather than zero-width tensors.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    Empty,
    Present(Array4<f32>),
}

impl Context {
    /// The amount of real objects in this part.
    pub fn width(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Present(objects) => objects.dim().1,
        }
    }
}

/// The padded context of every sample plus the amount of padding slots used.
#[derive(Debug)]
pub struct PaddedContext {
    pub tensor: Array4<f32>,
    pub padding: usize,
}

/// Joins the other particles and the goos along the object axis and zero pads them up to
/// `MAX_CONTEXT` objects.
///
/// # Arguments
/// * `config` - The configuration being assembled.
/// * `others` - The other particles of every sample.
/// * `goos` - The goos of every sample.
/// * `samples` - The amount of samples.
/// * `window` - The amount of timesteps per sample.
///
/// # Returns
/// The padded context or an error if there are more real objects than slots.
pub fn pad(
    config: &ConfigId,
    others: &Context,
    goos: &Context,
    samples: usize,
    window: usize,
) -> Result<PaddedContext> {
    let real = others.width() + goos.width();
    let padding = MAX_CONTEXT
        .checked_sub(real)
        .ok_or_else(|| LoaderErr::PaddingOverflow {
            config: config.to_string(),
            real,
            capacity: MAX_CONTEXT,
        })?;

    let zeros = Array4::<f32>::zeros((samples, padding, window, FEATURES));

    let mut parts: Vec<ArrayView4<f32>> = match (others, goos) {
        (Context::Empty, Context::Empty) => vec![],
        (Context::Present(o), Context::Empty) => vec![o.view()],
        (Context::Empty, Context::Present(g)) => vec![g.view()],
        (Context::Present(o), Context::Present(g)) => vec![o.view(), g.view()],
    };

    for part in &parts {
        check("context samples", part.dim().0, samples)?;
        check("context window", part.dim().2, window)?;
    }

    parts.push(zeros.view());
    let tensor = concatenate(Axis(1), &parts)?;
    check("context width", tensor.dim().1, MAX_CONTEXT)?;

    Ok(PaddedContext { tensor, padding })
}
