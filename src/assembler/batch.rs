use log::debug;
use ndarray::{Array1, Array2, Array3};

use crate::{config::Device, resolver::ConfigId};

/// One training batch, every tensor restricted to the samples `start..=end` of `config`.
///
/// Shapes, with `n` the batch size:
/// * `this_x` - `(n, num_past * 8)`
/// * `context_x` - `(n, 10, num_past * 8)`
/// * `y` - `(n, num_future * 8)`
/// * `mask` - `(10)`
/// * `context_future` - `(n, 10, num_future * 8)`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub this_x: Array2<f32>,
    pub context_x: Array3<f32>,
    pub y: Array2<f32>,
    pub mask: Array1<f32>,
    pub config: ConfigId,
    pub start: usize,
    pub end: usize,
    pub context_future: Array3<f32>,
    device: Device,
}

impl Batch {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        this_x: Array2<f32>,
        context_x: Array3<f32>,
        y: Array2<f32>,
        mask: Array1<f32>,
        config: ConfigId,
        start: usize,
        end: usize,
        context_future: Array3<f32>,
    ) -> Self {
        Self {
            this_x,
            context_x,
            y,
            mask,
            config,
            start,
            end,
            context_future,
            device: Device::Cpu,
        }
    }

    /// The amount of samples in the batch.
    pub fn len(&self) -> usize {
        self.this_x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Places the batch's tensors on `device`, values are left untouched.
    pub fn into_device(mut self, device: Device) -> Self {
        if self.device != device {
            debug!("moving batch {}[{}..={}] to {device:?}", self.config, self.start, self.end);
            self.device = device;
        }
        self
    }
}
