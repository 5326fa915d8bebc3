//! Moving-average frame-rate estimate.

/// Fixed-length ring of instantaneous rates. The ring is always full: it
/// starts seeded and every push evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct FpsWindow {
    samples: Vec<f64>,
    next: usize,
}

impl FpsWindow {
    /// Window of `len` samples (at least one), all set to `seed`.
    pub fn new(len: usize, seed: f64) -> Self {
        Self {
            samples: vec![seed; len.max(1)],
            next: 0,
        }
    }

    /// Record one inter-frame interval in seconds and return the average.
    /// Non-positive intervals count as 0 fps.
    pub fn push_sample(&mut self, dt: f64) -> f64 {
        let fps = if dt <= 0.0 { 0.0 } else { 1.0 / dt };
        self.samples[self.next] = fps;
        self.next = (self.next + 1) % self.samples.len();
        self.average()
    }

    pub fn average(&self) -> f64 {
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new(25, 30.0)
    }
}
