/// Collects incoming samples into fixed-size, non-overlapping blocks
/// Device callbacks deliver arbitrary buffer lengths; the estimator wants
/// exactly `block_size` samples per estimate
pub struct BlockAccumulator {
    block: Vec<f32>,
    block_size: usize,
}

impl BlockAccumulator {
    pub fn new(block_size: usize) -> Self {
        Self {
            block: Vec::with_capacity(block_size),
            block_size: block_size.max(1),
        }
    }

    /// Number of samples waiting for the next block
    pub fn pending(&self) -> usize {
        self.block.len()
    }

    /// Push samples, calling `on_block` once per completed block
    pub fn push<F>(&mut self, samples: impl IntoIterator<Item = f32>, mut on_block: F)
    where
        F: FnMut(&[f32]),
    {
        for sample in samples {
            self.block.push(sample);
            if self.block.len() == self.block_size {
                on_block(&self.block);
                self.block.clear();
            }
        }
    }
}
