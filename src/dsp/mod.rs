pub mod block;
pub mod yin;

pub use block::BlockAccumulator;
pub use yin::{Yin, YinParams};
