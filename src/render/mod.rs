pub mod engine;
pub mod history;
pub mod layout;
pub mod surface;
pub mod timer;

pub use engine::{palette, RenderEngine};
pub use history::PitchHistory;
pub use layout::LaneLayout;
pub use surface::{DrawCommand, DrawList, Rgb, Surface};
pub use timer::FrameTimer;
