pub mod app;
pub mod events;
pub mod render;

pub use app::App;
