mod chart;
mod driver;
mod engine;
mod input;
mod model;
mod roster;
mod song_loader;
mod util;

pub use chart::*;
pub use driver::*;
pub use engine::*;
pub use input::*;
pub use model::config::*;
pub use model::song::*;
pub use roster::*;
pub use song_loader::*;
pub use util::*;
