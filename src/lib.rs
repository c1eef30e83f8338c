#[macro_use]
mod logging;

mod error;
pub use error::*;

mod grid;
pub use grid::*;

mod matrix;
pub use matrix::*;

mod transform;
pub use transform::*;

mod period;
pub use period::*;

mod config;
pub use config::*;

mod history;
pub use history::*;

mod sequence;
pub use sequence::*;

mod image_io;
pub use image_io::*;

mod playback;
pub use playback::*;

mod didactic;
pub use didactic::*;

mod wasm;
pub use wasm::*;
