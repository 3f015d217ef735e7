pub mod common;
pub mod health;
pub mod image;

pub use common::*;
pub use health::*;
pub use image::*;
