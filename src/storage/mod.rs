mod disk;
mod image;

pub use disk::{DurablePage, DurableStore};
pub use image::DurableImage;
