pub mod image_embed;
pub mod seed;

pub use image_embed::{ImageEmbed, ImageEmbedder};
