pub mod build_images;
pub mod plan;
