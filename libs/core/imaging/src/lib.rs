//! Upload validation and resizing for product, logo and category images.
//!
//! Decoding and resampling are CPU bound and run on the blocking pool.

pub mod config;
pub mod error;
pub mod processor;

pub use config::ImageConfig;
pub use error::{ImageError, ImageResult};
pub use processor::{
    ALLOWED_CONTENT_TYPES, ImageProcessor, ProcessedImage, UploadedFile, fit_dimensions,
};
